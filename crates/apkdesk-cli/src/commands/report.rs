//! Report command - render an HTML report

use anyhow::{Context, Result};
use apkdesk_core::report::{self, ReportSource};
use apkdesk_core::{Session, StoreError};
use std::path::PathBuf;

use crate::output;

/// Run the report command
pub fn run(session: &mut Session, id: Option<String>, output_path: Option<PathBuf>) -> Result<()> {
    let source = match id {
        Some(id) => session
            .find_history(&id)
            .cloned()
            .map(ReportSource::History)
            .ok_or(StoreError::NotFound(id))
            .context("Failed to find history entry")?,
        None => session
            .current_report()
            .context("No current analysis; run `apkdesk analyze` or pass --id")?,
    };

    output::emit(&report::render(&source), output_path.as_deref())
}

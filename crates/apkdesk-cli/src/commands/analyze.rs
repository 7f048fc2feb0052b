//! Analyze command implementation

use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use apkdesk_core::{AnalysisInput, Session};
use colored::Colorize;
use std::path::PathBuf;

use super::banner;

/// Run the analyze command
pub async fn run(
    session: &mut Session,
    path: PathBuf,
    format: crate::OutputFormat,
    output_path: Option<PathBuf>,
) -> Result<()> {
    if !path.is_file() {
        anyhow::bail!("Package not found at: {}", path.display());
    }

    tracing::info!("Analyzing: {}", path.display());
    let committed = match session.analyze(AnalysisInput::path(&path)).await {
        Ok(committed) => committed,
        Err(e) => {
            eprintln!("{} {}", banner::status_fail(), e);
            return Err(e).context("Analysis failed");
        }
    };
    output::warn_unsaved(&committed);

    let entry = committed.into_value();
    let output_str =
        output::format_result(&entry.result, entry.origin.as_ref(), OutputFormat::from(format))?;
    output::emit(&output_str, output_path.as_deref())?;

    if matches!(format, crate::OutputFormat::Text) {
        println!(
            "{} Saved to history as {}",
            banner::status_ok(),
            entry.id.dimmed()
        );
    }

    Ok(())
}

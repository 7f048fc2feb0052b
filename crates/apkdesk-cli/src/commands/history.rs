//! History command - browse and manage past analyses

use anyhow::{Context, Result};
use apkdesk_core::Session;
use colored::Colorize;

use super::banner;
use crate::output::{self, OutputFormat};
use crate::HistoryAction;

/// Run a history action
pub fn run(session: &mut Session, action: HistoryAction) -> Result<()> {
    match action {
        HistoryAction::List => {
            banner::print_header("History");
            print!("{}", output::format_history(session.history()));
            Ok(())
        }
        HistoryAction::Show { id } => {
            let committed = session
                .load_from_history(&id)
                .context("Failed to load history entry")?;
            output::warn_unsaved(&committed);

            let result = committed.into_value();
            let text = output::format_result(&result, session.current_origin(), OutputFormat::Text)?;
            println!("{}", text);
            Ok(())
        }
        HistoryAction::Remove { id } => {
            let committed = session.remove_from_history(&id);
            output::warn_unsaved(&committed);
            if committed.into_value() {
                println!("{} Removed {}", banner::status_ok(), id.dimmed());
                Ok(())
            } else {
                anyhow::bail!("No history entry with id {}", id)
            }
        }
        HistoryAction::Clear => {
            let count = session.history().len();
            let committed = session.clear_history();
            output::warn_unsaved(&committed);
            println!(
                "{} Cleared {} history entr{}",
                banner::status_ok(),
                count.to_string().bold(),
                if count == 1 { "y" } else { "ies" }
            );
            Ok(())
        }
    }
}

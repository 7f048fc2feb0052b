//! Current command - show or clear the displayed analysis

use anyhow::Result;
use apkdesk_core::Session;
use colored::Colorize;

use super::banner;
use crate::output::{self, OutputFormat};
use crate::CurrentAction;

/// Run a current-analysis action
pub fn run(session: &mut Session, action: CurrentAction) -> Result<()> {
    match action {
        CurrentAction::Show => {
            println!("{} {}", "Status:".bold(), banner::status_badge(session.status()));
            match session.current() {
                Some(result) => {
                    let text =
                        output::format_result(result, session.current_origin(), OutputFormat::Text)?;
                    println!("{}", text);
                    if session.is_certificate_expired() {
                        println!("{}", "Signing certificate has expired.".red());
                    }
                }
                None => println!("{}", "No current analysis.".dimmed()),
            }
            Ok(())
        }
        CurrentAction::Clear => {
            let committed = session.clear_current_analysis();
            output::warn_unsaved(&committed);
            println!("{} Current analysis cleared", banner::status_ok());
            Ok(())
        }
    }
}

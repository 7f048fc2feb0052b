//! CLI banner and shared display helpers

use apkdesk_core::Status;
use colored::Colorize;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Print the main banner
pub fn print_banner() {
    println!();
    println!("  {} v{}", "apkdesk".cyan().bold(), VERSION);
    println!("  {}", "Package analysis history and result cache".dimmed());
    println!();
}

/// Print a compact header for subcommands
pub fn print_header(title: &str) {
    println!();
    println!("{} {}", "apkdesk".cyan().bold(), format!("| {}", title).dimmed());
    println!("{}", "=".repeat(60).dimmed());
}

/// Colored session status badge
pub fn status_badge(status: Status) -> String {
    match status {
        Status::Idle => "[IDLE]".dimmed().to_string(),
        Status::Loading => "[LOADING]".cyan().bold().to_string(),
        Status::Ready => "[READY]".green().bold().to_string(),
        Status::Failed => "[FAILED]".red().bold().to_string(),
    }
}

pub fn status_ok() -> String {
    format!("{}", "[OK]".green().bold())
}

pub fn status_fail() -> String {
    format!("{}", "[FAIL]".red().bold())
}

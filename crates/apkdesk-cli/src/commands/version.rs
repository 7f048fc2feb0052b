//! Version command implementation

use apkdesk_core::StoreConfig;
use colored::Colorize;

use super::banner;

/// Run the version command
pub fn run(config: &StoreConfig) {
    banner::print_banner();

    println!("{}", "Components:".white().bold());
    println!("  CLI:     v{}", env!("CARGO_PKG_VERSION"));
    println!("  Core:    v{}", apkdesk_core::VERSION);
    println!();

    println!("{}", "Configuration:".white().bold());
    println!("  {} Engine: {}", "-".dimmed(), config.analyzer.program.display());
    if config.storage.enabled {
        println!("  {} Storage: {}", "-".dimmed(), config.storage.directory.display());
    } else {
        println!("  {} Storage: {}", "-".dimmed(), "disabled".yellow());
    }
    println!("  {} History capacity: {}", "-".dimmed(), config.history_capacity);
    println!();
}

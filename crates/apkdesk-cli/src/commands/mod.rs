//! CLI commands

pub mod analyze;
pub mod banner;
pub mod current;
pub mod history;
pub mod report;
pub mod version;

//! Output formatting for analysis results and history

use anyhow::{Context, Result};
use apkdesk_core::{report, AnalysisResult, Committed, FileOrigin, HistoryEntry};
use colored::Colorize;
use std::path::Path;

/// Output format options
#[derive(Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl From<crate::OutputFormat> for OutputFormat {
    fn from(format: crate::OutputFormat) -> Self {
        match format {
            crate::OutputFormat::Text => OutputFormat::Text,
            crate::OutputFormat::Json => OutputFormat::Json,
            crate::OutputFormat::Html => OutputFormat::Html,
        }
    }
}

/// Format a result according to the specified format
pub fn format_result(
    result: &AnalysisResult,
    origin: Option<&FileOrigin>,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format_text(result, origin)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Html => Ok(report::render_html(result, origin)),
    }
}

fn format_text(result: &AnalysisResult, origin: Option<&FileOrigin>) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} {}\n",
        "Package:".bold(),
        result.package_name
    ));
    output.push_str(&format!("{}\n", "=".repeat(60)));
    output.push_str(&format!("  Version:  {}\n", result.formatted_version_info));
    output.push_str(&format!("  SDK:      {}\n", result.formatted_sdk_info));

    if let Some(origin) = origin {
        output.push_str(&format!(
            "  File:     {} ({})\n",
            origin.file_name,
            report::format_file_size(origin.file_size)
        ));
    }

    if let Some(activity) = &result.main_activity {
        output.push_str(&format!("  Activity: {}\n", activity));
    }

    if let Some(file) = &result.file_info {
        output.push_str(&format!("  SHA-256:  {}\n", file.sha256.dimmed()));
    }

    if let Some(sig) = &result.signature_info {
        output.push_str(&format!("\n{}\n", "Certificate:".bold()));
        output.push_str(&format!("  Subject:  {}\n", sig.subject));
        output.push_str(&format!("  Issuer:   {}\n", sig.issuer));
        let valid_to = report::format_date(&sig.valid_to);
        if result.is_certificate_expired {
            output.push_str(&format!("  Expires:  {} {}\n", valid_to, "[EXPIRED]".red().bold()));
        } else {
            output.push_str(&format!("  Expires:  {}\n", valid_to));
        }
    }

    output.push_str(&format!(
        "\n{} {} total, {} dangerous\n",
        "Permissions:".bold(),
        result.permission_stats.total,
        result.permission_stats.dangerous
    ));
    for permission in &result.dangerous_permissions {
        output.push_str(&format!("  {} {}\n", "[DANGEROUS]".red().bold(), permission.name));
    }
    for permission in result.normal_permissions() {
        output.push_str(&format!("  {}\n", permission.name.dimmed()));
    }

    output
}

/// Format history entries as a table, newest first
pub fn format_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return format!("{}\n", "No analyses in history.".dimmed());
    }

    let mut output = String::new();
    for (index, entry) in entries.iter().enumerate() {
        let dangerous = entry.result.permission_stats.dangerous;
        let badge = if dangerous > 0 {
            format!("{} dangerous", dangerous).red().to_string()
        } else {
            "no dangerous".green().to_string()
        };
        output.push_str(&format!(
            "{:>2}. {} {} {}  {}\n    {}  {}\n",
            index + 1,
            entry.result.package_name.bold(),
            entry.result.version_name,
            format!("({})", entry.analyzed_at.format("%Y-%m-%d %H:%M")).dimmed(),
            badge,
            "id:".dimmed(),
            entry.id.dimmed()
        ));
    }
    output
}

/// Write `content` to `path`, or to stdout when no path is given
pub fn emit(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            tracing::info!("Output written to: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Report a persistence failure without failing the command
pub fn warn_unsaved<T>(committed: &Committed<T>) {
    if let Some(e) = &committed.persist_error {
        eprintln!("{} {}", "Warning: state not saved:".yellow().bold(), e);
    }
}

//! Standalone HTML analysis reports
//!
//! Pure rendering: consumes a result and optional origin, holds no state.

use crate::types::{parse_engine_date, AnalysisResult, FileOrigin, HistoryEntry};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::fmt::Write;

const UNKNOWN: &str = "Unknown";

/// What a report is rendered from
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportSource {
    /// A freshly analyzed or currently displayed result
    Analysis {
        result: AnalysisResult,
        origin: Option<FileOrigin>,
    },
    /// An entry from the history ledger
    History(HistoryEntry),
}

impl ReportSource {
    pub fn result(&self) -> &AnalysisResult {
        match self {
            ReportSource::Analysis { result, .. } => result,
            ReportSource::History(entry) => &entry.result,
        }
    }

    pub fn origin(&self) -> Option<FileOrigin> {
        match self {
            ReportSource::Analysis { origin, .. } => origin.clone(),
            ReportSource::History(entry) => Some(entry.origin_or_synthesized()),
        }
    }
}

/// Render a report for `source`
pub fn render(source: &ReportSource) -> String {
    render_html_at(source.result(), source.origin().as_ref(), Utc::now())
}

/// Render a report for `result`
pub fn render_html(result: &AnalysisResult, origin: Option<&FileOrigin>) -> String {
    render_html_at(result, origin, Utc::now())
}

/// Render a report stamped with `generated_at`
pub fn render_html_at(
    result: &AnalysisResult,
    origin: Option<&FileOrigin>,
    generated_at: DateTime<Utc>,
) -> String {
    let mut html = String::new();
    let title = escape(&result.package_name);

    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <title>APK Analysis Report - {title}</title>
  <style>{STYLE}</style>
</head>
<body>
  <h1>APK Analysis Report</h1>
"#
    );

    let icon = result
        .icon_base64
        .as_deref()
        .or_else(|| origin.and_then(|o| o.icon_base64.as_deref()));
    let icon_html = match icon {
        Some(data) => format!(
            r#"<img src="data:image/png;base64,{}" alt="App Icon" class="app-icon">"#,
            escape(data)
        ),
        None => r#"<div class="app-icon" style="background: #eee;"></div>"#.to_string(),
    };
    let _ = write!(
        html,
        r#"  <div class="section app-header">
    {icon_html}
    <div class="app-info">
      <h2 style="margin: 0;">{title}</h2>
      <p style="margin: 5px 0;">Version: {} ({})</p>
      <p style="margin: 5px 0;">SDK: Android {} - {}</p>
    </div>
  </div>
"#,
        escape(&result.version_name),
        escape(&result.version_code),
        escape(&result.min_sdk),
        escape(&result.target_sdk),
    );

    let file = result.file_info.as_ref();
    let hash = |value: Option<&String>| {
        format!(
            r#"<span class="hash-value">{}</span>"#,
            value.map(|v| escape(v)).unwrap_or_else(|| UNKNOWN.to_string())
        )
    };
    html.push_str("  <div class=\"section\">\n    <h2>File Information</h2>\n    <table>\n");
    push_row(
        &mut html,
        "File name",
        &origin
            .map(|o| escape(&o.file_name))
            .unwrap_or_else(|| UNKNOWN.to_string()),
    );
    push_row(
        &mut html,
        "File size",
        &format_file_size(file.map(|f| f.file_size).unwrap_or(0)),
    );
    push_row(
        &mut html,
        "File type",
        &file
            .map(|f| escape(&f.file_type))
            .unwrap_or_else(|| UNKNOWN.to_string()),
    );
    push_row(&mut html, "MD5", &hash(file.map(|f| &f.md5)));
    push_row(&mut html, "SHA-1", &hash(file.map(|f| &f.sha1)));
    push_row(&mut html, "SHA-256", &hash(file.map(|f| &f.sha256)));
    html.push_str("    </table>\n  </div>\n");

    if let Some(sig) = &result.signature_info {
        let expiry = if result.is_certificate_expired {
            r#" <span class="danger">(expired)</span>"#
        } else {
            ""
        };
        html.push_str("  <div class=\"section\">\n    <h2>Certificate</h2>\n    <table>\n");
        push_row(&mut html, "Issuer", &escape(&sig.issuer));
        push_row(&mut html, "Subject", &escape(&sig.subject));
        push_row(&mut html, "Valid from", &escape(&format_date(&sig.valid_from)));
        push_row(
            &mut html,
            "Valid to",
            &format!("{}{}", escape(&format_date(&sig.valid_to)), expiry),
        );
        push_row(&mut html, "SHA-1 fingerprint", &hash(sig.fingerprint_sha1.as_ref()));
        push_row(&mut html, "SHA-256 fingerprint", &hash(sig.fingerprint_sha256.as_ref()));
        html.push_str("    </table>\n  </div>\n");
    }

    if !result.permissions.is_empty() {
        let _ = write!(
            html,
            "  <div class=\"section\">\n    <h2>Permissions</h2>\n    <p>Total: {} permissions ({} dangerous)</p>\n",
            result.permission_stats.total, result.permission_stats.dangerous
        );
        if !result.dangerous_permissions.is_empty() {
            html.push_str("    <h3>Dangerous permissions</h3>\n    <ul class=\"danger\">\n");
            for p in &result.dangerous_permissions {
                let _ = writeln!(html, "      <li>{}</li>", escape(&p.name));
            }
            html.push_str("    </ul>\n");
        }
        let mut normal = result.normal_permissions().peekable();
        if normal.peek().is_some() {
            html.push_str("    <h3>Normal permissions</h3>\n    <ul>\n");
            for p in normal {
                let _ = writeln!(html, "      <li>{}</li>", escape(&p.name));
            }
            html.push_str("    </ul>\n");
        }
        html.push_str("  </div>\n");
    }

    let _ = write!(
        html,
        r#"  <div class="section">
    <p style="color: #999;">Generated: {}</p>
  </div>
</body>
</html>
"#,
        generated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    );

    html
}

const STYLE: &str = "
    body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 800px; margin: 0 auto; padding: 20px; }
    h1, h2, h3 { color: #2c3e50; }
    .section { margin-bottom: 30px; border: 1px solid #eee; padding: 20px; border-radius: 5px; }
    .danger { color: #f56c6c; }
    table { width: 100%; border-collapse: collapse; margin-bottom: 15px; }
    table, th, td { border: 1px solid #eee; }
    th, td { padding: 10px; text-align: left; }
    th { background-color: #f7f7f7; }
    .app-header { display: flex; align-items: center; gap: 20px; }
    .app-icon { width: 64px; height: 64px; border-radius: 8px; }
    .app-info { flex: 1; }
    .hash-value { font-family: monospace; background: #f7f7f7; padding: 5px; border-radius: 4px; }
  ";

fn push_row(html: &mut String, header: &str, value: &str) {
    let _ = writeln!(html, "      <tr><th>{}</th><td>{}</td></tr>", header, value);
}

/// Format a byte count as megabytes with two decimals
pub fn format_file_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

/// Format an engine date for display, or return it unchanged if unparseable
pub fn format_date(value: &str) -> String {
    parse_engine_date(value)
        .map(|d| d.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| value.to_string())
}

/// Escape text for HTML element and attribute content
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

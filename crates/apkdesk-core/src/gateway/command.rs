//! Gateway that runs the engine as a child process

use super::AnalyzerGateway;
use crate::config::AnalyzerConfig;
use crate::error::{Result, StoreError};
use crate::types::{AnalysisInput, AnalysisResult, EngineReport};
use async_trait::async_trait;
use chrono::Utc;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Engine command name
pub const ANALYZE_COMMAND: &str = "analyze_package";

/// Runs `<program> <args..> analyze_package <path> [--name <display name>]`
/// and decodes an engine report from stdout
pub struct CommandGateway {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandGateway {
    /// Create a gateway for the given engine executable
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Create a gateway from analyzer configuration
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.program.clone()).with_args(config.args.clone())
    }

    /// Set arguments placed before the command name
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    async fn run(&self, path: &Path, display_name: Option<&str>) -> Result<AnalysisResult> {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args).arg(ANALYZE_COMMAND).arg(path);
        if let Some(name) = display_name {
            command.arg("--name").arg(name);
        }

        debug!("Running {} {} {}", self.program.display(), ANALYZE_COMMAND, path.display());

        let output = command.output().await.map_err(|e| {
            StoreError::AnalysisFailure(format!(
                "Failed to run {}: {}",
                self.program.display(),
                e
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr.trim();
            return Err(StoreError::AnalysisFailure(if reason.is_empty() {
                format!("Engine exited with {}", output.status)
            } else {
                reason.to_string()
            }));
        }

        let report: EngineReport = serde_json::from_slice(&output.stdout).map_err(|e| {
            StoreError::AnalysisFailure(format!("Invalid engine response: {}", e))
        })?;

        Ok(AnalysisResult::from_report(report, Utc::now()))
    }
}

/// Write raw package bytes to a temp file that lives as long as the handle
fn stage_bytes(data: &[u8]) -> Result<NamedTempFile> {
    let stage = || -> std::io::Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("apkdesk-")
            .suffix(".apk")
            .tempfile()?;
        file.write_all(data)?;
        file.flush()?;
        Ok(file)
    };
    stage().map_err(|e| StoreError::AnalysisFailure(format!("Failed to stage package bytes: {}", e)))
}

#[async_trait]
impl AnalyzerGateway for CommandGateway {
    async fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisResult> {
        match input {
            AnalysisInput::Path(path) => self.run(path, None).await,
            AnalysisInput::Bytes { name, data } => {
                let staged = stage_bytes(data)?;
                self.run(staged.path(), Some(name)).await
            }
        }
    }

    fn name(&self) -> &str {
        "command"
    }
}

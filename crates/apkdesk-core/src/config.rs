//! Configuration for storage, history and the analyzer engine

use crate::error::{Result, StoreError};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Durable storage settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Maximum number of history entries kept
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// External engine settings
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            history_capacity: default_history_capacity(),
            analyzer: AnalyzerConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content).map_err(|e| match e {
            StoreError::Toml(e) => {
                StoreError::Config(format!("Failed to parse {}: {}", path.display(), e))
            }
            other => other,
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(StoreError::Config(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        if self.analyzer.program.as_os_str().is_empty() {
            return Err(StoreError::Config("analyzer.program is empty".to_string()));
        }
        Ok(())
    }
}

/// Durable storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Persist history and the last analysis across restarts
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Storage directory
    #[serde(default = "default_storage_dir")]
    pub directory: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("apkdesk")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_storage_dir(),
        }
    }
}

/// External analyzer engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    /// Engine executable
    #[serde(default = "default_program")]
    pub program: PathBuf,
    /// Extra arguments placed before the command name
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_program() -> PathBuf {
    PathBuf::from("apk-engine")
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.history_capacity, 10);
        assert!(config.storage.enabled);
        assert!(config.storage.directory.ends_with("apkdesk"));
        assert_eq!(config.analyzer.program, PathBuf::from("apk-engine"));
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = StoreConfig::from_toml(
            r#"
history_capacity = 5

[storage]
directory = "/var/lib/apkdesk"

[analyzer]
program = "/opt/engine/bin/engine"
args = ["--json"]
"#,
        )
        .unwrap();

        assert_eq!(config.history_capacity, 5);
        assert!(config.storage.enabled);
        assert_eq!(config.storage.directory, PathBuf::from("/var/lib/apkdesk"));
        assert_eq!(config.analyzer.args, vec!["--json".to_string()]);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = StoreConfig::from_toml("history_capacity = 0").unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\nenabled = false").unwrap();

        let config = StoreConfig::load(Some(file.path())).unwrap();
        assert!(!config.storage.enabled);

        let mut broken = tempfile::NamedTempFile::new().unwrap();
        writeln!(broken, "history_capacity = \"ten\"").unwrap();
        assert!(matches!(
            StoreConfig::from_file(broken.path()),
            Err(StoreError::Config(_))
        ));
    }
}

//! Core type definitions for package analysis results and history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A permission requested by the package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Fully qualified permission name (e.g., "android.permission.CAMERA")
    pub name: String,
    /// Whether the platform classifies this permission as dangerous
    pub is_dangerous: bool,
}

impl Permission {
    pub fn new(name: impl Into<String>, is_dangerous: bool) -> Self {
        Self {
            name: name.into(),
            is_dangerous,
        }
    }
}

/// Signing certificate details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub issuer: String,
    pub subject: String,
    /// Start of the validity window, as reported by the engine
    pub valid_from: String,
    /// End of the validity window, as reported by the engine
    pub valid_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint_sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint_sha256: Option<String>,
}

impl SignatureInfo {
    /// Parse the end of the validity window.
    ///
    /// The engine emits RFC 2822 dates; RFC 3339 is accepted as well.
    pub fn valid_to_utc(&self) -> Option<DateTime<Utc>> {
        parse_engine_date(&self.valid_to)
    }

    /// Whether the certificate had expired at `now`. Unparseable dates count as not expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_to_utc().map(|end| end < now).unwrap_or(false)
    }
}

/// Parse a date string in one of the formats the engine emits
pub fn parse_engine_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|d| d.with_timezone(&Utc))
        .ok()
}

/// Permission totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionStats {
    pub total: usize,
    pub dangerous: usize,
}

/// File metadata computed by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
    pub file_size: u64,
    pub file_type: String,
    pub entry_count: u32,
}

/// Raw payload returned by the engine for `analyze_package`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineReport {
    pub package_name: String,
    pub version_name: String,
    pub version_code: String,
    pub min_sdk: String,
    pub target_sdk: String,
    #[serde(default)]
    pub permissions: Option<Vec<Permission>>,
    #[serde(default)]
    pub signature_info: Option<SignatureInfo>,
    #[serde(default)]
    pub file_info: Option<FileInfo>,
    #[serde(default)]
    pub main_activity: Option<String>,
    #[serde(default)]
    pub icon_base64: Option<String>,
}

/// Identity used for history deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageIdentity {
    pub package_name: String,
    pub version_name: String,
}

impl std::fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.package_name, self.version_name)
    }
}

/// Structured result of analyzing one package.
///
/// Produced once by a gateway and never mutated afterwards; a new analysis
/// replaces the value instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub package_name: String,
    pub version_name: String,
    pub version_code: String,
    pub min_sdk: String,
    pub target_sdk: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_info: Option<SignatureInfo>,
    /// Exactly the dangerous subset of `permissions`, in the same order
    #[serde(default)]
    pub dangerous_permissions: Vec<Permission>,
    #[serde(default)]
    pub permission_stats: PermissionStats,
    #[serde(default)]
    pub is_certificate_expired: bool,
    #[serde(default)]
    pub formatted_version_info: String,
    #[serde(default)]
    pub formatted_sdk_info: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_info: Option<FileInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_activity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_base64: Option<String>,
}

impl AnalysisResult {
    /// Build a result from an engine report, deriving every summary field
    pub fn from_report(report: EngineReport, now: DateTime<Utc>) -> Self {
        let permissions = report.permissions.unwrap_or_default();

        let dangerous_permissions: Vec<Permission> = permissions
            .iter()
            .filter(|p| p.is_dangerous)
            .cloned()
            .collect();

        let permission_stats = PermissionStats {
            total: permissions.len(),
            dangerous: dangerous_permissions.len(),
        };

        let is_certificate_expired = report
            .signature_info
            .as_ref()
            .map(|sig| sig.is_expired_at(now))
            .unwrap_or(false);

        let formatted_version_info =
            format!("{} ({})", report.version_name, report.version_code);
        let formatted_sdk_info = format!(
            "Min SDK: {}, Target SDK: {}",
            report.min_sdk, report.target_sdk
        );

        Self {
            package_name: report.package_name,
            version_name: report.version_name,
            version_code: report.version_code,
            min_sdk: report.min_sdk,
            target_sdk: report.target_sdk,
            permissions,
            signature_info: report.signature_info,
            dangerous_permissions,
            permission_stats,
            is_certificate_expired,
            formatted_version_info,
            formatted_sdk_info,
            file_info: report.file_info,
            main_activity: report.main_activity,
            icon_base64: report.icon_base64,
        }
    }

    /// Deduplication key for history
    pub fn identity(&self) -> PackageIdentity {
        PackageIdentity {
            package_name: self.package_name.clone(),
            version_name: self.version_name.clone(),
        }
    }

    /// Check that the derived permission fields agree with `permissions`
    pub fn is_consistent(&self) -> bool {
        let expected: Vec<&Permission> =
            self.permissions.iter().filter(|p| p.is_dangerous).collect();
        let subset_matches = expected.len() == self.dangerous_permissions.len()
            && expected
                .iter()
                .zip(&self.dangerous_permissions)
                .all(|(want, have)| *want == have);

        subset_matches
            && self.permission_stats.total == self.permissions.len()
            && self.permission_stats.dangerous == self.dangerous_permissions.len()
    }

    /// Permissions without the dangerous flag
    pub fn normal_permissions(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter().filter(|p| !p.is_dangerous)
    }
}

/// Where an analyzed package came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOrigin {
    pub file_name: String,
    /// Empty when the package was supplied as raw bytes
    pub file_path: String,
    pub file_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_base64: Option<String>,
}

impl FileOrigin {
    /// Placeholder origin for a result that has none recorded
    pub fn synthesized(result: &AnalysisResult) -> Self {
        Self {
            file_name: format!("{}-{}.apk", result.package_name, result.version_name),
            file_path: String::new(),
            file_size: 0,
            icon_base64: result.icon_base64.clone(),
        }
    }

    /// Copy of this origin with the icon filled from `result` when missing
    pub fn with_icon_from(mut self, result: &AnalysisResult) -> Self {
        if self.icon_base64.is_none() {
            self.icon_base64 = result.icon_base64.clone();
        }
        self
    }
}

/// Package reference handed to the analyzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisInput {
    /// A package on the local filesystem
    Path(PathBuf),
    /// Raw package bytes with a display name
    Bytes { name: String, data: Vec<u8> },
}

impl AnalysisInput {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        AnalysisInput::Path(path.into())
    }

    pub fn bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        AnalysisInput::Bytes {
            name: name.into(),
            data,
        }
    }

    /// Human-readable name of the input
    pub fn display_name(&self) -> String {
        match self {
            AnalysisInput::Path(path) => file_name_of(path),
            AnalysisInput::Bytes { name, .. } => name.clone(),
        }
    }

    /// File origin for this input. Filesystem metadata is read best-effort.
    pub fn origin(&self) -> FileOrigin {
        match self {
            AnalysisInput::Path(path) => FileOrigin {
                file_name: file_name_of(path),
                file_path: path.display().to_string(),
                file_size: std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
                icon_base64: None,
            },
            AnalysisInput::Bytes { name, data } => FileOrigin {
                file_name: name.clone(),
                file_path: String::new(),
                file_size: data.len() as u64,
                icon_base64: None,
            },
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// One past analysis kept in the history ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Generated identifier, unique per entry. Not used for deduplication.
    pub id: String,
    pub result: AnalysisResult,
    pub analyzed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<FileOrigin>,
}

impl HistoryEntry {
    /// Create an entry with a fresh identifier
    pub fn new(result: AnalysisResult, origin: Option<FileOrigin>, analyzed_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            result,
            analyzed_at,
            origin,
        }
    }

    pub fn identity(&self) -> PackageIdentity {
        self.result.identity()
    }

    /// The recorded origin, or a synthesized one when none was captured
    pub fn origin_or_synthesized(&self) -> FileOrigin {
        match &self.origin {
            Some(origin) => origin.clone(),
            None => FileOrigin::synthesized(&self.result),
        }
    }
}

/// Snapshot of the currently displayed analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastAnalysis {
    pub result: AnalysisResult,
    pub origin: FileOrigin,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Engine report with the given identity and permissions
    pub fn report(package: &str, version: &str, permissions: &[(&str, bool)]) -> EngineReport {
        EngineReport {
            package_name: package.to_string(),
            version_name: version.to_string(),
            version_code: "1".to_string(),
            min_sdk: "21".to_string(),
            target_sdk: "34".to_string(),
            permissions: Some(
                permissions
                    .iter()
                    .map(|(name, dangerous)| Permission::new(*name, *dangerous))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    pub fn result(package: &str, version: &str) -> AnalysisResult {
        AnalysisResult::from_report(
            report(
                package,
                version,
                &[
                    ("android.permission.INTERNET", false),
                    ("android.permission.CAMERA", true),
                ],
            ),
            Utc::now(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_dangerous_subset_and_stats() {
        let result = AnalysisResult::from_report(
            report(
                "com.example",
                "2.1",
                &[
                    ("android.permission.INTERNET", false),
                    ("android.permission.READ_CONTACTS", true),
                    ("android.permission.VIBRATE", false),
                    ("android.permission.RECORD_AUDIO", true),
                ],
            ),
            Utc::now(),
        );

        assert_eq!(result.permission_stats, PermissionStats { total: 4, dangerous: 2 });
        let names: Vec<_> = result.dangerous_permissions.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            ["android.permission.READ_CONTACTS", "android.permission.RECORD_AUDIO"]
        );
        assert!(result.is_consistent());
        assert_eq!(result.normal_permissions().count(), 2);
    }

    #[test]
    fn test_missing_permissions_yield_zero_stats() {
        let mut raw = report("com.example", "1.0", &[]);
        raw.permissions = None;
        let result = AnalysisResult::from_report(raw, Utc::now());

        assert!(result.permissions.is_empty());
        assert_eq!(result.permission_stats, PermissionStats::default());
        assert!(result.is_consistent());
    }

    #[test]
    fn test_inconsistent_stats_detected() {
        let mut result = result("com.example", "1.0");
        result.permission_stats.dangerous = 5;
        assert!(!result.is_consistent());

        let mut result = super::fixtures::result("com.example", "1.0");
        result.dangerous_permissions.clear();
        assert!(!result.is_consistent());
    }

    #[test]
    fn test_formatted_strings() {
        let mut raw = report("com.example", "3.4.5", &[]);
        raw.version_code = "345".to_string();
        let result = AnalysisResult::from_report(raw, Utc::now());

        assert_eq!(result.formatted_version_info, "3.4.5 (345)");
        assert_eq!(result.formatted_sdk_info, "Min SDK: 21, Target SDK: 34");
    }

    #[test]
    fn test_certificate_expiry() {
        let mut raw = report("com.example", "1.0", &[]);
        raw.signature_info = Some(SignatureInfo {
            issuer: "CN=Issuer".to_string(),
            subject: "CN=Subject".to_string(),
            valid_from: "Mon, 01 Jan 2018 00:00:00 +0000".to_string(),
            valid_to: "Fri, 01 Jan 2021 00:00:00 +0000".to_string(),
            fingerprint_sha1: None,
            fingerprint_sha256: None,
        });

        let before = Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2022, 6, 1, 0, 0, 0).unwrap();

        assert!(!AnalysisResult::from_report(raw.clone(), before).is_certificate_expired);
        assert!(AnalysisResult::from_report(raw, after).is_certificate_expired);
    }

    #[test]
    fn test_unparseable_expiry_is_not_expired() {
        let sig = SignatureInfo {
            issuer: String::new(),
            subject: String::new(),
            valid_from: String::new(),
            valid_to: "sometime next year".to_string(),
            fingerprint_sha1: None,
            fingerprint_sha256: None,
        };
        assert!(!sig.is_expired_at(Utc::now()));
        assert!(parse_engine_date("2021-01-01T00:00:00Z").is_some());
    }

    #[test]
    fn test_input_origin() {
        let bytes = AnalysisInput::bytes("upload.apk", vec![0u8; 42]);
        let origin = bytes.origin();
        assert_eq!(origin.file_name, "upload.apk");
        assert_eq!(origin.file_size, 42);
        assert!(origin.file_path.is_empty());

        let path = AnalysisInput::path("/nonexistent/dir/app-release.apk");
        let origin = path.origin();
        assert_eq!(origin.file_name, "app-release.apk");
        assert_eq!(origin.file_size, 0);
        assert_eq!(path.display_name(), "app-release.apk");
    }

    #[test]
    fn test_synthesized_origin() {
        let mut result = result("com.example.app", "1.2");
        result.icon_base64 = Some("aWNvbg==".to_string());
        let entry = HistoryEntry::new(result, None, Utc::now());

        let origin = entry.origin_or_synthesized();
        assert_eq!(origin.file_name, "com.example.app-1.2.apk");
        assert_eq!(origin.file_path, "");
        assert_eq!(origin.file_size, 0);
        assert_eq!(origin.icon_base64.as_deref(), Some("aWNvbg=="));
    }

    #[test]
    fn test_entry_ids_are_unique() {
        let a = HistoryEntry::new(result("com.a", "1.0"), None, Utc::now());
        let b = HistoryEntry::new(result("com.a", "1.0"), None, Utc::now());
        assert_ne!(a.id, b.id);
        assert_eq!(a.identity(), b.identity());
    }
}

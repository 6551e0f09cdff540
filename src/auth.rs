//! Cookie-replay login.
//!
//! The feed requires an authenticated session. Rather than scripting the
//! login form (fragile, challenge-prone), the user exports their session
//! cookies once and the collector replays them. The file is plain JSON: an
//! array of cookie records.

use crate::error::CollectError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One exported browser cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default, rename = "httpOnly", skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    /// Expiry as seconds since the epoch. Session cookies omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
}

/// Load cookies from a JSON export file.
///
/// A missing file is a typed error so the CLI can tell the user to export
/// cookies before the first run.
pub fn load_cookies(path: &Path) -> Result<Vec<Cookie>, CollectError> {
    if !path.exists() {
        return Err(CollectError::MissingCookies(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CollectError::Session(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| CollectError::Session(format!("malformed cookie file {}: {e}", path.display())))
}

/// Write cookies back out (used by the exporter helper and tests).
pub fn save_cookies(path: &Path, cookies: &[Cookie]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(cookies)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_typed() {
        let err = load_cookies(Path::new("/nonexistent/cookies.json")).unwrap_err();
        assert!(matches!(err, CollectError::MissingCookies(_)));
    }

    #[test]
    fn test_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cookies.json");
        let cookies = vec![
            Cookie {
                name: "auth_token".to_string(),
                value: "abc123".to_string(),
                domain: Some(".twitter.com".to_string()),
                path: Some("/".to_string()),
                secure: Some(true),
                http_only: Some(true),
                expires: Some(1_900_000_000.0),
            },
            Cookie {
                name: "ct0".to_string(),
                value: "deadbeef".to_string(),
                domain: None,
                path: None,
                secure: None,
                http_only: None,
                expires: None,
            },
        ];
        save_cookies(&path, &cookies).unwrap();

        let loaded = load_cookies(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "auth_token");
        assert_eq!(loaded[0].domain.as_deref(), Some(".twitter.com"));
        assert!(loaded[1].expires.is_none());
    }

    #[test]
    fn test_malformed_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cookies.json");
        std::fs::write(&path, "not json").unwrap();
        let err = load_cookies(&path).unwrap_err();
        assert!(matches!(err, CollectError::Session(_)));
    }
}

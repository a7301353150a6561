//! Persisted proxy settings (port and routes).
//!
//! The document is `{port, routes:[{id,pathPrefix,targetBaseUrl,enabled}]}`,
//! read once at startup and rewritten in full after every mutation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::routing::Route;

/// Error type for settings persistence.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk settings document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxySettings {
    #[serde(
        default,
        deserialize_with = "lenient_port",
        skip_serializing_if = "Option::is_none"
    )]
    pub port: Option<u16>,

    #[serde(default)]
    pub routes: Vec<Route>,
}

/// A port that is missing, zero, non-numeric or out of range reads as unset,
/// so the persisted routes still load.
fn lenient_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let port = raw
        .as_ref()
        .and_then(serde_json::Value::as_i64)
        .and_then(|p| u16::try_from(p).ok())
        .filter(|p| *p != 0);
    if port.is_none() {
        if let Some(value) = raw.filter(|v| !v.is_null()) {
            tracing::warn!(port = %value, "Ignoring invalid persisted port");
        }
    }
    Ok(port)
}

/// Reads and writes the settings document at a fixed path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document. A missing file yields empty settings.
    pub fn read(&self) -> Result<ProxySettings, SettingsError> {
        if !self.path.exists() {
            return Ok(ProxySettings::default());
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Read the document, logging and falling back to empty settings on error.
    pub fn load(&self) -> ProxySettings {
        match self.read() {
            Ok(settings) => {
                tracing::info!(
                    path = ?self.path,
                    routes = settings.routes.len(),
                    "Loaded proxy settings"
                );
                settings
            }
            Err(e) => {
                tracing::error!(path = ?self.path, error = %e, "Error loading proxy settings");
                ProxySettings::default()
            }
        }
    }

    /// Rewrite the whole document.
    pub fn save(&self, settings: &ProxySettings) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)?;
        tracing::debug!(path = ?self.path, routes = settings.routes.len(), "Saved proxy settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("proxy-config.json"));
        assert_eq!(store.load(), ProxySettings::default());
    }

    #[test]
    fn test_save_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("proxy-config.json"));
        let settings = ProxySettings {
            port: Some(9001),
            routes: vec![Route::new("abc", "/svc", "http://localhost:9000").unwrap()],
        };

        store.save(&settings).unwrap();
        assert_eq!(store.read().unwrap(), settings);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["port"], 9001);
        assert_eq!(raw["routes"][0]["pathPrefix"], "/svc");
        assert_eq!(raw["routes"][0]["targetBaseUrl"], "http://localhost:9000");
    }

    #[test]
    fn test_external_document_without_enabled_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxy-config.json");
        fs::write(
            &path,
            r#"{"routes":[{"id":"r1","pathPrefix":"/a","targetBaseUrl":"http://h"}]}"#,
        )
        .unwrap();

        let settings = SettingsStore::new(path).read().unwrap();
        assert_eq!(settings.port, None);
        assert!(settings.routes[0].enabled);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxy-config.json");
        fs::write(&path, "{not json").unwrap();

        let store = SettingsStore::new(path);
        assert!(matches!(store.read(), Err(SettingsError::Json(_))));
        assert_eq!(store.load(), ProxySettings::default());
    }

    #[test]
    fn test_out_of_range_port_keeps_routes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxy-config.json");
        let store = SettingsStore::new(&path);

        for port in ["70000", "0", "-1", "\"8080\"", "null"] {
            fs::write(
                &path,
                format!(
                    r#"{{"port":{},"routes":[{{"id":"r1","pathPrefix":"/a","targetBaseUrl":"http://h"}}]}}"#,
                    port
                ),
            )
            .unwrap();

            let settings = store.read().unwrap();
            assert_eq!(settings.port, None, "port {}", port);
            assert_eq!(settings.routes.len(), 1, "port {}", port);
        }
    }
}

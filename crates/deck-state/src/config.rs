use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How many cards share the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DeckLayoutMode {
    /// One card fills the viewport.
    #[default]
    SingleColumn,
    MultiColumn { columns: usize },
}

/// Host configuration of the deck, read from JSON.
///
/// Missing fields take their defaults:
///
/// ```json
/// { "layout": { "mode": "multi_column", "columns": 3 }, "card_spacing": 8.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    pub layout: DeckLayoutMode,
    pub card_spacing: f32,
    pub padding: f32,
    /// Directory holding `deck.json` and `page_stacks/`.
    pub storage_root: PathBuf,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            layout: DeckLayoutMode::SingleColumn,
            card_spacing: 0.0,
            padding: 0.0,
            storage_root: PathBuf::from("deck-data"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl DeckConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`load`](Self::load), but a missing file gives the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: DeckConfig = serde_json::from_str(
            r#"{ "layout": { "mode": "multi_column", "columns": 3 }, "card_spacing": 8.0 }"#,
        )
        .unwrap();
        assert_eq!(config.layout, DeckLayoutMode::MultiColumn { columns: 3 });
        assert_eq!(config.card_spacing, 8.0);
        assert_eq!(config.padding, 0.0);
        assert_eq!(config.storage_root, PathBuf::from("deck-data"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DeckConfig::load_or_default(dir.path().join("deck.config.json")).unwrap();
        assert_eq!(config, DeckConfig::default());
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = DeckConfig::load_or_default(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}

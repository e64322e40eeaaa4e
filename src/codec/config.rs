//! Codec configuration, persisted as TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Which body form JSON documents use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonLayout {
    /// `content` plus `partitions`.
    #[default]
    Partitions,
    /// A `sentences` array with one record per sentence.
    Sentences,
}

/// Options for the XML and JSON encoders. Decoders accept every variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// XML indentation in spaces; 0 writes compact XML.
    #[serde(default)]
    pub indent: usize,
    /// Emit the `<?xml ...?>` declaration.
    #[serde(default = "default_true")]
    pub xml_declaration: bool,
    /// Rewrite `"` in sentence text and tags to `&quot;`.
    #[serde(default = "default_true")]
    pub escape_quotes: bool,
    /// Pretty-print JSON output.
    #[serde(default)]
    pub json_pretty: bool,
    #[serde(default)]
    pub json_layout: JsonLayout,
}

fn default_true() -> bool {
    true
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            indent: 0,
            xml_declaration: default_true(),
            escape_quotes: default_true(),
            json_pretty: false,
            json_layout: JsonLayout::default(),
        }
    }
}

impl CodecConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Parse from TOML text.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}

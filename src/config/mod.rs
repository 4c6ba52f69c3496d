//! Runner configuration.
//!
//! A simple key-value lookup with defaults: built-in values layered under an
//! optional TOML file, recording where each layer came from. Projects may
//! also be declared directly in the file's `[settings]` table, mapping a
//! project name to its settings module.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "scrapyd.toml";

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Provenance of one configuration layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    /// File path, `None` for the built-in defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of the raw file bytes, `None` for the defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Key-value configuration with defaults.
#[derive(Debug, Clone)]
pub struct Config {
    values: toml::Table,
    settings: BTreeMap<String, String>,
    sources: Vec<ConfigSource>,
    created_at: DateTime<Utc>,
}

fn builtin_defaults() -> toml::Table {
    let mut table = toml::Table::new();
    table.insert("eggs_dir".to_string(), toml::Value::String("eggs".to_string()));
    table.insert("logs_dir".to_string(), toml::Value::String("logs".to_string()));
    table.insert("items_dir".to_string(), toml::Value::String("items".to_string()));
    table
}

impl Default for Config {
    fn default() -> Self {
        Self {
            values: builtin_defaults(),
            settings: BTreeMap::new(),
            sources: vec![ConfigSource {
                path: None,
                digest: None,
            }],
            created_at: Utc::now(),
        }
    }
}

impl Config {
    /// Built-in defaults only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path` over the built-in defaults.
    ///
    /// A missing file is not an error; the defaults apply unchanged.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if !path.exists() {
            return Ok(config);
        }

        let bytes = fs::read(path)?;
        let digest = {
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            hex::encode(hasher.finalize())
        };

        let contents = String::from_utf8_lossy(&bytes);
        let table: toml::Table = toml::from_str(&contents)?;
        for (key, value) in table {
            if key == "settings" {
                if let toml::Value::Table(declared) = value {
                    for (project, module) in declared {
                        if let toml::Value::String(module) = module {
                            config.settings.insert(project, module);
                        }
                    }
                }
                continue;
            }
            config.values.insert(key, value);
        }

        config.sources.push(ConfigSource {
            path: Some(path.to_string_lossy().into_owned()),
            digest: Some(digest),
        });
        Ok(config)
    }

    /// String value for `key`, falling back to `default`.
    pub fn get<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.values
            .get(key)
            .and_then(|value| value.as_str())
            .unwrap_or(default)
    }

    /// Projects declared in the `[settings]` table, keyed by project name.
    pub fn settings(&self) -> &BTreeMap<String, String> {
        &self.settings
    }

    /// Contributing layers, defaults first.
    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    /// When this configuration was assembled.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

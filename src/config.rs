use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::paths;

const DEFAULT_CONFIG_JSON: &str = include_str!("../config.default.json");

/// Flat configuration file: translator selection, language pair and one
/// credential block per credentialed service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub translator: String,
    pub source_lang: String,
    pub target_lang: String,
    #[serde(default = "default_max_msgid_length")]
    pub max_msgid_length: usize,
    #[serde(rename = "DeeplTranslator", default)]
    pub deepl: DeeplConfig,
    #[serde(rename = "LibreTranslator", default)]
    pub libre: LibreConfig,
    #[serde(rename = "MyMemoryTranslator", default)]
    pub mymemory: MyMemoryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeeplConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_true")]
    pub use_free_api: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibreConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_true")]
    pub use_free_api: bool,
    #[serde(default)]
    pub custom_url: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MyMemoryConfig {
    #[serde(default)]
    pub email: String,
}

impl Default for DeeplConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            use_free_api: true,
        }
    }
}

impl Default for LibreConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            use_free_api: true,
            custom_url: String::new(),
        }
    }
}

impl Config {
    /// Load the configuration, writing the embedded defaults first when the
    /// file does not exist yet.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(cli_path);
        if !path.exists() {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir).with_context(|| {
                    format!("failed to create config directory: {}", dir.display())
                })?;
            }
            fs::write(&path, DEFAULT_CONFIG_JSON)
                .with_context(|| format!("failed to write config: {}", path.display()))?;
            info!(
                "configuration file not found, created defaults at {}",
                path.display()
            );
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;
        info!("using translator: {}", config.translator);
        Ok(config)
    }
}

fn resolve_config_path(cli_path: Option<&Path>) -> PathBuf {
    match cli_path {
        Some(path) => path.to_path_buf(),
        None => paths::config_dir().join("config.json"),
    }
}

fn default_max_msgid_length() -> usize {
    300
}

fn default_true() -> bool {
    true
}

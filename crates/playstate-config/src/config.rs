use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Leave unset to be prompted at runtime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// 0 keeps the HTTP client's own default
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_item_types")]
    pub item_types: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BackupConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub played_only: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8096";
pub const DEFAULT_BACKUP_FILE: &str = "jellyplaytime.json";

fn default_page_size() -> usize {
    500
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_item_types() -> Vec<String> {
    vec!["Movie".to_string(), "Episode".to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: None,
            page_size: default_page_size(),
            timeout_seconds: default_timeout_seconds(),
            item_types: default_item_types(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Missing file means defaults; a present but broken file is an error
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.page_size == 0 {
            return Err(anyhow::anyhow!("server.page_size must be greater than zero"));
        }
        if self.server.item_types.iter().any(|t| t.trim().is_empty()) {
            return Err(anyhow::anyhow!("server.item_types cannot contain empty entries"));
        }
        if let Some(url) = &self.server.url {
            crate::settings::normalize_server_url(url)?;
        }
        Ok(())
    }
}

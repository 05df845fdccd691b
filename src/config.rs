use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub jira: Option<JiraConfig>,
    pub ado: Option<AdoConfig>,
    #[serde(default)]
    pub mappings: MappingConfig,
}

/// Jira Data Center connection. Either a PAT (bearer token) or a
/// username/password pair must be present.
#[derive(Debug, Clone, Deserialize)]
pub struct JiraConfig {
    pub url: String,
    pub pat: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Data Center instances commonly run with self-signed certificates.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdoConfig {
    pub organization: String,
    /// Base URL, e.g. "https://dev.azure.com".
    pub base_url: String,
    pub username: String,
    pub pat: String,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// Field vocabulary translation tables. Status entries may be scoped to a
/// work item type with a `"Type/Status"` key; scoped entries win.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MappingConfig {
    #[serde(default)]
    pub issue_types: HashMap<String, String>,
    #[serde(default)]
    pub statuses: HashMap<String, String>,
    #[serde(default)]
    pub link_types: HashMap<String, String>,
}

fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".reqtree")
        .join("config.toml")
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig =
        toml::from_str(&contents).with_context(|| "Failed to parse config.toml")?;
    Ok(config)
}

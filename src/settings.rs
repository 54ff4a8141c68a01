use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_template_path")]
    pub template_path: String,
    #[serde(default = "default_members_file")]
    pub members_file: String,
    /// Optional JSON category table replacing the built-in one.
    #[serde(default)]
    pub registry_file: Option<String>,
}

fn home_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("offertory")
}

fn default_data_dir() -> PathBuf {
    home_root().join("data")
}

fn default_template_path() -> String {
    home_root()
        .join("templates")
        .join("upload_sample.xlsx")
        .to_string_lossy()
        .to_string()
}

fn default_members_file() -> String {
    home_root().join("members.txt").to_string_lossy().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            template_path: default_template_path(),
            members_file: default_members_file(),
            registry_file: None,
        }
    }
}

/// Paths the ledger engine needs. Built once per invocation and passed by
/// reference into every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    pub data_dir: PathBuf,
    pub template_path: PathBuf,
}

impl LedgerConfig {
    pub fn new(data_dir: impl Into<PathBuf>, template_path: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            template_path: template_path.into(),
        }
    }
}

impl Settings {
    /// Apply per-invocation overrides and produce the engine config.
    pub fn ledger_config(&self, data_dir: Option<&str>, template: Option<&str>) -> LedgerConfig {
        let data_dir = data_dir
            .map(shellexpand_path)
            .unwrap_or_else(|| self.data_dir.clone());
        let template = template
            .map(shellexpand_path)
            .unwrap_or_else(|| self.template_path.clone());
        LedgerConfig::new(data_dir, template)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("offertory")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| LedgerError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::path::absolute(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

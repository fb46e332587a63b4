use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub player: PlayerConfig,
}

/// Settings for AI study-aid generation.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EnrichmentConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_model")]
    pub model: String,
    /// Override for proxies or regional endpoints; default endpoint when
    /// unset.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Parameters for the embedded player surface.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlayerConfig {
    #[serde(default)]
    pub autoplay: bool,
    #[serde(default = "default_true")]
    pub controls: bool,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: default_model(),
            base_url: None,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            autoplay: false,
            controls: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

impl Config {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

//! Configuration loading and parsing

use anyhow::{bail, Context, Result};
use seismic_review_core::{Actor, ReviewConfig, Role};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    pub analyst: Option<AnalystConfig>,
    #[serde(default)]
    pub review: ReviewConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("seismic.db")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalystConfig {
    pub name: String,
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl AnalystConfig {
    pub fn to_actor(&self) -> Actor {
        let actor = Actor::analyst(self.name.clone()).with_role(self.role);
        match &self.email {
            Some(email) => actor.with_email(email.clone()),
            None => actor,
        }
    }
}

impl AppConfig {
    /// Reject values that would only fail later, mid-review
    pub fn validate(&self) -> Result<()> {
        if self.database.path.as_os_str().is_empty() {
            bail!("database.path must not be empty");
        }
        if let Some(analyst) = &self.analyst {
            if analyst.name.trim().is_empty() {
                bail!("analyst.name must not be empty");
            }
        }
        Ok(())
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .validate()
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

pub mod animation;
pub mod server;

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use self::{animation::AnimationConfig, server::ServerConfig};

/// Struct to hold the complete configuration of the service.
///
/// Contains fields for:
///
/// - `server`: Listener address and seeding of renders.
/// - `animation`: Curve sweep, frame count and GIF timing.
///
/// Every field has a default, so a partial (or empty) file is valid.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub animation: AnimationConfig,
}

impl Config {
    /// Reads a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML or
    /// holds values that fail [`Config::validate`].
    #[tracing::instrument(level = "info")]
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file '{}'", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Could not parse config file '{}'", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file '{}'", path.display()))?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error if the animation settings cannot be rendered.
    pub fn validate(&self) -> Result<()> {
        self.animation.validate().context("Invalid animation config")
    }

    /// Loads `path` if it exists, otherwise falls back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded.
    #[tracing::instrument(level = "info")]
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.is_file() {
            Self::load(path)
        } else {
            info!("No config found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Writes the configuration as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    #[tracing::instrument(level = "info", skip(self))]
    pub fn save(&self, path: &Path) -> Result<()> {
        info!("Saving config to {}", path.display());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory '{}'", parent.display()))?;
        }
        let toml = toml::to_string(self).context("Failed to serialize config")?;
        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file '{}'", path.display()))?;
        Ok(())
    }
}

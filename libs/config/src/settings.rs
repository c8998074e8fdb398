//! Settings structures and loading

use crate::defaults;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Complete settings tree
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NicheSettings {
    pub cache: CacheSettings,
    pub bus: BusSettings,
    pub logging: LoggingSettings,
    pub store: StoreSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Record Store fetch deadline; expiry counts as a fetch failure
    pub fetch_timeout_ms: u64,
}

impl CacheSettings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: defaults::cache::FETCH_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BusSettings {
    pub topic: String,
    pub broadcast_capacity: usize,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            topic: defaults::bus::TOPIC.to_string(),
            broadcast_capacity: defaults::bus::BROADCAST_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::logging::LEVEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreSettings {
    pub fixture_path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            fixture_path: PathBuf::from(defaults::store::FIXTURE_PATH),
        }
    }
}

impl NicheSettings {
    /// Load settings from files with environment overrides
    ///
    /// A missing base file is not an error; defaults fill every gap.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        Self::load_with_env(base_path, environment, None)
    }

    /// As [`NicheSettings::load`], reading overrides from `env` instead of the
    /// process environment when given
    pub fn load_with_env(
        base_path: Option<&Path>,
        environment: Option<&str>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new(defaults::CONFIG_PATH));

        let mut builder = Config::builder()
            .add_source(
                Config::try_from(&NicheSettings::default())
                    .context("Failed to build default configuration")?,
            )
            .add_source(File::from(base).required(false));

        if let Some(env_name) = environment {
            let env_file = base
                .parent()
                .unwrap_or(Path::new("."))
                .join("environments")
                .join(format!("{}.toml", env_name));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(defaults::ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let settings: NicheSettings = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        debug!(?settings, "Configuration loaded");
        Ok(settings)
    }

    /// Expand `$VAR` / `~` references in path settings
    pub fn expand_env_vars(&mut self) -> Result<()> {
        let raw = self.store.fixture_path.to_string_lossy().to_string();
        let expanded = shellexpand::full(&raw).context("Failed to expand fixture path")?;
        self.store.fixture_path = PathBuf::from(expanded.as_ref());
        Ok(())
    }
}

/// Convenience function to load settings from the default location
pub fn load_settings(environment: Option<&str>) -> Result<NicheSettings> {
    let mut settings = NicheSettings::load(None, environment)?;
    settings.expand_env_vars()?;
    Ok(settings)
}

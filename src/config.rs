//! Layered application configuration.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory, or the file given
//!    with `--config`
//! 3. `DUPLYZER_*` environment variables (`DUPLYZER_WORKERS=16`,
//!    `DUPLYZER_STRATEGY=fixed-pool`, `DUPLYZER_PRETTY_JSON=true`)
//! 4. Command-line flags, applied with [`Config::with_overrides`]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::finder::default_workers;
use crate::duplicates::Strategy;

/// Prefix of the environment variables read by [`Config::load`].
pub const ENV_PREFIX: &str = "DUPLYZER_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gate capacity; 0 picks twice the number of CPUs.
    pub workers: usize,
    /// Traversal strategy.
    pub strategy: Strategy,
    /// Pretty-print JSON reports.
    pub pretty_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: 0,
            strategy: Strategy::Limited,
            pretty_json: false,
        }
    }
}

impl Config {
    /// Load defaults, the config file and the environment.
    ///
    /// With `explicit` set, that file must exist. Otherwise the platform
    /// config file is read if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit file is missing or any source holds
    /// a value of the wrong type.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = match explicit {
            Some(path) => {
                if !path.is_file() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Some(path.to_path_buf())
            }
            None => Self::default_path().ok(),
        };

        let config = Self::figment(file.as_deref())
            .extract()
            .context("Invalid configuration")?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// The provider chain used by [`load`](Self::load), without validation.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Apply command-line flags on top of the loaded layers.
    #[must_use]
    pub fn with_overrides(
        mut self,
        workers: Option<usize>,
        strategy: Option<Strategy>,
        pretty_json: bool,
    ) -> Self {
        if let Some(workers) = workers {
            self.workers = workers;
        }
        if let Some(strategy) = strategy {
            self.strategy = strategy;
        }
        self.pretty_json |= pretty_json;
        self
    }

    /// Gate capacity with 0 resolved to the default.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            default_workers()
        } else {
            self.workers
        }
    }

    /// Write the configuration as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Platform-specific location of `config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "duplyzer")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.workers, 0);
        assert_eq!(config.strategy, Strategy::Limited);
        assert!(!config.pretty_json);
        assert_eq!(config.effective_workers(), num_cpus::get() * 2);
    }

    #[test]
    fn test_overrides_win() {
        let config = Config {
            workers: 4,
            strategy: Strategy::Sequential,
            pretty_json: false,
        }
        .with_overrides(Some(9), Some(Strategy::FixedPool), true);

        assert_eq!(config.effective_workers(), 9);
        assert_eq!(config.strategy, Strategy::FixedPool);
        assert!(config.pretty_json);
    }

    #[test]
    fn test_absent_overrides_keep_loaded_values() {
        let config = Config {
            workers: 4,
            strategy: Strategy::Sequential,
            pretty_json: true,
        }
        .with_overrides(None, None, false);

        assert_eq!(config.workers, 4);
        assert_eq!(config.strategy, Strategy::Sequential);
        assert!(config.pretty_json);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}

//! Configuration service implementation.
//!
//! Loads `YidConfig` from `~/.config/yid/config.toml` (or an explicit path),
//! then applies environment overrides. A missing file yields defaults.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use yid_core::config::YidConfig;
use yid_core::error::{Result, YidError};

use crate::paths::YidPaths;

pub const ENV_RPC_URL: &str = "YID_RPC_URL";
pub const ENV_FACTORY_ADDRESS: &str = "YID_FACTORY_ADDRESS";
pub const ENV_WALLET_URL: &str = "YID_WALLET_URL";

/// Configuration service that loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    /// Explicit config file; `None` means the platform default location.
    path: Option<PathBuf>,
    /// Cached configuration, filled on first access.
    config: Arc<RwLock<Option<YidConfig>>>,
}

impl ConfigService {
    /// Creates a service reading the default config file.
    pub fn new() -> Self {
        Self {
            path: None,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a service reading `path` instead of the default location.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading it if not cached.
    pub fn get_config(&self) -> Result<YidConfig> {
        {
            let read_lock = self
                .config
                .read()
                .map_err(|_| YidError::internal("config cache lock poisoned"))?;
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let path = match &self.path {
            Some(path) => path.clone(),
            None => YidPaths::config_file()?,
        };
        let mut loaded = Self::load_file(&path)?;
        Self::apply_env_overrides(&mut loaded, |key| std::env::var(key).ok());

        let mut write_lock = self
            .config
            .write()
            .map_err(|_| YidError::internal("config cache lock poisoned"))?;
        *write_lock = Some(loaded.clone());

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = None;
        }
    }

    /// Reads a config file; a missing file yields the defaults.
    pub fn load_file(path: &Path) -> Result<YidConfig> {
        if !path.exists() {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            return Ok(YidConfig::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: YidConfig = toml::from_str(&content)?;
        config.timing.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Writes `config` to `path`, creating parent directories.
    pub fn save_file(path: &Path, config: &YidConfig) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlays values found through `lookup` (normally the process environment).
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides<F>(config: &mut YidConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(rpc_url) = lookup(ENV_RPC_URL) {
            config.network.rpc_url = rpc_url;
        }
        if let Some(factory) = lookup(ENV_FACTORY_ADDRESS) {
            config.factory_address = Some(factory);
        }
        if let Some(wallet_url) = lookup(ENV_WALLET_URL) {
            config.wallet_url = Some(wallet_url);
        }
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

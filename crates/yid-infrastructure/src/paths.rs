//! Path management for YID configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/yid/        # Config directory (platform config dir)
//! └── config.toml       # Application configuration
//! ```

use std::path::PathBuf;

use yid_core::error::{Result, YidError};

pub struct YidPaths;

impl YidPaths {
    /// Returns the YID configuration directory.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("yid"))
            .ok_or_else(|| YidError::config("Cannot find home directory"))
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}

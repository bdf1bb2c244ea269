//! Daemon configuration, loaded from `~/.config/oshirase/config.toml`.
//!
//! # Example TOML
//!
//! ```toml
//! image_size = 96
//!
//! [timeouts]
//! low = 3000
//! normal = 6000
//! critical = 0
//!
//! [popup]
//! width = 320
//!
//! [[monitors]]
//! name = "DP-1"
//! width = 2560
//! scale = 1
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::notify::image::IMAGE_SIZE;
use crate::notify::layout::Monitor;
use crate::notify::render::PopupConfig;
use crate::notify::timeout::TimeoutPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Longest side of notification images, in pixels
    pub image_size: u32,
    pub timeouts: TimeoutPolicy,
    pub popup: PopupConfig,
    pub monitors: Vec<Monitor>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_size: IMAGE_SIZE,
            timeouts: TimeoutPolicy::default(),
            popup: PopupConfig::default(),
            monitors: Vec::new(),
        }
    }
}

impl Config {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Parse from TOML string.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load `path`, or the default location when `None`.
    /// A missing default file yields the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let path = default_config_path();
                if path.exists() {
                    Self::load(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Path to the default configuration file.
pub fn default_config_path() -> PathBuf {
    dirs_path().join("config.toml")
}

fn dirs_path() -> PathBuf {
    if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(config).join("oshirase")
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".config/oshirase")
    } else {
        PathBuf::from("/tmp/oshirase")
    }
}

//! Configuration system for the oxidized-cafe frontend

use crate::error::{FrontendError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub launch: LaunchConfig,
    pub logging: LoggingConfig,
}

/// Storage roots and the layout derived from them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Native SD card root
    pub sd_root: String,
    /// SD card root when mounted through the FAT driver
    pub sd_fat_root: String,
    /// USB root when mounted through the FAT driver
    pub usb_fat_root: String,
    /// Roots a relaunch target may live under, checked in order
    pub relaunch_roots: Vec<String>,
    /// Frontend directory name under the SD root
    pub port_dir_name: String,
}

/// A title identity that marks an alternate loader
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TitleLoader {
    pub name: String,
    pub title_id: u64,
}

/// Launch context detection and argument limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Titles that host the homebrew launcher
    pub title_loaders: Vec<TitleLoader>,
    /// Module whose presence indicates the RPX loader environment
    pub loader_module: String,
    /// Longest secondary argument forwarded on relaunch, in bytes
    pub max_arg_len: usize,
    /// Most network-fork arguments accepted back at startup
    pub max_forwarded_args: usize,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Size of the console log line buffer
    pub line_buffer: usize,
}

/// Logging level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive string understood by `EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

pub const HBL_TITLE_ID: u64 = 0x0005_0000_1337_4842;
pub const MII_MAKER_JPN_TITLE_ID: u64 = 0x0005_0010_1004_A000;
pub const MII_MAKER_USA_TITLE_ID: u64 = 0x0005_0010_1004_A100;
pub const MII_MAKER_EUR_TITLE_ID: u64 = 0x0005_0010_1004_A200;

impl Default for StorageConfig {
    fn default() -> Self {
        let sd_root = "fs:/vol/external01/".to_string();
        let sd_fat_root = "sd:/".to_string();

        Self {
            relaunch_roots: vec![sd_root.clone(), sd_fat_root.clone()],
            sd_root,
            sd_fat_root,
            usb_fat_root: "usb:/".to_string(),
            port_dir_name: "retroarch".to_string(),
        }
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        let loader = |name: &str, title_id| TitleLoader {
            name: name.to_string(),
            title_id,
        };

        Self {
            title_loaders: vec![
                loader("Homebrew Launcher", HBL_TITLE_ID),
                loader("Mii Maker (JPN)", MII_MAKER_JPN_TITLE_ID),
                loader("Mii Maker (USA)", MII_MAKER_USA_TITLE_ID),
                loader("Mii Maker (EUR)", MII_MAKER_EUR_TITLE_ID),
            ],
            loader_module: "homebrew_rpx_loader".to_string(),
            max_arg_len: 4096,
            max_forwarded_args: 64,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            line_buffer: 2048,
        }
    }
}

impl Config {
    /// Load configuration from the default location, or create it if missing
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            Self::load_from(&path)
        } else {
            let config = Self::default();
            config.save_to(&path)?;
            Ok(config)
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| FrontendError::Config(e.to_string()))
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| FrontendError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("oxidized-cafe")
            .join("config.toml")
    }
}

// src/config.rs

//! Configuration for the backend and the demo host.
//!
//! Every section falls back to its defaults when missing, so a config file
//! only needs the fields it changes.

use crate::canvas::PixelFormat;
use crate::error::CanvasError;
use anyhow::{Context, Result};
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV_VAR: &str = "FIFO_CANVAS_CONFIG";

/// Global configuration for the binary, loaded on first use.
///
/// Library code takes `&Config` explicitly instead.
pub static CONFIG: Lazy<Config> = Lazy::new(|| match Config::load() {
    Ok(config) => config,
    Err(e) => {
        warn!("Config: {:#}; using defaults", e);
        Config::default()
    }
});

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub pipes: PipeConfig,
    pub timing: TimingConfig,
}

/// Root surface settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    /// 8, 16 or 32.
    pub bits_per_pixel: u32,
    pub antialias: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            width: 400,
            height: 400,
            bits_per_pixel: 32,
            antialias: true,
        }
    }
}

impl DisplayConfig {
    pub fn pixel_format(&self) -> Result<PixelFormat, CanvasError> {
        PixelFormat::from_bits_per_pixel(self.bits_per_pixel)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipeConfig {
    /// Outbound frame stream.
    pub image_fifo: PathBuf,
    /// Inbound control lines.
    pub command_fifo: PathBuf,
}

impl Default for PipeConfig {
    fn default() -> Self {
        PipeConfig {
            image_fifo: PathBuf::from("/tmp/navit.image.fifo"),
            command_fifo: PathBuf::from("/tmp/navit.command.fifo"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// How often the transport thread re-checks for a frame or a reader.
    pub frame_poll_interval_ms: u64,
    /// Host loop tick of the demo binary.
    pub input_poll_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            frame_poll_interval_ms: 5,
            input_poll_interval_ms: 20,
        }
    }
}

impl TimingConfig {
    pub fn frame_poll_interval(&self) -> Duration {
        Duration::from_millis(self.frame_poll_interval_ms.max(1))
    }

    pub fn input_poll_interval(&self) -> Duration {
        Duration::from_millis(self.input_poll_interval_ms)
    }
}

impl Config {
    /// Loads from the file named by `FIFO_CANVAS_CONFIG`, or returns defaults.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        info!("Config: loaded {}", path.display());
        Ok(config)
    }
}

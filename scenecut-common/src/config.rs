//! Configuration loading
//!
//! A small optional TOML file supplies project/event naming and the
//! sequence render profile. A missing file is never fatal: the defaults
//! produce the standard 720p 23.976 profile. An invalid file is an
//! error — silently ignoring a typo'd config is worse than stopping.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};

/// Sequence format profile written into new documents.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FormatProfile {
    pub name: String,
    pub frame_duration: String,
    pub width: u32,
    pub height: u32,
    pub color_space: String,
}

impl Default for FormatProfile {
    fn default() -> Self {
        FormatProfile {
            name: "FFVideoFormat720p2398".to_string(),
            frame_duration: "1001/24000s".to_string(),
            width: 1280,
            height: 720,
            color_space: "1-1-1 (Rec. 709)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Project name for freshly created documents.
    pub project: String,
    /// Event name for freshly created documents.
    pub event: String,
    /// Library bundle location attribute, if any.
    pub library_location: Option<String>,
    pub format: FormatProfile,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            project: "Untitled Project".to_string(),
            event: chrono::Local::now().format("%-m-%-d-%y").to_string(),
            library_location: None,
            format: FormatProfile::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or defaults when `path` is `None`
    /// or the file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Config::default());
        }
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| Error::Config(e.to_string()))
    }
}

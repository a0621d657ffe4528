/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * User configuration.
 */

//! User configuration.
//!
//! Layers, later ones winning:
//!
//! 1. built-in defaults
//! 2. `config.toml` in the platform config directory (`faultline/config.toml`)
//! 3. `FAULTLINE_PYTHON` and `FAULTLINE_STATE_DIR`
//! 4. command-line flags, applied by the binary
//!
//! ```toml
//! python = "/usr/bin/python3.12"
//! color = "never"
//!
//! [search]
//! site = "stackoverflow"
//! tag = "python"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FaultlineError, Result};

pub const PYTHON_ENV: &str = "FAULTLINE_PYTHON";
pub const STATE_DIR_ENV: &str = "FAULTLINE_STATE_DIR";

/// When to colour terminal output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn enabled(self, is_terminal: bool) -> bool {
        match self {
            ColorChoice::Auto => is_terminal,
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

impl fmt::Display for ColorChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColorChoice::Auto => "auto",
            ColorChoice::Always => "always",
            ColorChoice::Never => "never",
        })
    }
}

impl FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            other => Err(format!("invalid color choice '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub site: String,
    pub tag: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.stackexchange.com/2.3/search".to_string(),
            site: "stackoverflow".to_string(),
            tag: "python".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interpreter to run scripts with. Discovered on `PATH` when unset.
    pub python: Option<PathBuf>,
    /// Where the mirror file and replay state live.
    pub state_dir: Option<PathBuf>,
    pub color: ColorChoice,
    pub search: SearchConfig,
}

impl Config {
    /// `<config dir>/faultline/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("faultline").join("config.toml"))
    }

    /// `<state dir>/faultline`, falling back to the local data directory.
    pub fn default_state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("faultline")
    }

    /// Load from the default location and the process environment.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path().as_deref(), |key| {
            std::env::var(key).ok()
        })
    }

    /// Load from `path` (a missing file means defaults), then apply
    /// overrides from `env`.
    pub fn load_from(path: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let text = std::fs::read_to_string(path)?;
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_toml(&text, path)?
            }
            _ => Self::default(),
        };

        if let Some(python) = env(PYTHON_ENV).filter(|v| !v.is_empty()) {
            config.python = Some(PathBuf::from(python));
        }
        if let Some(dir) = env(STATE_DIR_ENV).filter(|v| !v.is_empty()) {
            config.state_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    pub fn from_toml(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|e| FaultlineError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(Self::default_state_dir)
    }
}

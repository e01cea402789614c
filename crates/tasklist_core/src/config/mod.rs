//! User settings from `config.json` in the per-user tasklist directory.
//!
//! The file is optional. It may name another task file and switch on
//! coloured output:
//!
//! ```json
//! { "store_path": "/home/me/notes/tasks.json", "color": true }
//! ```

use crate::error::AppError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKLIST_CONFIG_PATH";
const APP_DIR_NAME: &str = "tasklist";

/// `%APPDATA%\tasklist` on Windows, `~/.config/tasklist` elsewhere.
pub fn app_dir() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join(APP_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
    }
}

pub fn config_path() -> Result<PathBuf, AppError> {
    match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
        _ => Ok(app_dir()?.join(CONFIG_FILE_NAME)),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Task file location; `TASKLIST_STORE_PATH` still wins over this.
    pub store_path: Option<String>,
    pub color: bool,
}

/// A config that could not be read still yields defaults; the reason is
/// kept for the caller to report.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

/// Values given on the command line, applied over the file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub store_path: Option<String>,
    pub color: Option<bool>,
}

impl Config {
    pub fn load() -> ConfigLoad {
        match config_path() {
            Ok(path) => Self::load_from(&path),
            Err(err) => ConfigLoad {
                config: Config::default(),
                error: Some(err),
            },
        }
    }

    pub fn load_from(path: &Path) -> ConfigLoad {
        match Self::read(path) {
            Ok(config) => ConfigLoad {
                config,
                error: None,
            },
            Err(err) => ConfigLoad {
                config: Config::default(),
                error: Some(err),
            },
        }
    }

    fn read(path: &Path) -> Result<Config, AppError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
        let mut config: Config = serde_json::from_str(&content).map_err(|err| {
            AppError::invalid_data(format!("invalid config {}: {}", path.display(), err))
        })?;
        config.store_path = config.store_path.filter(|p| !p.trim().is_empty());
        Ok(config)
    }

    pub fn with_overrides(&self, overrides: &ConfigOverrides) -> Config {
        let store_path = match overrides.store_path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => Some(path.to_string()),
            _ => self.store_path.clone(),
        };

        Config {
            store_path,
            color: overrides.color.unwrap_or(self.color),
        }
    }

    pub fn palette(&self) -> Palette {
        if self.color {
            Palette::COLOR
        } else {
            Palette::PLAIN
        }
    }
}

/// Accepts the usual spellings of a boolean switch.
pub fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

const BOLD_CYAN: &str = "\x1b[1;36m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Terminal styling for rendered output; plain text when colour is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Palette {
    color: bool,
}

impl Palette {
    pub const PLAIN: Palette = Palette { color: false };
    pub const COLOR: Palette = Palette { color: true };

    pub fn heading(&self, text: &str) -> String {
        self.paint(BOLD_CYAN, text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

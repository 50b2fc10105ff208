// src/system/settings.rs

use crate::{
    constants::{DEFAULT_HISTORY_FILE, DEFAULT_MAX_DEPTH},
    core::paths::{self, PathError},
};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Could not read settings file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// User preferences read from `config.toml`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Overrides the root prompt.
    pub prompt: Option<String>,
    /// Overrides the banner printed when the interpreter starts.
    pub intro: Option<String>,
    /// Whether the line editor keeps a history file.
    pub history: bool,
    pub history_file: String,
    pub max_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prompt: None,
            intro: None,
            history: true,
            history_file: DEFAULT_HISTORY_FILE.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Settings {
    /// The history file with `~` and environment variables expanded.
    pub fn history_path(&self) -> PathBuf {
        paths::expand_path(&self.history_file)
    }
}

/// Loads settings from an explicit file, or from the default location.
///
/// An explicit file must exist. The default file is optional: when it is absent the
/// built-in defaults are returned.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, SettingsError> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (paths::get_settings_path()?, false),
    };

    if !required && !path.exists() {
        log::debug!("No settings file at '{}', using defaults.", path.display());
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(&path).map_err(|source| SettingsError::Io {
        path: path.clone(),
        source,
    })?;
    let settings = toml::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.clone(),
        source,
    })?;
    log::debug!("Loaded settings from '{}'.", path.display());
    Ok(settings)
}

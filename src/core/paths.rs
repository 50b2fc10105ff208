// src/core/paths.rs

use crate::constants::{CONFIG_DIR_NAME, SETTINGS_FILENAME};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
}

/// Returns the path to the jcmd configuration directory (`~/.config/jcmd` on Linux).
/// Unlike the history file, nothing is ever written here, so the directory is not created.
pub fn get_config_dir() -> Result<PathBuf, PathError> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME))
        .ok_or(PathError::ConfigDirNotFound)
}

/// Returns the path of the default settings file.
pub fn get_settings_path() -> Result<PathBuf, PathError> {
    get_config_dir().map(|dir| dir.join(SETTINGS_FILENAME))
}

/// Expands `~` and environment variables (`$VAR`, `${VAR}`) in a user-supplied path.
///
/// An unknown variable is not an error: the home directory is still expanded and the
/// variable is left as written, so the path fails later with a readable message.
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(e) => {
            log::debug!("Could not fully expand path '{}': {}", raw, e);
            PathBuf::from(shellexpand::tilde(raw).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_plain_path_is_untouched() {
        assert_eq!(expand_path("conf/sub.json"), PathBuf::from("conf/sub.json"));
    }

    #[test]
    fn test_expand_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/x.json"), home.join("x.json"));
        }
    }

    #[test]
    fn test_expand_unknown_variable_keeps_text() {
        let path = expand_path("$JCMD_SURELY_UNDEFINED_VARIABLE/x.json");
        assert_eq!(
            path,
            PathBuf::from("$JCMD_SURELY_UNDEFINED_VARIABLE/x.json")
        );
    }

    #[test]
    fn test_settings_path_ends_with_file_name() {
        if let Ok(path) = get_settings_path() {
            assert!(path.ends_with("jcmd/config.toml"));
        }
    }
}

//! Locations of plexsearch's configuration and data files.
//!
//! Follows the XDG base directory variables when they are set, then the
//! platform default, then the usual dot directories under `$HOME`.
use std::io;
use std::path::PathBuf;

use crate::config::env_var;

const APP_DIR: &str = "plexsearch";

/// Configuration written on first run.
pub const DEFAULT_CONFIG: &str = include_str!("../data/config.yml");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BaseDir {
    Config,
    Data,
}

impl BaseDir {
    fn env_name(self) -> &'static str {
        match self {
            BaseDir::Config => "XDG_CONFIG_HOME",
            BaseDir::Data => "XDG_DATA_HOME",
        }
    }

    fn platform_default(self) -> Option<PathBuf> {
        match self {
            BaseDir::Config => dirs::config_dir(),
            BaseDir::Data => dirs::data_local_dir(),
        }
    }

    fn home_fallback(self) -> &'static str {
        match self {
            BaseDir::Config => "~/.config",
            BaseDir::Data => "~/.local/share",
        }
    }

    /// The plexsearch directory under this base. An empty variable counts
    /// as unset.
    fn app_dir(self, env: &dyn Fn(&str) -> Option<String>) -> PathBuf {
        env(self.env_name())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(|| self.platform_default())
            .unwrap_or_else(|| PathBuf::from(shellexpand::tilde(self.home_fallback()).into_owned()))
            .join(APP_DIR)
    }
}

pub fn config_dir() -> PathBuf {
    BaseDir::Config.app_dir(&env_var)
}

/// The data directory, created if missing.
pub fn get_data_dir() -> io::Result<PathBuf> {
    let path = BaseDir::Data.app_dir(&env_var);
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(name: &'static str, value: &'static str) -> impl Fn(&str) -> Option<String> {
        move |key| (key == name).then(|| value.to_string())
    }

    #[test]
    fn test_xdg_variable_wins() {
        let env = env_with("XDG_CONFIG_HOME", "/tmp/xdg-config");
        assert_eq!(
            BaseDir::Config.app_dir(&env),
            PathBuf::from("/tmp/xdg-config/plexsearch")
        );

        let env = env_with("XDG_DATA_HOME", "/tmp/xdg-data");
        assert_eq!(
            BaseDir::Data.app_dir(&env),
            PathBuf::from("/tmp/xdg-data/plexsearch")
        );
    }

    #[test]
    fn test_variable_for_other_base_is_ignored() {
        let env = env_with("XDG_DATA_HOME", "/tmp/xdg-data");
        assert_ne!(
            BaseDir::Config.app_dir(&env),
            PathBuf::from("/tmp/xdg-data/plexsearch")
        );
    }

    #[test]
    fn test_empty_variable_falls_back_to_platform_default() {
        let env = env_with("XDG_CONFIG_HOME", "");
        let expected = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(shellexpand::tilde("~/.config").into_owned()))
            .join(APP_DIR);
        assert_eq!(BaseDir::Config.app_dir(&env), expected);
    }

    #[test]
    fn test_default_config_names_models_and_key() {
        assert!(DEFAULT_CONFIG.contains("models:"));
        assert!(DEFAULT_CONFIG.contains("api_key: env:PERPLEXITY_API_KEY"));
    }
}

use std::{
    collections::HashMap,
    fs::{self, File},
    io::Write,
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::paths::{DEFAULT_CONFIG, config_dir};
use crate::provider::perplexity::DEFAULT_BASE_URL;

/// Environment variable holding the API key when none is configured.
pub const API_KEY_ENV: &str = "PERPLEXITY_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("File system error: {0}")]
    IO(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    YAMLError(#[from] serde_yaml::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "API key required via --api-key, the config file or the PERPLEXITY_API_KEY environment variable"
    )]
    MissingApiKey,
}

/// Settings that shape every search request of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub model: String,
    pub stream: bool,
    pub show_citations: bool,
    pub system_prompt: Option<String>,
}

/// Values given on the command line. `None`/`false` defers to the config.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub no_stream: bool,
    pub citations: bool,
    pub log_file: Option<String>,
    pub markdown_file: Option<String>,
}

/// Configuration after applying overrides and the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub api_key: String,
    pub search: SearchSettings,
    pub log_file: Option<PathBuf>,
    pub markdown_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub stream: bool,
    pub citations: bool,
    pub log_file: Option<String>,
    pub markdown_file: Option<String>,
    pub system_prompt: Option<String>,
    pub models: HashMap<String, String>,
}

#[derive(Deserialize, Debug, Default)]
struct RawConfig {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    stream: Option<bool>,
    citations: Option<bool>,
    log_file: Option<String>,
    markdown_file: Option<String>,
    system_prompt: Option<String>,
    #[serde(default)]
    models: HashMap<String, String>,
}

impl RawConfig {
    #[instrument]
    fn to_config(&self) -> Result<Config, ConfigError> {
        let base_url = self
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Config(format!(
                "Invalid base_url '{base_url}', expected an http(s) url"
            )));
        }

        let model = match &self.model {
            Some(m) if m.trim().is_empty() => {
                return Err(ConfigError::Config("Model must not be empty".to_string()));
            }
            Some(m) => m.clone(),
            None => "large".to_string(),
        };

        for (alias, id) in &self.models {
            if id.trim().is_empty() {
                return Err(ConfigError::Config(format!(
                    "Model alias '{alias}' has no identifier"
                )));
            }
        }

        Ok(Config {
            base_url,
            api_key: self.api_key.clone().filter(|k| !k.is_empty()),
            model,
            stream: self.stream.unwrap_or(true),
            citations: self.citations.unwrap_or(false),
            log_file: self.log_file.clone(),
            markdown_file: self.markdown_file.clone(),
            system_prompt: self.system_prompt.clone(),
            models: self.models.clone(),
        })
    }
}

/// Reads `name` from the process environment.
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

impl Config {
    /// Maps a model alias to its identifier. Unknown names are passed through
    /// unchanged; the API rejects invalid models.
    pub fn resolve_model(&self, name: &str) -> String {
        self.models
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Streaming precedence: the `--no-stream` flag, then an environment
    /// override (`OR_APP_NAME=Aider` forces buffered output), then the
    /// config file.
    pub fn resolve_stream(&self, no_stream: bool, env: &dyn Fn(&str) -> Option<String>) -> bool {
        if no_stream {
            return false;
        }
        if env("OR_APP_NAME").as_deref() == Some("Aider") {
            return false;
        }
        self.stream
    }

    /// API key precedence: explicit override, config value (with `env:`
    /// indirection), then `PERPLEXITY_API_KEY`.
    pub fn resolve_api_key(
        &self,
        explicit: Option<&str>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<String, ConfigError> {
        if let Some(key) = explicit.filter(|k| !k.is_empty()) {
            return Ok(key.to_string());
        }

        if let Some(key) = &self.api_key {
            if let Some(var) = key.strip_prefix("env:") {
                let var = var.trim();
                if let Some(value) = env(var).filter(|v| !v.is_empty()) {
                    return Ok(value);
                }
                debug!("Environment variable {var} not set");
            } else {
                return Ok(key.clone());
            }
        }

        env(API_KEY_ENV)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    pub fn resolve(
        &self,
        overrides: &Overrides,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<ResolvedConfig, ConfigError> {
        let model_name = overrides.model.as_deref().unwrap_or(&self.model);
        let search = SearchSettings {
            model: self.resolve_model(model_name),
            stream: self.resolve_stream(overrides.no_stream, env),
            show_citations: overrides.citations || self.citations,
            system_prompt: self.system_prompt.clone(),
        };

        let log_file = overrides
            .log_file
            .as_deref()
            .or(self.log_file.as_deref())
            .map(expand_path);
        let markdown_file = overrides
            .markdown_file
            .as_deref()
            .or(self.markdown_file.as_deref())
            .map(expand_path);

        Ok(ResolvedConfig {
            base_url: self.base_url.clone(),
            api_key: self.resolve_api_key(overrides.api_key.as_deref(), env)?,
            search,
            log_file,
            markdown_file,
        })
    }
}

#[instrument(skip(config_path))]
pub fn create_or_get_config_file(
    config_path: Option<PathBuf>,
) -> Result<(bool, PathBuf), ConfigError> {
    let actual_path = config_path.unwrap_or_else(|| config_dir().join("plexsearch.yml"));

    let parent_dir = actual_path.parent().ok_or_else(|| {
        ConfigError::IO(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Config path has no parent directory",
        ))
    })?;

    if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
        fs::create_dir_all(parent_dir)?;
    }

    if actual_path.exists() {
        Ok((true, actual_path))
    } else {
        File::create(&actual_path)?.write_all(DEFAULT_CONFIG.as_bytes())?;
        Ok((false, actual_path))
    }
}

#[instrument(skip(config_path))]
pub fn get_config(config_path: Option<PathBuf>) -> Result<Config, ConfigError> {
    let (_, config_file) = create_or_get_config_file(config_path)?;
    let content = fs::read_to_string(&config_file)?;
    let raw: RawConfig = serde_yaml::from_str::<Option<RawConfig>>(&content)?.unwrap_or_default();
    raw.to_config()
}

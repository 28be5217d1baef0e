//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! API keys are never stored in the TOML: the `[credentials]` section only
//! names the environment variables and files that hold them.

use common::{Secret, read_secret_file};
use credential_pool::Credential;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Timeout for a single generation attempt
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// Remote model settings
#[derive(Debug, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Where to find API keys, in rotation order
#[derive(Debug, Deserialize)]
pub struct CredentialsConfig {
    /// Environment variables holding one key each
    #[serde(default = "default_credential_env")]
    pub env: Vec<String>,
    /// Files holding one key each, appended after the env entries
    #[serde(default)]
    pub key_files: Vec<PathBuf>,
}

fn default_timeout() -> u64 {
    60
}

fn default_max_connections() -> usize {
    1000
}

fn default_model_id() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_base_url() -> String {
    provider::DEFAULT_BASE_URL.to_string()
}

fn default_credential_env() -> Vec<String> {
    vec!["GEMINI_API_KEY".to_string()]
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            base_url: default_base_url(),
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            env: default_credential_env(),
            key_files: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        if !config.model.base_url.starts_with("http://")
            && !config.model.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                config.model.base_url
            )));
        }

        if config.model.model_id.trim().is_empty() {
            return Err(common::Error::Config("model_id must not be empty".into()));
        }

        if config.server.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if config.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("code-review-service.toml")
    }
}

impl CredentialsConfig {
    /// Assemble the ordered credential list: env entries first, then key files.
    ///
    /// Unset or blank variables and blank files are skipped. An unreadable key
    /// file is an error. The result may be empty; the rotator rejects that.
    pub fn resolve(&self) -> common::Result<Vec<Credential>> {
        let mut credentials = Vec::new();

        for name in &self.env {
            match std::env::var(name) {
                Ok(value) if !value.trim().is_empty() => {
                    credentials.push(Credential::new(
                        name.clone(),
                        Secret::new(value.trim().to_owned()),
                    ));
                }
                _ => debug!(env = name.as_str(), "credential env var unset, skipping"),
            }
        }

        for path in &self.key_files {
            match read_secret_file(path)? {
                Some(key) => credentials.push(Credential::new(path.display().to_string(), key)),
                None => debug!(path = %path.display(), "credential file blank, skipping"),
            }
        }

        Ok(credentials)
    }
}

//! Configuration for the Claimcheck verifier.
//!
//! Uses `figment` for layered configuration: defaults -> optional TOML file
//! -> `CLAIMCHECK_`-prefixed environment variables (`__` separates nesting,
//! e.g. `CLAIMCHECK_BACKEND__MODEL`).

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Default config file looked up in the working directory.
const DEFAULT_CONFIG_FILE: &str = "claimcheck.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
}

/// Configuration for the generative backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Model identifier (e.g. "gemini-2.5-flash").
    pub model: String,
    /// Environment variable name containing the API key.
    pub api_key_env: String,
    /// Optional base URL override for the API endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Request timeout budget in seconds.
    pub timeout_secs: u64,
    /// Sampling temperature. Kept low: fact checking wants stable output.
    pub temperature: f32,
    /// Retry policy for transient failures.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: None,
            timeout_secs: 60,
            temperature: 0.2,
            retry: RetryConfig::default(),
        }
    }
}

/// Retry policy for transient backend errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Backoff before the first retry, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound on any single backoff, in milliseconds.
    pub max_backoff_ms: u64,
    /// Multiplier applied per attempt.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Load configuration, optionally from an explicit file path.
///
/// With `path = None`, `claimcheck.toml` in the working directory is merged
/// if it exists; an explicit path that does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    match path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            figment = figment.merge(Toml::file(path));
        }
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                figment = figment.merge(Toml::file(default_path));
            }
        }
    }

    figment = figment.merge(Env::prefixed("CLAIMCHECK_").split("__"));

    figment.extract().map_err(|e| ConfigError::Invalid {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend.model, "gemini-2.5-flash");
        assert_eq!(config.backend.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.backend.timeout_secs, 60);
        assert!(config.backend.base_url.is_none());
        assert_eq!(config.backend.retry.max_retries, 2);
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claimcheck.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[backend]\nmodel = \"gemini-2.0-flash\"\ntimeout_secs = 30"
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.backend.model, "gemini-2.0-flash");
        assert_eq!(config.backend.timeout_secs, 30);
        // Fields absent from the file keep their defaults.
        assert_eq!(config.backend.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/claimcheck.toml")));
        match result {
            Err(ConfigError::FileNotFound { path }) => {
                assert!(path.ends_with("claimcheck.toml"));
            }
            other => panic!("Expected FileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_env_override() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("CLAIMCHECK_BACKEND__MODEL", "gemini-2.5-pro");
            let config = load_config(None).expect("config should load");
            assert_eq!(config.backend.model, "gemini-2.5-pro");
            Ok(())
        });
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claimcheck.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[backend]\ntimeout_secs = \"not a number\"").unwrap();

        let result = load_config(Some(&path));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}

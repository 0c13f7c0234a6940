use anyhow::Result;
use std::env;
use std::fmt;

use crate::models::Credential;

/// Config holds all run configuration
#[derive(Clone)]
pub struct Config {
    pub username: String,
    password: String,
    pub concurrency: usize,
    pub api_timeout_secs: u64,
    pub tls_insecure: bool,
    pub output_path: String,
    pub output_delimiter: char,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self {
            username: get_env("FW_USERNAME", ""),
            password: get_env("FW_PASSWORD", ""),
            concurrency: get_env("FW_CONCURRENCY", "10").parse().unwrap_or(10),
            api_timeout_secs: get_env("FW_API_TIMEOUT_SECS", "10").parse().unwrap_or(10),
            tls_insecure: parse_bool(&get_env("FW_TLS_INSECURE", "false")),
            output_path: get_env("FW_OUTPUT_PATH", "fw_results.csv"),
            output_delimiter: get_env("FW_OUTPUT_DELIMITER", ",").chars().next().unwrap_or(','),
        }
    }

    /// The run's single credential; both parts must be set
    pub fn credential(&self) -> Result<Credential> {
        if self.username.is_empty() {
            return Err(anyhow::anyhow!("FW_USERNAME (or --username) is not set"));
        }
        if self.password.is_empty() {
            return Err(anyhow::anyhow!("FW_PASSWORD is not set"));
        }
        Ok(Credential::new(&self.username, &self.password))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("concurrency", &self.concurrency)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("tls_insecure", &self.tls_insecure)
            .field("output_path", &self.output_path)
            .field("output_delimiter", &self.output_delimiter)
            .finish()
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(username: &str, password: &str) -> Config {
        Config {
            username: username.to_string(),
            password: password.to_string(),
            concurrency: 10,
            api_timeout_secs: 10,
            tls_insecure: false,
            output_path: "fw_results.csv".to_string(),
            output_delimiter: ',',
        }
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool(" YES "));
        assert!(parse_bool("1"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
        assert!(!parse_bool("nope"));
    }

    #[test]
    fn test_credential_requires_both_parts() {
        assert!(config("", "secret").credential().is_err());
        assert!(config("admin", "").credential().is_err());
        let credential = config("admin", "secret").credential().unwrap();
        assert_eq!(credential.username, "admin");
        assert_eq!(credential.secret(), "secret");
    }

    #[test]
    fn test_debug_redacts_password() {
        let shown = format!("{:?}", config("admin", "hunter2"));
        assert!(shown.contains("admin"));
        assert!(!shown.contains("hunter2"));
    }
}

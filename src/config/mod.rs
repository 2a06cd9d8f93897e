//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Directory static assets are served from
    pub asset_root: PathBuf,
    /// Allowed client origins for CORS, empty disables the CORS layer
    pub client_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        };

        let client_origins = lookup("CLIENT_ORIGIN")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            asset_root: lookup("ASSET_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            client_origins,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_bind_port_3000() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.asset_root, PathBuf::from("."));
        assert!(config.client_origins.is_empty());
    }

    #[test]
    fn port_overrides_server_addr() {
        let config = config_from(&[("PORT", "8081"), ("SERVER_ADDR", "127.0.0.1:9000")]).unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:8081".parse().unwrap());
    }

    #[test]
    fn splits_client_origins() {
        let config = config_from(&[(
            "CLIENT_ORIGIN",
            "http://localhost:3000, https://tanks.example.com,",
        )])
        .unwrap();
        assert_eq!(
            config.client_origins,
            vec!["http://localhost:3000", "https://tanks.example.com"]
        );
    }

    #[test]
    fn rejects_bad_addresses() {
        assert!(matches!(
            config_from(&[("SERVER_ADDR", "not-an-address")]),
            Err(ConfigError::InvalidAddress)
        ));
        assert!(matches!(
            config_from(&[("PORT", "tanks")]),
            Err(ConfigError::InvalidAddress)
        ));
    }
}

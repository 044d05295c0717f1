use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use log::info;
use thiserror::Error;

/// `PLATFORM` value under which destructive admin endpoints are allowed.
pub const DEV_PLATFORM: &str = "dev";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid bind address {value}: {reason}")]
    InvalidBindAddr { value: String, reason: String },
    #[error("Invalid worker count {value}: {reason}")]
    InvalidWorkers { value: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Scylla contact points; `None` selects the in-memory store.
    pub db_nodes: Option<Vec<String>>,
    pub platform: String,
    pub bind_addr: SocketAddr,
    pub assets_dir: PathBuf,
    pub metrics_template: PathBuf,
    pub workers: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_nodes = lookup("DB_URL").and_then(|raw| {
            let nodes: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|node| !node.is_empty())
                .map(str::to_string)
                .collect();
            (!nodes.is_empty()).then_some(nodes)
        });

        let platform = lookup("PLATFORM").unwrap_or_default();

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidBindAddr {
                value: bind_raw.clone(),
                reason: e.to_string(),
            })?;

        let workers = match lookup("WORKERS") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) => {
                    return Err(ConfigError::InvalidWorkers {
                        value: raw,
                        reason: "must be at least 1".to_string(),
                    })
                }
                Ok(n) => n,
                Err(e) => {
                    return Err(ConfigError::InvalidWorkers {
                        value: raw,
                        reason: e.to_string(),
                    })
                }
            },
            None => num_cpus::get(),
        };

        let assets_dir = PathBuf::from(lookup("ASSETS_DIR").unwrap_or_else(|| "./app".to_string()));
        let metrics_template = PathBuf::from(
            lookup("METRICS_TEMPLATE").unwrap_or_else(|| "admin/metrics.html".to_string()),
        );

        info!(
            "Configuration loaded: platform={:?}, bind={}, workers={}, store={}",
            platform,
            bind_addr,
            workers,
            if db_nodes.is_some() { "scylla" } else { "memory" }
        );

        Ok(Config {
            db_nodes,
            platform,
            bind_addr,
            assets_dir,
            metrics_template,
            workers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).expect("config");
        assert!(config.db_nodes.is_none());
        assert_eq!(config.bind_addr, "127.0.0.1:8080".parse().expect("addr"));
        assert_eq!(config.assets_dir, PathBuf::from("./app"));
        assert_eq!(config.metrics_template, PathBuf::from("admin/metrics.html"));
        assert!(config.workers >= 1);
        assert!(config.platform.is_empty());
    }

    #[test]
    fn parses_node_list_and_platform() {
        let config = Config::from_lookup(lookup_from(&[
            ("DB_URL", "10.0.0.1:9042, 10.0.0.2:9042,"),
            ("PLATFORM", "dev"),
            ("WORKERS", "3"),
        ]))
        .expect("config");
        assert_eq!(
            config.db_nodes,
            Some(vec!["10.0.0.1:9042".to_string(), "10.0.0.2:9042".to_string()])
        );
        assert_eq!(config.platform, DEV_PLATFORM);
        assert_eq!(config.workers, 3);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("BIND_ADDR", "nowhere")])),
            Err(ConfigError::InvalidBindAddr { .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("WORKERS", "0")])),
            Err(ConfigError::InvalidWorkers { .. })
        ));
    }
}

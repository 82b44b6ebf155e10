//! Runtime settings for the hub and the server binary.

use bon::Builder;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.meteo.example/v1";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

/// Settings for [`crate::MeteoHub`].
///
/// # Examples
///
/// ```
/// use meteohub::HubConfig;
/// use std::time::Duration;
///
/// let config = HubConfig::builder()
///     .upstream_url("http://localhost:9000")
///     .cache_ttl(Duration::from_secs(5))
///     .build();
/// assert_eq!(config.max_concurrent_upstream, 4);
/// assert_eq!(config.request_timeout, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, Builder)]
pub struct HubConfig {
    /// Provider base URL, without trailing slash.
    #[builder(into, default = DEFAULT_UPSTREAM_URL.to_string())]
    pub upstream_url: String,
    #[builder(default = Duration::from_secs(10))]
    pub request_timeout: Duration,
    /// Zero disables reuse of completed fetches.
    #[builder(default = Duration::from_secs(60))]
    pub cache_ttl: Duration,
    /// Process-wide cap on simultaneous provider requests.
    #[builder(default = 4)]
    pub max_concurrent_upstream: usize,
    /// Chunk requests one historical window may have in flight.
    #[builder(default = 4)]
    pub max_parallel_chunks: usize,
    /// Station list to load instead of the embedded one.
    pub stations_file: Option<PathBuf>,
    #[builder(into, default = DEFAULT_BIND_ADDRESS.to_string())]
    pub bind_address: String,
    #[builder(into, default = concat!("meteohub/", env!("CARGO_PKG_VERSION")).to_string())]
    pub user_agent: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl HubConfig {
    /// Reads overrides from `METEOHUB_*` environment variables on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = lookup("METEOHUB_UPSTREAM_URL") {
            config.upstream_url = url;
        }
        if let Some(bind) = lookup("METEOHUB_BIND") {
            config.bind_address = bind;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "METEOHUB_CACHE_TTL_SECS")? {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(max) = parse_var::<usize>(&lookup, "METEOHUB_MAX_UPSTREAM")? {
            if max == 0 {
                return Err(ConfigError::InvalidValue {
                    name: "METEOHUB_MAX_UPSTREAM",
                    value: max.to_string(),
                });
            }
            config.max_concurrent_upstream = max;
        }
        if let Some(path) = lookup("METEOHUB_STATIONS") {
            config.stations_file = Some(PathBuf::from(path));
        }
        Ok(config)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = HubConfig::default();
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.max_parallel_chunks, 4);
        assert!(config.stations_file.is_none());
        assert!(config.user_agent.starts_with("meteohub/"));
    }

    #[test]
    fn test_env_overrides() {
        let config = HubConfig::from_lookup(lookup(&[
            ("METEOHUB_UPSTREAM_URL", "http://provider"),
            ("METEOHUB_CACHE_TTL_SECS", "0"),
            ("METEOHUB_MAX_UPSTREAM", "8"),
            ("METEOHUB_STATIONS", "/etc/meteohub/stations.json"),
        ]))
        .unwrap();
        assert_eq!(config.upstream_url, "http://provider");
        assert!(config.cache_ttl.is_zero());
        assert_eq!(config.max_concurrent_upstream, 8);
        assert_eq!(
            config.stations_file,
            Some(PathBuf::from("/etc/meteohub/stations.json"))
        );
    }

    #[test]
    fn test_invalid_env_values() {
        let err = HubConfig::from_lookup(lookup(&[("METEOHUB_CACHE_TTL_SECS", "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                name: "METEOHUB_CACHE_TTL_SECS",
                value: "soon".to_string()
            }
        );
        assert!(HubConfig::from_lookup(lookup(&[("METEOHUB_MAX_UPSTREAM", "0")])).is_err());
    }
}

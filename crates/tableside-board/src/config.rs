//! Configuration for the order board.
//!
//! All configuration is loaded from environment variables. The board only
//! needs to know where the broker is, how many tables the restaurant has,
//! and how the connection should behave when it drops.

use std::time::Duration;

use crate::error::BoardError;

/// Broker address used when `MQTT_URL` is not set.
pub const DEFAULT_BROKER_URL: &str = "ws://localhost:8083/mqtt";

/// Number of tables in the reference deployment.
pub const DEFAULT_TABLE_COUNT: u32 = 4;

/// Complete board configuration loaded from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// Broker URL (e.g. `ws://localhost:8083/mqtt`).
    pub broker_url: String,
    /// Number of tables; valid tables are `1..=table_count`.
    pub table_count: u32,
    /// Fixed delay between reconnect attempts.
    pub reconnect_period: Duration,
    /// MQTT keep-alive interval.
    pub keep_alive: Duration,
    /// Prefix of the randomly generated client identifier.
    pub client_prefix: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            broker_url: DEFAULT_BROKER_URL.to_owned(),
            table_count: DEFAULT_TABLE_COUNT,
            reconnect_period: Duration::from_millis(1000),
            keep_alive: Duration::from_secs(30),
            client_prefix: "web-".to_owned(),
        }
    }
}

impl BoardConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `MQTT_URL` -- broker address (default `ws://localhost:8083/mqtt`)
    /// - `TABLE_COUNT` -- number of tables (default 4, must be at least 1)
    /// - `MQTT_RECONNECT_MS` -- reconnect period in milliseconds (default 1000)
    /// - `MQTT_KEEP_ALIVE_SECS` -- keep-alive interval in seconds (default 30)
    /// - `MQTT_CLIENT_PREFIX` -- client id prefix (default `web-`)
    pub fn from_env() -> Result<Self, BoardError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BoardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let broker_url = lookup("MQTT_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.broker_url);

        let table_count: u32 = parse_or(&lookup, "TABLE_COUNT", defaults.table_count)?;
        if table_count == 0 {
            return Err(BoardError::Config(
                "TABLE_COUNT must be at least 1".to_owned(),
            ));
        }

        let reconnect_ms: u64 = parse_or(&lookup, "MQTT_RECONNECT_MS", 1000)?;
        let keep_alive_secs: u64 = parse_or(&lookup, "MQTT_KEEP_ALIVE_SECS", 30)?;

        let client_prefix = lookup("MQTT_CLIENT_PREFIX").unwrap_or(defaults.client_prefix);

        Ok(Self {
            broker_url,
            table_count,
            reconnect_period: Duration::from_millis(reconnect_ms),
            keep_alive: Duration::from_secs(keep_alive_secs),
            client_prefix,
        })
    }

    /// Generate a fresh random client identifier for one session.
    ///
    /// Identifiers are not persisted and not checked for collisions.
    pub fn generate_client_id(&self) -> String {
        format!("{}{:x}", self.client_prefix, rand::random::<u64>())
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, BoardError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e| BoardError::Config(format!("invalid {name}: {e}")))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = BoardConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, BoardConfig::default());
        assert_eq!(config.broker_url, "ws://localhost:8083/mqtt");
        assert_eq!(config.table_count, 4);
        assert_eq!(config.reconnect_period, Duration::from_millis(1000));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = BoardConfig::from_lookup(lookup_from(&[
            ("MQTT_URL", "wss://broker.example.com/mqtt"),
            ("TABLE_COUNT", "8"),
            ("MQTT_RECONNECT_MS", "250"),
            ("MQTT_KEEP_ALIVE_SECS", "10"),
            ("MQTT_CLIENT_PREFIX", "kiosk-"),
        ]))
        .unwrap();
        assert_eq!(config.broker_url, "wss://broker.example.com/mqtt");
        assert_eq!(config.table_count, 8);
        assert_eq!(config.reconnect_period, Duration::from_millis(250));
        assert_eq!(config.keep_alive, Duration::from_secs(10));
        assert!(config.generate_client_id().starts_with("kiosk-"));
    }

    #[test]
    fn blank_broker_url_falls_back_to_default() {
        let config = BoardConfig::from_lookup(lookup_from(&[("MQTT_URL", "  ")])).unwrap();
        assert_eq!(config.broker_url, DEFAULT_BROKER_URL);
    }

    #[test]
    fn rejects_invalid_numbers() {
        let result = BoardConfig::from_lookup(lookup_from(&[("TABLE_COUNT", "four")]));
        assert!(matches!(result, Err(BoardError::Config(_))));

        let result = BoardConfig::from_lookup(lookup_from(&[("MQTT_RECONNECT_MS", "-1")]));
        assert!(matches!(result, Err(BoardError::Config(_))));
    }

    #[test]
    fn rejects_zero_tables() {
        let result = BoardConfig::from_lookup(lookup_from(&[("TABLE_COUNT", "0")]));
        assert!(matches!(result, Err(BoardError::Config(_))));
    }

    #[test]
    fn client_ids_are_random_per_session() {
        let config = BoardConfig::default();
        let a = config.generate_client_id();
        let b = config.generate_client_id();
        assert!(a.starts_with("web-"));
        assert_ne!(a, b);
    }
}

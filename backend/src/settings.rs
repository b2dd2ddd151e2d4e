//! Application settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `ROUTE_LEDGER_*` environment variables, or a
//! configuration file. Settings are loaded once at startup and passed by
//! reference to the pool, broker adapters, dispatcher and HTTP server.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/route_ledger";
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BROKER_TOPIC: &str = "route-commands";
const DEFAULT_CONSUMER_GROUP: &str = "route-ledger";
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_POLL_RETRY_DELAY_MS: u64 = 1_000;
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Configuration shared by the HTTP service and the command processor.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ROUTE_LEDGER")]
pub struct AppSettings {
    /// PostgreSQL connection URL for the route store and command log.
    pub database_url: Option<String>,
    /// Maximum number of pooled store connections.
    pub pool_max_size: Option<u32>,
    /// Seconds to wait for a pooled connection.
    pub connection_timeout_secs: Option<u64>,
    /// Topic carrying write commands.
    pub broker_topic: Option<String>,
    /// Consumer group used by the command processor.
    pub consumer_group: Option<String>,
    /// Milliseconds between polls when the command log is drained.
    pub poll_interval_ms: Option<u64>,
    /// Milliseconds to wait after a failed poll.
    pub poll_retry_delay_ms: Option<u64>,
    /// Socket address the HTTP service binds to.
    pub bind_address: Option<String>,
}

impl AppSettings {
    pub fn database_url(&self) -> &str {
        self.database_url.as_deref().unwrap_or(DEFAULT_DATABASE_URL)
    }

    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(
            self.connection_timeout_secs
                .unwrap_or(DEFAULT_CONNECTION_TIMEOUT_SECS),
        )
    }

    pub fn broker_topic(&self) -> &str {
        self.broker_topic.as_deref().unwrap_or(DEFAULT_BROKER_TOPIC)
    }

    pub fn consumer_group(&self) -> &str {
        self.consumer_group
            .as_deref()
            .unwrap_or(DEFAULT_CONSUMER_GROUP)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    pub fn poll_retry_delay(&self) -> Duration {
        Duration::from_millis(
            self.poll_retry_delay_ms
                .unwrap_or(DEFAULT_POLL_RETRY_DELAY_MS),
        )
    }

    pub fn bind_address(&self) -> &str {
        self.bind_address.as_deref().unwrap_or(DEFAULT_BIND_ADDRESS)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const KEYS: [&str; 8] = [
        "ROUTE_LEDGER_DATABASE_URL",
        "ROUTE_LEDGER_POOL_MAX_SIZE",
        "ROUTE_LEDGER_CONNECTION_TIMEOUT_SECS",
        "ROUTE_LEDGER_BROKER_TOPIC",
        "ROUTE_LEDGER_CONSUMER_GROUP",
        "ROUTE_LEDGER_POLL_INTERVAL_MS",
        "ROUTE_LEDGER_POLL_RETRY_DELAY_MS",
        "ROUTE_LEDGER_BIND_ADDRESS",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("route-ledger")]).expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(KEYS.map(|key| (key, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.database_url(), DEFAULT_DATABASE_URL);
        assert_eq!(settings.pool_max_size(), DEFAULT_POOL_MAX_SIZE);
        assert_eq!(settings.connection_timeout(), Duration::from_secs(30));
        assert_eq!(settings.broker_topic(), "route-commands");
        assert_eq!(settings.consumer_group(), "route-ledger");
        assert_eq!(settings.poll_interval(), Duration::from_millis(500));
        assert_eq!(settings.poll_retry_delay(), Duration::from_secs(1));
        assert_eq!(settings.bind_address(), "0.0.0.0:8080");
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            (
                "ROUTE_LEDGER_DATABASE_URL",
                Some("postgres://db.internal/routes".to_owned()),
            ),
            ("ROUTE_LEDGER_POOL_MAX_SIZE", Some("4".to_owned())),
            ("ROUTE_LEDGER_CONNECTION_TIMEOUT_SECS", Some("5".to_owned())),
            ("ROUTE_LEDGER_BROKER_TOPIC", Some("rides".to_owned())),
            ("ROUTE_LEDGER_CONSUMER_GROUP", Some("ride-writer".to_owned())),
            ("ROUTE_LEDGER_POLL_INTERVAL_MS", Some("50".to_owned())),
            ("ROUTE_LEDGER_POLL_RETRY_DELAY_MS", Some("250".to_owned())),
            ("ROUTE_LEDGER_BIND_ADDRESS", Some("127.0.0.1:9090".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.database_url(), "postgres://db.internal/routes");
        assert_eq!(settings.pool_max_size(), 4);
        assert_eq!(settings.connection_timeout(), Duration::from_secs(5));
        assert_eq!(settings.broker_topic(), "rides");
        assert_eq!(settings.consumer_group(), "ride-writer");
        assert_eq!(settings.poll_interval(), Duration::from_millis(50));
        assert_eq!(settings.poll_retry_delay(), Duration::from_millis(250));
        assert_eq!(settings.bind_address(), "127.0.0.1:9090");
    }
}

//! Server configuration for Falkon.
//!
//! Loads configuration from environment variables with defaults. The two
//! gated settings are kept as raw strings here; [`Capabilities::detect`]
//! decides whether they are usable.
//!
//! [`Capabilities::detect`]: crate::capability::Capabilities::detect

use std::net::SocketAddr;

use tracing::warn;

const DEFAULT_PORT: u16 = 8080;

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Raw auth publishable key, if set.
    pub auth_publishable_key: Option<String>,
    /// Raw data-service URL, if set.
    pub data_url: Option<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "auth_publishable_key",
                &self.auth_publishable_key.as_ref().map(|_| "[set]"),
            )
            .field("data_url", &self.data_url)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT`: port to bind on, binds to `0.0.0.0` (platform convention)
    /// - `FALKON_BIND_ADDR`: full bind address (overrides `PORT`, default: `127.0.0.1:8080`)
    /// - `FALKON_LOG_LEVEL`: log filter (default: `info`)
    /// - `FALKON_AUTH_PUBLISHABLE_KEY`: auth publishable key (optional)
    /// - `FALKON_DATA_URL`: `memory:`, `redb://<path>`, or `rocksdb://<path>` (optional)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default_addr = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT));

        // Priority: FALKON_BIND_ADDR > PORT > default.
        let bind_addr = if let Some(addr) = lookup("FALKON_BIND_ADDR") {
            addr.parse().unwrap_or_else(|e| {
                warn!(value = %addr, error = %e, "invalid FALKON_BIND_ADDR, using default");
                default_addr
            })
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = port.parse().unwrap_or_else(|e| {
                warn!(value = %port, error = %e, "invalid PORT, using default");
                DEFAULT_PORT
            });
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            default_addr
        };

        let log_level = lookup("FALKON_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        Self {
            bind_addr,
            log_level,
            auth_publishable_key: lookup("FALKON_AUTH_PUBLISHABLE_KEY"),
            data_url: lookup("FALKON_DATA_URL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.bind_addr, SocketAddr::from(([127, 0, 0, 1], 8080)));
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.auth_publishable_key.is_none());
        assert!(cfg.data_url.is_none());
    }

    #[test]
    fn port_binds_all_interfaces() {
        let cfg = config(&[("PORT", "3000")]);
        assert_eq!(cfg.bind_addr, SocketAddr::from(([0, 0, 0, 0], 3000)));
    }

    #[test]
    fn bind_addr_wins_over_port() {
        let cfg = config(&[("PORT", "3000"), ("FALKON_BIND_ADDR", "127.0.0.1:9000")]);
        assert_eq!(cfg.bind_addr, SocketAddr::from(([127, 0, 0, 1], 9000)));
    }

    #[test]
    fn unparsable_addresses_fall_back_to_defaults() {
        let cfg = config(&[("FALKON_BIND_ADDR", "localhost")]);
        assert_eq!(cfg.bind_addr, SocketAddr::from(([127, 0, 0, 1], 8080)));

        let cfg = config(&[("PORT", "eighty")]);
        assert_eq!(cfg.bind_addr, SocketAddr::from(([0, 0, 0, 0], 8080)));
    }

    #[test]
    fn gated_settings_are_passed_through_raw() {
        let cfg = config(&[
            ("FALKON_AUTH_PUBLISHABLE_KEY", "pk_test_abc"),
            ("FALKON_DATA_URL", "memory:"),
        ]);
        assert_eq!(cfg.auth_publishable_key.as_deref(), Some("pk_test_abc"));
        assert_eq!(cfg.data_url.as_deref(), Some("memory:"));
        assert!(!format!("{cfg:?}").contains("pk_test_abc"));
    }
}

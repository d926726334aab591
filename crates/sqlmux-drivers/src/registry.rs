//! Registry of the dialect drivers compiled into this build

use sqlmux_core::{Client, ClientConfig, ConnectionParams, DialectDriver, Result, SqlmuxError};
use std::collections::HashMap;
use std::sync::Arc;

/// Drivers keyed by the canonical key of their capability profile
pub struct DriverRegistry {
    drivers: HashMap<&'static str, Arc<dyn DialectDriver>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Create a registry with every driver enabled by crate features
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        #[cfg(feature = "mysql")]
        registry.register(Arc::new(crate::mysql::MySqlDriver::new()));
        #[cfg(feature = "postgres")]
        registry.register(Arc::new(crate::postgres::PostgresDriver::new()));

        registry
    }

    /// Register a driver under its profile key, replacing any previous one
    pub fn register(&mut self, driver: Arc<dyn DialectDriver>) {
        let key = driver.profile().key;
        tracing::info!(dialect = %key, "registering dialect driver");
        self.drivers.insert(key, driver);
    }

    /// Look up a driver by dialect key or alias (`mariadb`, `postgres`, ...)
    pub fn get(&self, dialect: &str) -> Result<Arc<dyn DialectDriver>> {
        let key = sqlmux_core::resolve(dialect)?.key;
        self.drivers.get(key).cloned().ok_or_else(|| {
            tracing::warn!(dialect = %dialect, "dialect has no registered driver");
            SqlmuxError::UnknownDialect(dialect.to_string())
        })
    }

    /// Canonical keys of the registered drivers, sorted
    pub fn list(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.drivers.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    pub fn has(&self, dialect: &str) -> bool {
        self.get(dialect).is_ok()
    }

    /// Build an unconnected client for `dialect`
    pub fn client(&self, dialect: &str, params: ConnectionParams) -> Result<Client> {
        Ok(Client::new(self.get(dialect)?, params))
    }

    /// Build an unconnected client from a parsed configuration
    pub fn client_from_config(&self, config: &ClientConfig) -> Result<Client> {
        self.client(&config.dialect, config.connection.clone())
    }

    /// Build a client and open its connection
    #[tracing::instrument(skip(self, params), fields(host = %params.host))]
    pub async fn connect(&self, dialect: &str, params: ConnectionParams) -> Result<Client> {
        let client = self.client(dialect, params)?;
        client.connect().await?;
        Ok(client)
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_register_both_dialects() {
        let registry = DriverRegistry::default();
        assert_eq!(registry.list(), vec!["mysql", "postgresql"]);
    }

    #[test]
    fn test_aliases_resolve_to_the_canonical_driver() {
        let registry = DriverRegistry::with_defaults();
        assert_eq!(registry.get("MariaDB").unwrap().profile().key, "mysql");
        assert_eq!(registry.get("postgres").unwrap().profile().key, "postgresql");
    }

    #[test]
    fn test_unknown_and_unregistered_dialects() {
        let registry = DriverRegistry::new();
        assert!(matches!(
            registry.get("oracle").err().unwrap(),
            SqlmuxError::UnknownDialect(_)
        ));
        assert!(!registry.has("mysql"));
    }

    #[test]
    fn test_client_from_url_takes_dialect_defaults() {
        let registry = DriverRegistry::with_defaults();
        let config = ClientConfig::from_url("postgres://app@db.local/shop").unwrap();

        let client = registry.client_from_config(&config).unwrap();

        assert_eq!(client.profile().key, "postgresql");
        assert_eq!(client.params().port, Some(5432));
        assert_eq!(client.params().database.as_deref(), Some("shop"));
    }

    #[test]
    fn test_client_from_toml() {
        let registry = DriverRegistry::with_defaults();
        let config = ClientConfig::from_toml_str(indoc! {r#"
            dialect = "mysql"
            host = "127.0.0.1"
            user = "root"
            pool_size = 4
        "#})
        .unwrap();

        let client = registry.client_from_config(&config).unwrap();

        assert_eq!(client.params().port, Some(3306));
        assert_eq!(client.params().effective_pool_size(), 4);
    }

    #[tokio::test]
    async fn test_unconnected_client_reports_state() {
        let registry = DriverRegistry::with_defaults();
        let client = registry
            .client("mysql", ConnectionParams::new("localhost"))
            .unwrap();
        assert!(!client.is_connected().await);
    }
}

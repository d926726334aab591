//! Shared fixtures for the live driver tests.
//!
//! Every test receives a freshly connected [`Client`] for one dialect, or
//! `None` when no server is configured for it. Tests create their own
//! uniquely named tables and drop them when done.

use anyhow::{Context, Result};
use sqlmux_core::{Client, ClientConfig};
use sqlmux_drivers::DriverRegistry;
use std::env;
use std::sync::Once;

static TRACING: Once = Once::new();

/// Dialect under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestDriver {
    /// MySQL or MariaDB
    Mysql,
    /// PostgreSQL
    Postgres,
}

impl TestDriver {
    /// Environment variable holding the connection URL
    pub fn url_var(&self) -> &'static str {
        match self {
            TestDriver::Mysql => "SQLMUX_TEST_MYSQL_URL",
            TestDriver::Postgres => "SQLMUX_TEST_POSTGRES_URL",
        }
    }

    /// Canonical dialect key
    pub fn key(&self) -> &'static str {
        match self {
            TestDriver::Mysql => "mysql",
            TestDriver::Postgres => "postgresql",
        }
    }

    /// Parsed configuration, if a server is configured
    pub fn config(&self) -> Result<Option<ClientConfig>> {
        let Ok(url) = env::var(self.url_var()) else {
            return Ok(None);
        };
        let config = ClientConfig::from_url(&url)
            .with_context(|| format!("invalid {}", self.url_var()))?;
        Ok(Some(config))
    }

    /// Schema that holds the scratch tables
    pub fn schema(&self, client: &Client) -> String {
        match self {
            TestDriver::Mysql => client.params().database.clone().unwrap_or_default(),
            TestDriver::Postgres => "public".to_string(),
        }
    }
}

/// Install a test subscriber once; `RUST_LOG` controls the filter
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Connected client for `driver`, or `None` when the server is not configured
pub async fn test_client(driver: TestDriver) -> Result<Option<Client>> {
    init_tracing();
    let Some(config) = driver.config()? else {
        tracing::info!(var = driver.url_var(), "skipping, no server configured");
        return Ok(None);
    };

    let client = DriverRegistry::with_defaults()
        .client_from_config(&config)
        .context("failed to build client")?;
    client
        .connect()
        .await
        .with_context(|| format!("failed to connect to {}", driver.key()))?;
    Ok(Some(client))
}

/// Unique table name so parallel tests never collide
pub fn scratch_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &id[..8])
}

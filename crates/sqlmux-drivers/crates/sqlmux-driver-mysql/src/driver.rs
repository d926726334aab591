//! MySQL driver implementation

use async_trait::async_trait;
use sqlmux_core::profile::MYSQL;
use sqlmux_core::{
    Adapter, CapabilityProfile, Catalog, ConnectionParams, DdlCompiler, DialectDriver, Result,
};
use std::sync::Arc;

use crate::{MySqlAdapter, MySqlCatalog, MySqlDdl};

/// MySQL database driver
#[derive(Debug)]
pub struct MySqlDriver {
    catalog: MySqlCatalog,
    ddl: MySqlDdl,
}

impl MySqlDriver {
    /// Create a new MySQL driver instance
    pub fn new() -> Self {
        tracing::debug!("MySQL driver initialized");
        Self {
            catalog: MySqlCatalog,
            ddl: MySqlDdl,
        }
    }
}

impl Default for MySqlDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DialectDriver for MySqlDriver {
    fn profile(&self) -> &'static CapabilityProfile {
        &MYSQL
    }

    #[tracing::instrument(skip(self, params), fields(host = %params.host, database = ?params.database))]
    async fn connect(&self, params: &ConnectionParams) -> Result<Arc<dyn Adapter>> {
        let adapter = MySqlAdapter::connect(params).await?;
        Ok(Arc::new(adapter))
    }

    fn catalog(&self) -> &dyn Catalog {
        &self.catalog
    }

    fn ddl(&self) -> &dyn DdlCompiler {
        &self.ddl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_profile() {
        let driver = MySqlDriver::new();
        assert_eq!(driver.profile().key, "mysql");
        assert_eq!(driver.profile().default_port, 3306);
        assert!(!driver.profile().transactional_ddl);
    }

    #[test]
    fn test_ddl_uses_backticks() {
        let driver = MySqlDriver::default();
        assert_eq!(driver.ddl().use_schema("app"), "USE `app`");
    }
}

//! PostgreSQL driver implementation

use async_trait::async_trait;
use sqlmux_core::profile::POSTGRESQL;
use sqlmux_core::{
    Adapter, CapabilityProfile, Catalog, ConnectionParams, DdlCompiler, DialectDriver, Result,
};
use std::sync::Arc;

use crate::{PostgresAdapter, PostgresCatalog, PostgresDdl};

/// PostgreSQL database driver
#[derive(Debug, Default)]
pub struct PostgresDriver {
    catalog: PostgresCatalog,
    ddl: PostgresDdl,
}

impl PostgresDriver {
    pub fn new() -> Self {
        tracing::debug!("PostgreSQL driver initialized");
        Self::default()
    }
}

#[async_trait]
impl DialectDriver for PostgresDriver {
    fn profile(&self) -> &'static CapabilityProfile {
        &POSTGRESQL
    }

    #[tracing::instrument(skip(self, params), fields(host = %params.host, database = ?params.database))]
    async fn connect(&self, params: &ConnectionParams) -> Result<Arc<dyn Adapter>> {
        Ok(Arc::new(PostgresAdapter::connect(params).await?))
    }

    fn catalog(&self) -> &dyn Catalog {
        &self.catalog
    }

    fn ddl(&self) -> &dyn DdlCompiler {
        &self.ddl
    }
}

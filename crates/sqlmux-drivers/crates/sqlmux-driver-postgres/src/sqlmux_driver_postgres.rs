//! PostgreSQL dialect driver

mod catalog;
mod connection;
mod ddl;
mod driver;
mod tls;

pub use catalog::PostgresCatalog;
pub use connection::{PostgresAdapter, PostgresSession};
pub use ddl::PostgresDdl;
pub use driver::PostgresDriver;
pub use tls::{build_tls_connector, pg_ssl_mode};

#[cfg(test)]
mod catalog_tests;
#[cfg(test)]
mod ddl_tests;

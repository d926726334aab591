//! MySQL/MariaDB dialect driver

mod catalog;
mod connection;
mod ddl;
mod driver;
mod tls;

pub use catalog::MySqlCatalog;
pub use connection::{MySqlAdapter, MySqlSession};
pub use ddl::MySqlDdl;
pub use driver::MySqlDriver;
pub use tls::build_ssl_opts;

#[cfg(test)]
mod catalog_tests;
#[cfg(test)]
mod ddl_tests;

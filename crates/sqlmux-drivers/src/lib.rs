//! sqlmux drivers - concrete dialect implementations
//!
//! Re-exports each enabled dialect crate and provides [`DriverRegistry`],
//! which resolves dialect keys (aliases included) to drivers and builds
//! [`Client`]s from configuration.

#[cfg(feature = "mysql")]
pub use sqlmux_driver_mysql as mysql;
#[cfg(feature = "postgres")]
pub use sqlmux_driver_postgres as postgres;

mod registry;

pub use registry::DriverRegistry;

/// Re-export commonly used types from sqlmux-core
pub use sqlmux_core::{
    Client, ClientConfig, ConnectionParams, DialectDriver, ExecuteOptions, ExecuteOutcome,
    QueryBuilder, Result, Row, SqlmuxError, SslMode, Value,
};

//! sqlmux core - dialect-abstracted database client layer
//!
//! This crate holds everything that does not depend on a concrete server:
//!
//! - `CapabilityProfile` - declarative per-dialect defaults and feature flags
//! - `QueryBuilder` - immutable builder rendering SELECT/INSERT/UPDATE/DELETE
//! - `Session`, `Adapter`, `Catalog`, `DdlCompiler`, `DialectDriver` - the
//!   seams a dialect driver implements
//! - `Client` - connection lifecycle, multi-statement execution with field
//!   enrichment, introspection and DDL application
//! - Common types like `Value`, `Row`, `ColumnMeta`, `ResultEnvelope`, etc.

mod client;
mod connection;
pub mod decode;
mod diff;
mod driver;
mod envelope;
mod error;
pub mod executor;
pub mod profile;
mod query;
mod schema;
mod types;

pub use client::Client;
pub use connection::*;
pub use diff::*;
pub use driver::*;
pub use envelope::*;
pub use error::*;
pub use executor::{ExecuteOptions, split_statements};
pub use profile::{CapabilityProfile, Features, LimitSyntax, PROFILE_REGISTRY, Templates, resolve};
pub use query::*;
pub use schema::*;
pub use types::*;

#[cfg(test)]
mod client_tests;
#[cfg(test)]
mod mock;

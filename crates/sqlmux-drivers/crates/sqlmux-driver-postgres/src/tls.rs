//! PostgreSQL TLS support
//!
//! Maps [`SslMode`] onto a `native-tls` connector for tokio-postgres and onto
//! the matching `sslmode` of the connection config.

use native_tls::{Certificate, TlsConnector};
use postgres_native_tls::MakeTlsConnector;
use sqlmux_core::{ConnectionParams, Result, SqlmuxError, SslMode};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// `sslmode` handed to tokio-postgres
pub fn pg_ssl_mode(mode: SslMode) -> tokio_postgres::config::SslMode {
    match mode {
        SslMode::Disable => tokio_postgres::config::SslMode::Disable,
        SslMode::Prefer => tokio_postgres::config::SslMode::Prefer,
        SslMode::Require | SslMode::VerifyCa | SslMode::VerifyFull => {
            tokio_postgres::config::SslMode::Require
        }
    }
}

/// Build the TLS connector for `params`, or `None` when TLS is disabled.
///
/// `prefer` and `require` accept any certificate, `verify-ca` checks the
/// chain but not the host name, `verify-full` checks both.
pub fn build_tls_connector(params: &ConnectionParams) -> Result<Option<MakeTlsConnector>> {
    if params.ssl_mode == SslMode::Disable {
        debug!("TLS disabled");
        return Ok(None);
    }

    info!(mode = ?params.ssl_mode, "building PostgreSQL TLS connector");
    let mut builder = TlsConnector::builder();
    match params.ssl_mode {
        SslMode::Prefer | SslMode::Require => {
            builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }
        SslMode::VerifyCa => {
            builder.danger_accept_invalid_hostnames(true);
        }
        SslMode::VerifyFull | SslMode::Disable => {}
    }

    if let Some(path) = &params.ssl_ca_cert {
        builder.add_root_certificate(load_certificate(path)?);
    }

    let connector = builder
        .build()
        .map_err(|e| SqlmuxError::Configuration(format!("Failed to build TLS connector: {}", e)))?;
    Ok(Some(MakeTlsConnector::new(connector)))
}

fn load_certificate(path: &Path) -> Result<Certificate> {
    let pem = fs::read(path).map_err(|e| {
        SqlmuxError::Configuration(format!(
            "Failed to read CA certificate {}: {}",
            path.display(),
            e
        ))
    })?;
    debug!(path = %path.display(), "loaded CA certificate");
    Certificate::from_pem(&pem).map_err(|e| {
        SqlmuxError::Configuration(format!(
            "Invalid CA certificate {}: {}",
            path.display(),
            e
        ))
    })
}

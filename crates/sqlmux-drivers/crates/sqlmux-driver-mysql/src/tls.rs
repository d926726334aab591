//! TLS options for MySQL connections

use mysql_async::SslOpts;
use sqlmux_core::{ConnectionParams, Result, SqlmuxError, SslMode};
use tracing::debug;

/// Build `SslOpts` for `params`, or `None` when TLS is disabled.
///
/// `prefer` and `require` encrypt without checking the certificate chain,
/// `verify-ca` checks the chain but not the host name, `verify-full` checks
/// both.
pub fn build_ssl_opts(params: &ConnectionParams) -> Result<Option<SslOpts>> {
    let ssl_opts = match params.ssl_mode {
        SslMode::Disable => {
            debug!("TLS disabled");
            return Ok(None);
        }
        SslMode::Prefer | SslMode::Require => SslOpts::default()
            .with_danger_accept_invalid_certs(true)
            .with_danger_skip_domain_validation(true),
        SslMode::VerifyCa => SslOpts::default().with_danger_skip_domain_validation(true),
        SslMode::VerifyFull => SslOpts::default(),
    };

    let ssl_opts = match &params.ssl_ca_cert {
        Some(path) => {
            if !path.exists() {
                return Err(SqlmuxError::Configuration(format!(
                    "CA certificate not found: {}",
                    path.display()
                )));
            }
            debug!(path = %path.display(), "adding CA certificate");
            ssl_opts
                .with_root_certs(vec![path.clone().into()])
                .with_disable_built_in_roots(true)
        }
        None => ssl_opts,
    };

    debug!(mode = ?params.ssl_mode, "MySQL SSL options built");
    Ok(Some(ssl_opts))
}

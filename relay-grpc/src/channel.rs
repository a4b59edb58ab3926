use crate::Error;
use backon::ExponentialBuilder;
use std::path::PathBuf;
use std::time::Duration;
use tonic::transport::Certificate;
use tonic::transport::Channel;
use tonic::transport::ClientTlsConfig;
use tonic::transport::Endpoint;

const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);
const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How to reach one back-end daemon.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Full URL, e.g. `https://localhost:10009`.
    pub url: String,
    /// CA certificate (PEM). Absent means an insecure channel, development
    /// only.
    pub tls_cert_path: Option<PathBuf>,
    /// Per-call deadline.
    pub timeout: Duration,
    /// Bound on encoded and decoded message sizes, both directions.
    pub max_message_bytes: usize,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            tls_cert_path: None,
            timeout: Duration::from_secs(30),
            max_message_bytes: 4 * 1024 * 1024,
        }
    }
}

/// Retry policy for RPC calls: `base * 2^(attempt - 1)` between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub(crate) fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_factor(2.0)
            .with_max_times(self.max_attempts.saturating_sub(1) as usize)
    }
}

/// Build the process-lifetime channel for a daemon.
///
/// The channel connects lazily and reconnects on demand, so a daemon restart
/// does not require restarting the gateway.
pub(crate) fn build_channel(config: &ConnectionConfig) -> Result<Channel, Error> {
    let mut endpoint = Endpoint::from_shared(config.url.clone())
        .map_err(Error::connect)?
        .timeout(config.timeout)
        .connect_timeout(CONNECT_TIMEOUT)
        .http2_keep_alive_interval(KEEPALIVE_INTERVAL)
        .keep_alive_timeout(KEEPALIVE_TIMEOUT)
        .keep_alive_while_idle(true);

    match &config.tls_cert_path {
        Some(path) => {
            let pem = std::fs::read(path)
                .map_err(|e| Error::tls(format!("reading {}: {e}", path.display())))?;
            let tls = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem));
            endpoint = endpoint.tls_config(tls).map_err(Error::connect)?;
        }
        None => {
            tracing::warn!(url = %config.url, "Connecting without TLS (development only)");
        }
    }

    Ok(endpoint.connect_lazy())
}

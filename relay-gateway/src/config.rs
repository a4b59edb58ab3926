use relay_core::Error;
use relay_grpc::CircuitBreakerConfig;
use relay_grpc::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Where to reach one back-end daemon.
#[derive(Debug, Clone)]
pub struct DaemonSettings {
    pub url: String,
    pub tls_cert_path: Option<PathBuf>,
}

/// Runtime configuration, read from the environment.
///
/// Every knob has a default suitable for a local development setup; the env
/// var names match the deployment layout this gateway has always used.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_path: String,

    pub relay_urls: Vec<String>,
    /// Gateway identity key (hex). Generated on startup when absent.
    pub gateway_identity_key: Option<String>,

    pub session_timeout: Duration,
    pub challenge_timeout: Duration,
    pub max_concurrent_sessions: i64,

    pub vtxo_expiration: Duration,
    pub vtxo_min_amount: u64,

    pub fee_sats_per_vbyte: u64,
    pub fee_percentage: f64,

    pub rpc_timeout: Duration,
    pub rpc_max_message_bytes: usize,
    pub breaker: CircuitBreakerConfig,
    pub retry: RetryPolicy,

    pub arkd: DaemonSettings,
    pub tapd: DaemonSettings,
    pub lnd: DaemonSettings,

    pub sweep_interval: Duration,
    pub health_check_interval: Duration,
    pub cache_ttl: Duration,

    pub invoice_expiry_seconds: i64,
    pub payment_timeout_seconds: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: "gateway.db".to_string(),
            relay_urls: vec![
                "wss://relay.damus.io".to_string(),
                "wss://nos.lol".to_string(),
            ],
            gateway_identity_key: None,
            session_timeout: Duration::from_secs(30 * 60),
            challenge_timeout: Duration::from_secs(5 * 60),
            max_concurrent_sessions: 100,
            vtxo_expiration: Duration::from_secs(24 * 60 * 60),
            vtxo_min_amount: 1_000,
            fee_sats_per_vbyte: 10,
            fee_percentage: 0.001,
            rpc_timeout: Duration::from_secs(30),
            rpc_max_message_bytes: 4 * 1024 * 1024,
            breaker: CircuitBreakerConfig::default(),
            retry: RetryPolicy::default(),
            arkd: DaemonSettings {
                url: "http://localhost:10009".to_string(),
                tls_cert_path: None,
            },
            tapd: DaemonSettings {
                url: "http://localhost:10029".to_string(),
                tls_cert_path: None,
            },
            lnd: DaemonSettings {
                url: "http://localhost:10010".to_string(),
                tls_cert_path: None,
            },
            sweep_interval: Duration::from_secs(30),
            health_check_interval: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(300),
            invoice_expiry_seconds: 3600,
            payment_timeout_seconds: 60,
        }
    }
}

impl Settings {
    /// Load settings from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, Error> {
        let defaults = Self::default();

        let relay_urls = match std::env::var("NOSTR_RELAYS") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            Err(_) => defaults.relay_urls,
        };

        Ok(Self {
            database_path: env_or("GATEWAY_DB_PATH", defaults.database_path),
            relay_urls,
            gateway_identity_key: std::env::var("NOSTR_PRIVATE_KEY").ok(),
            session_timeout: Duration::from_secs(
                env_parse("SESSION_TIMEOUT_MINUTES", 30u64)? * 60,
            ),
            challenge_timeout: Duration::from_secs(
                env_parse("CHALLENGE_TIMEOUT_MINUTES", 5u64)? * 60,
            ),
            max_concurrent_sessions: env_parse("MAX_CONCURRENT_SESSIONS", 100i64)?,
            vtxo_expiration: Duration::from_secs(
                env_parse("VTXO_EXPIRATION_HOURS", 24u64)? * 60 * 60,
            ),
            vtxo_min_amount: env_parse("VTXO_MIN_AMOUNT_SATS", 1_000u64)?,
            fee_sats_per_vbyte: env_parse("FEE_SATS_PER_VBYTE", 10u64)?,
            fee_percentage: env_parse("FEE_PERCENTAGE", 0.001f64)?,
            rpc_timeout: Duration::from_secs(env_parse("GRPC_TIMEOUT_SECONDS", 30u64)?),
            rpc_max_message_bytes: env_parse("GRPC_MAX_MESSAGE_LENGTH", 4_194_304usize)?,
            breaker: CircuitBreakerConfig {
                failure_threshold: env_parse("CIRCUIT_BREAKER_THRESHOLD", 5u32)?,
                recovery_timeout: Duration::from_secs(env_parse(
                    "CIRCUIT_BREAKER_TIMEOUT_SECONDS",
                    60u64,
                )?),
            },
            retry: RetryPolicy {
                max_attempts: env_parse("MAX_RETRY_ATTEMPTS", 3u32)?,
                base_delay: Duration::from_secs(env_parse("RETRY_DELAY_SECONDS", 1u64)?),
            },
            arkd: daemon_settings("ARKD", "http://localhost:10009"),
            tapd: daemon_settings("TAPD", "http://localhost:10029"),
            lnd: daemon_settings("LND", "http://localhost:10010"),
            sweep_interval: Duration::from_secs(env_parse("SWEEP_INTERVAL_SECONDS", 30u64)?),
            health_check_interval: Duration::from_secs(env_parse(
                "HEALTH_CHECK_INTERVAL_SECONDS",
                30u64,
            )?),
            cache_ttl: Duration::from_secs(env_parse("CACHE_DEFAULT_TTL", 300u64)?),
            invoice_expiry_seconds: env_parse("INVOICE_EXPIRY_SECONDS", 3600i64)?,
            payment_timeout_seconds: env_parse("PAYMENT_TIMEOUT_SECONDS", 60i64)?,
        })
    }

    pub fn connection_config(&self, daemon: &DaemonSettings) -> relay_grpc::ConnectionConfig {
        relay_grpc::ConnectionConfig {
            url: daemon.url.clone(),
            tls_cert_path: daemon.tls_cert_path.clone(),
            timeout: self.rpc_timeout,
            max_message_bytes: self.rpc_max_message_bytes,
        }
    }

    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_timeout.as_secs() as i64
    }

    /// Challenge TTL, never longer than the session TTL.
    pub fn challenge_ttl_seconds(&self) -> i64 {
        self.challenge_timeout
            .min(self.session_timeout)
            .as_secs() as i64
    }
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn env_parse<T>(name: &str, default: T) -> Result<T, Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::ad_hoc(format!("invalid {name}={raw}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn daemon_settings(prefix: &str, default_url: &str) -> DaemonSettings {
    let url = match (
        std::env::var(format!("{prefix}_URL")),
        std::env::var(format!("{prefix}_HOST")),
        std::env::var(format!("{prefix}_PORT")),
    ) {
        (Ok(url), _, _) => url,
        (_, Ok(host), Ok(port)) => format!("http://{host}:{port}"),
        (_, Ok(host), Err(_)) => format!("http://{host}"),
        _ => default_url.to_string(),
    };

    DaemonSettings {
        url,
        tls_cert_path: std::env::var(format!("{prefix}_TLS_CERT")).ok().map(Into::into),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.session_timeout, Duration::from_secs(1800));
        assert_eq!(settings.challenge_timeout, Duration::from_secs(300));
        assert_eq!(settings.max_concurrent_sessions, 100);
        assert_eq!(settings.breaker.failure_threshold, 5);
        assert_eq!(settings.retry.max_attempts, 3);
        assert_eq!(settings.rpc_max_message_bytes, 4 * 1024 * 1024);
    }

    #[test]
    fn challenge_ttl_is_capped_by_session_ttl() {
        let mut settings = Settings::default();
        settings.challenge_timeout = Duration::from_secs(3600 * 10);
        assert_eq!(
            settings.challenge_ttl_seconds(),
            settings.session_ttl_seconds()
        );
    }
}

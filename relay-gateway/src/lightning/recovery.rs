//! Classification and recovery policy for Lightning failures.
//!
//! Errors fall into classes with their own retry budgets; only recoverable
//! classes are retried, with exponential backoff and jitter. A per-class
//! consecutive-failure breaker stops hammering a systematically failing
//! path.

use rand::Rng;
use relay_core::Error;
use relay_core::ErrorKind;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use std::time::Instant;
use tokio::sync::Mutex;

const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Network,
    Timeout,
    Channel,
    Payment,
    RateLimit,
    InvoiceExpired,
    InsufficientBalance,
    Validation,
    Unknown,
}

impl ErrorClass {
    /// Classify a domain error, falling back to message heuristics for
    /// kinds that do not map one-to-one.
    pub fn classify(e: &Error) -> Self {
        match e.kind() {
            ErrorKind::ServiceTimeout => ErrorClass::Timeout,
            ErrorKind::ServiceUnavailable => ErrorClass::Network,
            ErrorKind::ChannelUnavailable => ErrorClass::Channel,
            ErrorKind::PaymentFailed => ErrorClass::Payment,
            ErrorKind::RateLimited => ErrorClass::RateLimit,
            ErrorKind::InvoiceExpired => ErrorClass::InvoiceExpired,
            ErrorKind::InsufficientBalance => ErrorClass::InsufficientBalance,
            ErrorKind::InvalidIntent | ErrorKind::InvalidInvoice => ErrorClass::Validation,
            _ => {
                let message = e.message().to_lowercase();
                if message.contains("timeout") {
                    ErrorClass::Timeout
                } else if message.contains("network") || message.contains("connection") {
                    ErrorClass::Network
                } else if message.contains("channel") {
                    ErrorClass::Channel
                } else if message.contains("rate limit") {
                    ErrorClass::RateLimit
                } else {
                    ErrorClass::Unknown
                }
            }
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorClass::Network
                | ErrorClass::Timeout
                | ErrorClass::Channel
                | ErrorClass::Payment
                | ErrorClass::RateLimit
        )
    }

    /// Retry budget per class. Network glitches get the most patience,
    /// rate limiting the least.
    pub fn max_retries(&self) -> u32 {
        match self {
            ErrorClass::Network => 5,
            ErrorClass::Timeout | ErrorClass::Channel | ErrorClass::Payment => 3,
            ErrorClass::RateLimit => 1,
            ErrorClass::InvoiceExpired
            | ErrorClass::InsufficientBalance
            | ErrorClass::Validation
            | ErrorClass::Unknown => 0,
        }
    }
}

#[derive(Debug, Default)]
struct ClassState {
    consecutive_failures: u32,
    tripped_until: Option<Instant>,
}

/// Tracks failures per error class and trips a breaker on streaks.
#[derive(Debug)]
pub struct RecoveryTracker {
    trip_threshold: u32,
    trip_hold: Duration,
    classes: Mutex<HashMap<ErrorClass, ClassState>>,
}

impl Default for RecoveryTracker {
    fn default() -> Self {
        Self {
            trip_threshold: 5,
            trip_hold: Duration::from_secs(300),
            classes: Mutex::new(HashMap::new()),
        }
    }
}

impl RecoveryTracker {
    pub fn new(trip_threshold: u32, trip_hold: Duration) -> Self {
        Self {
            trip_threshold,
            trip_hold,
            classes: Mutex::new(HashMap::new()),
        }
    }

    pub async fn is_tripped(&self, class: ErrorClass) -> bool {
        let mut classes = self.classes.lock().await;
        let state = classes.entry(class).or_default();
        match state.tripped_until {
            Some(until) if Instant::now() < until => true,
            Some(_) => {
                state.tripped_until = None;
                state.consecutive_failures = 0;
                false
            }
            None => false,
        }
    }

    /// Record a failure; returns whether the class breaker is (now) tripped.
    async fn record_failure(&self, class: ErrorClass) -> bool {
        let mut classes = self.classes.lock().await;
        let state = classes.entry(class).or_default();

        if let Some(until) = state.tripped_until {
            if Instant::now() >= until {
                state.tripped_until = None;
                state.consecutive_failures = 0;
            }
        }

        state.consecutive_failures += 1;
        if state.tripped_until.is_none() && state.consecutive_failures >= self.trip_threshold {
            state.tripped_until = Some(Instant::now() + self.trip_hold);
            tracing::warn!(
                ?class,
                failures = state.consecutive_failures,
                "Lightning error class breaker tripped"
            );
        }

        state.tripped_until.is_some()
    }

    async fn record_success(&self) {
        let mut classes = self.classes.lock().await;
        for state in classes.values_mut() {
            state.consecutive_failures = 0;
        }
    }

    /// Run an operation under the recovery policy: retry recoverable
    /// classes with backoff and jitter, bail out immediately on terminal
    /// classes or a tripped breaker.
    pub async fn run<T, F, Fut>(&self, op_name: &str, op: F) -> Result<T, Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => {
                    self.record_success().await;
                    return Ok(value);
                }
                Err(e) => {
                    let class = ErrorClass::classify(&e);
                    let tripped = self.record_failure(class).await;

                    if !class.is_recoverable() || tripped || attempt > class.max_retries() {
                        return Err(e);
                    }

                    let delay = backoff_with_jitter(attempt);
                    tracing::warn!(
                        op = op_name,
                        ?class,
                        attempt,
                        "Retrying Lightning operation in {delay:?}: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

fn backoff_with_jitter(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(6);
    let base = Duration::from_secs(1) * 2u32.pow(exponent);
    let capped = base.min(MAX_BACKOFF);
    // Jitter in [0.5, 1.0) of the capped delay.
    let factor = rand::thread_rng().gen_range(0.5..1.0);
    capped.mul_f64(factor)
}

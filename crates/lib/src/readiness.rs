//! Startup wait: poll an upstream until it reports ready.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::config::ReadinessConfig;

/// Fixed-interval retry. `max_attempts: None` retries forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: None,
        }
    }
}

impl From<&ReadinessConfig> for RetryPolicy {
    fn from(c: &ReadinessConfig) -> Self {
        Self {
            interval: Duration::from_secs(c.interval_secs),
            max_attempts: c.max_attempts,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReadinessError {
    #[error("{name} not ready after {attempts} attempt(s): {last}")]
    Exhausted {
        name: String,
        attempts: u32,
        last: String,
    },
}

/// Run `probe` until it succeeds, sleeping `policy.interval` between failures.
/// Returns the number of attempts taken.
pub async fn wait_until_ready<F, Fut, E>(
    name: &str,
    policy: RetryPolicy,
    mut probe: F,
) -> Result<u32, ReadinessError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match probe().await {
            Ok(()) => {
                log::info!("{} is ready after {} attempt(s)", name, attempts);
                return Ok(attempts);
            }
            Err(e) => {
                if policy.max_attempts.is_some_and(|max| attempts >= max) {
                    return Err(ReadinessError::Exhausted {
                        name: name.to_string(),
                        attempts,
                        last: e.to_string(),
                    });
                }
                log::debug!("waiting for {} to be ready: {}", name, e);
            }
        }
        tokio::time::sleep(policy.interval).await;
    }
}

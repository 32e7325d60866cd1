//! Budgeted retry for taxonomy API calls.
//!
//! A repository call gets one time budget, the same one the selector
//! enforces around it. [`RetryPolicy::within`] splits that budget into
//! attempts and backoff sleeps so that every planned attempt can actually
//! run before the caller gives up. Tiny budgets get fewer retries, never
//! attempts shorter than [`MIN_ATTEMPT`].
//!
//! Transport failures (refused connections, per-attempt timeouts) and the
//! transient statuses the service answers with under load (429, 502, 503,
//! 504) are retried. Any other response is returned to the caller as-is.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;

/// Retries after the first attempt when the budget allows them.
const MAX_RETRIES: u32 = 2;

/// First backoff sleep; doubles on each further retry.
const BASE_DELAY: Duration = Duration::from_millis(100);

/// Shortest attempt worth making. Budgets that cannot give every attempt
/// this much plan fewer retries.
const MIN_ATTEMPT: Duration = Duration::from_millis(250);

/// How one repository call spends its time budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    pub(crate) max_retries: u32,
    pub(crate) attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Plan attempts that fit, backoff included, inside `budget`.
    pub(crate) fn within(budget: Duration) -> Self {
        for retries in (1..=MAX_RETRIES).rev() {
            let backoff = total_backoff(retries);
            let Some(remaining) = budget.checked_sub(backoff) else {
                continue;
            };
            let attempt_timeout = remaining / (retries + 1);
            if attempt_timeout >= MIN_ATTEMPT {
                return Self {
                    max_retries: retries,
                    attempt_timeout,
                };
            }
        }
        Self {
            max_retries: 0,
            attempt_timeout: budget,
        }
    }

    /// Sleep before retry number `retry` (1-based).
    fn delay(retry: u32) -> Duration {
        BASE_DELAY * 2u32.pow(retry.saturating_sub(1))
    }
}

fn total_backoff(retries: u32) -> Duration {
    (1..=retries).map(RetryPolicy::delay).sum()
}

/// Whether a status means "try again shortly" rather than a real answer.
pub(crate) fn is_transient(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Send a request under `policy`.
///
/// `send` receives the per-attempt timeout and is called at most
/// `max_retries + 1` times. The last attempt's result is returned whatever
/// it is, so a persistent 503 still reaches the caller as a response.
pub(crate) async fn retry_send<F, Fut>(
    policy: RetryPolicy,
    send: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn(Duration) -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for retry in 1..=policy.max_retries {
        match send(policy.attempt_timeout).await {
            Ok(resp) if !is_transient(resp.status()) => return Ok(resp),
            Ok(resp) => {
                tracing::warn!(
                    retry,
                    max_retries = policy.max_retries,
                    status = resp.status().as_u16(),
                    "taxonomy service busy, retrying"
                );
            }
            Err(e) => {
                tracing::warn!(
                    retry,
                    max_retries = policy.max_retries,
                    error = %e,
                    "taxonomy request failed, retrying"
                );
            }
        }
        tokio::time::sleep(RetryPolicy::delay(retry)).await;
    }
    send(policy.attempt_timeout).await
}

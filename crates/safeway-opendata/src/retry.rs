//! Back-off for transient open-data failures.

use std::future::Future;
use std::time::Duration;

use crate::error::OpenDataError;

const DELAY_CEILING: Duration = Duration::from_secs(30);

/// Doubling delay schedule with ±25 % jitter, capped at 30 s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Backoff {
    max_retries: u32,
    base_ms: u64,
}

impl Backoff {
    pub(crate) fn new(max_retries: u32, base_ms: u64) -> Self {
        Self {
            max_retries,
            base_ms,
        }
    }

    /// Delay before retry `retry` (1-based), without jitter.
    fn nominal(self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(10);
        Duration::from_millis(self.base_ms.saturating_mul(factor)).min(DELAY_CEILING)
    }

    fn jittered(self, retry: u32) -> Duration {
        self.nominal(retry).mul_f64(rand::random_range(0.75..=1.25))
    }
}

/// Timeouts, connect failures, HTTP 5xx and the service's own `ERROR-5xx`
/// result codes. Everything else is answered on the first attempt.
fn is_transient(err: &OpenDataError) -> bool {
    match err {
        OpenDataError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        OpenDataError::ApiError { code, .. } => code.starts_with("ERROR-5"),
        OpenDataError::Truncated { .. }
        | OpenDataError::MissingService { .. }
        | OpenDataError::Deserialize { .. } => false,
    }
}

/// Runs `attempt` until it succeeds, fails permanently, or the retry budget
/// is spent.
pub(crate) async fn with_retries<T, F, Fut>(
    backoff: Backoff,
    mut attempt: F,
) -> Result<T, OpenDataError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, OpenDataError>>,
{
    let mut retry = 0u32;
    loop {
        let err = match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if retry >= backoff.max_retries || !is_transient(&err) {
            return Err(err);
        }
        retry += 1;
        let delay = backoff.jittered(retry);
        tracing::warn!(
            retry,
            of = backoff.max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "open-data request failed; backing off"
        );
        tokio::time::sleep(delay).await;
    }
}

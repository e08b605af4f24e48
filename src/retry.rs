// Bounded retry with optional exponential backoff
//
// Local recovery for recoverable operations. The outcome is a value, not a
// Result: callers that opted into retry handling never see a throw.
use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

/// Terminal outcome of a retried operation
#[derive(Debug, Clone)]
pub enum RetryOutcome<T> {
    Success { data: T },
    Failure { error: AppError },
}

impl<T> RetryOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Success { .. })
    }

    pub fn data(self) -> Option<T> {
        match self {
            RetryOutcome::Success { data } => Some(data),
            RetryOutcome::Failure { .. } => None,
        }
    }

    pub fn error(self) -> Option<AppError> {
        match self {
            RetryOutcome::Success { .. } => None,
            RetryOutcome::Failure { error } => Some(error),
        }
    }
}

/// Run `op` up to `max_retries + 1` times. Before retry attempt `n`
/// (1-based) the delay is `base_delay_ms * 2^(n-1)` with backoff enabled,
/// `base_delay_ms` otherwise. Never re-throws.
pub async fn with_retry<T, F, Fut>(
    mut op: F,
    max_retries: u32,
    base_delay_ms: u64,
    backoff: bool,
) -> RetryOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut last_error: Option<AppError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay_ms = if backoff {
                base_delay_ms.saturating_mul(1u64 << (attempt - 1).min(63))
            } else {
                base_delay_ms
            };
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        match op().await {
            Ok(data) => return RetryOutcome::Success { data },
            Err(mut error) => {
                error.retry_count = attempt;
                tracing::debug!(
                    attempt,
                    max_retries,
                    "retryable operation failed: {}",
                    error.developer_message
                );
                last_error = Some(error);
            }
        }
    }

    let mut error =
        last_error.unwrap_or_else(|| AppError::unexpected("retry loop made no attempts"));
    error.retry_count = max_retries;
    error.max_retries = max_retries;
    RetryOutcome::Failure { error }
}

/// Retry with the configured defaults: `max_retries` attempts beyond the
/// first, `retry_delay_ms` base delay, exponential backoff on.
pub async fn with_default_retry<T, F, Fut>(op: F) -> RetryOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let cfg = crate::config::config();
    with_retry(op, cfg.max_retries, cfg.retry_delay_ms, true).await
}

//! Retry with exponential back-off and jitter for the postcode client.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors (network failures, 5xx). Application-level and
//! deserialization errors are returned immediately — retrying cannot fix
//! them.

use std::future::Future;
use std::time::Duration;

use crate::error::PostcodesError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** network-level failures (timeout, connection reset) and
/// HTTP 5xx responses.
///
/// **Not retriable:** [`PostcodesError::ApiError`] and
/// [`PostcodesError::Deserialize`].
pub(crate) fn is_retriable(err: &PostcodesError) -> bool {
    match err {
        PostcodesError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        PostcodesError::ApiError(_) | PostcodesError::Deserialize { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors, sleeping `backoff_base_ms × 2ⁿ ± 25 %` between
/// attempts, capped at 10 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, PostcodesError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PostcodesError>>,
{
    const MAX_DELAY_MS: u64 = 10_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "postcode lookup transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error() -> PostcodesError {
        PostcodesError::ApiError("boom".to_string())
    }

    #[test]
    fn api_errors_are_not_retriable() {
        assert!(!is_retriable(&api_error()));
    }

    #[test]
    fn deserialize_errors_are_not_retriable() {
        let source = serde_json::from_str::<i64>("x").unwrap_err();
        let err = PostcodesError::Deserialize {
            context: "lookup(SW1A1AA)".to_string(),
            source,
        };
        assert!(!is_retriable(&err));
    }

    #[tokio::test]
    async fn gives_up_after_max_retries_on_nonretriable() {
        let mut calls = 0u32;
        let result: Result<(), _> = retry_with_backoff(3, 1, || {
            calls += 1;
            async { Err(api_error()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 1, "non-retriable errors must not retry");
    }

    #[tokio::test]
    async fn returns_first_success() {
        let mut calls = 0u32;
        let result = retry_with_backoff(3, 1, || {
            calls += 1;
            async { Ok(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 1);
    }
}

//! Retry with exponential back-off and jitter for Admin API calls.
//!
//! Shopify's Admin API leaks a shared call bucket across clients, so 429s
//! are routine and worth retrying. Server-side 5xx and network failures are
//! also transient; 4xx responses and parse failures are not.

use std::future::Future;
use std::time::Duration;

use crate::error::ShopifyError;

/// Returns `true` for errors worth retrying after a back-off delay.
///
/// **Retriable:**
/// - [`ShopifyError::RateLimited`] — 429; the platform asked us to back off.
/// - [`ShopifyError::Http`] — network-level failure (timeout, reset).
/// - [`ShopifyError::UnexpectedStatus`] with a 5xx status.
///
/// **Not retriable:**
/// - [`ShopifyError::NotFound`] and other 4xx — same answer every time.
/// - [`ShopifyError::Deserialize`] — malformed body; retrying won't fix it.
/// - [`ShopifyError::PaginationLimit`] / [`ShopifyError::InvalidShopDomain`] —
///   programmer/config errors.
fn is_retriable(err: &ShopifyError) -> bool {
    match err {
        ShopifyError::RateLimited { .. } | ShopifyError::Http(_) => true,
        ShopifyError::UnexpectedStatus { status, .. } => *status >= 500,
        ShopifyError::Deserialize { .. }
        | ShopifyError::NotFound { .. }
        | ShopifyError::PaginationLimit { .. }
        | ShopifyError::InvalidShopDomain { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors.
///
/// The sleep before the n-th retry is `backoff_base_secs * 2^(n-1)` seconds
/// with ±25% jitter, capped at 60s. A 429 carrying a larger `Retry-After`
/// waits for that instead.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ShopifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ShopifyError>>,
{
    const MAX_DELAY_SECS: u64 = 60;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;

                let computed = backoff_base_secs.saturating_mul(1u64 << (attempt - 1).min(10));
                let server_hint = match &err {
                    ShopifyError::RateLimited { retry_after_secs } => *retry_after_secs,
                    _ => 0,
                };
                let capped = computed.max(server_hint).min(MAX_DELAY_SECS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms =
                    ((capped * 1000) as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient Shopify error — retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

//! Ship-to-country fallback for product fetches.
//!
//! Some catalog items cannot be quoted for every destination: the gateway
//! rejects the call with an availability error for one country while serving
//! the same product for another. The strategy walks an ordered candidate
//! list and classifies each failure through [`AliexpressError::kind`]:
//!
//! - `ProductUnavailable` — advance to the next candidate after a courtesy
//!   delay.
//! - `RateLimited` — retry the same country once after a longer delay, then
//!   advance if it is still throttled.
//! - anything else — abort the whole loop immediately; auth and network
//!   failures will not improve with a different destination.
//!
//! The first success short-circuits and reports which country worked, which
//! downstream code uses to tag EU-sourced variants.

use std::future::Future;
use std::time::Duration;

use crate::error::{AliexpressError, ErrorKind};

/// Delays applied between fallback attempts.
#[derive(Debug, Clone, Copy)]
pub struct FallbackPolicy {
    /// Pause before trying the next candidate after an availability miss.
    pub unavailable_delay: Duration,
    /// Pause before the single same-country retry after a throttle.
    pub rate_limit_delay: Duration,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            unavailable_delay: Duration::from_millis(1500),
            rate_limit_delay: Duration::from_millis(8000),
        }
    }
}

/// Successful fallback outcome: the payload plus the country that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackSuccess<T> {
    pub country: String,
    pub value: T,
}

/// Runs `fetch` against each candidate country in order until one succeeds.
///
/// `fetch` is invoked with one country code per attempt; the same country is
/// retried at most once (only after a rate-limit classification).
///
/// # Errors
///
/// - The original error, unmodified, when a fetch fails with an
///   unclassified/auth/network error (immediate abort).
/// - [`AliexpressError::NotAvailableAnywhere`] when every candidate was
///   exhausted with availability or persistent throttle errors.
pub async fn fetch_with_country_fallback<T, F, Fut>(
    countries: &[String],
    policy: FallbackPolicy,
    mut fetch: F,
) -> Result<FallbackSuccess<T>, AliexpressError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, AliexpressError>>,
{
    for country in countries {
        let mut retried = false;
        loop {
            match fetch(country.clone()).await {
                Ok(value) => {
                    return Ok(FallbackSuccess {
                        country: country.clone(),
                        value,
                    });
                }
                Err(err) => match err.kind() {
                    ErrorKind::ProductUnavailable => {
                        tracing::info!(
                            country = %country,
                            error = %err,
                            "product unavailable for candidate — advancing"
                        );
                        tokio::time::sleep(policy.unavailable_delay).await;
                        break;
                    }
                    ErrorKind::RateLimited if !retried => {
                        retried = true;
                        tracing::warn!(
                            country = %country,
                            error = %err,
                            "gateway throttled — retrying same country once"
                        );
                        tokio::time::sleep(policy.rate_limit_delay).await;
                    }
                    ErrorKind::RateLimited => {
                        tracing::warn!(
                            country = %country,
                            "still throttled after retry — advancing"
                        );
                        tokio::time::sleep(policy.unavailable_delay).await;
                        break;
                    }
                    ErrorKind::AuthorizationRequired | ErrorKind::Other => {
                        tracing::error!(
                            country = %country,
                            error = %err,
                            "non-retryable error — aborting fallback"
                        );
                        return Err(err);
                    }
                },
            }
        }
    }

    Err(AliexpressError::NotAvailableAnywhere {
        countries: countries.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    fn countries(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| (*c).to_string()).collect()
    }

    fn zero_delay() -> FallbackPolicy {
        FallbackPolicy {
            unavailable_delay: Duration::ZERO,
            rate_limit_delay: Duration::ZERO,
        }
    }

    fn unavailable() -> AliexpressError {
        AliexpressError::Api {
            code: "15".to_string(),
            message: "item is prohibited for this country".to_string(),
        }
    }

    fn throttled() -> AliexpressError {
        AliexpressError::Api {
            code: "7".to_string(),
            message: "request frequency exceeded".to_string(),
        }
    }

    fn unclassified() -> AliexpressError {
        AliexpressError::Api {
            code: "500".to_string(),
            message: "remote service error".to_string(),
        }
    }

    #[tokio::test]
    async fn first_success_short_circuits() {
        let attempted = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&attempted);

        let result = fetch_with_country_fallback(&countries(&["DE", "FR", "ES"]), zero_delay(), |c| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(c.clone());
                if c == "FR" {
                    Ok(42u32)
                } else {
                    Err(unavailable())
                }
            }
        })
        .await
        .expect("FR should succeed");

        assert_eq!(result.country, "FR");
        assert_eq!(result.value, 42);
        // ES must never be attempted once FR succeeds.
        assert_eq!(*attempted.lock().unwrap(), vec!["DE", "FR"]);
    }

    #[tokio::test]
    async fn unclassified_error_aborts_without_trying_later_candidates() {
        let attempted = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&attempted);

        let result = fetch_with_country_fallback(&countries(&["DE", "FR", "ES"]), zero_delay(), |c| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(c);
                Err::<u32, _>(unclassified())
            }
        })
        .await;

        assert!(matches!(result, Err(AliexpressError::Api { .. })));
        assert_eq!(*attempted.lock().unwrap(), vec!["DE"], "abort on first candidate");
    }

    #[tokio::test]
    async fn rate_limit_retries_same_country_once_then_advances() {
        let attempted = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&attempted);

        let result = fetch_with_country_fallback(&countries(&["DE", "FR"]), zero_delay(), |c| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(c.clone());
                if c == "DE" {
                    Err(throttled())
                } else {
                    Ok(7u32)
                }
            }
        })
        .await
        .expect("FR should succeed");

        assert_eq!(result.country, "FR");
        // DE twice (initial + one retry), then FR.
        assert_eq!(*attempted.lock().unwrap(), vec!["DE", "DE", "FR"]);
    }

    #[tokio::test]
    async fn rate_limit_retry_can_succeed_in_place() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = fetch_with_country_fallback(&countries(&["DE", "FR"]), zero_delay(), |c| {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(throttled())
                } else {
                    Ok(c)
                }
            }
        })
        .await
        .expect("retry should succeed");

        assert_eq!(result.country, "DE");
        assert_eq!(result.value, "DE");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausting_all_candidates_yields_uniform_failure() {
        let result = fetch_with_country_fallback(&countries(&["DE", "FR", "ES"]), zero_delay(), |_| async {
            Err::<u32, _>(unavailable())
        })
        .await;

        match result {
            Err(AliexpressError::NotAvailableAnywhere { countries }) => {
                assert_eq!(countries, vec!["DE", "FR", "ES"]);
            }
            other => panic!("expected NotAvailableAnywhere, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_candidate_list_fails_immediately() {
        let result =
            fetch_with_country_fallback(&[], zero_delay(), |_| async { Ok(1u32) }).await;
        assert!(matches!(
            result,
            Err(AliexpressError::NotAvailableAnywhere { .. })
        ));
    }
}

use thiserror::Error;

use crate::sign::SignError;
use crate::token::TokenStoreError;

/// Errors returned by the AliExpress client.
#[derive(Debug, Error)]
pub enum AliexpressError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway returned an error envelope.
    #[error("AliExpress API error {code}: {message}")]
    Api { code: String, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// No usable access or refresh token remains. Terminal for automated
    /// flows: a human must redo the consent step.
    #[error("re-authorization required: {0}")]
    AuthorizationRequired(String),

    /// A credential needed for this call is not configured.
    #[error("missing credential: {0}")]
    MissingCredentials(&'static str),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),

    /// Every ship-to candidate was exhausted without a successful fetch.
    #[error("product not available in any candidate country (tried: {})", countries.join(", "))]
    NotAvailableAnywhere { countries: Vec<String> },
}

/// Coarse classification of vendor failures, decoupling retry/fallback logic
/// from the vendor's error wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The product genuinely cannot be sold/shipped for the requested
    /// country; trying again will not help, but another country might.
    ProductUnavailable,
    /// The gateway asked us to slow down.
    RateLimited,
    /// Token invalid or expired beyond refresh; requires human action.
    AuthorizationRequired,
    /// Anything else: network failures, parse errors, unknown API errors.
    Other,
}

/// Vendor error codes that indicate an invalid or expired session token.
const AUTH_ERROR_CODES: &[&str] = &["27", "IllegalAccessToken", "InvalidSession"];

impl AliexpressError {
    /// Classify this error for the fallback strategy.
    ///
    /// API-message matching is intentionally confined to this single adapter:
    /// the vendor does not return structured availability codes, so the
    /// documented wording families (`prohibited`/`unsaleable`/`sku`/`country`
    /// and `frequency`/`limit`) are mapped here and nowhere else.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            AliexpressError::Api { code, message } => {
                if AUTH_ERROR_CODES.contains(&code.as_str()) {
                    return ErrorKind::AuthorizationRequired;
                }
                let lower = message.to_lowercase();
                if ["prohibited", "unsaleable", "sku", "country"]
                    .iter()
                    .any(|needle| lower.contains(needle))
                {
                    ErrorKind::ProductUnavailable
                } else if ["frequency", "limit"].iter().any(|n| lower.contains(n)) {
                    ErrorKind::RateLimited
                } else {
                    ErrorKind::Other
                }
            }
            AliexpressError::AuthorizationRequired(_) => ErrorKind::AuthorizationRequired,
            _ => ErrorKind::Other,
        }
    }
}

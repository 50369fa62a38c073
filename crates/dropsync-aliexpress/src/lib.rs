//! Signed client for the AliExpress Open Platform.
//!
//! The gateway authenticates every call with a parameter signature (MD5 for
//! business calls, HMAC-SHA256 for the OAuth token endpoints) and a session
//! token obtained through an OAuth consent flow. This crate owns the signing,
//! the token lifecycle, defensive parsing of the vendor's nested response
//! shapes, and the ship-to-country fallback used when a product cannot be
//! quoted for the preferred destination.

pub mod client;
pub mod error;
pub mod fallback;
pub mod pacing;
pub mod sign;
pub mod token;
pub mod types;

pub use client::{AliexpressClient, AliexpressConfig};
pub use error::{AliexpressError, ErrorKind};
pub use fallback::{fetch_with_country_fallback, FallbackPolicy, FallbackSuccess};
pub use pacing::RequestPacer;
pub use sign::{sign_hmac_sha256, sign_md5, SignError};
pub use token::{
    FileTokenStore, MemoryTokenStore, OAuthTokens, TokenState, TokenStore, TokenStoreError,
    ACCESS_EXPIRY_BUFFER_SECS,
};
pub use types::{ProductDetail, TrackingInfo};

//! Webhook signature verification.
//!
//! Shopify signs webhook deliveries with HMAC-SHA256 over the raw request
//! body, base64-encoded in the `X-Shopify-Hmac-Sha256` header. Verification
//! recomputes the digest with the shared secret and compares in constant
//! time; the raw bytes must be used — re-serialized JSON will not match.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Name of the signature header on webhook deliveries.
pub const SIGNATURE_HEADER: &str = "X-Shopify-Hmac-Sha256";

/// Computes the base64 HMAC-SHA256 signature for a raw body.
///
/// Exposed for tests and for signing outbound test deliveries.
#[must_use]
pub fn compute_signature(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    BASE64.encode(mac.finalize().into_bytes())
}

/// Verifies a webhook delivery.
///
/// Returns `false` for a missing/garbled header as well as for a signature
/// mismatch; the digest comparison is constant-time.
#[must_use]
pub fn verify_signature(secret: &str, body: &[u8], header_value: &str) -> bool {
    let Ok(claimed) = BASE64.decode(header_value.trim()) else {
        return false;
    };

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    let expected = mac.finalize().into_bytes();

    expected.ct_eq(claimed.as_slice()).into()
}

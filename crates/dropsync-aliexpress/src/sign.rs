//! Request signing for the AliExpress Open Platform gateway.
//!
//! Two schemes coexist, matching the platform's contract:
//!
//! - **MD5** for general gateway calls: `secret + sorted(key || value) + secret`,
//!   MD5, uppercase hex.
//! - **HMAC-SHA256** for the OAuth token endpoints, which are addressed by
//!   REST path: `api_path + sorted(key || value)`, keyed with the secret,
//!   uppercase hex.
//!
//! Both signers are pure: the caller appends the digest as the `sign`
//! parameter immediately before transmission.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use md5::Md5;
use sha2::{Digest, Sha256};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignError {
    /// The parameter set already carries a `sign` key; signing it again would
    /// produce a digest the server can never verify.
    #[error("parameter set already contains a 'sign' key")]
    SignKeyPresent,
}

/// Concatenate `key || value` pairs in key order.
///
/// A `BTreeMap` input guarantees the sort; no separator is inserted, per the
/// vendor's signature base definition.
fn signature_base(params: &BTreeMap<String, String>) -> String {
    let mut base = String::new();
    for (key, value) in params {
        base.push_str(key);
        base.push_str(value);
    }
    base
}

fn ensure_no_sign_key(params: &BTreeMap<String, String>) -> Result<(), SignError> {
    if params.contains_key("sign") {
        return Err(SignError::SignKeyPresent);
    }
    Ok(())
}

/// MD5 scheme: `MD5(secret + base + secret)`, uppercase hex.
///
/// # Errors
///
/// Returns [`SignError::SignKeyPresent`] if `params` already contains `sign`.
pub fn sign_md5(secret: &str, params: &BTreeMap<String, String>) -> Result<String, SignError> {
    ensure_no_sign_key(params)?;

    let mut hasher = Md5::new();
    hasher.update(secret.as_bytes());
    hasher.update(signature_base(params).as_bytes());
    hasher.update(secret.as_bytes());
    Ok(hex::encode_upper(hasher.finalize()))
}

/// HMAC-SHA256 scheme: `HMAC-SHA256(api_path + base)` keyed with the secret,
/// uppercase hex. Used for the token create/refresh endpoints.
///
/// # Errors
///
/// Returns [`SignError::SignKeyPresent`] if `params` already contains `sign`.
pub fn sign_hmac_sha256(
    secret: &str,
    api_path: &str,
    params: &BTreeMap<String, String>,
) -> Result<String, SignError> {
    ensure_no_sign_key(params)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(api_path.as_bytes());
    mac.update(signature_base(params).as_bytes());
    Ok(hex::encode_upper(mac.finalize().into_bytes()))
}

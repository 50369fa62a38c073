//! Shopify Admin REST client and webhook verification.

pub mod client;
pub mod error;
pub mod pagination;
mod retry;
pub mod types;
pub mod webhook;

pub use client::{ShopifyClient, ShopifyConfig};
pub use error::ShopifyError;
pub use types::{Product, ProductInput, Variant, VariantInput};
pub use webhook::{compute_signature, verify_signature, SIGNATURE_HEADER};

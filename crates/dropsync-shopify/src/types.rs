//! Admin REST API payload types.
//!
//! Reads model only the fields the sync path consumes. Writes go through
//! [`ProductInput`], which serializes skipping `None` fields so partial
//! updates do not clobber untouched attributes.
//!
//! Admin REST returns `tags` as a single comma-separated string (unlike the
//! public `products.json` endpoint, which uses an array).

use serde::{Deserialize, Serialize};

use dropsync_core::NormalizedProduct;

/// Envelope for single-product responses: `{"product": {...}}`.
#[derive(Debug, Deserialize)]
pub struct ProductEnvelope {
    pub product: Product,
}

/// Envelope for list responses: `{"products": [...]}`.
#[derive(Debug, Deserialize)]
pub struct ProductsEnvelope {
    pub products: Vec<Product>,
}

/// A product as returned by the Admin REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub handle: String,
    #[serde(default)]
    pub body_html: Option<String>,
    /// `"active"`, `"draft"`, or `"archived"`.
    #[serde(default)]
    pub status: Option<String>,
    /// Comma-separated tag string; may be empty.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Variant {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    /// Decimal string, e.g. `"24.99"`.
    pub price: String,
    #[serde(default)]
    pub inventory_policy: Option<String>,
}

impl Variant {
    /// Price as a [`rust_decimal::Decimal`] for comparisons. Shopify keeps
    /// prices as strings on the wire; `None` means the string did not parse,
    /// which callers treat as "price unknown" rather than zero.
    #[must_use]
    pub fn price_decimal(&self) -> Option<rust_decimal::Decimal> {
        self.price.trim().parse().ok()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub id: Option<i64>,
    pub src: String,
    #[serde(default)]
    pub position: Option<i32>,
}

// ---------------------------------------------------------------------------
// Write payloads
// ---------------------------------------------------------------------------

/// Envelope for product writes: `{"product": {...}}`.
#[derive(Debug, Serialize)]
pub struct ProductInputEnvelope<'a> {
    pub product: &'a ProductInput,
}

/// Fields for product create/update. `None` fields are omitted from the
/// payload so updates stay partial.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<VariantInput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// `"deny"` stops overselling when vendor stock runs out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_policy: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageInput {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
}

impl ProductInput {
    /// Builds a create/update payload from a normalized vendor product.
    ///
    /// `status` is `"active"` or `"draft"`; `published` controls storefront
    /// visibility independently of status. The vendor SKU id is carried in
    /// the variant `sku` field so later imports can match variants, and the
    /// ship-to country that produced the snapshot is recorded as a tag.
    #[must_use]
    pub fn from_normalized(product: &NormalizedProduct, status: &str, published: bool) -> Self {
        let variants = product
            .variants
            .iter()
            .map(|v| VariantInput {
                title: v.title.clone(),
                sku: Some(v.source_sku_id.clone()),
                price: v.price.clone(),
                inventory_policy: Some("deny".to_string()),
            })
            .collect();

        let images = product
            .images
            .iter()
            .map(|i| ImageInput {
                src: i.src.clone(),
                position: Some(i.position),
            })
            .collect();

        let mut tags = vec![format!("ship-to:{}", product.ship_to_country)];
        if product.has_eu_variant() {
            tags.push("eu-warehouse".to_string());
        }

        Self {
            title: Some(product.title.clone()),
            body_html: product.description_html.clone(),
            handle: Some(product.handle.clone()),
            status: Some(status.to_string()),
            published: Some(published),
            tags: Some(tags.join(", ")),
            variants,
            images,
        }
    }
}

#[cfg(test)]
mod tests {
    use dropsync_core::{NormalizedImage, NormalizedVariant};

    use super::*;

    fn normalized() -> NormalizedProduct {
        NormalizedProduct {
            source_product_id: "1005001234".to_string(),
            title: "Wireless Earbuds Pro".to_string(),
            description_html: Some("<p>Great sound.</p>".to_string()),
            handle: "wireless-earbuds-pro".to_string(),
            images: vec![NormalizedImage {
                src: "https://img/1.jpg".to_string(),
                position: 1,
            }],
            ship_to_country: "DE".to_string(),
            variants: vec![NormalizedVariant {
                source_sku_id: "12000011112222".to_string(),
                title: Some("Color: Black".to_string()),
                price: Some("19.99".to_string()),
                currency: Some("EUR".to_string()),
                available_stock: Some(12),
                ship_from_country: Some("ES".to_string()),
                eu_warehouse: true,
            }],
        }
    }

    #[test]
    fn from_normalized_builds_full_payload() {
        let input = ProductInput::from_normalized(&normalized(), "draft", false);
        assert_eq!(input.title.as_deref(), Some("Wireless Earbuds Pro"));
        assert_eq!(input.status.as_deref(), Some("draft"));
        assert_eq!(input.published, Some(false));
        assert_eq!(input.tags.as_deref(), Some("ship-to:DE, eu-warehouse"));
        assert_eq!(input.variants.len(), 1);
        assert_eq!(input.variants[0].sku.as_deref(), Some("12000011112222"));
        assert_eq!(
            input.variants[0].inventory_policy.as_deref(),
            Some("deny")
        );
    }

    #[test]
    fn serialized_payload_omits_absent_fields() {
        let input = ProductInput {
            status: Some("active".to_string()),
            ..ProductInput::default()
        };
        let json =
            serde_json::to_string(&ProductInputEnvelope { product: &input }).expect("serialize");
        assert_eq!(json, r#"{"product":{"status":"active"}}"#);
    }

    #[test]
    fn variant_price_parses_to_decimal() {
        let variant: Variant = serde_json::from_value(serde_json::json!({
            "id": 1, "price": "24.99"
        }))
        .expect("parse");
        assert_eq!(
            variant.price_decimal(),
            Some(rust_decimal::Decimal::new(2499, 2))
        );

        let garbled: Variant = serde_json::from_value(serde_json::json!({
            "id": 2, "price": "n/a"
        }))
        .expect("parse");
        assert!(garbled.price_decimal().is_none());
    }

    #[test]
    fn product_read_tolerates_missing_optionals() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": 1,
            "title": "T",
            "handle": "t"
        }))
        .expect("parse");
        assert!(product.status.is_none());
        assert!(product.variants.is_empty());
    }
}

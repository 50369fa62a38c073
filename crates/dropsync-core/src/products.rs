//! Normalized product shapes shared between the vendor client, the Shopify
//! push path, and the translation store.
//!
//! Vendor responses are parsed defensively in `dropsync-aliexpress` and
//! reduced to these types; everything downstream works with this shape only.

use serde::{Deserialize, Serialize};

/// A product normalized from a vendor response, ready for the Shopify push
/// path and the translation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedProduct {
    /// Vendor product identifier (AliExpress item id).
    pub source_product_id: String,
    /// Source-language title.
    pub title: String,
    /// Source-language HTML description, when the vendor provided one.
    pub description_html: Option<String>,
    /// Canonical URL handle derived from the title.
    pub handle: String,
    /// Image URLs in vendor order.
    pub images: Vec<NormalizedImage>,
    /// Ship-to country that produced this snapshot (fallback winner).
    pub ship_to_country: String,
    pub variants: Vec<NormalizedVariant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedVariant {
    /// Vendor SKU identifier.
    pub source_sku_id: String,
    /// Variant attribute summary (e.g. `"Color: Black / Size: M"`).
    pub title: Option<String>,
    /// Sale price as a decimal string in the vendor's quoted currency.
    pub price: Option<String>,
    pub currency: Option<String>,
    pub available_stock: Option<i64>,
    /// Vendor-reported ship-from country for this SKU, when present.
    pub ship_from_country: Option<String>,
    /// True when the reported ship-from origin is inside the EU. Drives the
    /// storefront exposure filter.
    pub eu_warehouse: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedImage {
    pub src: String,
    pub position: i32,
}

impl NormalizedProduct {
    /// True when at least one variant ships from an EU warehouse.
    #[must_use]
    pub fn has_eu_variant(&self) -> bool {
        self.variants.iter().any(|v| v.eu_warehouse)
    }
}

/// EU member states, ISO-3166 alpha-2. Used to tag `eu_warehouse` variants.
const EU_COUNTRIES: &[&str] = &[
    "AT", "BE", "BG", "HR", "CY", "CZ", "DK", "EE", "FI", "FR", "DE", "GR", "HU", "IE", "IT", "LV",
    "LT", "LU", "MT", "NL", "PL", "PT", "RO", "SK", "SI", "ES", "SE",
];

/// Returns `true` for an ISO-3166 alpha-2 code of an EU member state.
/// Comparison is case-insensitive; unknown and empty codes return `false`.
#[must_use]
pub fn is_eu_country(code: &str) -> bool {
    let upper = code.trim().to_uppercase();
    EU_COUNTRIES.contains(&upper.as_str())
}

/// Generate a URL-safe slug from a product title.
///
/// ASCII alphanumerics are kept, spaces become dashes, everything else is
/// dropped, and runs of dashes collapse.
#[must_use]
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else if c == ' ' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eu_country_detection() {
        assert!(is_eu_country("DE"));
        assert!(is_eu_country("de"));
        assert!(is_eu_country(" nl "));
        assert!(!is_eu_country("CN"));
        assert!(!is_eu_country("GB"));
        assert!(!is_eu_country(""));
    }

    #[test]
    fn slugify_simple_title() {
        assert_eq!(slugify("Wireless Earbuds Pro"), "wireless-earbuds-pro");
    }

    #[test]
    fn slugify_strips_punctuation_and_collapses_dashes() {
        assert_eq!(
            slugify("USB-C  Cable (2m) — Fast!"),
            "usb-c-cable-2m-fast"
        );
    }

    #[test]
    fn slugify_drops_non_ascii() {
        // Accented characters are stripped rather than transliterated.
        assert_eq!(slugify("Café Grinder"), "caf-grinder");
    }

    #[test]
    fn has_eu_variant_reflects_any_variant() {
        let mut product = NormalizedProduct {
            source_product_id: "100500".to_string(),
            title: "Test".to_string(),
            description_html: None,
            handle: "test".to_string(),
            images: vec![],
            ship_to_country: "DE".to_string(),
            variants: vec![NormalizedVariant {
                source_sku_id: "sku-1".to_string(),
                title: None,
                price: Some("9.99".to_string()),
                currency: Some("EUR".to_string()),
                available_stock: Some(10),
                ship_from_country: Some("CN".to_string()),
                eu_warehouse: false,
            }],
        };
        assert!(!product.has_eu_variant());

        product.variants.push(NormalizedVariant {
            source_sku_id: "sku-2".to_string(),
            title: None,
            price: Some("11.99".to_string()),
            currency: Some("EUR".to_string()),
            available_stock: Some(3),
            ship_from_country: Some("ES".to_string()),
            eu_warehouse: true,
        });
        assert!(product.has_eu_variant());
    }
}

//! Vendor response types for the AliExpress gateway.
//!
//! The vendor owns these shapes and changes them silently, so every nested
//! field is optional and extraction tolerates absence at every level. Only
//! the fields this system actually consumes are modeled; everything else is
//! dropped at parse time.

use serde::Deserialize;

use dropsync_core::{is_eu_country, slugify, NormalizedImage, NormalizedProduct, NormalizedVariant};

// ---------------------------------------------------------------------------
// Error envelope
// ---------------------------------------------------------------------------

/// Top-level error envelope returned by the gateway on failed calls.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub sub_code: Option<String>,
    #[serde(default)]
    pub sub_msg: Option<String>,
}

impl ErrorResponse {
    /// Best-effort `(code, message)` pair: sub-fields win over top-level ones.
    #[must_use]
    pub fn code_and_message(&self) -> (String, String) {
        let code = self
            .sub_code
            .clone()
            .or_else(|| self.code.as_ref().map(ToString::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        let message = self
            .sub_msg
            .clone()
            .or_else(|| self.msg.clone())
            .unwrap_or_else(|| "unknown error".to_string());
        (code.trim_matches('"').to_string(), message)
    }
}

// ---------------------------------------------------------------------------
// Product detail
// ---------------------------------------------------------------------------

/// Payload of `aliexpress.ds.product.get`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductDetail {
    #[serde(default)]
    pub ae_item_base_info_dto: Option<ItemBaseInfo>,
    #[serde(default)]
    pub ae_item_sku_info_dtos: Option<SkuInfoList>,
    #[serde(default)]
    pub ae_multimedia_info_dto: Option<MultimediaInfo>,
    #[serde(default)]
    pub package_info_dto: Option<PackageInfo>,
    #[serde(default)]
    pub ae_store_info: Option<StoreInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemBaseInfo {
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub product_status_type: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SkuInfoList {
    #[serde(default)]
    pub ae_item_sku_info_d_t_o: Vec<SkuInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SkuInfo {
    #[serde(default)]
    pub sku_id: Option<serde_json::Value>,
    #[serde(default)]
    pub sku_attr: Option<String>,
    #[serde(default)]
    pub sku_price: Option<String>,
    #[serde(default)]
    pub offer_sale_price: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub sku_available_stock: Option<i64>,
    #[serde(default)]
    pub ae_sku_property_dtos: Option<SkuPropertyList>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SkuPropertyList {
    #[serde(default)]
    pub ae_sku_property_d_t_o: Vec<SkuProperty>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SkuProperty {
    #[serde(default)]
    pub sku_property_name: Option<String>,
    #[serde(default)]
    pub sku_property_value: Option<String>,
    #[serde(default)]
    pub property_value_definition_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MultimediaInfo {
    /// Semicolon-separated URL list, per the vendor contract.
    #[serde(default)]
    pub image_urls: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PackageInfo {
    #[serde(default)]
    pub gross_weight: Option<String>,
    #[serde(default)]
    pub package_length: Option<i64>,
    #[serde(default)]
    pub package_width: Option<i64>,
    #[serde(default)]
    pub package_height: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreInfo {
    #[serde(default)]
    pub store_id: Option<i64>,
    #[serde(default)]
    pub store_name: Option<String>,
}

impl SkuInfo {
    /// Best-available price: the discounted offer price when present,
    /// otherwise the list price.
    #[must_use]
    pub fn effective_price(&self) -> Option<&str> {
        self.offer_sale_price
            .as_deref()
            .or(self.sku_price.as_deref())
    }

    /// Vendor-reported ship-from country, read from the SKU property whose
    /// name mentions shipping/sending. The vendor localizes the property
    /// name, so matching is substring-based and case-insensitive.
    #[must_use]
    pub fn ship_from_country(&self) -> Option<String> {
        let properties = &self.ae_sku_property_dtos.as_ref()?.ae_sku_property_d_t_o;
        properties.iter().find_map(|p| {
            let name = p.sku_property_name.as_deref()?.to_lowercase();
            if name.contains("ship") || name.contains("send") {
                p.property_value_definition_name
                    .as_deref()
                    .or(p.sku_property_value.as_deref())
                    .map(normalize_country)
            } else {
                None
            }
        })
    }

    /// Human-readable variant summary from the raw `sku_attr` string
    /// (`"14:193;200007763:201336100"` style entries are dropped; named
    /// values like `"Color:Black"` are kept).
    #[must_use]
    pub fn title(&self) -> Option<String> {
        let properties = &self.ae_sku_property_dtos.as_ref()?.ae_sku_property_d_t_o;
        let parts: Vec<String> = properties
            .iter()
            .filter_map(|p| {
                let name = p.sku_property_name.as_deref()?;
                let value = p
                    .property_value_definition_name
                    .as_deref()
                    .or(p.sku_property_value.as_deref())?;
                Some(format!("{name}: {value}"))
            })
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" / "))
        }
    }
}

/// Map vendor warehouse labels to ISO-3166 codes where they are known
/// aliases; pass two-letter codes through uppercased.
fn normalize_country(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() == 2 {
        return trimmed.to_uppercase();
    }
    match trimmed.to_lowercase().as_str() {
        "germany" | "deutschland" => "DE".to_string(),
        "france" => "FR".to_string(),
        "spain" | "españa" => "ES".to_string(),
        "italy" | "italia" => "IT".to_string(),
        "netherlands" => "NL".to_string(),
        "belgium" => "BE".to_string(),
        "poland" | "polska" => "PL".to_string(),
        "czech republic" | "czech" => "CZ".to_string(),
        "china" => "CN".to_string(),
        "united states" | "usa" => "US".to_string(),
        _ => trimmed.to_uppercase(),
    }
}

impl ProductDetail {
    /// Reduce the vendor shape to the normalized product used by the push
    /// and translation paths. Absent fields degrade gracefully; only a
    /// missing product id or title makes the product unusable.
    #[must_use]
    pub fn into_normalized(self, ship_to_country: &str) -> Option<NormalizedProduct> {
        let base = self.ae_item_base_info_dto?;
        let product_id = base.product_id?;
        let title = base.subject.filter(|s| !s.trim().is_empty())?;

        let images = self
            .ae_multimedia_info_dto
            .and_then(|m| m.image_urls)
            .map(|urls| {
                urls.split(';')
                    .filter(|u| !u.trim().is_empty())
                    .enumerate()
                    .map(|(i, u)| NormalizedImage {
                        src: u.trim().to_string(),
                        position: i32::try_from(i + 1).unwrap_or(i32::MAX),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let variants = self
            .ae_item_sku_info_dtos
            .map(|list| {
                list.ae_item_sku_info_d_t_o
                    .into_iter()
                    .filter_map(|sku| {
                        let source_sku_id = sku
                            .sku_id
                            .as_ref()
                            .map(|v| v.to_string().trim_matches('"').to_string())?;
                        let ship_from = sku.ship_from_country();
                        Some(NormalizedVariant {
                            title: sku.title(),
                            price: sku.effective_price().map(ToString::to_string),
                            currency: sku
                                .currency_code
                                .clone()
                                .or_else(|| base.currency_code.clone()),
                            available_stock: sku.sku_available_stock,
                            eu_warehouse: ship_from
                                .as_deref()
                                .is_some_and(is_eu_country),
                            ship_from_country: ship_from,
                            source_sku_id,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let handle = slugify(&title);
        Some(NormalizedProduct {
            source_product_id: product_id.to_string(),
            description_html: base.detail.filter(|d| !d.trim().is_empty()),
            title,
            handle,
            images,
            ship_to_country: ship_to_country.to_string(),
            variants,
        })
    }
}

// ---------------------------------------------------------------------------
// Freight, orders, tracking
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct FreightOption {
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub estimated_delivery_days: Option<String>,
    #[serde(default)]
    pub free_shipping: Option<bool>,
    #[serde(default)]
    pub freight_amount: Option<FreightAmount>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FreightAmount {
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderCreateResult {
    #[serde(default)]
    pub order_list: Vec<i64>,
    #[serde(default)]
    pub is_success: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrackingEvent {
    #[serde(default)]
    pub event_desc: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrackingInfo {
    #[serde(default)]
    pub official_website: Option<String>,
    #[serde(default)]
    pub events: Vec<TrackingEvent>,
}

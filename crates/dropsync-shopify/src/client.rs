//! HTTP client for the Shopify Admin REST API.

use std::time::Duration;

use reqwest::Client;

use crate::error::ShopifyError;
use crate::pagination::next_page_cursor;
use crate::retry::retry_with_backoff;
use crate::types::{
    Product, ProductEnvelope, ProductInput, ProductInputEnvelope, ProductsEnvelope,
};

/// Maximum number of pages to fetch before returning an error.
/// Prevents infinite loops on cycling cursors.
const MAX_PAGES: usize = 200;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Connection settings for [`ShopifyClient`].
#[derive(Debug, Clone)]
pub struct ShopifyConfig {
    /// Shop domain (`example.myshopify.com`) or a full base URL for tests.
    pub shop_domain: String,
    pub admin_token: String,
    /// Admin API version segment, e.g. `"2025-01"`.
    pub api_version: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Additional attempts after the first failure for retriable errors.
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries.
    pub backoff_base_secs: u64,
}

/// Client for the Shopify Admin REST API.
///
/// Handles 429 (shared call bucket), 404, and other non-2xx responses as
/// typed errors; transient failures are retried with exponential backoff.
#[derive(Debug)]
pub struct ShopifyClient {
    client: Client,
    config: ShopifyConfig,
    base_url: String,
}

impl ShopifyClient {
    /// Creates a client with configured timeout, `User-Agent`, and retry
    /// policy.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ShopifyError::InvalidShopDomain`] if the
    /// shop domain is empty.
    pub fn new(config: ShopifyConfig) -> Result<Self, ShopifyError> {
        if config.shop_domain.trim().is_empty() {
            return Err(ShopifyError::InvalidShopDomain {
                domain: config.shop_domain.clone(),
                reason: "shop domain must be non-empty".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .build()?;

        // Test servers pass a full http://127.0.0.1:port base; production
        // config passes a bare shop domain.
        let origin = if config.shop_domain.starts_with("http://")
            || config.shop_domain.starts_with("https://")
        {
            config.shop_domain.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", config.shop_domain.trim_end_matches('/'))
        };
        let base_url = format!("{origin}/admin/api/{}", config.api_version);

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Fetches one page of products, returning the page plus the cursor for
    /// the next one (if any).
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::RateLimited`] — 429 after all retries exhausted.
    /// - [`ShopifyError::NotFound`] — 404 (not retried).
    /// - [`ShopifyError::UnexpectedStatus`] — other non-2xx (5xx retried).
    /// - [`ShopifyError::Http`] / [`ShopifyError::Deserialize`] as usual.
    pub async fn list_products_page(
        &self,
        limit: u32,
        page_info: Option<&str>,
    ) -> Result<(Vec<Product>, Option<String>), ShopifyError> {
        let mut url = format!("{}/products.json?limit={limit}", self.base_url);
        if let Some(cursor) = page_info {
            url.push_str("&page_info=");
            url.push_str(cursor);
        }

        let (body, link_header) = self.get_with_retry(&url).await?;
        let envelope: ProductsEnvelope =
            serde_json::from_str(&body).map_err(|e| ShopifyError::Deserialize {
                context: format!("products page (cursor={page_info:?})"),
                source: e,
            })?;

        Ok((envelope.products, next_page_cursor(link_header.as_deref())))
    }

    /// Fetches the entire catalog by following `Link` cursors.
    ///
    /// All-or-nothing: a failure on any page discards earlier pages and
    /// returns the error, so callers never act on a partial catalog.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::list_products_page`] errors and returns
    /// [`ShopifyError::PaginationLimit`] after [`MAX_PAGES`] pages.
    pub async fn fetch_all_products(
        &self,
        limit: u32,
        inter_request_delay_ms: u64,
    ) -> Result<Vec<Product>, ShopifyError> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            pages += 1;
            if pages > MAX_PAGES {
                return Err(ShopifyError::PaginationLimit {
                    max_pages: MAX_PAGES,
                });
            }
            if pages > 1 && inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(inter_request_delay_ms)).await;
            }

            let (products, next) = self.list_products_page(limit, cursor.as_deref()).await?;
            all.extend(products);

            cursor = next;
            if cursor.is_none() {
                break;
            }
        }

        Ok(all)
    }

    /// Fetches one product by id.
    ///
    /// # Errors
    ///
    /// [`ShopifyError::NotFound`] for unknown ids; otherwise as
    /// [`Self::list_products_page`].
    pub async fn get_product(&self, product_id: i64) -> Result<Product, ShopifyError> {
        let url = format!("{}/products/{product_id}.json", self.base_url);
        let (body, _) = self.get_with_retry(&url).await?;
        let envelope: ProductEnvelope =
            serde_json::from_str(&body).map_err(|e| ShopifyError::Deserialize {
                context: format!("product {product_id}"),
                source: e,
            })?;
        Ok(envelope.product)
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Creates a product.
    ///
    /// # Errors
    ///
    /// Same surface as [`Self::list_products_page`]; validation failures
    /// arrive as [`ShopifyError::UnexpectedStatus`] with status 422 and the
    /// response body attached.
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, ShopifyError> {
        let url = format!("{}/products.json", self.base_url);
        let body = self
            .write_with_retry(reqwest::Method::POST, &url, input)
            .await?;
        let envelope: ProductEnvelope =
            serde_json::from_str(&body).map_err(|e| ShopifyError::Deserialize {
                context: "create product".to_string(),
                source: e,
            })?;
        Ok(envelope.product)
    }

    /// Updates an existing product in place.
    ///
    /// # Errors
    ///
    /// Same surface as [`Self::create_product`].
    pub async fn update_product(
        &self,
        product_id: i64,
        input: &ProductInput,
    ) -> Result<Product, ShopifyError> {
        let url = format!("{}/products/{product_id}.json", self.base_url);
        let body = self
            .write_with_retry(reqwest::Method::PUT, &url, input)
            .await?;
        let envelope: ProductEnvelope =
            serde_json::from_str(&body).map_err(|e| ShopifyError::Deserialize {
                context: format!("update product {product_id}"),
                source: e,
            })?;
        Ok(envelope.product)
    }

    /// Updates a single variant's price.
    ///
    /// # Errors
    ///
    /// Same surface as [`Self::create_product`].
    pub async fn update_variant_price(
        &self,
        variant_id: i64,
        price: &str,
    ) -> Result<(), ShopifyError> {
        let url = format!("{}/variants/{variant_id}.json", self.base_url);
        let payload = serde_json::json!({ "variant": { "id": variant_id, "price": price } });

        retry_with_backoff(
            self.config.max_retries,
            self.config.backoff_base_secs,
            || {
                let url = url.clone();
                let payload = payload.clone();
                async move {
                    let response = self
                        .client
                        .put(&url)
                        .header(ACCESS_TOKEN_HEADER, &self.config.admin_token)
                        .json(&payload)
                        .send()
                        .await?;
                    Self::consume_response(response, &url).await.map(|_| ())
                }
            },
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    /// GET with retry; returns the body and the `Link` header.
    async fn get_with_retry(
        &self,
        url: &str,
    ) -> Result<(String, Option<String>), ShopifyError> {
        retry_with_backoff(
            self.config.max_retries,
            self.config.backoff_base_secs,
            || {
                let url = url.to_owned();
                async move {
                    let response = self
                        .client
                        .get(&url)
                        .header(ACCESS_TOKEN_HEADER, &self.config.admin_token)
                        .send()
                        .await?;
                    Self::consume_response(response, &url).await
                }
            },
        )
        .await
    }

    /// POST/PUT with retry; returns the body.
    async fn write_with_retry(
        &self,
        method: reqwest::Method,
        url: &str,
        input: &ProductInput,
    ) -> Result<String, ShopifyError> {
        retry_with_backoff(
            self.config.max_retries,
            self.config.backoff_base_secs,
            || {
                let url = url.to_owned();
                let method = method.clone();
                async move {
                    let response = self
                        .client
                        .request(method, &url)
                        .header(ACCESS_TOKEN_HEADER, &self.config.admin_token)
                        .json(&ProductInputEnvelope { product: input })
                        .send()
                        .await?;
                    Self::consume_response(response, &url)
                        .await
                        .map(|(body, _)| body)
                }
            },
        )
        .await
    }

    /// Maps the response status to typed errors and extracts body + `Link`.
    async fn consume_response(
        response: reqwest::Response,
        url: &str,
    ) -> Result<(String, Option<String>), ShopifyError> {
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(2);
            return Err(ShopifyError::RateLimited { retry_after_secs });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ShopifyError::NotFound {
                url: url.to_owned(),
            });
        }

        let link_header = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = response.text().await?;

        if !status.is_success() {
            // Keep the body: Shopify's 422s carry the field-level reasons.
            return Err(ShopifyError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
                body: body.chars().take(500).collect(),
            });
        }

        Ok((body, link_header))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(domain: &str) -> ShopifyConfig {
        ShopifyConfig {
            shop_domain: domain.to_string(),
            admin_token: "shpat_test".to_string(),
            api_version: "2025-01".to_string(),
            timeout_secs: 30,
            user_agent: "dropsync/0.1".to_string(),
            max_retries: 0,
            backoff_base_secs: 0,
        }
    }

    #[test]
    fn base_url_from_bare_domain() {
        let client = ShopifyClient::new(test_config("example.myshopify.com")).expect("client");
        assert_eq!(
            client.base_url,
            "https://example.myshopify.com/admin/api/2025-01"
        );
    }

    #[test]
    fn base_url_from_full_url_is_kept() {
        let client = ShopifyClient::new(test_config("http://127.0.0.1:9999/")).expect("client");
        assert_eq!(client.base_url, "http://127.0.0.1:9999/admin/api/2025-01");
    }

    #[test]
    fn empty_domain_is_rejected() {
        let err = ShopifyClient::new(test_config("  ")).expect_err("must reject");
        assert!(matches!(err, ShopifyError::InvalidShopDomain { .. }));
    }
}

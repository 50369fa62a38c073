//! Signed HTTP client for the AliExpress Open Platform gateway.
//!
//! Gateway business calls (`aliexpress.ds.*`) are form-POSTs against a single
//! sync endpoint, signed with the MD5 scheme. The OAuth token endpoints are
//! addressed by REST path and signed with HMAC-SHA256. All endpoints return a
//! JSON envelope keyed by the method name; errors arrive as an
//! `error_response` object which is classified into typed errors before any
//! payload parsing happens.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde_json::Value;

use crate::error::AliexpressError;
use crate::sign::{sign_hmac_sha256, sign_md5};
use crate::token::{OAuthTokens, TokenState, TokenStore};
use crate::types::{
    ErrorResponse, FreightOption, OrderCreateResult, ProductDetail, TrackingInfo,
};

const TOKEN_CREATE_PATH: &str = "/auth/token/create";
const TOKEN_REFRESH_PATH: &str = "/auth/token/refresh";

/// Connection settings for [`AliexpressClient`].
#[derive(Debug, Clone)]
pub struct AliexpressConfig {
    pub app_key: String,
    pub app_secret: String,
    /// Gateway base URL; pointed at a mock server in tests.
    pub gateway_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// Client for the AliExpress Open Platform gateway.
pub struct AliexpressClient {
    client: Client,
    config: AliexpressConfig,
}

impl AliexpressClient {
    /// Creates a client with configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`AliexpressError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: AliexpressConfig) -> Result<Self, AliexpressError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { client, config })
    }

    // -----------------------------------------------------------------------
    // Product / logistics / order operations
    // -----------------------------------------------------------------------

    /// Fetches product detail for one ship-to country.
    ///
    /// Returns the raw [`ProductDetail`]; callers normalize it with
    /// [`ProductDetail::into_normalized`] so the fallback strategy can keep
    /// the winning country alongside the payload.
    ///
    /// # Errors
    ///
    /// - [`AliexpressError::Api`] if the gateway reports an error envelope.
    /// - [`AliexpressError::Http`] on network failure or non-2xx status.
    /// - [`AliexpressError::Deserialize`] on unexpected payload shape.
    pub async fn get_product(
        &self,
        session: &str,
        product_id: i64,
        ship_to_country: &str,
        target_language: &str,
        target_currency: &str,
    ) -> Result<ProductDetail, AliexpressError> {
        let body = self
            .execute(
                "aliexpress.ds.product.get",
                Some(session),
                &[
                    ("product_id", &product_id.to_string()),
                    ("ship_to_country", ship_to_country),
                    ("target_language", target_language),
                    ("target_currency", target_currency),
                ],
            )
            .await?;

        let result = extract_result(&body, "aliexpress_ds_product_get_response");
        serde_json::from_value(result).map_err(|e| AliexpressError::Deserialize {
            context: format!("product.get(id={product_id}, ship_to={ship_to_country})"),
            source: e,
        })
    }

    /// Queries shipping options for a SKU quantity to one country.
    ///
    /// # Errors
    ///
    /// Same error surface as [`Self::get_product`].
    pub async fn query_freight(
        &self,
        session: &str,
        product_id: i64,
        sku_id: &str,
        quantity: u32,
        country_code: &str,
    ) -> Result<Vec<FreightOption>, AliexpressError> {
        let query = serde_json::json!({
            "productId": product_id,
            "selectedSkuId": sku_id,
            "quantity": quantity,
            "shipToCountry": country_code,
        });
        let body = self
            .execute(
                "aliexpress.ds.freight.query",
                Some(session),
                &[("queryDeliveryReq", &query.to_string())],
            )
            .await?;

        let result = extract_result(&body, "aliexpress_ds_freight_query_response");
        let options = result
            .get("delivery_options")
            .and_then(|d| d.get("delivery_option_d_t_o"))
            .cloned()
            .unwrap_or(Value::Array(vec![]));
        serde_json::from_value(options).map_err(|e| AliexpressError::Deserialize {
            context: format!("freight.query(id={product_id}, country={country_code})"),
            source: e,
        })
    }

    /// Places a dropship order for previously fetched SKUs.
    ///
    /// # Errors
    ///
    /// Same error surface as [`Self::get_product`].
    pub async fn create_order(
        &self,
        session: &str,
        param_place_order_request: &Value,
    ) -> Result<OrderCreateResult, AliexpressError> {
        let body = self
            .execute(
                "aliexpress.trade.buy.placeorder",
                Some(session),
                &[(
                    "param_place_order_request4_open_api_d_t_o",
                    &param_place_order_request.to_string(),
                )],
            )
            .await?;

        let result = extract_result(&body, "aliexpress_trade_buy_placeorder_response");
        serde_json::from_value(result).map_err(|e| AliexpressError::Deserialize {
            context: "trade.buy.placeorder".to_string(),
            source: e,
        })
    }

    /// Fetches logistics tracking events for an order.
    ///
    /// # Errors
    ///
    /// Same error surface as [`Self::get_product`].
    pub async fn get_tracking(
        &self,
        session: &str,
        order_id: i64,
        tracking_number: &str,
    ) -> Result<TrackingInfo, AliexpressError> {
        let body = self
            .execute(
                "aliexpress.logistics.ds.trackinginfo.query",
                Some(session),
                &[
                    ("origin_order_id", &order_id.to_string()),
                    ("logistics_no", tracking_number),
                ],
            )
            .await?;

        let result = extract_result(&body, "aliexpress_logistics_ds_trackinginfo_query_response");
        serde_json::from_value(result).map_err(|e| AliexpressError::Deserialize {
            context: format!("trackinginfo.query(order={order_id})"),
            source: e,
        })
    }

    // -----------------------------------------------------------------------
    // OAuth token endpoints
    // -----------------------------------------------------------------------

    /// Exchanges an authorization code for a token pair (the consent step's
    /// server side).
    ///
    /// # Errors
    ///
    /// - [`AliexpressError::Api`] if the gateway rejects the code.
    /// - [`AliexpressError::Http`] / [`AliexpressError::Deserialize`] as usual.
    pub async fn exchange_authorization_code(
        &self,
        code: &str,
    ) -> Result<OAuthTokens, AliexpressError> {
        let body = self
            .execute_rest(TOKEN_CREATE_PATH, &[("code", code)])
            .await?;
        parse_token_response(&body)
    }

    /// Trades a refresh token for a fresh token pair.
    ///
    /// # Errors
    ///
    /// - [`AliexpressError::Api`] if the gateway rejects the refresh token.
    /// - [`AliexpressError::Http`] / [`AliexpressError::Deserialize`] as usual.
    pub async fn refresh_tokens(
        &self,
        refresh_token: &str,
    ) -> Result<OAuthTokens, AliexpressError> {
        let body = self
            .execute_rest(TOKEN_REFRESH_PATH, &[("refresh_token", refresh_token)])
            .await?;
        parse_token_response(&body)
    }

    /// Returns a usable access token, refreshing through `store` when the
    /// persisted one is expired or inside the safety buffer.
    ///
    /// # Errors
    ///
    /// Returns [`AliexpressError::AuthorizationRequired`] when no record
    /// exists or the refresh token has also expired — terminal until a human
    /// re-runs the consent step. Refresh failures surface as their
    /// underlying error.
    pub async fn ensure_access_token(
        &self,
        store: &dyn TokenStore,
    ) -> Result<String, AliexpressError> {
        let Some(tokens) = store.load()? else {
            return Err(AliexpressError::AuthorizationRequired(
                "no token record; run the authorization flow first".to_string(),
            ));
        };

        match tokens.state() {
            TokenState::AccessValid => Ok(tokens.access_token),
            TokenState::AccessExpiredRefreshValid => {
                tracing::info!("access token expired — refreshing");
                let refreshed = self.refresh_tokens(&tokens.refresh_token).await?;
                store.save(&refreshed)?;
                Ok(refreshed.access_token)
            }
            TokenState::Unauthorized | TokenState::AllExpired => {
                Err(AliexpressError::AuthorizationRequired(
                    "refresh token expired; re-run the authorization flow".to_string(),
                ))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    /// System + business parameters for a gateway call, MD5-signed.
    fn gateway_params(
        &self,
        method: &str,
        session: Option<&str>,
        business: &[(&str, &str)],
    ) -> Result<BTreeMap<String, String>, AliexpressError> {
        let mut params: BTreeMap<String, String> = BTreeMap::new();
        params.insert("app_key".to_string(), self.config.app_key.clone());
        params.insert("method".to_string(), method.to_string());
        params.insert(
            "timestamp".to_string(),
            Utc::now().timestamp_millis().to_string(),
        );
        params.insert("sign_method".to_string(), "md5".to_string());
        params.insert("format".to_string(), "json".to_string());
        params.insert("v".to_string(), "2.0".to_string());
        if let Some(session) = session {
            params.insert("session".to_string(), session.to_string());
        }
        for (key, value) in business {
            params.insert((*key).to_string(), (*value).to_string());
        }

        let sign = sign_md5(&self.config.app_secret, &params)?;
        params.insert("sign".to_string(), sign);
        Ok(params)
    }

    /// Sends one signed gateway call and returns the raw JSON body after
    /// rejecting error envelopes.
    async fn execute(
        &self,
        method: &str,
        session: Option<&str>,
        business: &[(&str, &str)],
    ) -> Result<Value, AliexpressError> {
        let params = self.gateway_params(method, session, business)?;
        let response = self
            .client
            .post(&self.config.gateway_url)
            .form(&params)
            .send()
            .await?;
        let response = response.error_for_status()?;
        let text = response.text().await?;

        let body: Value = serde_json::from_str(&text).map_err(|e| AliexpressError::Deserialize {
            context: method.to_string(),
            source: e,
        })?;
        check_error_envelope(&body)?;
        Ok(body)
    }

    /// Sends one HMAC-SHA256-signed call to a REST-path endpoint (token
    /// create/refresh).
    async fn execute_rest(
        &self,
        api_path: &str,
        business: &[(&str, &str)],
    ) -> Result<Value, AliexpressError> {
        let mut params: BTreeMap<String, String> = BTreeMap::new();
        params.insert("app_key".to_string(), self.config.app_key.clone());
        params.insert(
            "timestamp".to_string(),
            Utc::now().timestamp_millis().to_string(),
        );
        params.insert("sign_method".to_string(), "sha256".to_string());
        for (key, value) in business {
            params.insert((*key).to_string(), (*value).to_string());
        }
        let sign = sign_hmac_sha256(&self.config.app_secret, api_path, &params)?;
        params.insert("sign".to_string(), sign);

        let url = format!(
            "{}{}",
            self.config.gateway_url.trim_end_matches('/'),
            api_path
        );
        let response = self.client.post(&url).form(&params).send().await?;
        let response = response.error_for_status()?;
        let text = response.text().await?;

        let body: Value = serde_json::from_str(&text).map_err(|e| AliexpressError::Deserialize {
            context: api_path.to_string(),
            source: e,
        })?;
        check_error_envelope(&body)?;
        Ok(body)
    }
}

/// Rejects bodies carrying the gateway error envelope.
fn check_error_envelope(body: &Value) -> Result<(), AliexpressError> {
    if let Some(error) = body.get("error_response") {
        let parsed: ErrorResponse =
            serde_json::from_value(error.clone()).unwrap_or_else(|_| ErrorResponse {
                code: None,
                msg: Some(error.to_string()),
                sub_code: None,
                sub_msg: None,
            });
        let (code, message) = parsed.code_and_message();
        return Err(AliexpressError::Api { code, message });
    }
    Ok(())
}

/// Unwraps `{"<method>_response": {"result": {...}}}` envelopes, tolerating
/// a missing `result` level (some endpoints inline the payload).
fn extract_result(body: &Value, envelope_key: &str) -> Value {
    let inner = body.get(envelope_key).unwrap_or(body);
    inner.get("result").unwrap_or(inner).clone()
}

/// Converts the token endpoint's relative-expiry response into an
/// [`OAuthTokens`] record with absolute timestamps.
fn parse_token_response(body: &Value) -> Result<OAuthTokens, AliexpressError> {
    let now = Utc::now();

    let access_token = body
        .get("access_token")
        .and_then(Value::as_str)
        .ok_or_else(|| AliexpressError::Deserialize {
            context: "token response".to_string(),
            source: serde::de::Error::custom("missing access_token"),
        })?
        .to_string();
    let refresh_token = body
        .get("refresh_token")
        .and_then(Value::as_str)
        .ok_or_else(|| AliexpressError::Deserialize {
            context: "token response".to_string(),
            source: serde::de::Error::custom("missing refresh_token"),
        })?
        .to_string();

    // The gateway reports both relative (`expires_in` seconds) and absolute
    // (`expire_time` epoch millis) forms depending on endpoint version;
    // prefer the absolute form when present.
    let access_expires_at = read_expiry(body, "expire_time", "expires_in", now, 3600)?;
    let refresh_expires_at = read_expiry(
        body,
        "refresh_token_valid_time",
        "refresh_expires_in",
        now,
        30 * 24 * 3600,
    )?;

    let account_id = body
        .get("user_id")
        .map(|v| v.to_string().trim_matches('"').to_string());

    Ok(OAuthTokens {
        access_token,
        refresh_token,
        access_expires_at,
        refresh_expires_at,
        account_id,
    })
}

fn read_expiry(
    body: &Value,
    absolute_key: &str,
    relative_key: &str,
    now: chrono::DateTime<Utc>,
    default_secs: i64,
) -> Result<chrono::DateTime<Utc>, AliexpressError> {
    if let Some(millis) = body.get(absolute_key).and_then(value_as_i64) {
        return chrono::DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
            AliexpressError::Deserialize {
                context: "token response".to_string(),
                source: serde::de::Error::custom(format!("{absolute_key} out of range")),
            }
        });
    }
    let secs = body
        .get(relative_key)
        .and_then(value_as_i64)
        .unwrap_or(default_secs);
    Ok(now + chrono::Duration::seconds(secs))
}

/// Token endpoints stringify numbers inconsistently; accept both forms.
fn value_as_i64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse::<i64>().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AliexpressConfig {
        AliexpressConfig {
            app_key: "12345".to_string(),
            app_secret: "secret".to_string(),
            gateway_url: "https://api-sg.aliexpress.com/sync".to_string(),
            timeout_secs: 30,
            user_agent: "dropsync/0.1".to_string(),
        }
    }

    #[test]
    fn gateway_params_include_system_fields_and_sign() {
        let client = AliexpressClient::new(test_config()).expect("client");
        let params = client
            .gateway_params(
                "aliexpress.ds.product.get",
                Some("sess-1"),
                &[("product_id", "42")],
            )
            .expect("params");

        assert_eq!(params.get("app_key").map(String::as_str), Some("12345"));
        assert_eq!(
            params.get("method").map(String::as_str),
            Some("aliexpress.ds.product.get")
        );
        assert_eq!(params.get("session").map(String::as_str), Some("sess-1"));
        assert_eq!(params.get("sign_method").map(String::as_str), Some("md5"));
        assert_eq!(params.get("product_id").map(String::as_str), Some("42"));
        let sign = params.get("sign").expect("sign present");
        assert_eq!(sign.len(), 32);
    }

    #[test]
    fn extract_result_unwraps_envelope_and_result() {
        let body = serde_json::json!({
            "aliexpress_ds_product_get_response": { "result": { "x": 1 } }
        });
        assert_eq!(
            extract_result(&body, "aliexpress_ds_product_get_response"),
            serde_json::json!({ "x": 1 })
        );
    }

    #[test]
    fn extract_result_tolerates_missing_result_level() {
        let body = serde_json::json!({
            "aliexpress_ds_product_get_response": { "x": 1 }
        });
        assert_eq!(
            extract_result(&body, "aliexpress_ds_product_get_response"),
            serde_json::json!({ "x": 1 })
        );
    }

    #[test]
    fn check_error_envelope_maps_to_api_error() {
        let body = serde_json::json!({
            "error_response": { "code": 7, "msg": "request frequency exceeded" }
        });
        let err = check_error_envelope(&body).expect_err("must error");
        assert!(matches!(err, AliexpressError::Api { .. }));
    }

    #[test]
    fn parse_token_response_with_relative_expiries() {
        let before = Utc::now();
        let tokens = parse_token_response(&serde_json::json!({
            "access_token": "a-1",
            "refresh_token": "r-1",
            "expires_in": 86400,
            "refresh_expires_in": 2_592_000,
            "user_id": 777
        }))
        .expect("parse");

        assert_eq!(tokens.access_token, "a-1");
        assert_eq!(tokens.account_id.as_deref(), Some("777"));
        let access_secs = (tokens.access_expires_at - before).num_seconds();
        assert!((86_390..=86_410).contains(&access_secs), "got {access_secs}");
    }

    #[test]
    fn parse_token_response_prefers_absolute_expiry() {
        let tokens = parse_token_response(&serde_json::json!({
            "access_token": "a-1",
            "refresh_token": "r-1",
            "expire_time": 1_700_000_000_000_i64,
            "expires_in": 10
        }))
        .expect("parse");
        assert_eq!(tokens.access_expires_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn parse_token_response_missing_tokens_is_deserialize_error() {
        let err = parse_token_response(&serde_json::json!({ "access_token": "a" }))
            .expect_err("must fail");
        assert!(matches!(err, AliexpressError::Deserialize { .. }));
    }
}

//! DeepL v2 client, used for short fields (titles) on locales DeepL covers.

use serde::Deserialize;

use crate::error::TranslateError;

pub struct DeeplClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translations: Vec<Translation>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct Translation {
    text: String,
}

impl DeeplClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            url: format!("{}/translate", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }

    /// Translates one plain-text field to a DeepL `target_lang` code
    /// (e.g. `"DE"`, `"EN-US"`).
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::Deepl`] on API errors or empty results,
    /// [`TranslateError::Http`] / [`TranslateError::Deserialize`] otherwise.
    pub async fn translate(
        &self,
        text: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError> {
        let response = self
            .client
            .post(&self.url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("DeepL-Auth-Key {}", self.api_key),
            )
            .form(&[("text", text), ("target_lang", target_lang)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // DeepL error bodies are `{"message": "..."}`; fall back to the
            // status line when the body is not JSON.
            let message = serde_json::from_str::<TranslateResponse>(&body)
                .ok()
                .and_then(|r| r.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(TranslateError::Deepl(message));
        }

        let parsed: TranslateResponse =
            serde_json::from_str(&body).map_err(|e| TranslateError::Deserialize {
                context: "DeepL translate response".to_string(),
                source: e,
            })?;

        parsed
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| TranslateError::Deepl("response contained no translations".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(base_url: &str) -> DeeplClient {
        DeeplClient::new(reqwest::Client::new(), base_url, "deepl-key")
    }

    #[tokio::test]
    async fn translate_returns_first_translation() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .and(header("authorization", "DeepL-Auth-Key deepl-key"))
            .and(body_string_contains("target_lang=DE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "translations": [
                    { "detected_source_language": "EN", "text": "Kabellose Ohrhörer" }
                ]
            })))
            .mount(&server)
            .await;

        let translated = client(&server.uri())
            .translate("Wireless Earbuds", "DE")
            .await
            .expect("translate");
        assert_eq!(translated, "Kabellose Ohrhörer");
    }

    #[tokio::test]
    async fn quota_error_message_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(456).set_body_json(serde_json::json!({
                "message": "Quota exceeded"
            })))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .translate("x", "DE")
            .await
            .expect_err("must fail");
        assert!(matches!(err, TranslateError::Deepl(ref m) if m == "Quota exceeded"));
    }
}

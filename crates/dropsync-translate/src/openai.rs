//! OpenAI chat-completions client for product copy translation.

use serde::{Deserialize, Serialize};

use crate::error::TranslateError;

/// Client for the chat-completions endpoint.
pub struct OpenAiClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl OpenAiClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client,
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// Translates one text field into the named target language.
    ///
    /// The system prompt pins the output to the translation alone — no
    /// commentary, markup preserved for HTML inputs — and temperature 0
    /// keeps repeated runs stable.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::OpenAi`] if the API reports an error or
    /// returns no choices, [`TranslateError::Http`] /
    /// [`TranslateError::Deserialize`] for transport and shape failures.
    pub async fn translate(
        &self,
        text: &str,
        target_language: &str,
        is_html: bool,
    ) -> Result<String, TranslateError> {
        let format_rule = if is_html {
            "The input is HTML; keep every tag and attribute unchanged and translate only the visible text."
        } else {
            "The input is plain text."
        };
        let system = format!(
            "You are a professional e-commerce translator. Translate the user's \
             product copy into {target_language}. {format_rule} Respond with the \
             translation only, no explanations or quotes."
        );

        let request = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| TranslateError::Deserialize {
                context: "chat completions response".to_string(),
                source: e,
            })?;

        if let Some(error) = parsed.error {
            return Err(TranslateError::OpenAi(error.message));
        }
        if !status.is_success() {
            return Err(TranslateError::OpenAi(format!("HTTP {status}")));
        }

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| TranslateError::OpenAi("response contained no choices".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new(reqwest::Client::new(), base_url, "sk-test", "gpt-4o-mini")
    }

    #[tokio::test]
    async fn translate_returns_first_choice() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_string_contains("gpt-4o-mini"))
            .and(body_string_contains("Wireless Earbuds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "Kabellose Ohrhörer " } }
                ]
            })))
            .mount(&server)
            .await;

        let translated = client(&server.uri())
            .translate("Wireless Earbuds", "German", false)
            .await
            .expect("translate");
        assert_eq!(translated, "Kabellose Ohrhörer");
    }

    #[tokio::test]
    async fn api_error_body_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "Rate limit reached", "type": "tokens" }
            })))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .translate("x", "German", false)
            .await
            .expect_err("must fail");
        assert!(matches!(err, TranslateError::OpenAi(ref m) if m.contains("Rate limit")));
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .translate("x", "German", false)
            .await
            .expect_err("must fail");
        assert!(matches!(err, TranslateError::OpenAi(_)));
    }
}

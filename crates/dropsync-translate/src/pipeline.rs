//! Per-locale translation pipeline.
//!
//! One product × one locale produces one [`TranslatedFields`]: the title and
//! the HTML description are translated as concurrent, independent calls and
//! joined before anything is written — the only fan-out in the system. The
//! localized slug is derived from the translated title, not translated
//! separately, so slug and title never drift apart.

use dropsync_core::{slugify, LocaleConfig};
use futures::future::OptionFuture;

use crate::deepl::DeeplClient;
use crate::error::TranslateError;
use crate::openai::OpenAiClient;

/// Source-language fields for one product.
#[derive(Debug, Clone, Copy)]
pub struct SourceFields<'a> {
    pub title: &'a str,
    pub description_html: Option<&'a str>,
}

/// Output of one product × locale translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedFields {
    pub title: String,
    pub description_html: Option<String>,
    pub slug: String,
    /// `"deepl+openai"`, `"openai"`, or `"deepl"` — recorded in the store's
    /// `translated_by` column.
    pub provider: String,
}

/// Provider set used for translation runs. Either client may be absent;
/// the pipeline picks per field and fails with
/// [`TranslateError::NoProvider`] when a locale cannot be served at all.
pub struct Translator {
    openai: Option<OpenAiClient>,
    deepl: Option<DeeplClient>,
}

impl Translator {
    #[must_use]
    pub fn new(openai: Option<OpenAiClient>, deepl: Option<DeeplClient>) -> Self {
        Self { openai, deepl }
    }

    /// Translates one product's fields into `locale`.
    ///
    /// Titles go to DeepL when the locale declares a `deepl_target` and a
    /// DeepL client is configured (short fields, cheap and precise);
    /// otherwise OpenAI. Descriptions always go to OpenAI because DeepL
    /// mangles vendor HTML. Both calls run concurrently and the first error
    /// cancels the pair.
    ///
    /// # Errors
    ///
    /// - [`TranslateError::NoProvider`] when neither provider can serve the
    ///   locale.
    /// - Provider/transport errors from the underlying clients.
    pub async fn translate_product(
        &self,
        source: SourceFields<'_>,
        locale: &LocaleConfig,
    ) -> Result<TranslatedFields, TranslateError> {
        let deepl_target = locale.deepl_target.as_deref().filter(|_| self.deepl.is_some());

        let title_via_deepl = deepl_target.is_some();
        if !title_via_deepl && self.openai.is_none() {
            return Err(TranslateError::NoProvider(locale.code.clone()));
        }
        if source.description_html.is_some() && self.openai.is_none() {
            return Err(TranslateError::NoProvider(locale.code.clone()));
        }

        let title_future = async {
            if let (Some(target), Some(deepl)) = (deepl_target, self.deepl.as_ref()) {
                deepl.translate(source.title, target).await
            } else if let Some(openai) = self.openai.as_ref() {
                openai.translate(source.title, &locale.name, false).await
            } else {
                Err(TranslateError::NoProvider(locale.code.clone()))
            }
        };

        let description_future: OptionFuture<_> = source
            .description_html
            .map(|html| {
                // Checked above: openai is present whenever a description exists.
                let openai = self.openai.as_ref().expect("openai client checked above");
                openai.translate(html, &locale.name, true)
            })
            .into();

        let (title, description) =
            futures::future::try_join(title_future, async move {
                description_future.await.transpose()
            })
            .await?;

        let provider = match (title_via_deepl, source.description_html.is_some()) {
            (true, true) => "deepl+openai",
            (true, false) => "deepl",
            (false, _) => "openai",
        };

        Ok(TranslatedFields {
            slug: slugify(&title),
            title,
            description_html: description,
            provider: provider.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn locale(code: &str, deepl_target: Option<&str>) -> LocaleConfig {
        LocaleConfig {
            code: code.to_string(),
            name: match code {
                "de" => "Deutsch".to_string(),
                _ => code.to_uppercase(),
            },
            deepl_target: deepl_target.map(ToString::to_string),
            enabled: true,
        }
    }

    async fn mock_openai(server: &MockServer, translated: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [ { "message": { "content": translated } } ]
            })))
            .mount(server)
            .await;
    }

    async fn mock_deepl(server: &MockServer, translated: &str) {
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "translations": [ { "text": translated } ]
            })))
            .mount(server)
            .await;
    }

    fn translator(server: &MockServer, with_openai: bool, with_deepl: bool) -> Translator {
        let http = reqwest::Client::new();
        Translator::new(
            with_openai.then(|| OpenAiClient::new(http.clone(), &server.uri(), "sk", "gpt-4o-mini")),
            with_deepl.then(|| DeeplClient::new(http.clone(), &server.uri(), "dk")),
        )
    }

    #[tokio::test]
    async fn splits_fields_across_providers() {
        let server = MockServer::start().await;
        mock_deepl(&server, "Kabellose Ohrhörer Pro").await;
        mock_openai(&server, "<p>Toller Klang.</p>").await;

        let result = translator(&server, true, true)
            .translate_product(
                SourceFields {
                    title: "Wireless Earbuds Pro",
                    description_html: Some("<p>Great sound.</p>"),
                },
                &locale("de", Some("DE")),
            )
            .await
            .expect("translate");

        assert_eq!(result.title, "Kabellose Ohrhörer Pro");
        assert_eq!(result.description_html.as_deref(), Some("<p>Toller Klang.</p>"));
        assert_eq!(result.slug, "kabellose-ohrhrer-pro");
        assert_eq!(result.provider, "deepl+openai");
    }

    #[tokio::test]
    async fn falls_back_to_openai_for_titles_without_deepl_target() {
        let server = MockServer::start().await;
        mock_openai(&server, "Słuchawki bezprzewodowe").await;

        let result = translator(&server, true, true)
            .translate_product(
                SourceFields {
                    title: "Wireless Earbuds",
                    description_html: None,
                },
                &locale("pl", None),
            )
            .await
            .expect("translate");

        assert_eq!(result.title, "Słuchawki bezprzewodowe");
        assert!(result.description_html.is_none());
        assert_eq!(result.provider, "openai");
    }

    #[tokio::test]
    async fn deepl_only_serves_title_only_products() {
        let server = MockServer::start().await;
        mock_deepl(&server, "Kabellose Ohrhörer").await;

        let result = translator(&server, false, true)
            .translate_product(
                SourceFields {
                    title: "Wireless Earbuds",
                    description_html: None,
                },
                &locale("de", Some("DE")),
            )
            .await
            .expect("translate");
        assert_eq!(result.provider, "deepl");
    }

    #[tokio::test]
    async fn description_without_openai_is_no_provider() {
        let server = MockServer::start().await;
        mock_deepl(&server, "Titel").await;

        let err = translator(&server, false, true)
            .translate_product(
                SourceFields {
                    title: "Title",
                    description_html: Some("<p>Body</p>"),
                },
                &locale("de", Some("DE")),
            )
            .await
            .expect_err("must fail");
        assert!(matches!(err, TranslateError::NoProvider(ref l) if l == "de"));
    }

    #[tokio::test]
    async fn no_providers_at_all_is_no_provider() {
        let err = Translator::new(None, None)
            .translate_product(
                SourceFields {
                    title: "Title",
                    description_html: None,
                },
                &locale("de", None),
            )
            .await
            .expect_err("must fail");
        assert!(matches!(err, TranslateError::NoProvider(_)));
    }

    #[tokio::test]
    async fn provider_error_fails_the_pair() {
        let server = MockServer::start().await;
        mock_deepl(&server, "Kabellose Ohrhörer").await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("Great sound"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": { "message": "server exploded" }
            })))
            .mount(&server)
            .await;

        let err = translator(&server, true, true)
            .translate_product(
                SourceFields {
                    title: "Wireless Earbuds",
                    description_html: Some("<p>Great sound.</p>"),
                },
                &locale("de", Some("DE")),
            )
            .await
            .expect_err("openai failure must fail the product");
        assert!(matches!(err, TranslateError::OpenAi(_)));
    }
}

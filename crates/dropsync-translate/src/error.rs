use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAi(String),

    #[error("DeepL API error: {0}")]
    Deepl(String),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// No configured provider can handle the requested locale.
    #[error("no translation provider available for locale '{0}'")]
    NoProvider(String),

    #[error("failed to read audit report {path}: {source}")]
    ReportIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("audit report {path} is malformed: {source}")]
    ReportMalformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

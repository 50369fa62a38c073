//! Translation providers, the per-locale pipeline, and the wrong-language
//! audit.

pub mod audit;
pub mod deepl;
pub mod error;
pub mod openai;
pub mod pipeline;

pub use audit::{audit_translations, AuditFinding, AuditInput, AuditReport, FlaggedField};
pub use deepl::DeeplClient;
pub use error::TranslateError;
pub use openai::OpenAiClient;
pub use pipeline::{SourceFields, TranslatedFields, Translator};

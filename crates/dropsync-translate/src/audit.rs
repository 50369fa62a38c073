//! Translation audit: find stored rows whose text is not in the locale's
//! language.
//!
//! The classifier is the coarse regex heuristic from `dropsync-core`; it
//! only flags rows it is confident about, so the audit under-reports rather
//! than producing false positives that a bulk fix would then "repair" into
//! damage. Findings are written to a JSON report consumed by the `fix`
//! command.

use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use dropsync_core::{detect_language, matches_locale};

use crate::error::TranslateError;

/// One stored translation row, as seen by the audit.
#[derive(Debug, Clone, Copy)]
pub struct AuditInput<'a> {
    pub product_id: i64,
    pub locale: &'a str,
    pub title: &'a str,
    pub description_html: Option<&'a str>,
}

/// Which stored field tripped the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlaggedField {
    Title,
    Description,
}

/// One row flagged as wrong-language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditFinding {
    pub product_id: i64,
    pub locale: String,
    pub field: FlaggedField,
    /// Locale code of the detected language, when the heuristic maps to one.
    pub detected_locale: Option<String>,
    /// First characters of the offending text, for human review.
    pub excerpt: String,
}

/// Audit output, serialized to `audit-results.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuditReport {
    pub generated_at: DateTime<Utc>,
    pub scanned: usize,
    pub findings: Vec<AuditFinding>,
}

const EXCERPT_LEN: usize = 120;

fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_LEN).collect()
}

/// Strips HTML tags so the language heuristic sees prose, not markup.
fn strip_tags(html: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is a valid regex"));
    tag.replace_all(html, " ").into_owned()
}

/// Classifies one row; `None` when nothing is confidently wrong.
fn audit_row(row: &AuditInput<'_>) -> Option<AuditFinding> {
    if matches_locale(row.title, row.locale) == Some(false) {
        return Some(AuditFinding {
            product_id: row.product_id,
            locale: row.locale.to_string(),
            field: FlaggedField::Title,
            detected_locale: detect_language(row.title)
                .locale_code()
                .map(ToString::to_string),
            excerpt: excerpt(row.title),
        });
    }

    if let Some(html) = row.description_html {
        let text = strip_tags(html);
        if matches_locale(&text, row.locale) == Some(false) {
            return Some(AuditFinding {
                product_id: row.product_id,
                locale: row.locale.to_string(),
                field: FlaggedField::Description,
                detected_locale: detect_language(&text)
                    .locale_code()
                    .map(ToString::to_string),
                excerpt: excerpt(text.trim()),
            });
        }
    }

    None
}

/// Audits a batch of stored rows.
#[must_use]
pub fn audit_translations(rows: &[AuditInput<'_>]) -> AuditReport {
    let findings = rows.iter().filter_map(audit_row).collect::<Vec<_>>();
    if !findings.is_empty() {
        tracing::warn!(
            flagged = findings.len(),
            scanned = rows.len(),
            "audit flagged wrong-language translations"
        );
    }
    AuditReport {
        generated_at: Utc::now(),
        scanned: rows.len(),
        findings,
    }
}

impl AuditReport {
    /// Writes the report as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::ReportIo`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), TranslateError> {
        let body = serde_json::to_vec_pretty(self).map_err(|e| TranslateError::ReportIo {
            path: path.display().to_string(),
            source: std::io::Error::other(e),
        })?;
        std::fs::write(path, body).map_err(|e| TranslateError::ReportIo {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Reads a report produced by [`AuditReport::save`].
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::ReportIo`] if the file cannot be read, or
    /// [`TranslateError::ReportMalformed`] if it does not parse.
    pub fn load(path: &Path) -> Result<Self, TranslateError> {
        let content = std::fs::read_to_string(path).map_err(|e| TranslateError::ReportIo {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| TranslateError::ReportMalformed {
            path: path.display().to_string(),
            source: e,
        })
    }
}

//! Regex language heuristics for the translation audit.
//!
//! This is deliberately a coarse classifier: it only needs to catch rows
//! whose stored text is obviously in the wrong language (e.g. German copy
//! stored under the `it` locale), not to identify arbitrary languages. Short
//! or ambiguous text yields [`DetectedLanguage::Unknown`] and is never
//! flagged.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedLanguage {
    English,
    German,
    French,
    Italian,
    Spanish,
    Dutch,
    Unknown,
}

impl DetectedLanguage {
    /// Locale code this language corresponds to, for audit reporting.
    #[must_use]
    pub fn locale_code(self) -> Option<&'static str> {
        match self {
            DetectedLanguage::English => Some("en"),
            DetectedLanguage::German => Some("de"),
            DetectedLanguage::French => Some("fr"),
            DetectedLanguage::Italian => Some("it"),
            DetectedLanguage::Spanish => Some("es"),
            DetectedLanguage::Dutch => Some("nl"),
            DetectedLanguage::Unknown => None,
        }
    }
}

/// Minimum number of function-word hits before a language is reported.
/// Below this the text is too short to classify reliably.
const MIN_HITS: usize = 3;

/// The winning language must beat the runner-up by this many hits, otherwise
/// the text is reported as [`DetectedLanguage::Unknown`].
const MIN_MARGIN: usize = 2;

struct LanguageMatcher {
    language: DetectedLanguage,
    pattern: &'static str,
    regex: OnceLock<Regex>,
}

impl LanguageMatcher {
    fn hits(&self, text: &str) -> usize {
        let regex = self.regex.get_or_init(|| {
            Regex::new(self.pattern).expect("language pattern is a valid regex")
        });
        regex.find_iter(text).count()
    }
}

/// High-frequency function words per language. Words shared between two
/// languages (e.g. `de` in Spanish/French/Dutch, `in` in English/German/
/// Italian/Dutch) are left out of whichever side would cause the most
/// cross-talk; margins handle the rest.
static MATCHERS: [LanguageMatcher; 6] = [
    LanguageMatcher {
        language: DetectedLanguage::English,
        pattern: r"(?i)\b(the|and|with|for|this|your|from|has|are|not)\b",
        regex: OnceLock::new(),
    },
    LanguageMatcher {
        language: DetectedLanguage::German,
        pattern: r"(?i)\b(und|der|die|das|mit|für|nicht|eine|ist|sind|auf|werden)\b",
        regex: OnceLock::new(),
    },
    LanguageMatcher {
        language: DetectedLanguage::French,
        pattern: r"(?i)\b(le|la|les|des|est|avec|pour|vous|une|dans|sont|votre)\b",
        regex: OnceLock::new(),
    },
    LanguageMatcher {
        language: DetectedLanguage::Italian,
        pattern: r"(?i)\b(il|gli|che|con|per|una|sono|questo|della|del|più|non)\b",
        regex: OnceLock::new(),
    },
    LanguageMatcher {
        language: DetectedLanguage::Spanish,
        pattern: r"(?i)\b(el|los|las|es|con|para|una|este|esta|del|más|son)\b",
        regex: OnceLock::new(),
    },
    LanguageMatcher {
        language: DetectedLanguage::Dutch,
        pattern: r"(?i)\b(het|een|van|met|voor|niet|deze|zijn|wordt|aan|je)\b",
        regex: OnceLock::new(),
    },
];

/// Classify the dominant language of `text`.
///
/// Returns [`DetectedLanguage::Unknown`] when no language scores at least
/// [`MIN_HITS`] matches, or when the top two languages are within
/// [`MIN_MARGIN`] of each other.
#[must_use]
pub fn detect_language(text: &str) -> DetectedLanguage {
    let mut scores: Vec<(DetectedLanguage, usize)> = MATCHERS
        .iter()
        .map(|m| (m.language, m.hits(text)))
        .collect();
    scores.sort_by(|a, b| b.1.cmp(&a.1));

    let (best_lang, best) = scores[0];
    let (_, second) = scores[1];

    if best < MIN_HITS || best - second < MIN_MARGIN {
        return DetectedLanguage::Unknown;
    }
    best_lang
}

/// Check whether `text` is plausibly written in the language of `locale`.
///
/// Returns `None` when the detector cannot commit to any language (short or
/// ambiguous text) or when the locale has no heuristic — callers must treat
/// that as "do not flag". `Some(false)` means the text confidently reads as a
/// different language than the locale claims.
#[must_use]
pub fn matches_locale(text: &str, locale: &str) -> Option<bool> {
    let expected = match locale {
        "en" => DetectedLanguage::English,
        "de" => DetectedLanguage::German,
        "fr" => DetectedLanguage::French,
        "it" => DetectedLanguage::Italian,
        "es" => DetectedLanguage::Spanish,
        "nl" => DetectedLanguage::Dutch,
        _ => return None,
    };

    match detect_language(text) {
        DetectedLanguage::Unknown => None,
        detected => Some(detected == expected),
    }
}

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One storefront locale as declared in `config/locales.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleConfig {
    /// Lowercase locale code used in URLs and database rows (e.g. `"de"`).
    pub code: String,
    /// Human-readable display name (e.g. `"Deutsch"`).
    pub name: String,
    /// DeepL `target_lang` code for this locale, when DeepL supports it.
    pub deepl_target: Option<String>,
    /// Disabled locales stay in the registry but are skipped by translation runs.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Parsed locale registry plus the vendor ship-to candidate order.
#[derive(Debug, Deserialize)]
pub struct LocalesFile {
    pub default: String,
    pub locales: Vec<LocaleConfig>,
    pub ship_to_countries: Vec<String>,
}

impl LocalesFile {
    /// Locales eligible for translation runs (enabled, excluding the default).
    #[must_use]
    pub fn target_locales(&self) -> Vec<&LocaleConfig> {
        self.locales
            .iter()
            .filter(|l| l.enabled && l.code != self.default)
            .collect()
    }

    /// Look up a locale by code, enabled or not.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&LocaleConfig> {
        self.locales.iter().find(|l| l.code == code)
    }
}

/// Load and validate the locale registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_locales(path: &Path) -> Result<LocalesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LocalesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let locales_file: LocalesFile = serde_yaml::from_str(&content)?;

    validate_locales(&locales_file)?;

    Ok(locales_file)
}

fn validate_locales(file: &LocalesFile) -> Result<(), ConfigError> {
    if file.locales.is_empty() {
        return Err(ConfigError::Validation(
            "locales list must be non-empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for locale in &file.locales {
        if locale.code.trim().is_empty() {
            return Err(ConfigError::Validation(
                "locale code must be non-empty".to_string(),
            ));
        }
        if locale.code != locale.code.to_lowercase() {
            return Err(ConfigError::Validation(format!(
                "locale code '{}' must be lowercase",
                locale.code
            )));
        }
        if !seen.insert(locale.code.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate locale code: '{}'",
                locale.code
            )));
        }
    }

    if !seen.contains(&file.default) {
        return Err(ConfigError::Validation(format!(
            "default locale '{}' is not declared in the locales list",
            file.default
        )));
    }

    if file.ship_to_countries.is_empty() {
        return Err(ConfigError::Validation(
            "ship_to_countries must list at least one candidate".to_string(),
        ));
    }

    let mut seen_countries = HashSet::new();
    for country in &file.ship_to_countries {
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::Validation(format!(
                "ship-to country '{country}' must be an uppercase ISO-3166 two-letter code"
            )));
        }
        if !seen_countries.insert(country.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate ship-to country: '{country}'"
            )));
        }
    }

    Ok(())
}

//! `translate` command: fill in missing (product, locale) translation rows.
//!
//! Source copy is the default-locale row seeded by `import`. For each source
//! row the command diffs the locale registry against the locales already
//! stored and translates the gap, one locale at a time; within a locale the
//! title and description calls run concurrently in the pipeline.

use clap::Args;

use dropsync_core::{AppConfig, LocaleConfig, LocalesFile};
use dropsync_db::ProductTranslationRow;
use dropsync_translate::{DeeplClient, OpenAiClient, SourceFields, Translator};

use crate::fail_run_best_effort;

#[derive(Debug, Args)]
pub struct TranslateArgs {
    /// Translate only this locale
    #[arg(long)]
    pub locale: Option<String>,

    /// Translate only this product (Shopify product id)
    #[arg(long = "product-id")]
    pub product_id: Option<i64>,

    /// Maximum number of source products to process
    #[arg(long, default_value_t = 50)]
    pub limit: i64,

    /// Re-translate locales that already have rows
    #[arg(long)]
    pub force: bool,

    /// Preview the work without calling providers or writing rows
    #[arg(long)]
    pub dry_run: bool,
}

pub(crate) fn build_translator(config: &AppConfig) -> anyhow::Result<Translator> {
    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.http_request_timeout_secs))
        .user_agent(&config.http_user_agent)
        .build()?;

    let openai = config
        .openai_api_key
        .as_deref()
        .map(|key| OpenAiClient::new(http.clone(), &config.openai_base_url, key, &config.openai_model));
    let deepl = config
        .deepl_api_key
        .as_deref()
        .map(|key| DeeplClient::new(http.clone(), &config.deepl_base_url, key));

    if openai.is_none() && deepl.is_none() {
        anyhow::bail!("no translation provider configured; set OPENAI_API_KEY and/or DEEPL_API_KEY");
    }
    Ok(Translator::new(openai, deepl))
}

/// Target locales still missing for one source row.
fn missing_locales<'a>(
    registry: &'a LocalesFile,
    locale_filter: Option<&str>,
    present: &[String],
    force: bool,
) -> Vec<&'a LocaleConfig> {
    registry
        .target_locales()
        .into_iter()
        .filter(|l| locale_filter.is_none_or(|f| l.code == f))
        .filter(|l| force || !present.iter().any(|p| p == &l.code))
        .collect()
}

/// Translate missing locales for imported products.
///
/// Per-pair failures are logged and skipped; the run fails only when every
/// attempted pair failed.
///
/// # Errors
///
/// Returns an error when no provider is configured, the locale registry
/// cannot be loaded, or the run cannot be recorded.
pub(crate) async fn run_translate(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    args: TranslateArgs,
) -> anyhow::Result<()> {
    let registry = dropsync_core::load_locales(&config.locales_path)?;

    if let Some(filter) = args.locale.as_deref() {
        if registry.get(filter).is_none() {
            anyhow::bail!("locale '{filter}' is not declared in {}", config.locales_path.display());
        }
    }

    let sources: Vec<ProductTranslationRow> = match args.product_id {
        Some(product_id) => dropsync_db::get_translation(pool, product_id, &registry.default)
            .await?
            .into_iter()
            .collect(),
        None => {
            dropsync_db::list_translations_for_audit(pool, Some(registry.default.as_str()), args.limit)
                .await?
        }
    };

    if sources.is_empty() {
        println!("no source rows found; run `import` first");
        return Ok(());
    }

    if args.dry_run {
        let mut pairs = 0usize;
        for source in &sources {
            let present =
                dropsync_db::list_locales_present_for_product(pool, source.product_id).await?;
            pairs += missing_locales(&registry, args.locale.as_deref(), &present, args.force).len();
        }
        println!(
            "dry-run: would translate {pairs} (product, locale) pairs across {} products",
            sources.len()
        );
        return Ok(());
    }

    let translator = build_translator(config)?;

    let run = dropsync_db::create_sync_run(pool, "translate", "cli").await?;
    if let Err(e) = dropsync_db::start_sync_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, "translate", format!("{e:#}")).await;
        return Err(e.into());
    }

    let mut translated: i32 = 0;
    let mut attempted: usize = 0;
    let mut failed: usize = 0;

    for source in &sources {
        let present = match dropsync_db::list_locales_present_for_product(pool, source.product_id)
            .await
        {
            Ok(present) => present,
            Err(e) => {
                tracing::error!(product_id = source.product_id, error = %e, "failed to list locales");
                failed += 1;
                attempted += 1;
                continue;
            }
        };

        for locale in missing_locales(&registry, args.locale.as_deref(), &present, args.force) {
            attempted += 1;
            match translate_pair(pool, &translator, source, locale).await {
                Ok(()) => translated = translated.saturating_add(1),
                Err(e) => {
                    tracing::error!(
                        product_id = source.product_id,
                        locale = %locale.code,
                        error = %e,
                        "translation failed — skipping pair"
                    );
                    failed += 1;
                }
            }
        }
    }

    if attempted == 0 {
        dropsync_db::complete_sync_run(pool, run.id, 0).await?;
        println!("nothing to translate; all locales present");
        return Ok(());
    }
    if failed == attempted {
        let message = format!("all {failed} translation pairs failed");
        fail_run_best_effort(pool, run.id, "translate", message.clone()).await;
        anyhow::bail!("{message}");
    }

    if let Err(err) = dropsync_db::complete_sync_run(pool, run.id, translated).await {
        let message = format!("{err:#}");
        fail_run_best_effort(pool, run.id, "translate", message).await;
        return Err(err.into());
    }
    println!("translated {translated} pairs ({failed} failed)");
    Ok(())
}

async fn translate_pair(
    pool: &sqlx::PgPool,
    translator: &Translator,
    source: &ProductTranslationRow,
    locale: &LocaleConfig,
) -> anyhow::Result<()> {
    let fields = translator
        .translate_product(
            SourceFields {
                title: &source.title,
                description_html: source.description_html.as_deref(),
            },
            locale,
        )
        .await?;

    let source_hash = source.source_hash.clone().unwrap_or_else(|| {
        dropsync_db::source_fingerprint(&source.title, source.description_html.as_deref())
    });

    dropsync_db::upsert_translation(
        pool,
        &dropsync_db::NewTranslation {
            product_id: source.product_id,
            locale: &locale.code,
            title: &fields.title,
            description_html: fields.description_html.as_deref(),
            handle_slug: Some(&fields.slug),
            source_hash: Some(&source_hash),
            translated_by: Some(&fields.provider),
        },
    )
    .await?;

    if let Some(handle) = source.handle_slug.as_deref() {
        dropsync_db::upsert_slug_mapping(pool, handle, &locale.code, &fields.slug).await?;
    }

    tracing::info!(
        product_id = source.product_id,
        locale = %locale.code,
        provider = %fields.provider,
        "stored translation"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> LocalesFile {
        let yaml = r"
default: en
locales:
  - code: en
    name: English
  - code: de
    name: Deutsch
    deepl_target: DE
  - code: fr
    name: Français
    deepl_target: FR
  - code: pl
    name: Polski
    enabled: false
ship_to_countries: [DE]
";
        serde_yaml::from_str(yaml).expect("parse registry")
    }

    fn codes(locales: &[&LocaleConfig]) -> Vec<String> {
        locales.iter().map(|l| l.code.clone()).collect()
    }

    #[test]
    fn missing_locales_excludes_present_and_disabled_and_default() {
        let registry = registry();
        let present = vec!["de".to_string()];
        let missing = missing_locales(&registry, None, &present, false);
        assert_eq!(codes(&missing), vec!["fr"]);
    }

    #[test]
    fn missing_locales_with_force_includes_present() {
        let registry = registry();
        let present = vec!["de".to_string()];
        let missing = missing_locales(&registry, None, &present, true);
        assert_eq!(codes(&missing), vec!["de", "fr"]);
    }

    #[test]
    fn missing_locales_filter_narrows_to_one() {
        let registry = registry();
        let missing = missing_locales(&registry, Some("fr"), &[], false);
        assert_eq!(codes(&missing), vec!["fr"]);
    }

    #[test]
    fn missing_locales_filter_on_present_locale_is_empty_without_force() {
        let registry = registry();
        let present = vec!["fr".to_string()];
        let missing = missing_locales(&registry, Some("fr"), &present, false);
        assert!(missing.is_empty());
    }
}

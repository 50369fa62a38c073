//! `audit` and `fix` commands.
//!
//! `audit` scans stored translations with the language heuristic and writes
//! `audit-results.json`; `fix` reads that report back and re-translates each
//! flagged (product, locale) pair from its default-locale source row. The
//! two commands are separate on purpose: the report is reviewable and
//! editable before any bulk LLM spend happens.

use std::path::PathBuf;

use clap::Args;

use dropsync_core::AppConfig;
use dropsync_translate::{audit_translations, AuditInput, AuditReport, SourceFields};

use crate::fail_run_best_effort;
use crate::translate::build_translator;

#[derive(Debug, Args)]
pub struct AuditArgs {
    /// Audit only this locale
    #[arg(long)]
    pub locale: Option<String>,

    /// Maximum number of rows to scan
    #[arg(long, default_value_t = 1000)]
    pub limit: i64,

    /// Report output path
    #[arg(long, default_value = "audit-results.json")]
    pub out: PathBuf,
}

#[derive(Debug, Args)]
pub struct FixArgs {
    /// Report produced by `audit`
    #[arg(long = "in", default_value = "audit-results.json")]
    pub input: PathBuf,

    /// Fix at most this many findings
    #[arg(long)]
    pub limit: Option<usize>,

    /// List what would be re-translated without calling providers
    #[arg(long)]
    pub dry_run: bool,
}

/// Scan stored translations and write the audit report.
///
/// # Errors
///
/// Returns an error if the rows cannot be read or the report cannot be
/// written.
pub(crate) async fn run_audit(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    args: AuditArgs,
) -> anyhow::Result<()> {
    let registry = dropsync_core::load_locales(&config.locales_path)?;
    let rows =
        dropsync_db::list_translations_for_audit(pool, args.locale.as_deref(), args.limit).await?;

    // The default locale holds source copy, not translations; auditing it
    // against itself would only produce noise.
    let inputs: Vec<AuditInput<'_>> = rows
        .iter()
        .filter(|row| row.locale != registry.default)
        .map(|row| AuditInput {
            product_id: row.product_id,
            locale: &row.locale,
            title: &row.title,
            description_html: row.description_html.as_deref(),
        })
        .collect();

    let report = audit_translations(&inputs);
    report.save(&args.out)?;

    println!(
        "scanned {} rows, flagged {}; report written to {}",
        report.scanned,
        report.findings.len(),
        args.out.display()
    );
    Ok(())
}

/// Re-translate rows flagged by a previous audit.
///
/// Per-finding failures are logged and skipped; the run fails when every
/// finding failed.
///
/// # Errors
///
/// Returns an error if the report cannot be read, no provider is
/// configured, or the run cannot be recorded.
pub(crate) async fn run_fix(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    args: FixArgs,
) -> anyhow::Result<()> {
    let registry = dropsync_core::load_locales(&config.locales_path)?;
    let report = AuditReport::load(&args.input)?;

    let take = args.limit.unwrap_or(usize::MAX);
    let findings: Vec<_> = report.findings.iter().take(take).collect();
    if findings.is_empty() {
        println!("report has no findings; nothing to fix");
        return Ok(());
    }

    if args.dry_run {
        for finding in &findings {
            println!(
                "would re-translate product {} locale {} ({:?} flagged, detected {})",
                finding.product_id,
                finding.locale,
                finding.field,
                finding.detected_locale.as_deref().unwrap_or("unknown")
            );
        }
        return Ok(());
    }

    let translator = build_translator(config)?;

    let run = dropsync_db::create_sync_run(pool, "fix", "cli").await?;
    if let Err(e) = dropsync_db::start_sync_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, "fix", format!("{e:#}")).await;
        return Err(e.into());
    }

    let mut fixed: i32 = 0;
    let mut failed: usize = 0;
    let total = findings.len();

    for finding in findings {
        let Some(locale) = registry.get(&finding.locale) else {
            tracing::warn!(
                product_id = finding.product_id,
                locale = %finding.locale,
                "finding references a locale no longer in the registry — skipping"
            );
            failed += 1;
            continue;
        };

        let source = match dropsync_db::get_translation(pool, finding.product_id, &registry.default)
            .await
        {
            Ok(Some(source)) => source,
            Ok(None) => {
                tracing::warn!(
                    product_id = finding.product_id,
                    "no source row for flagged product — skipping"
                );
                failed += 1;
                continue;
            }
            Err(e) => {
                tracing::error!(product_id = finding.product_id, error = %e, "failed to load source row");
                failed += 1;
                continue;
            }
        };

        let result = async {
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
                    product_id: finding.product_id,
                    locale: &locale.code,
                    title: &fields.title,
                    description_html: fields.description_html.as_deref(),
                    handle_slug: Some(&fields.slug),
                    source_hash: Some(&source_hash),
                    translated_by: Some(&fields.provider),
                },
            )
            .await?;
            Ok::<(), anyhow::Error>(())
        }
        .await;

        match result {
            Ok(()) => {
                fixed = fixed.saturating_add(1);
                tracing::info!(
                    product_id = finding.product_id,
                    locale = %finding.locale,
                    "re-translated flagged row"
                );
            }
            Err(e) => {
                tracing::error!(
                    product_id = finding.product_id,
                    locale = %finding.locale,
                    error = %e,
                    "fix failed — skipping finding"
                );
                failed += 1;
            }
        }
    }

    if failed == total {
        let message = format!("all {failed} findings failed to fix");
        fail_run_best_effort(pool, run.id, "fix", message.clone()).await;
        anyhow::bail!("{message}");
    }

    if let Err(err) = dropsync_db::complete_sync_run(pool, run.id, fixed).await {
        let message = format!("{err:#}");
        fail_run_best_effort(pool, run.id, "fix", message).await;
        return Err(err.into());
    }
    println!("re-translated {fixed} of {total} flagged rows");
    Ok(())
}

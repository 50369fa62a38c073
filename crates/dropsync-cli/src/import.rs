//! `import` command: vendor fetch with country fallback → Shopify push →
//! translation-store seed rows.

use std::time::Duration;

use clap::Args;

use dropsync_aliexpress::{
    fetch_with_country_fallback, AliexpressError, ErrorKind, FallbackPolicy, RequestPacer,
};
use dropsync_core::{AppConfig, NormalizedProduct};
use dropsync_shopify::{ProductInput, ShopifyClient, ShopifyConfig};

use crate::fail_run_best_effort;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Vendor product id to import (repeatable)
    #[arg(long = "product-id", required = true)]
    pub product_ids: Vec<i64>,

    /// Override the configured ship-to candidate list with one country
    #[arg(long)]
    pub ship_to: Option<String>,

    /// Import at most this many products from the given ids
    #[arg(long)]
    pub limit: Option<usize>,

    /// Preview what would be imported without writing anywhere
    #[arg(long)]
    pub dry_run: bool,

    /// Skip products with no EU-warehouse variant
    #[arg(long)]
    pub skip_non_eu: bool,

    /// Shopify product status for created products
    #[arg(long, default_value = "draft")]
    pub status: String,

    /// Publish created products to the storefront immediately
    #[arg(long)]
    pub publish: bool,
}

pub(crate) fn build_shopify_client(config: &AppConfig) -> anyhow::Result<ShopifyClient> {
    let shop_domain = config
        .shopify_shop_domain
        .clone()
        .ok_or_else(|| anyhow::anyhow!("SHOPIFY_SHOP_DOMAIN is not set"))?;
    let admin_token = config
        .shopify_admin_token
        .clone()
        .ok_or_else(|| anyhow::anyhow!("SHOPIFY_ADMIN_TOKEN is not set"))?;

    Ok(ShopifyClient::new(ShopifyConfig {
        shop_domain,
        admin_token,
        api_version: config.shopify_api_version.clone(),
        timeout_secs: config.http_request_timeout_secs,
        user_agent: config.http_user_agent.clone(),
        max_retries: config.http_max_retries,
        backoff_base_secs: config.http_retry_backoff_base_secs,
    })?)
}

/// Resolve the candidate ship-to list: an explicit `--ship-to` wins over the
/// registry order.
fn candidate_countries(override_country: Option<&str>, configured: &[String]) -> Vec<String> {
    match override_country {
        Some(country) => vec![country.trim().to_uppercase()],
        None => configured.to_vec(),
    }
}

/// Apply `--skip-non-eu`: keep only EU-warehouse variants, dropping the
/// product entirely when none remain.
fn filter_eu_variants(mut product: NormalizedProduct) -> Option<NormalizedProduct> {
    product.variants.retain(|v| v.eu_warehouse);
    if product.variants.is_empty() {
        None
    } else {
        Some(product)
    }
}

/// Import products from the vendor and push them to Shopify.
///
/// Per-product failures are logged and skipped; the run fails when every
/// product failed. [`ErrorKind::AuthorizationRequired`] halts the run
/// immediately — nothing downstream can succeed without a valid session.
///
/// # Errors
///
/// Returns an error when credentials are missing, the run cannot be
/// recorded, or the vendor session is terminally unauthorized.
pub(crate) async fn run_import(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    args: ImportArgs,
) -> anyhow::Result<()> {
    let locales = dropsync_core::load_locales(&config.locales_path)?;
    let countries = candidate_countries(args.ship_to.as_deref(), &locales.ship_to_countries);

    let take = args.limit.unwrap_or(usize::MAX);
    let product_ids: Vec<i64> = args.product_ids.iter().copied().take(take).collect();
    if product_ids.is_empty() {
        println!("no product ids to import");
        return Ok(());
    }

    if args.dry_run {
        println!(
            "dry-run: would import {} products via countries [{}] as status '{}'{}",
            product_ids.len(),
            countries.join(", "),
            args.status,
            if args.publish { ", published" } else { "" }
        );
        return Ok(());
    }

    let vendor = crate::auth::build_aliexpress_client(config)?;
    let store = crate::auth::token_store(config);
    let session = vendor.ensure_access_token(&store).await?;
    let shopify = build_shopify_client(config)?;
    let pacer = RequestPacer::new(config.vendor_requests_per_sec, config.vendor_burst);
    let policy = FallbackPolicy {
        unavailable_delay: Duration::from_millis(config.fallback_unavailable_delay_ms),
        rate_limit_delay: Duration::from_millis(config.fallback_rate_limit_delay_ms),
    };

    let run = dropsync_db::create_sync_run(pool, "import", "cli").await?;
    if let Err(e) = dropsync_db::start_sync_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, "import", format!("{e:#}")).await;
        return Err(e.into());
    }

    let mut imported: i32 = 0;
    let mut failed: usize = 0;
    let total = product_ids.len();

    for product_id in product_ids {
        match import_one(
            pool, &vendor, &session, &shopify, &pacer, policy, &countries, &locales, product_id,
            &args,
        )
        .await
        {
            Ok(true) => imported = imported.saturating_add(1),
            Ok(false) => failed += 1,
            Err(e) => {
                // A dead session poisons every remaining product; stop here.
                if matches!(
                    e.downcast_ref::<AliexpressError>(),
                    Some(err) if err.kind() == ErrorKind::AuthorizationRequired
                ) {
                    let message = format!("{e:#}");
                    fail_run_best_effort(pool, run.id, "import", message).await;
                    return Err(e);
                }
                tracing::error!(product_id, error = %e, "unexpected error importing product");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        tracing::warn!(failed, total, "some products failed during import");
    }
    if failed == total {
        let message = format!("all {failed} products failed import");
        fail_run_best_effort(pool, run.id, "import", message.clone()).await;
        anyhow::bail!("{message}");
    }

    if let Err(err) = dropsync_db::complete_sync_run(pool, run.id, imported).await {
        let message = format!("{err:#}");
        fail_run_best_effort(pool, run.id, "import", message).await;
        return Err(err.into());
    }
    println!("imported {imported} of {total} products");
    Ok(())
}

/// Imports a single product. `Ok(true)` = imported, `Ok(false)` = skipped
/// (logged), `Err` = unexpected failure for the caller to classify.
#[allow(clippy::too_many_arguments)]
async fn import_one(
    pool: &sqlx::PgPool,
    vendor: &dropsync_aliexpress::AliexpressClient,
    session: &str,
    shopify: &ShopifyClient,
    pacer: &RequestPacer,
    policy: FallbackPolicy,
    countries: &[String],
    locales: &dropsync_core::LocalesFile,
    product_id: i64,
    args: &ImportArgs,
) -> anyhow::Result<bool> {
    let outcome = fetch_with_country_fallback(countries, policy, |country| async move {
        pacer.acquire().await;
        vendor
            .get_product(session, product_id, &country, "EN", "EUR")
            .await
    })
    .await;

    let success = match outcome {
        Ok(success) => success,
        Err(AliexpressError::NotAvailableAnywhere { countries }) => {
            tracing::warn!(
                product_id,
                countries = countries.join(","),
                "product not available in any candidate country — skipping"
            );
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    let Some(normalized) = success.value.into_normalized(&success.country) else {
        tracing::warn!(product_id, "vendor payload missing base info — skipping");
        return Ok(false);
    };

    let normalized = if args.skip_non_eu {
        match filter_eu_variants(normalized) {
            Some(product) => product,
            None => {
                tracing::info!(product_id, "no EU-warehouse variant — skipping");
                return Ok(false);
            }
        }
    } else {
        normalized
    };

    let input = ProductInput::from_normalized(&normalized, &args.status, args.publish);
    let created = shopify.create_product(&input).await?;
    tracing::info!(
        product_id,
        shopify_id = created.id,
        country = %success.country,
        variants = normalized.variants.len(),
        "created Shopify product"
    );

    // Seed the default-locale row and slug mapping; translation runs build
    // on these. A failure here leaves Shopify and the store inconsistent —
    // there is no compensating delete, so make the mismatch loud.
    let source_hash = dropsync_db::source_fingerprint(
        &normalized.title,
        normalized.description_html.as_deref(),
    );
    let seed = dropsync_db::NewTranslation {
        product_id: created.id,
        locale: &locales.default,
        title: &normalized.title,
        description_html: normalized.description_html.as_deref(),
        handle_slug: Some(&created.handle),
        source_hash: Some(&source_hash),
        translated_by: Some("manual"),
    };
    let db_result = async {
        dropsync_db::upsert_translation(pool, &seed).await?;
        dropsync_db::upsert_slug_mapping(pool, &created.handle, &locales.default, &created.handle)
            .await?;
        Ok::<(), dropsync_db::DbError>(())
    }
    .await;

    if let Err(e) = db_result {
        tracing::error!(
            product_id,
            shopify_id = created.id,
            error = %e,
            "Shopify product created but translation store write failed — stores are now inconsistent"
        );
        return Err(e.into());
    }

    Ok(true)
}

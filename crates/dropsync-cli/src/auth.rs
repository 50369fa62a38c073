//! Vendor API authorization commands.

use clap::Subcommand;

use dropsync_aliexpress::{
    AliexpressClient, AliexpressConfig, FileTokenStore, TokenState, TokenStore,
};
use dropsync_core::AppConfig;

#[derive(Debug, Subcommand)]
pub enum AuthCommands {
    /// Report the current token state
    Status,
    /// Exchange a consent-flow authorization code for tokens
    Exchange {
        /// Authorization code from the vendor's consent redirect
        #[arg(long)]
        code: String,
    },
    /// Force a token refresh now
    Refresh,
}

/// Builds the vendor client from app config, failing with an actionable
/// message when credentials are missing.
pub(crate) fn build_aliexpress_client(config: &AppConfig) -> anyhow::Result<AliexpressClient> {
    let app_key = config
        .aliexpress_app_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("ALIEXPRESS_APP_KEY is not set"))?;
    let app_secret = config
        .aliexpress_app_secret
        .clone()
        .ok_or_else(|| anyhow::anyhow!("ALIEXPRESS_APP_SECRET is not set"))?;

    Ok(AliexpressClient::new(AliexpressConfig {
        app_key,
        app_secret,
        gateway_url: config.aliexpress_gateway_url.clone(),
        timeout_secs: config.http_request_timeout_secs,
        user_agent: config.http_user_agent.clone(),
    })?)
}

pub(crate) fn token_store(config: &AppConfig) -> FileTokenStore {
    FileTokenStore::new(config.aliexpress_token_path.clone())
}

pub(crate) async fn run_auth(config: &AppConfig, command: AuthCommands) -> anyhow::Result<()> {
    let store = token_store(config);

    match command {
        AuthCommands::Status => {
            match store.load()? {
                None => println!("unauthorized: no token record on disk"),
                Some(tokens) => {
                    let state = tokens.state();
                    let description = match state {
                        TokenState::AccessValid => "access token valid",
                        TokenState::AccessExpiredRefreshValid => {
                            "access token expired; refresh token still valid"
                        }
                        TokenState::AllExpired => {
                            "both tokens expired; re-run the authorization flow"
                        }
                        TokenState::Unauthorized => "unauthorized",
                    };
                    println!("{description}");
                    println!("  access expires:  {}", tokens.access_expires_at);
                    println!("  refresh expires: {}", tokens.refresh_expires_at);
                    if let Some(account) = &tokens.account_id {
                        println!("  account:         {account}");
                    }
                }
            }
            Ok(())
        }
        AuthCommands::Exchange { code } => {
            let client = build_aliexpress_client(config)?;
            let tokens = client.exchange_authorization_code(&code).await?;
            store.save(&tokens)?;
            println!(
                "authorized; access token valid until {}",
                tokens.access_expires_at
            );
            Ok(())
        }
        AuthCommands::Refresh => {
            let client = build_aliexpress_client(config)?;
            let Some(tokens) = store.load()? else {
                anyhow::bail!("no token record on disk; run `auth exchange --code <code>` first");
            };
            let refreshed = client.refresh_tokens(&tokens.refresh_token).await?;
            store.save(&refreshed)?;
            println!(
                "refreshed; access token valid until {}",
                refreshed.access_expires_at
            );
            Ok(())
        }
    }
}

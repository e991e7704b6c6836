//! Cache command - inspect and maintain the configured cache backend
//!
//! Entries for outbound URLs are addressed the same way `fetch` stores
//! them, so `inspect` and `purge` take a URL rather than a raw key.

use clap::{Args, Subcommand};
use serde_json::{Value, json};

use crate::domain::{CacheEntry, CacheExt, DomainError, FetchRequest};
use crate::infrastructure::fetch::CachedFetcher;
use crate::infrastructure::logging::{LoggingConfig, init_logging};

use super::fetch::{FormatArg, with_query_pairs};
use super::serve::load_config;

#[derive(Args, Clone, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum CacheAction {
    /// Backend name and entry count (scans the key prefix on Redis)
    Stats,

    /// Show the cached entry for a URL
    Inspect(EntryArgs),

    /// Delete the cached entry for a URL
    Purge(EntryArgs),

    /// Delete every entry under the key prefix
    Clear {
        /// Required; sessions and preferences are dropped too
        #[arg(long)]
        yes: bool,
    },
}

/// Identifies one cached outbound request
#[derive(Args, Clone, Debug)]
pub struct EntryArgs {
    pub url: String,

    /// Query parameter as `key=value` (repeatable)
    #[arg(long = "query", short = 'q')]
    pub query: Vec<String>,

    #[arg(long, value_enum, default_value_t = FormatArg::Json)]
    pub format: FormatArg,
}

impl EntryArgs {
    pub fn request(&self) -> anyhow::Result<FetchRequest> {
        let request = FetchRequest::new("cli", &self.url).with_format(self.format.into());
        with_query_pairs(request, &self.query)
    }
}

pub async fn run(args: CacheArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = load_config();
    init_logging(&LoggingConfig::from(&config.logging));

    let state = crate::create_app_state_with_config(&config).await?;
    let fetcher = &state.fetcher;

    let output = match &args.action {
        CacheAction::Stats => stats(fetcher).await?,
        CacheAction::Inspect(entry) => inspect(fetcher, &entry.request()?).await?,
        CacheAction::Purge(entry) => purge(fetcher, &entry.request()?).await?,
        CacheAction::Clear { yes: false } => {
            anyhow::bail!("Refusing to clear the cache without --yes")
        }
        CacheAction::Clear { yes: true } => clear(fetcher).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn stats(fetcher: &CachedFetcher) -> Result<Value, DomainError> {
    let cache = fetcher.cache();

    Ok(json!({
        "backend": cache.backend_name(),
        "entries": cache.size().await?,
    }))
}

async fn inspect(fetcher: &CachedFetcher, request: &FetchRequest) -> Result<Value, DomainError> {
    let key = fetcher.key_for(request);
    let cache = fetcher.cache();

    let Some(entry) = cache.get::<CacheEntry<Value>>(&key).await? else {
        return Ok(json!({"key": key, "exists": false}));
    };
    let expires_in = cache.ttl(&key).await?;

    Ok(json!({
        "key": key,
        "exists": true,
        "storedAt": entry.stored_at,
        "ttlSeconds": entry.ttl_seconds,
        "isStale": entry.is_stale(),
        "expiresInSeconds": expires_in.map(|d| d.as_secs()),
    }))
}

async fn purge(fetcher: &CachedFetcher, request: &FetchRequest) -> Result<Value, DomainError> {
    let key = fetcher.key_for(request);
    let deleted = fetcher.cache().delete(&key).await?;

    Ok(json!({"key": key, "deleted": deleted}))
}

async fn clear(fetcher: &CachedFetcher) -> Result<Value, DomainError> {
    let cache = fetcher.cache();
    let before = cache.size().await?;
    cache.clear().await?;

    Ok(json!({"backend": cache.backend_name(), "cleared": before}))
}

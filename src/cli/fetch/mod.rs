//! Fetch command - one cached fetch through the configured cache

use std::time::Duration;

use clap::{Args, ValueEnum};
use serde_json::{Value, json};

use crate::domain::{FetchFormat, FetchPolicy, FetchRequest, FetchResult};
use crate::infrastructure::logging::{LoggingConfig, init_logging};

use super::serve::load_config;

/// Response handling for the fetched URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Text,
    Exists,
}

impl From<FormatArg> for FetchFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Json => FetchFormat::Json,
            FormatArg::Text => FetchFormat::Text,
            FormatArg::Exists => FetchFormat::Exists,
        }
    }
}

/// Arguments for the fetch command
#[derive(Args, Clone, Debug)]
pub struct FetchArgs {
    /// URL to fetch
    pub url: String,

    /// Seconds before the cached value is stale
    #[arg(long, default_value_t = 300)]
    pub ttl: u64,

    /// Refetch stale values instead of serving them
    #[arg(long)]
    pub no_swr: bool,

    /// Skip the cache read and overwrite the entry
    #[arg(long)]
    pub bypass: bool,

    /// Extra query parameter as `key=value` (repeatable)
    #[arg(long = "query", short = 'q')]
    pub query: Vec<String>,

    #[arg(long, value_enum, default_value_t = FormatArg::Json)]
    pub format: FormatArg,

    /// Service label used in logs and metrics
    #[arg(long, default_value = "cli")]
    pub service: String,
}

impl FetchArgs {
    pub fn request(&self) -> anyhow::Result<FetchRequest> {
        let request = FetchRequest::new(&self.service, &self.url).with_format(self.format.into());
        with_query_pairs(request, &self.query)
    }

    pub fn policy(&self, stale_window: Duration) -> FetchPolicy {
        FetchPolicy::with_ttl(Duration::from_secs(self.ttl))
            .swr(!self.no_swr)
            .stale_window(stale_window)
            .bypass(self.bypass)
    }
}

/// Adds `key=value` pairs to the request's query
pub(crate) fn with_query_pairs(
    mut request: FetchRequest,
    pairs: &[String],
) -> anyhow::Result<FetchRequest> {
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Query parameter must be key=value: '{}'", pair))?;
        request = request.with_query(key, value);
    }

    Ok(request)
}

/// Run one cached fetch and print the result as JSON
pub async fn run(args: FetchArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = load_config();
    init_logging(&LoggingConfig::from(&config.logging));

    let state = crate::create_app_state_with_config(&config).await?;
    let request = args.request()?;
    let policy = args.policy(config.cache.stale_window());

    let result = state.fetcher.fetch_value(request, policy, None).await?;
    println!("{}", serde_json::to_string_pretty(&render(&result))?);

    Ok(())
}

fn render(result: &FetchResult<Value>) -> Value {
    json!({
        "status": result.status.as_header_value(),
        "isStale": result.is_stale,
        "data": result.data,
    })
}

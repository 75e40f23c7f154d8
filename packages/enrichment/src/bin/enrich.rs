//! Enrich email-keyed rows from the command line.
//!
//! Prints one JSON array of row results to stdout; progress goes to the log.
//!
//! ```text
//! enrich --email jane@wiz.io --fields fields.json
//! enrich --input rows.json --email-column "Work Email" --fields fields.json --concurrency 5
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use indexmap::IndexMap;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use enrichment::ai::OpenAI;
use enrichment::providers::{FirecrawlScraper, RateLimitedProvider, TavilySearch, WebCapabilityProvider};
use enrichment::{
    BatchEnricher, ChannelProgress, EnrichmentConfig, EnrichmentField, LlmExtractor, ProgressEvent, RowData,
    RowOrchestrator, SecretString,
};

#[derive(Parser)]
#[command(name = "enrich")]
#[command(about = "Fill company fields for email-keyed rows")]
struct Cli {
    /// Enrich a single email address
    #[arg(long, conflicts_with = "input")]
    email: Option<String>,

    /// JSON array of row objects
    #[arg(long, required_unless_present = "email")]
    input: Option<PathBuf>,

    /// JSON array of field definitions
    #[arg(long)]
    fields: PathBuf,

    /// Column holding the email address
    #[arg(long, default_value = "email")]
    email_column: String,

    /// Rows processed at once
    #[arg(long, default_value_t = 3)]
    concurrency: usize,

    /// Milliseconds between row starts
    #[arg(long, default_value_t = 1000)]
    row_delay_ms: u64,

    /// Provider requests per second, shared by all rows
    #[arg(long, default_value_t = 5)]
    requests_per_second: u32,
}

/// Settings loaded from environment variables.
struct Config {
    openai_api_key: SecretString,
    openai_model: Option<String>,
    tavily_api_key: SecretString,
    firecrawl_api_key: SecretString,
    content_cap: Option<usize>,
}

impl Config {
    fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            openai_api_key: env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set")?
                .into(),
            openai_model: env::var("OPENAI_MODEL").ok(),
            tavily_api_key: env::var("TAVILY_API_KEY")
                .context("TAVILY_API_KEY must be set")?
                .into(),
            firecrawl_api_key: env::var("FIRECRAWL_API_KEY")
                .context("FIRECRAWL_API_KEY must be set")?
                .into(),
            content_cap: env::var("ENRICHMENT_CONTENT_CAP")
                .ok()
                .map(|v| v.parse())
                .transpose()
                .context("ENRICHMENT_CONTENT_CAP must be a valid number")?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,enrichment=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let fields = read_fields(&cli.fields)?;
    let rows = match (&cli.email, &cli.input) {
        (Some(email), _) => vec![[(cli.email_column.clone(), email.clone())].into_iter().collect()],
        (None, Some(path)) => read_rows(path)?,
        (None, None) => bail!("either --email or --input is required"),
    };
    tracing::info!(rows = rows.len(), fields = fields.len(), "Input loaded");

    let searcher = TavilySearch::new(config.tavily_api_key).context("Failed to build Tavily client")?;
    let scraper = FirecrawlScraper::new(config.firecrawl_api_key).context("Failed to build Firecrawl client")?;
    let provider = RateLimitedProvider::new(WebCapabilityProvider::new(searcher, scraper), cli.requests_per_second);

    let mut model = OpenAI::new(config.openai_api_key);
    if let Some(name) = config.openai_model {
        model = model.with_model(name);
    }
    let extractor = LlmExtractor::new(model);

    let mut enrichment_config = EnrichmentConfig::default();
    if let Some(cap) = config.content_cap {
        enrichment_config = enrichment_config.with_content_cap(cap);
    }

    let orchestrator = Arc::new(RowOrchestrator::with_config(provider, extractor, enrichment_config));
    let batch = BatchEnricher::new(orchestrator)
        .with_concurrency(cli.concurrency)
        .with_row_delay(Duration::from_millis(cli.row_delay_ms));

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing current phases");
            ctrl_c.cancel();
        }
    });

    let (sink, mut events) = ChannelProgress::channel(0);
    let relay = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    let results = batch
        .enrich_rows(rows, &fields, &cli.email_column, Some(&sink), &cancel)
        .await;
    drop(sink);
    let _ = relay.await;

    let output = serde_json::to_string_pretty(&results).context("Failed to serialize results")?;
    println!("{}", output);

    Ok(())
}

fn read_fields(path: &Path) -> Result<Vec<EnrichmentField>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let fields: Vec<EnrichmentField> =
        serde_json::from_str(&raw).with_context(|| format!("{} is not a JSON array of fields", path.display()))?;
    if fields.is_empty() {
        bail!("{} defines no fields", path.display());
    }
    Ok(fields)
}

fn read_rows(path: &Path) -> Result<Vec<RowData>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let rows: Vec<IndexMap<String, Value>> =
        serde_json::from_str(&raw).with_context(|| format!("{} is not a JSON array of objects", path.display()))?;

    Ok(rows
        .into_iter()
        .map(|row| row.into_iter().map(|(column, value)| (column, cell_text(value))).collect())
        .collect())
}

fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn log_event(event: &ProgressEvent) {
    match event {
        ProgressEvent::Phase {
            row_index,
            message,
            severity,
        } => tracing::info!(row_index, severity = ?severity, "{}", message),
        ProgressEvent::Field {
            row_index,
            field,
            result,
        } => tracing::info!(
            row_index,
            field = %field,
            value = %result.value.display_string(),
            confidence = result.confidence,
            source = %result.source,
            "Field resolved"
        ),
    }
}

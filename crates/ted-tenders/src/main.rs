//! TED Tenders entry point.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use ted_tenders::config::{Config, DEFAULT_PORTAL_URL};
use ted_tenders::http_client::HttpClient;
use ted_tenders::renderer::Renderer;
use ted_tenders::{run_with_renderer, ChromiumRenderer, ExchangeRateApi, GoogleTranslator};

#[derive(Parser)]
#[command(
    name = "ted-tenders",
    about = "Extract procurement notices from the TED portal into a CSV file",
    version
)]
struct Cli {
    /// Full-text search keyword (product category).
    #[arg(short, long, default_value = "Adalimumab")]
    keyword: String,

    /// Publication year.
    #[arg(short, long, default_value_t = 2024)]
    year: u16,

    /// Notice scope (ACTIVE, ALL, LATEST).
    #[arg(long, default_value = "ACTIVE")]
    scope: String,

    /// ISO 4217 currency every value is converted to.
    #[arg(short, long, default_value = "INR")]
    currency: String,

    /// Language text fields are translated to.
    #[arg(short, long, default_value = "en")]
    language: String,

    /// Output CSV path. Defaults to `<keyword>_tenders_<year>.csv`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show the browser window.
    #[arg(long)]
    headed: bool,

    /// Chromium binary. Also reads TED_TENDERS_CHROMIUM_PATH.
    #[arg(long)]
    chromium: Option<PathBuf>,

    /// Portal root URL.
    #[arg(long, default_value = DEFAULT_PORTAL_URL)]
    portal_url: String,

    /// Stop after this many search result pages.
    #[arg(long, default_value_t = 50)]
    max_pages: u32,

    /// Minimum pause between two page loads, in milliseconds.
    #[arg(long, default_value_t = 3000)]
    pause_ms: u64,

    /// Extra wait after a page's content appears, in milliseconds.
    #[arg(long, default_value_t = 3000)]
    settle_ms: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut config = Config::default();
        config.search.keyword = self.keyword;
        config.search.year = self.year;
        config.search.scope = self.scope.to_ascii_uppercase();
        config.target_currency = self.currency.trim().to_ascii_uppercase();
        config.target_language = self.language.trim().to_ascii_lowercase();
        config.max_pages = self.max_pages;
        config.output = self
            .output
            .unwrap_or_else(|| config.search.default_output_path());
        config.portal.base_url = self.portal_url;
        config.portal.request_pause = Duration::from_millis(self.pause_ms);
        config.portal.settle_delay = Duration::from_millis(self.settle_ms);
        config.browser.headless = !self.headed;
        config.browser.chromium_path = self.chromium;
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.into_config();
    let output = config.output.clone();

    let http = HttpClient::new(config.services.timeout, &config.browser.user_agent);
    let translator = Arc::new(GoogleTranslator::new(
        http.clone(),
        config.services.translate_url.clone(),
    ));
    let converter = Arc::new(ExchangeRateApi::new(
        http,
        config.services.exchange_rate_url.clone(),
    ));

    let renderer = ChromiumRenderer::launch(&config.browser)
        .await
        .context("failed to start the browser")?;

    let result = run_with_renderer(&renderer, translator, converter, config).await;
    if let Err(e) = renderer.shutdown().await {
        tracing::warn!("browser shutdown failed: {e}");
    }
    let outcome = result?;

    if outcome.export(&output)? {
        println!(
            "Exported {} notices to {}",
            outcome.table.len(),
            output.display()
        );
    } else {
        println!("No notices found; nothing written");
    }
    let stats = &outcome.stats;
    println!(
        "  Pages: {}  Found: {}  Visited: {}  Skipped: {}",
        stats.pages_visited,
        stats.notices_found,
        stats.notices_visited,
        stats.render_failures + stats.missing_fields + stats.invalid_ids
    );
    if stats.translation_fallbacks + stats.conversion_fallbacks > 0 {
        println!(
            "  Kept original text {} times, original value {} times",
            stats.translation_fallbacks, stats.conversion_fallbacks
        );
    }

    Ok(())
}

//! # gnews_scraper
//!
//! Command-line front end: renders a Google News search or topic page,
//! extracts its articles and prints them as JSON.
//!
//! ## Usage
//!
//! ```sh
//! BROWSERLESS_URL=http://localhost:3000 gnews_scraper -s "rust" -l 10
//! ```

use clap::Parser;
use gnews_scraper::config::DEFAULT_LOG_LEVEL;
use gnews_scraper::outputs::json;
use gnews_scraper::{UserConfig, scrape_news};
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    let file_config = match &args.config {
        Some(path) => UserConfig::load(path).await?,
        None => UserConfig::default(),
    };
    let user = file_config.overridden_by(args.user_config());

    // --- Tracing init ---
    let level = user
        .log_level
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    debug!(?args, "Parsed CLI arguments");

    let articles = match scrape_news(user).await {
        Ok(articles) => articles,
        Err(e) => {
            error!(error = %e, "Scrape failed");
            return Err(e.into());
        }
    };

    match &args.output {
        Some(path) => json::write_articles(&articles, path).await?,
        None => json::print_articles(&articles).await?,
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        count = articles.len(),
        "Execution complete"
    );

    Ok(())
}

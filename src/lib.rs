//! # gnews_scraper
//!
//! Extracts normalized article records from rendered Google News search and
//! topic pages.
//!
//! ## Pipeline
//!
//! 1. **Config**: caller options merged over defaults ([`ScraperConfig`])
//! 2. **URL**: base endpoint plus an ordered query string ([`query`])
//! 3. **Render**: a [`Browser`] page configured with viewport, user agent,
//!    navigation headers and consent cookie loads the URL
//! 4. **Extract**: one of two layout strategies turns the HTML into records
//!    ([`extract`])
//! 5. **Resolve** (optional): click-through links become publisher URLs,
//!    concurrently ([`resolve`])
//! 6. **Enrich** (optional): body text fetched per record and filtered by
//!    keywords ([`enrich`])
//! 7. **Assemble**: untitled records dropped, result ceiling applied
//!    ([`assemble`])
//!
//! ## Usage
//!
//! ```ignore
//! let articles = gnews_scraper::scrape_news(UserConfig {
//!     search_term: Some("rust programming".into()),
//!     limit: Some(10),
//!     ..Default::default()
//! })
//! .await?;
//! ```

pub mod assemble;
pub mod browser;
pub mod config;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod models;
pub mod outputs;
pub mod query;
pub mod resolve;
pub mod utils;

pub use assemble::assemble_results;
pub use browser::browserless::BrowserlessBrowser;
pub use browser::{Browser, BrowserPage, LaunchOptions};
pub use config::{ScraperConfig, UserConfig};
pub use enrich::KeywordFilter;
pub use error::{BrowserError, ResolveError, ScrapeError};
pub use extract::extract_articles;
pub use models::{Article, QueryVars};
pub use resolve::{HttpLinkResolver, LinkResolver};

use browser::{
    CONSENT_REJECT_SELECTOR, Cookie, DEFAULT_USER_AGENT, Viewport, WaitUntil, navigation_headers,
};
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

/// Scrape one listing page with the given browser and link resolver.
///
/// The browser and its page are closed on every exit path. Only failures to
/// open, configure or load the listing page are returned as errors; per-record
/// problems shrink or annotate the result instead.
#[instrument(level = "info", skip_all)]
pub async fn scrape<B, R>(browser: B, resolver: &R, user: UserConfig) -> error::Result<Vec<Article>>
where
    B: Browser,
    R: LinkResolver,
{
    let config = ScraperConfig::from_user(user);
    let url = query::build_search_url(&config);
    info!(%url, "Scraping news");

    let mut page = match browser.new_page().await {
        Ok(page) => page,
        Err(e) => {
            close_browser(browser).await;
            return Err(e.into());
        }
    };

    let outcome = collect_articles(&mut page, resolver, &config, &url).await;

    if let Err(e) = page.close().await {
        warn!(error = %e, "Failed to close page");
    }
    close_browser(browser).await;

    let articles = outcome?;
    let results = assemble_results(articles, config.limit);
    info!(count = results.len(), "Scrape complete");
    Ok(results)
}

/// Scrape using the bundled Browserless driver and HTTP link resolver, both
/// built from `user`.
pub async fn scrape_news(user: UserConfig) -> error::Result<Vec<Article>> {
    let config = ScraperConfig::from_user(user.clone());
    let browser = BrowserlessBrowser::launch(&LaunchOptions {
        endpoint: config.browser_url.clone(),
        token: config.browser_token.clone(),
        headless: config.headless,
        args: config.browser_args.clone(),
    })?;
    let resolver = HttpLinkResolver::new()?;
    scrape(browser, &resolver, user).await
}

async fn close_browser<B: Browser>(browser: B) {
    if let Err(e) = browser.close().await {
        warn!(error = %e, "Failed to close browser");
    }
}

async fn collect_articles<P, R>(
    page: &mut P,
    resolver: &R,
    config: &ScraperConfig,
    url: &str,
) -> error::Result<Vec<Article>>
where
    P: BrowserPage,
    R: LinkResolver,
{
    page.set_viewport(Viewport::default()).await?;
    page.set_user_agent(DEFAULT_USER_AGENT).await?;
    page.set_extra_headers(navigation_headers()).await?;
    page.set_cookie(Cookie::consent(Utc::now())).await?;

    page.goto(url, WaitUntil::NetworkIdle2).await?;
    dismiss_consent(page).await;

    let html = page.content().await?;
    let mut articles = extract_articles(&html);
    info!(count = articles.len(), "Extracted articles");

    if config.pretty_urls {
        articles = resolve::resolve_links(resolver, articles).await;
    }

    if config.get_article_content {
        let filter = KeywordFilter::with_options(
            config.filter_words.clone(),
            config.filter_case_sensitive,
            config.filter_whole_word,
        );
        articles = enrich::enrich_articles(page, articles, &filter).await;
    }

    Ok(articles)
}

/// Click "Reject all" on the consent interstitial if it is showing.
async fn dismiss_consent<P: BrowserPage>(page: &mut P) {
    match page
        .click_and_wait(CONSENT_REJECT_SELECTOR, WaitUntil::NetworkIdle2)
        .await
    {
        Ok(()) => debug!("Dismissed consent dialog"),
        Err(BrowserError::ElementNotFound(_)) => debug!("No consent dialog shown"),
        Err(e) => debug!(error = %e, "Consent dialog not dismissed"),
    }
}

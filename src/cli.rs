//! Command-line interface definitions for gnews_scraper.
//!
//! Flags map onto [`UserConfig`] fields; anything left unset falls through to
//! the optional config file and then to the library defaults.

use clap::Parser;
use gnews_scraper::utils::parse_key_value;
use gnews_scraper::{QueryVars, UserConfig};

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Search the last day of coverage
/// gnews_scraper -s "climate" -t 1d
///
/// # A topic page with locale parameters, written to a file
/// gnews_scraper --base-url https://news.google.com/topics/CAAqIggK... \
///     -q hl=en-US -q gl=US -q ceid=US:en -l 10 -o topic.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Search term, sent as the `q` parameter
    #[arg(short, long)]
    pub search_term: Option<String>,

    /// Timeframe, sent as the `when` parameter (e.g. 1h, 1d, 7d)
    #[arg(short, long)]
    pub timeframe: Option<String>,

    /// Extra query parameter as key=value (repeatable)
    #[arg(short = 'q', long = "query-var", value_parser = parse_key_value)]
    pub query_vars: Vec<(String, String)>,

    /// Listing page to scrape instead of the search endpoint
    #[arg(long)]
    pub base_url: Option<String>,

    /// Keep aggregator links instead of resolving publisher URLs
    #[arg(long)]
    pub no_pretty_urls: bool,

    /// Fetch each article's body text
    #[arg(long)]
    pub article_content: bool,

    /// Keep only articles whose body mentions one of these words (repeatable)
    #[arg(short = 'w', long = "filter-word")]
    pub filter_words: Vec<String>,

    /// Match filter words case-sensitively
    #[arg(long)]
    pub filter_case_sensitive: bool,

    /// Match filter words on word boundaries only
    #[arg(long)]
    pub filter_whole_word: bool,

    /// Maximum number of articles to return
    #[arg(short, long)]
    pub limit: Option<i64>,

    /// Optional path to a YAML or JSON config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Browserless endpoint
    #[arg(long, env = "BROWSERLESS_URL")]
    pub browser_url: Option<String>,

    /// Browserless API token
    #[arg(long, env = "BROWSERLESS_TOKEN")]
    pub browser_token: Option<String>,

    /// Extra Chrome flag passed at launch (repeatable)
    #[arg(long = "browser-arg", allow_hyphen_values = true)]
    pub browser_args: Vec<String>,

    /// Run the browser with a visible window
    #[arg(long)]
    pub headed: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long)]
    pub log_level: Option<String>,

    /// Write the JSON result to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

impl Cli {
    /// Options explicitly given on the command line.
    pub fn user_config(&self) -> UserConfig {
        let query_vars = (!self.query_vars.is_empty())
            .then(|| self.query_vars.iter().cloned().collect::<QueryVars>());
        let non_empty = |v: &Vec<String>| (!v.is_empty()).then(|| v.clone());

        UserConfig {
            search_term: self.search_term.clone(),
            timeframe: self.timeframe.clone(),
            query_vars,
            base_url: self.base_url.clone(),
            pretty_urls: self.no_pretty_urls.then_some(false),
            get_article_content: self.article_content.then_some(true),
            filter_words: non_empty(&self.filter_words),
            filter_case_sensitive: self.filter_case_sensitive.then_some(true),
            filter_whole_word: self.filter_whole_word.then_some(true),
            limit: self.limit,
            browser_args: non_empty(&self.browser_args),
            headless: self.headed.then_some(false),
            log_level: self.log_level.clone(),
            browser_url: self.browser_url.clone(),
            browser_token: self.browser_token.clone(),
        }
    }
}

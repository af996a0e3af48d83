//! Click-through link resolution.
//!
//! Listing pages link to `news.google.com/read/<id>` (or `/articles/<id>`)
//! rather than to the publisher. [`HttpLinkResolver`] turns those into the
//! publisher URL:
//!
//! 1. Older ids are base64url-encoded protobuf that embeds the target URL
//!    directly, so they decode without any request.
//! 2. Otherwise the link is fetched; a redirect chain that ends off Google
//!    hosts is taken as the answer.
//! 3. Otherwise the landing page's `data-n-au` attribute carries the URL.
//!
//! A failed resolution is never fatal: [`resolve_links`] keeps the original
//! link for that record.

use crate::browser::DEFAULT_USER_AGENT;
use crate::error::ResolveError;
use crate::extract::fields::selector;
use crate::models::Article;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use futures::future::join_all;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

const AGGREGATOR_HOST: &str = "news.google.com";
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 10;
/// Field 4, wire type 2 (length-delimited).
const URL_FIELD_TAG: u8 = 0x22;

static PUBLISHER_URL_ATTR: Lazy<Selector> = Lazy::new(|| selector("[data-n-au]"));

/// Resolves one aggregator link to a publisher URL.
#[allow(async_fn_in_trait)]
pub trait LinkResolver {
    /// Resolve `link`.
    ///
    /// # Returns
    ///
    /// The publisher URL, or the reason it could not be found. Callers keep
    /// the original link on error.
    async fn resolve(&self, link: &str) -> Result<String, ResolveError>;
}

/// Resolve every record's link concurrently and wait for all attempts to
/// settle. Records whose resolution fails keep their link unchanged.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn resolve_links<R: LinkResolver>(resolver: &R, articles: Vec<Article>) -> Vec<Article> {
    let outcomes = join_all(articles.iter().map(|a| resolver.resolve(&a.link))).await;

    let mut resolved = 0usize;
    let articles: Vec<Article> = articles
        .into_iter()
        .zip(outcomes)
        .map(|(mut article, outcome)| {
            match outcome {
                Ok(url) => {
                    resolved += 1;
                    article.link = url;
                }
                Err(e) => debug!(link = %article.link, error = %e, "Keeping unresolved link"),
            }
            article
        })
        .collect();

    info!(resolved, total = articles.len(), "Resolved article links");
    articles
}

/// Resolver backed by plain HTTP requests.
#[derive(Debug, Clone)]
pub struct HttpLinkResolver {
    client: reqwest::Client,
}

impl HttpLinkResolver {
    /// Build the HTTP client used for every resolution.
    ///
    /// # Returns
    ///
    /// The resolver, or [`ResolveError::Request`] if the client cannot be
    /// built (e.g. no TLS backend).
    pub fn new() -> Result<Self, ResolveError> {
        let client = reqwest::Client::builder()
            .timeout(RESOLVE_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl HttpLinkResolver {
    /// Fetch `link` and find the publisher URL it leads to.
    ///
    /// A redirect chain that ends off Google hosts is the answer. Otherwise
    /// the landing page (often a Google interstitial) must carry the target in
    /// a `data-n-au` attribute.
    ///
    /// # Arguments
    ///
    /// * `link` - Absolute URL to request
    ///
    /// # Returns
    ///
    /// The publisher URL, [`ResolveError::Request`] for transport failures
    /// and non-2xx landing pages, or [`ResolveError::Unresolved`] when the
    /// page names no target.
    async fn fetch_publisher_url(&self, link: &str) -> Result<String, ResolveError> {
        let requested = Url::parse(link).map_err(|_| ResolveError::InvalidUrl(link.to_string()))?;
        let resp = self.client.get(requested.clone()).send().await?;

        let landed = resp.url().clone();
        if landed != requested && landed.host_str().is_some_and(|host| !is_google_host(host)) {
            debug!(url = %landed, "Followed redirect to publisher");
            return Ok(landed.to_string());
        }

        let status = resp.status();
        if !status.is_success() {
            return Err(ResolveError::Request(format!("status {status} for {link}")));
        }
        let body = resp.text().await?;
        let target = publisher_url_from_html(&body)
            .ok_or_else(|| ResolveError::Unresolved(link.to_string()))?;
        validate_url(&target)
    }
}

impl LinkResolver for HttpLinkResolver {
    #[instrument(level = "debug", skip(self))]
    async fn resolve(&self, link: &str) -> Result<String, ResolveError> {
        let id = article_id(link).ok_or_else(|| ResolveError::NotAggregatorLink(link.to_string()))?;

        if let Some(url) = decode_inline_url(id) {
            debug!(%url, "Decoded publisher URL from article id");
            return Ok(url);
        }

        self.fetch_publisher_url(link).await
    }
}

/// The article id of an aggregator click-through link.
pub fn article_id(link: &str) -> Option<&str> {
    let parsed = Url::parse(link).ok()?;
    if parsed.host_str() != Some(AGGREGATOR_HOST) {
        return None;
    }
    // slice the id out of the original string so it can be borrowed
    let path = link.split(['?', '#']).next()?;
    let mut segments = path.rsplit('/');
    let id = segments.next()?;
    let kind = segments.next()?;
    (matches!(kind, "read" | "articles") && !id.is_empty()).then_some(id)
}

/// Decode a publisher URL embedded in an old-style article id.
///
/// Such ids are base64url protobuf messages whose length-delimited field 4
/// (tag byte `0x22`) holds the URL. The field's varint length prefix decides
/// where the URL ends, so trailing fields never leak into it.
///
/// # Arguments
///
/// * `id` - The last path segment of a `/read/` or `/articles/` link
///
/// # Returns
///
/// The embedded `http(s)` URL, or `None` for newer opaque ids.
pub fn decode_inline_url(id: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(id.trim_end_matches('=')).ok()?;

    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == URL_FIELD_TAG)
        .find_map(|(at, _)| {
            let (len, prefix) = read_varint(&bytes[at + 1..])?;
            let start = at + 1 + prefix;
            let end = start.checked_add(usize::try_from(len).ok()?)?;
            let field = bytes.get(start..end)?;
            if !field.starts_with(b"http") {
                return None;
            }
            let candidate = std::str::from_utf8(field).ok()?;
            validate_url(candidate).ok()
        })
}

/// Protobuf base-128 varint: the value and how many bytes it took.
fn read_varint(bytes: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    for (i, byte) in bytes.iter().take(10).enumerate() {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

/// First `data-n-au` value on a landing page.
pub fn publisher_url_from_html(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&PUBLISHER_URL_ATTR)
        .filter_map(|el| el.value().attr("data-n-au"))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Whether `host` belongs to Google, which the publisher never does.
///
/// Subdomains count (`consent.google.com`, `lh3.googleusercontent.com`).
pub fn is_google_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    ["google.com", "gstatic.com", "googleusercontent.com", "googleapis.com"]
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
}

fn validate_url(candidate: &str) -> Result<String, ResolveError> {
    match Url::parse(candidate) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url.to_string()),
        _ => Err(ResolveError::InvalidUrl(candidate.to_string())),
    }
}

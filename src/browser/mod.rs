//! Browser driver seam.
//!
//! The pipeline only needs a handful of page operations: configure the
//! session, navigate, optionally click through a consent dialog, and read the
//! rendered HTML. [`Browser`] and [`BrowserPage`] capture that surface so the
//! extraction logic never depends on a particular automation backend.
//!
//! [`browserless::BrowserlessBrowser`] is the bundled implementation.
//!
//! # Navigation setup
//!
//! Before loading a listing page the pipeline configures:
//! - a 1366x768 [`Viewport`]
//! - [`DEFAULT_USER_AGENT`], a desktop Chrome string
//! - [`navigation_headers`], sent with top-level navigations only
//! - the [`Cookie::consent`] cookie, which pre-answers the EU consent wall
//!
//! and waits for [`WaitUntil::NetworkIdle2`]. If the consent wall shows
//! anyway, [`CONSENT_REJECT_SELECTOR`] is clicked.

pub mod browserless;

use crate::error::BrowserError;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/78.0.3904.108 Safari/537.36";

/// Selector of the "Reject all" button on the consent interstitial.
pub const CONSENT_REJECT_SELECTOR: &str = r#"[aria-label="Reject all"]"#;

/// When a navigation counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitUntil {
    Load,
    DomContentLoaded,
    NetworkIdle0,
    /// No more than two open connections for 500ms.
    #[default]
    NetworkIdle2,
}

impl WaitUntil {
    /// Puppeteer's name for the condition.
    pub fn as_str(self) -> &'static str {
        match self {
            WaitUntil::Load => "load",
            WaitUntil::DomContentLoaded => "domcontentloaded",
            WaitUntil::NetworkIdle0 => "networkidle0",
            WaitUntil::NetworkIdle2 => "networkidle2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1366,
            height: 768,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
}

impl Cookie {
    /// Pre-accepted consent cookie for Google properties, dated `now`.
    pub fn consent(now: DateTime<Utc>) -> Self {
        Self {
            name: "CONSENT".to_string(),
            value: format!("YES+cb.{}-04-p0.en-GB+FX+667", now.format("%Y%m%d")),
            domain: ".google.com".to_string(),
        }
    }
}

/// Headers sent with top-level navigation requests.
///
/// # Returns
///
/// `Accept`, `Accept-Encoding`, `Accept-Language`,
/// `Upgrade-Insecure-Requests` and `Referer` pairs, in that order.
pub fn navigation_headers() -> Vec<(String, String)> {
    [
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3",
        ),
        ("Accept-Encoding", "gzip"),
        ("Accept-Language", "en-US,en;q=0.9,es;q=0.8"),
        ("Upgrade-Insecure-Requests", "1"),
        ("Referer", "https://www.google.com/"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Options used when launching a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Endpoint of the remote browser service.
    pub endpoint: String,
    pub token: Option<String>,
    pub headless: bool,
    /// Extra Chrome command-line flags.
    pub args: Vec<String>,
}

/// A launched browser that hands out pages.
///
/// The pipeline drives one browser per invocation from a single task, so the
/// returned futures carry no `Send` bound.
#[allow(async_fn_in_trait)]
pub trait Browser {
    /// The page type this browser opens.
    type Page: BrowserPage;

    /// Open a fresh page with default settings.
    ///
    /// # Returns
    ///
    /// The new page, or an error if the browser refused to open one.
    async fn new_page(&self) -> Result<Self::Page, BrowserError>;

    /// Release the browser and everything it holds.
    async fn close(self) -> Result<(), BrowserError>;
}

/// One navigation context. Not safe to share between concurrent navigations.
///
/// Settings (`set_*`) apply to every later navigation of the page.
#[allow(async_fn_in_trait)]
pub trait BrowserPage {
    async fn set_viewport(&mut self, viewport: Viewport) -> Result<(), BrowserError>;

    async fn set_user_agent(&mut self, user_agent: &str) -> Result<(), BrowserError>;

    /// Extra headers attached to main-frame navigation requests only.
    async fn set_extra_headers(&mut self, headers: Vec<(String, String)>)
        -> Result<(), BrowserError>;

    /// Add `cookie`, replacing any cookie with the same name and domain.
    async fn set_cookie(&mut self, cookie: Cookie) -> Result<(), BrowserError>;

    /// Navigate to `url`.
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL to load
    /// * `wait` - When the navigation counts as finished
    ///
    /// # Returns
    ///
    /// `Ok(())` once the document has loaded, or an error if the page could
    /// not be reached or the browser service failed.
    async fn goto(&mut self, url: &str, wait: WaitUntil) -> Result<(), BrowserError>;

    /// Click the first element matching `selector` and wait for the
    /// navigation it triggers.
    ///
    /// # Returns
    ///
    /// [`BrowserError::ElementNotFound`] when nothing matches, and
    /// [`BrowserError::NotNavigated`] before the first [`goto`](Self::goto).
    async fn click_and_wait(&mut self, selector: &str, wait: WaitUntil)
        -> Result<(), BrowserError>;

    /// Rendered HTML of the current document.
    async fn content(&self) -> Result<String, BrowserError>;

    async fn close(self) -> Result<(), BrowserError>;
}

//! Turning a rendered listing page into [`Article`] records.
//!
//! The aggregator serves one of two markup generations:
//!
//! | Layout | Anchor | Container |
//! |--------|--------|-----------|
//! | Modern | `a[href^="./read/"]` with visible text | nearest ancestor holding a `time[datetime]` |
//! | Legacy | `<article>` | the `<article>` itself |
//!
//! [`PageLayout::detect`] makes the choice once per page. When any modern
//! anchor exists the legacy pass never runs.

pub mod fields;
pub mod legacy;

use crate::models::Article;
use fields::{find_container, parent_element, selector, text_of};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

/// `articleType` of every record produced by the modern layout.
pub const MODERN_ARTICLE_TYPE: &str = "topic";

static ARTICLE: Lazy<Selector> = Lazy::new(|| selector("article"));

/// The markup generation found on a page, with the elements that drive
/// extraction, in document order.
#[derive(Debug)]
pub enum PageLayout<'a> {
    /// Read-link anchors with non-empty text.
    Modern(Vec<ElementRef<'a>>),
    /// Top-level `<article>` cards.
    Legacy(Vec<ElementRef<'a>>),
}

impl<'a> PageLayout<'a> {
    /// Decide which layout `document` uses.
    ///
    /// Any read-link anchor with visible text makes the page modern; only
    /// when there is none are `<article>` cards collected. Articles nested in
    /// another article are skipped so each card yields one record.
    ///
    /// # Arguments
    ///
    /// * `document` - The parsed listing page
    ///
    /// # Returns
    ///
    /// The layout with its driving elements, possibly empty.
    pub fn detect(document: &'a Html) -> Self {
        let anchors: Vec<ElementRef<'a>> = document
            .select(&fields::READ_LINK)
            .filter(|anchor| !text_of(*anchor).is_empty())
            .collect();
        if !anchors.is_empty() {
            return PageLayout::Modern(anchors);
        }

        let cards = document
            .select(&ARTICLE)
            .filter(|card| !has_article_ancestor(*card))
            .collect();
        PageLayout::Legacy(cards)
    }

    /// `"modern"` or `"legacy"`, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            PageLayout::Modern(_) => "modern",
            PageLayout::Legacy(_) => "legacy",
        }
    }

    /// Build one record per driving element, in document order.
    pub fn extract(&self) -> Vec<Article> {
        match self {
            PageLayout::Modern(anchors) => anchors.iter().copied().map(modern_article).collect(),
            PageLayout::Legacy(cards) => cards.iter().copied().map(legacy_article).collect(),
        }
    }
}

fn has_article_ancestor(card: ElementRef<'_>) -> bool {
    let mut current = parent_element(card);
    while let Some(el) = current {
        if ARTICLE.matches(&el) {
            return true;
        }
        current = parent_element(el);
    }
    false
}

/// Build a record from a modern read-link anchor.
pub fn modern_article(anchor: ElementRef<'_>) -> Article {
    let container = find_container(anchor);
    let (datetime, time) = fields::modern_time(container);
    Article {
        title: text_of(anchor),
        link: fields::absolutize_link(anchor.value().attr("href").unwrap_or_default()),
        image: fields::modern_image(container),
        source: fields::modern_source(container),
        datetime,
        time,
        article_type: MODERN_ARTICLE_TYPE.to_string(),
        content: None,
    }
}

/// Build a record from a legacy `<article>` card.
pub fn legacy_article(card: ElementRef<'_>) -> Article {
    let kind = legacy::classify(card);
    let (datetime, time) = fields::legacy_time(card);
    Article {
        title: legacy::title(card, kind),
        link: fields::legacy_link(card),
        image: fields::legacy_image(card),
        source: fields::legacy_source(card),
        datetime,
        time,
        article_type: kind.to_string(),
        content: None,
    }
}

/// Parse `html` and extract every article record in document order.
///
/// Never fails: markup that matches neither layout yields an empty list,
/// and missing fields are left empty on the record.
///
/// # Arguments
///
/// * `html` - Rendered HTML of a search or topic page
///
/// # Returns
///
/// Records with titles not yet filtered; see
/// [`crate::assemble::assemble_results`].
#[instrument(level = "debug", skip_all, fields(bytes = html.len()))]
pub fn extract_articles(html: &str) -> Vec<Article> {
    let document = Html::parse_document(html);
    let layout = PageLayout::detect(&document);
    let articles = layout.extract();
    debug!(
        layout = layout.name(),
        count = articles.len(),
        "Extracted articles from page"
    );
    articles
}

//! Field-level extraction rules.
//!
//! Each field is pulled out by an ordered list of [`FieldRule`]s evaluated
//! against an article container until one yields a non-empty value. A
//! missing element always produces the field's empty value.
//!
//! # Rule chains
//!
//! | Field | Modern layout | Legacy layout |
//! |-------|---------------|---------------|
//! | link | anchor `href` | `./articles/` link, then `./read/` link |
//! | image | attachment-API `img`, then `figure img` | `figure img` srcset, then `src` |
//! | source | innermost `div[data-n-tid]` | marker in the last block, then any marker |
//! | time | first `time[datetime]` | `time` in the last block |
//!
//! Links and images are made absolute against the aggregator origin;
//! datetimes are normalized to RFC 3339 UTC with milliseconds, or `""` when
//! unparseable.
//!
//! # Container search
//!
//! The modern layout has no per-article wrapper. [`find_container`] walks up
//! from the headline anchor at most [`MAX_CONTAINER_ASCENT`] levels until an
//! ancestor holds a `time[datetime]`. The bound is a heuristic: a page that
//! nests deeper yields the last ancestor reached and, usually, empty fields.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

/// Origin that relative aggregator links and images are resolved against.
pub const AGGREGATOR_ORIGIN: &str = "https://news.google.com";

/// How many ancestors above the anchor's parent are inspected while looking
/// for the element that carries an article's metadata.
pub const MAX_CONTAINER_ASCENT: usize = 6;

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e}"))
}

pub(crate) static READ_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"a[href^="./read/"]"#));
pub(crate) static LEGACY_ARTICLE_LINK: Lazy<Selector> =
    Lazy::new(|| selector(r#"a[href^="./article"]"#));
pub(crate) static LEGACY_READ_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"a[href^="./read"]"#));
static TIME_WITH_DATETIME: Lazy<Selector> = Lazy::new(|| selector("time[datetime]"));
static LAST_BLOCK_TIME: Lazy<Selector> = Lazy::new(|| selector("div:last-child time"));
static SOURCE_MARKER: Lazy<Selector> = Lazy::new(|| selector("div[data-n-tid]"));
static LAST_BLOCK_SOURCE_MARKER: Lazy<Selector> =
    Lazy::new(|| selector("div:last-child div[data-n-tid]"));
static ATTACHMENT_IMAGE: Lazy<Selector> =
    Lazy::new(|| selector(r#"img[src*="/api/attachments/"]"#));
static FIGURE_IMAGE: Lazy<Selector> = Lazy::new(|| selector("figure img"));

/// One candidate way of reading a field out of a container.
pub type FieldRule = fn(ElementRef<'_>) -> Option<String>;

/// Evaluate `rules` in order and return the first non-empty value, or `""`.
pub fn first_non_empty(container: ElementRef<'_>, rules: &[FieldRule]) -> String {
    rules
        .iter()
        .filter_map(|rule| rule(container))
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

/// Concatenated, trimmed text of an element.
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

pub(crate) fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

fn first_attr(container: ElementRef<'_>, sel: &Selector, attr: &str) -> Option<String> {
    container
        .select(sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}

/// Turn an aggregator-relative link (`./read/...`) into an absolute URL.
pub fn absolutize_link(href: &str) -> String {
    match href.strip_prefix("./") {
        Some(rest) => format!("{AGGREGATOR_ORIGIN}/{rest}"),
        None => href.to_string(),
    }
}

/// Make an image URL absolute. Root-relative paths are served by the
/// aggregator; scheme-relative ones keep their own host.
pub fn absolutize_image(src: &str) -> String {
    if let Some(rest) = src.strip_prefix("//") {
        format!("https://{rest}")
    } else if src.starts_with('/') {
        format!("{AGGREGATOR_ORIGIN}{src}")
    } else {
        src.to_string()
    }
}

/// Convert a `datetime` attribute into `YYYY-MM-DDTHH:MM:SS.sssZ`.
///
/// Anything that cannot be read as a date yields `""`.
pub fn normalize_datetime(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        });

    parsed
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// Walk up from the anchor's parent until an ancestor contains a
/// `time[datetime]`, giving up after [`MAX_CONTAINER_ASCENT`] steps and
/// returning whichever ancestor was reached last.
pub fn find_container(anchor: ElementRef<'_>) -> ElementRef<'_> {
    let mut container = parent_element(anchor).unwrap_or(anchor);
    for _ in 0..MAX_CONTAINER_ASCENT {
        if container.select(&TIME_WITH_DATETIME).next().is_some() {
            break;
        }
        match parent_element(container) {
            Some(parent) => container = parent,
            None => break,
        }
    }
    container
}

fn has_nested_source_marker(element: ElementRef<'_>) -> bool {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|child| SOURCE_MARKER.matches(&child))
}

/// Modern layout: innermost source marker inside the container.
pub fn modern_source(container: ElementRef<'_>) -> String {
    container
        .select(&SOURCE_MARKER)
        .find(|marker| !has_nested_source_marker(*marker))
        .map(text_of)
        .unwrap_or_default()
}

/// `(datetime, time)` read from the first `time[datetime]` in the container.
pub fn modern_time(container: ElementRef<'_>) -> (String, String) {
    time_fields(container.select(&TIME_WITH_DATETIME).next())
}

fn time_fields(time: Option<ElementRef<'_>>) -> (String, String) {
    match time {
        Some(el) => (
            normalize_datetime(el.value().attr("datetime").unwrap_or_default()),
            text_of(el),
        ),
        None => (String::new(), String::new()),
    }
}

fn attachment_image(container: ElementRef<'_>) -> Option<String> {
    first_attr(container, &ATTACHMENT_IMAGE, "src")
}

fn figure_image_src(container: ElementRef<'_>) -> Option<String> {
    first_attr(container, &FIGURE_IMAGE, "src")
}

fn figure_image_srcset(container: ElementRef<'_>) -> Option<String> {
    first_attr(container, &FIGURE_IMAGE, "srcset")
        .and_then(|srcset| second_to_last_srcset_candidate(&srcset).map(str::to_string))
}

const MODERN_IMAGE_RULES: &[FieldRule] = &[attachment_image, figure_image_src];
const LEGACY_IMAGE_RULES: &[FieldRule] = &[figure_image_srcset, figure_image_src];

/// Modern layout: attachment-API image, then any figure image.
pub fn modern_image(container: ElementRef<'_>) -> String {
    absolutize_image(&first_non_empty(container, MODERN_IMAGE_RULES))
}

/// Legacy layout: a `srcset` candidate when present, else the plain `src`.
pub fn legacy_image(container: ElementRef<'_>) -> String {
    absolutize_image(&first_non_empty(container, LEGACY_IMAGE_RULES))
}

/// Pick the second-to-last whitespace-separated token of a `srcset`.
///
/// With the usual `url descriptor, url descriptor` shape this lands on the
/// URL of the last candidate. Fewer than two tokens yield `None`.
pub fn second_to_last_srcset_candidate(srcset: &str) -> Option<&str> {
    let tokens: Vec<&str> = srcset.split(' ').collect();
    if tokens.len() < 2 {
        return None;
    }
    Some(tokens[tokens.len() - 2]).filter(|token| !token.is_empty())
}

fn legacy_article_href(container: ElementRef<'_>) -> Option<String> {
    first_attr(container, &LEGACY_ARTICLE_LINK, "href")
}

fn legacy_read_href(container: ElementRef<'_>) -> Option<String> {
    first_attr(container, &LEGACY_READ_LINK, "href")
}

const LEGACY_LINK_RULES: &[FieldRule] = &[legacy_article_href, legacy_read_href];

/// Legacy layout: article link, then read link, made absolute.
pub fn legacy_link(container: ElementRef<'_>) -> String {
    absolutize_link(&first_non_empty(container, LEGACY_LINK_RULES))
}

fn last_block_source(container: ElementRef<'_>) -> Option<String> {
    container.select(&LAST_BLOCK_SOURCE_MARKER).next().map(text_of)
}

fn any_source(container: ElementRef<'_>) -> Option<String> {
    container.select(&SOURCE_MARKER).next().map(text_of)
}

const LEGACY_SOURCE_RULES: &[FieldRule] = &[last_block_source, any_source];

/// Legacy layout: the publisher name.
///
/// Cards usually put the source marker in their last child block; some put
/// it earlier, so any marker in the card is the fallback.
///
/// # Arguments
///
/// * `container` - The `<article>` card
///
/// # Returns
///
/// The marker's trimmed text, or `""` when the card has none.
pub fn legacy_source(container: ElementRef<'_>) -> String {
    first_non_empty(container, LEGACY_SOURCE_RULES)
}

/// `(datetime, time)` read from the time element of the last child block.
pub fn legacy_time(container: ElementRef<'_>) -> (String, String) {
    time_fields(container.select(&LAST_BLOCK_TIME).next())
}

//! Shape classification and headline selection for legacy `<article>` cards.
//!
//! Older listing pages render each story as an `<article>`. Three shapes
//! occur, told apart by their contents:
//!
//! | Kind | Detected by | Title rules |
//! |------|-------------|-------------|
//! | `regular` | contains an `h3` | `h3`, `h4`, article link, read link |
//! | `topicFeatured` | no `h3`, contains a `figure` | `h4`, `target=_blank` link, article link, read link |
//! | `topicSmall` | neither | same as `topicFeatured` |
//!
//! The kind's name becomes the record's `articleType`.

use super::fields::{
    FieldRule, LEGACY_ARTICLE_LINK, LEGACY_READ_LINK, first_non_empty, selector, text_of,
};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use std::fmt;

static H3: Lazy<Selector> = Lazy::new(|| selector("h3"));
static H4: Lazy<Selector> = Lazy::new(|| selector("h4"));
static FIGURE: Lazy<Selector> = Lazy::new(|| selector("figure"));
static BLANK_TARGET_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"a[target="_blank"]"#));

/// The internal shape of a legacy article card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyKind {
    /// Search result card with an `h3` headline.
    Regular,
    /// Topic page lead card: `h4` headline next to a figure.
    TopicFeatured,
    /// Topic page compact card without artwork.
    TopicSmall,
}

impl LegacyKind {
    /// The `articleType` value written for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            LegacyKind::Regular => "regular",
            LegacyKind::TopicFeatured => "topicFeatured",
            LegacyKind::TopicSmall => "topicSmall",
        }
    }

    fn title_rules(self) -> &'static [FieldRule] {
        match self {
            LegacyKind::Regular => REGULAR_TITLE_RULES,
            LegacyKind::TopicFeatured | LegacyKind::TopicSmall => TOPIC_TITLE_RULES,
        }
    }
}

impl fmt::Display for LegacyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn contains(container: ElementRef<'_>, sel: &Selector) -> bool {
    container.select(sel).next().is_some()
}

/// Classify a card by the elements it contains.
///
/// # Arguments
///
/// * `container` - The `<article>` card
///
/// # Returns
///
/// [`LegacyKind::Regular`] when an `h3` is present, else
/// [`LegacyKind::TopicFeatured`] when a `figure` is present, else
/// [`LegacyKind::TopicSmall`].
pub fn classify(container: ElementRef<'_>) -> LegacyKind {
    if contains(container, &H3) {
        LegacyKind::Regular
    } else if contains(container, &FIGURE) {
        LegacyKind::TopicFeatured
    } else {
        LegacyKind::TopicSmall
    }
}

fn first_text(container: ElementRef<'_>, sel: &Selector) -> Option<String> {
    container.select(sel).next().map(text_of)
}

fn h3_text(container: ElementRef<'_>) -> Option<String> {
    first_text(container, &H3)
}

fn h4_text(container: ElementRef<'_>) -> Option<String> {
    first_text(container, &H4)
}

fn blank_target_link_text(container: ElementRef<'_>) -> Option<String> {
    first_text(container, &BLANK_TARGET_LINK)
}

fn article_link_text(container: ElementRef<'_>) -> Option<String> {
    first_text(container, &LEGACY_ARTICLE_LINK)
}

fn read_link_text(container: ElementRef<'_>) -> Option<String> {
    first_text(container, &LEGACY_READ_LINK)
}

const REGULAR_TITLE_RULES: &[FieldRule] =
    &[h3_text, h4_text, article_link_text, read_link_text];
const TOPIC_TITLE_RULES: &[FieldRule] = &[
    h4_text,
    blank_target_link_text,
    article_link_text,
    read_link_text,
];

/// Headline for a card of the given kind, trimmed, or `""`.
pub fn title(container: ElementRef<'_>, kind: LegacyKind) -> String {
    first_non_empty(container, kind.title_rules())
}

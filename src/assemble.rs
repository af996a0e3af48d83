//! Final filtering of extracted records.
//!
//! Runs once, after resolution and enrichment, so the limit counts only
//! records that survived every earlier stage.

use crate::models::Article;
use tracing::debug;

/// Drop records without a usable title and keep at most `limit` of the rest,
/// preserving order.
///
/// # Arguments
///
/// * `articles` - Records in page order
/// * `limit` - Maximum number of records to return
///
/// # Returns
///
/// The first `min(limit, titled)` titled records. Applying it twice gives
/// the same result.
pub fn assemble_results(articles: Vec<Article>, limit: usize) -> Vec<Article> {
    let total = articles.len();
    let kept: Vec<Article> = articles
        .into_iter()
        .filter(Article::has_title)
        .take(limit)
        .collect();
    debug!(total, kept = kept.len(), limit, "Assembled results");
    kept
}

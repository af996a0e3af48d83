//! JSON output of extracted articles.
//!
//! The array is written exactly as returned by [`crate::scrape`], so record
//! order matches the page order.
//!
//! # Output Shape
//!
//! ```text
//! [
//!   {
//!     "title": "Hello",
//!     "link": "https://www.reuters.com/...",
//!     "image": "",
//!     "source": "Reuters",
//!     "datetime": "2024-01-01T00:00:00.000Z",
//!     "time": "1 day ago",
//!     "articleType": "topic"
//!   }
//! ]
//! ```
//!
//! `content` appears only when body text was fetched.

use crate::models::Article;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, instrument};

/// Render articles as pretty-printed JSON.
pub fn articles_to_json(articles: &[Article]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(articles)
}

/// Write articles to `path`, creating parent directories as needed.
///
/// # Arguments
///
/// * `articles` - Records to serialize
/// * `path` - Destination file, overwritten if it exists
///
/// # Returns
///
/// `Ok(())` on success, or an error if directory creation or file writing fails.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display(), count = articles.len()))]
pub async fn write_articles(
    articles: &[Article],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn Error>> {
    let path = path.as_ref();
    let json = articles_to_json(articles)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!("Wrote articles JSON");
    Ok(())
}

/// Print articles as JSON on stdout.
pub async fn print_articles(articles: &[Article]) -> Result<(), Box<dyn Error>> {
    let mut json = articles_to_json(articles)?;
    json.push('\n');
    let mut stdout = tokio::io::stdout();
    stdout.write_all(json.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

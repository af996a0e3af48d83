//! Output writers for scraped results.
//!
//! - [`json`]: serializes the article list to a file or stdout
//!
//! ```text
//! gnews_scraper -s "rust" -o ./out/rust.json
//! out/
//! └── rust.json   # [ { "title": ..., "link": ..., "articleType": ... }, ... ]
//! ```

pub mod json;

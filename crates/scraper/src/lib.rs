// ABOUTME: Main library entry point for the wino wine-page scraper.
// ABOUTME: Re-exports the public API: Client, ClientBuilder, WineRecord, ScrapeError, fetchers and URL helpers.

//! Wino - extracts structured wine facts from wine product pages.
//!
//! A [`Client`] fetches a page through a [`PageFetcher`], runs the extraction
//! cascade over the markup, resolves the region against the taxonomy and
//! canonicalizes the grape list. When the page cannot be scraped it falls
//! back to neighbouring vintages and finally to the URL itself.
//!
//! # Example
//!
//! ```no_run
//! use wino_scraper::Client;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Client::builder().build();
//!     let (record, url) = client
//!         .scrape("https://www.vivino.com/US/en/chateau-example/w/123?year=2018")
//!         .await;
//!     if let (Some(record), Some(url)) = (record, url) {
//!         println!("{} ({:?}) from {}", record.name, record.vintage, url);
//!     }
//! }
//! ```

pub mod client;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod fetch;
pub mod options;
pub mod record;
pub mod url;

pub use crate::client::Client;
pub use crate::error::{ErrorCode, ScrapeError};
pub use crate::extract::{extract, Candidate, Extraction};
pub use crate::fetch::{BrowserFetcher, FetchedPage, HttpFetcher, PageFetcher};
pub use crate::options::{ClientBuilder, DelayRange, Options};
pub use crate::record::{WineRecord, WineType, UNKNOWN_COUNTRY, UNKNOWN_REGION, UNKNOWN_VARIETAL};
pub use crate::url::{sanitize_url, with_year, year_param};

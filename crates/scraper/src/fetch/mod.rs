// ABOUTME: The page-fetch port and shared client-identity helpers.
// ABOUTME: Adapters: BrowserFetcher (headless Chromium) and HttpFetcher (plain HTTP GET).

//! Page fetching.
//!
//! Extraction never talks to the network directly. It receives markup from a
//! [`PageFetcher`], which lets tests substitute scripted pages for a browser.

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;

use crate::error::ScrapeError;

pub mod browser;
pub mod http;

pub use browser::BrowserFetcher;
pub use http::HttpFetcher;

/// How long a fetch may wait for the page heading before giving up.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(25);

/// The element whose presence marks a wine page as rendered.
pub const READY_SELECTOR: &str = "h1";

/// Desktop browser identities rotated across fetches.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:126.0) Gecko/20100101 Firefox/126.0",
];

/// Picks a user agent at random.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// A successfully loaded page.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// The URL after any redirects.
    pub final_url: String,
    pub html: String,
}

/// Loads one URL and returns its rendered markup.
///
/// Implementations must acquire and release all resources within a single
/// call and report failures as timeout, render or network errors.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ScrapeError>;
}

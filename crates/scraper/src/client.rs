// ABOUTME: Client orchestrating fetch, extraction, taxonomy normalization and the fallback chain.
// ABOUTME: scrape() never fails; it degrades to neighbouring vintages, then to URL parsing, then None.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use wino_taxonomy::{
    load_builtin_taxonomy, load_builtin_varietals, normalize_key, Hints, Taxonomy, VarietalList,
};

use crate::error::ScrapeError;
use crate::extract::{extract, Extraction};
use crate::fallback::{borrow_vintage, extract_from_url};
use crate::fetch::{BrowserFetcher, PageFetcher};
use crate::options::{ClientBuilder, DelayRange, Options};
use crate::record::{check_vintage, WineRecord};
use crate::url::{sanitize_url, with_year, year_param};

/// The scraper entry point.
///
/// Reference data and the fetcher are fixed at construction and shared
/// read-only, so one client can serve concurrent scrapes.
#[derive(Clone)]
pub struct Client {
    opts: Options,
    taxonomy: Arc<Taxonomy>,
    varietals: Arc<VarietalList>,
    fetcher: Arc<dyn PageFetcher>,
}

impl Client {
    /// Returns a builder with default options.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client, loading builtin reference data for anything not supplied.
    pub fn new(opts: Options) -> Self {
        let taxonomy = opts
            .taxonomy
            .clone()
            .unwrap_or_else(|| Arc::new(load_builtin_taxonomy()));
        let varietals = opts
            .varietals
            .clone()
            .unwrap_or_else(|| Arc::new(load_builtin_varietals()));
        let fetcher = opts
            .fetcher
            .clone()
            .unwrap_or_else(|| Arc::new(BrowserFetcher::new(opts.timeout)));

        Self {
            opts,
            taxonomy,
            varietals,
            fetcher,
        }
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn varietals(&self) -> &VarietalList {
        &self.varietals
    }

    /// Scrapes one wine page.
    ///
    /// Returns the record and the canonical URL: the final URL after redirects
    /// on a direct hit, or the sanitized request URL when a fallback produced
    /// the record. Returns `(None, None)` only when every stage failed.
    pub async fn scrape(&self, url: &str) -> (Option<WineRecord>, Option<String>) {
        info!(url, "scrape started");

        let sanitized = match sanitize_url(url) {
            Ok(u) => u,
            Err(e) => {
                warn!(error = %e, "URL rejected, trying URL fallback");
                return self.url_fallback(url);
            }
        };

        match self.attempt(&sanitized).await {
            Ok((record, final_url)) => {
                info!(url = %final_url, name = %record.name, "scrape succeeded");
                return (Some(record), Some(final_url));
            }
            Err(e) => warn!(error = %e, "initial attempt failed"),
        }

        self.pause(self.opts.cooldown).await;

        if let Some(year) = year_param(&sanitized).and_then(check_vintage) {
            if let Some(record) = self.try_neighbours(&sanitized, year).await {
                return (Some(record), Some(sanitized));
            }
        }

        self.url_fallback(&sanitized)
    }

    /// Runs extraction and normalization on markup the caller already has.
    pub fn scrape_html(&self, html: &str, url: &str) -> Result<(WineRecord, String), ScrapeError> {
        let canonical = sanitize_url(url).unwrap_or_else(|_| url.to_string());
        let extraction = extract(html, &canonical)?;
        Ok((self.normalize(extraction), canonical))
    }

    /// Resolves region/country against the taxonomy and canonicalizes the varietal.
    pub fn normalize(&self, extraction: Extraction) -> WineRecord {
        let Extraction {
            mut record,
            raw_grapes,
        } = extraction;

        let country_hint = record.has_country().then(|| record.country.clone());
        let region_text = if record.has_region() {
            record.region.clone()
        } else {
            String::new()
        };
        let matched = self
            .taxonomy
            .match_region(&region_text, country_hint.as_deref());

        let empty = Hints::new();
        let hints = match &matched {
            Some(m) => {
                record.country = m.country.clone();
                match m.deepest() {
                    Some(deepest) => {
                        record.region = deepest.to_string();
                        record.region_full = Some(m.display_path());
                    }
                    None if record.has_region()
                        && normalize_key(&record.region) != normalize_key(&m.country) =>
                    {
                        record.region_full = Some(format!("{}, {}", record.region, m.country));
                    }
                    None => record.region_full = Some(m.display_path()),
                }
                &m.hints
            }
            None => {
                debug!(region = %record.region, country = %record.country, "region not in taxonomy");
                record.region_full = compose_region_full(&record);
                &empty
            }
        };

        record.varietal = self.varietals.canonicalize(&raw_grapes, &record.name, hints);
        record
    }

    /// One fetch-extract-normalize pass.
    async fn attempt(&self, url: &str) -> Result<(WineRecord, String), ScrapeError> {
        let page = self.fetcher.fetch(url).await?;
        let extraction = extract(&page.html, &page.final_url)?;
        Ok((self.normalize(extraction), page.final_url))
    }

    /// Tries the following and then the preceding vintage, borrowing from the first that works.
    async fn try_neighbours(&self, url: &str, year: i32) -> Option<WineRecord> {
        let neighbours = [year.checked_add(1), year.checked_sub(1)];
        for (i, neighbour) in neighbours.into_iter().flatten().enumerate() {
            if i > 0 {
                self.pause(self.opts.retry_delay).await;
            }

            let neighbour_url = match with_year(url, neighbour) {
                Ok(u) => u,
                Err(e) => {
                    warn!(error = %e, "could not build neighbouring vintage URL");
                    continue;
                }
            };

            info!(url = %neighbour_url, "trying neighbouring vintage");
            match self.attempt(&neighbour_url).await {
                Ok((record, _)) => {
                    warn!(borrowed = neighbour, requested = year, "using neighbouring vintage data");
                    return Some(borrow_vintage(record, year));
                }
                Err(e) => info!(error = %e, "neighbouring vintage failed"),
            }
        }
        None
    }

    fn url_fallback(&self, url: &str) -> (Option<WineRecord>, Option<String>) {
        match extract_from_url(url, &self.taxonomy, &self.varietals) {
            Some(record) => {
                warn!(url, name = %record.name, "returning URL-derived record for review");
                (Some(record), Some(url.to_string()))
            }
            None => {
                error!(url, "all scrape and fallback attempts failed");
                (None, None)
            }
        }
    }

    async fn pause(&self, range: DelayRange) {
        if range.is_zero() {
            return;
        }
        let delay = range.sample();
        debug!(?delay, "pausing between attempts");
        tokio::time::sleep(delay).await;
    }
}

/// "Region, Country" from whichever parts are known.
fn compose_region_full(record: &WineRecord) -> Option<String> {
    let parts: Vec<&str> = [
        record.has_region().then_some(record.region.as_str()),
        record.has_country().then_some(record.country.as_str()),
    ]
    .into_iter()
    .flatten()
    .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

// ABOUTME: Configuration for the scraper client: reference data, page fetcher, timeout and pacing.
// ABOUTME: ClientBuilder provides a fluent API for constructing Client instances with custom settings.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use wino_taxonomy::{Taxonomy, VarietalList};

use crate::client::Client;
use crate::fetch::{PageFetcher, DEFAULT_TIMEOUT};

/// A closed interval of pause lengths; each pause picks a random point in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange::new(Duration::ZERO, Duration::ZERO);

    pub const fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub fn from_secs_f64(min: f64, max: f64) -> Self {
        Self::new(Duration::from_secs_f64(min), Duration::from_secs_f64(max))
    }

    pub fn is_zero(&self) -> bool {
        self.max.is_zero()
    }

    /// A random duration within the range.
    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

/// Configuration options for the scraper client.
#[derive(Clone)]
pub struct Options {
    /// Per-fetch timeout handed to the default fetcher.
    pub timeout: Duration,
    /// Pause after the first attempt fails, before trying neighbouring vintages.
    pub cooldown: DelayRange,
    /// Pause between neighbouring-vintage attempts.
    pub retry_delay: DelayRange,
    pub taxonomy: Option<Arc<Taxonomy>>,
    pub varietals: Option<Arc<VarietalList>>,
    pub fetcher: Option<Arc<dyn PageFetcher>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            cooldown: DelayRange::from_secs_f64(3.0, 5.0),
            retry_delay: DelayRange::from_secs_f64(2.0, 4.0),
            taxonomy: None,
            varietals: None,
            fetcher: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("timeout", &self.timeout)
            .field("cooldown", &self.cooldown)
            .field("retry_delay", &self.retry_delay)
            .field("taxonomy", &self.taxonomy.as_ref().map(|t| t.len()))
            .field("varietals", &self.varietals.as_ref().map(|v| v.len()))
            .field("fetcher", &self.fetcher.is_some())
            .finish()
    }
}

/// Builder for constructing Client instances with custom configuration.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    /// Create a new ClientBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Set the fetch timeout used by the default browser fetcher.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the pause taken after the first attempt fails.
    pub fn cooldown(mut self, min: Duration, max: Duration) -> Self {
        self.opts.cooldown = DelayRange::new(min, max);
        self
    }

    /// Set the pause taken between neighbouring-vintage attempts.
    pub fn retry_delay(mut self, min: Duration, max: Duration) -> Self {
        self.opts.retry_delay = DelayRange::new(min, max);
        self
    }

    /// Disable all pacing delays.
    pub fn no_delay(mut self) -> Self {
        self.opts.cooldown = DelayRange::ZERO;
        self.opts.retry_delay = DelayRange::ZERO;
        self
    }

    /// Use a custom region taxonomy instead of the builtin one.
    pub fn taxonomy(mut self, taxonomy: Taxonomy) -> Self {
        self.opts.taxonomy = Some(Arc::new(taxonomy));
        self
    }

    /// Use a custom varietal list instead of the builtin one.
    pub fn varietals(mut self, varietals: VarietalList) -> Self {
        self.opts.varietals = Some(Arc::new(varietals));
        self
    }

    /// Use a custom page fetcher instead of the headless browser.
    pub fn fetcher(mut self, fetcher: impl PageFetcher + 'static) -> Self {
        self.opts.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Build the Client with the configured options.
    pub fn build(self) -> Client {
        Client::new(self.opts)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ABOUTME: Headless Chromium page fetcher built on chromiumoxide.
// ABOUTME: Launches one browser per fetch with a random identity and closes it on every exit path.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{random_user_agent, FetchedPage, PageFetcher, DEFAULT_TIMEOUT, READY_SELECTOR};
use crate::error::ScrapeError;

const WINDOW_WIDTH: u32 = 1920;
const WINDOW_HEIGHT: u32 = 1080;

/// Runs before any page script so automation checks see a regular browser.
const HIDE_AUTOMATION_JS: &str = r#"
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
"#;

/// Fetches pages through a freshly launched headless Chromium.
#[derive(Debug, Clone)]
pub struct BrowserFetcher {
    timeout: Duration,
    poll_interval: Duration,
    executable: Option<PathBuf>,
}

impl BrowserFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: Duration::from_millis(250),
            executable: None,
        }
    }

    /// Uses a specific Chrome/Chromium binary instead of auto-detection.
    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn config(&self, url: &str) -> Result<BrowserConfig, ScrapeError> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--lang=en-US")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", random_user_agent()))
            .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
            .viewport(Some(Viewport {
                width: WINDOW_WIDTH,
                height: WINDOW_HEIGHT,
                device_scale_factor: Some(1.0),
                ..Default::default()
            }));
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(|e| {
            ScrapeError::render(
                url,
                "Launch",
                Some(anyhow::anyhow!("failed to build browser config: {}", e)),
            )
        })
    }

    async fn load(&self, browser: &Browser, url: &str) -> Result<FetchedPage, ScrapeError> {
        let deadline = Instant::now() + self.timeout;

        let page = browser.new_page("about:blank").await.map_err(|e| {
            ScrapeError::render(url, "NewPage", Some(anyhow::anyhow!("failed to open page: {}", e)))
        })?;

        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(HIDE_AUTOMATION_JS))
            .await
            .map_err(|e| {
                ScrapeError::render(url, "Stealth", Some(anyhow::anyhow!("script injection failed: {}", e)))
            })?;

        match tokio::time::timeout(self.timeout, page.goto(url)).await {
            Err(_) => {
                return Err(ScrapeError::timeout(
                    url,
                    "Navigate",
                    Some(anyhow::anyhow!("navigation timed out after {:?}", self.timeout)),
                ))
            }
            Ok(Err(e)) => {
                return Err(ScrapeError::network(
                    url,
                    "Navigate",
                    Some(anyhow::anyhow!("navigation failed: {}", e)),
                ))
            }
            Ok(Ok(_)) => {}
        }

        self.wait_for_heading(&page, url, deadline).await?;

        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .map(|u| u.to_string())
            .unwrap_or_else(|| url.to_string());

        let html = page.content().await.map_err(|e| {
            ScrapeError::render(url, "Content", Some(anyhow::anyhow!("failed to read markup: {}", e)))
        })?;

        Ok(FetchedPage { final_url, html })
    }

    async fn wait_for_heading(
        &self,
        page: &Page,
        url: &str,
        deadline: Instant,
    ) -> Result<(), ScrapeError> {
        loop {
            if page.find_element(READY_SELECTOR).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ScrapeError::timeout(
                    url,
                    "WaitForHeading",
                    Some(anyhow::anyhow!("no {} within {:?}", READY_SELECTOR, self.timeout)),
                ));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl Default for BrowserFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ScrapeError> {
        let config = self.config(url)?;
        let (mut browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            ScrapeError::render(url, "Launch", Some(anyhow::anyhow!("failed to launch browser: {}", e)))
        })?;

        let handle = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let result = self.load(&browser, url).await;

        if let Err(e) = browser.close().await {
            warn!(url, error = %e, "browser close failed");
        }
        if let Err(e) = browser.wait().await {
            debug!(url, error = %e, "browser process wait failed");
        }
        handle.abort();

        match &result {
            Ok(page) => debug!(url, final_url = %page.final_url, "page rendered"),
            Err(e) => debug!(url, error = %e, "browser fetch failed"),
        }
        result
    }
}

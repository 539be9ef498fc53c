// ABOUTME: Error types for the wine scraper including the ErrorCode enum and ScrapeError struct.
// ABOUTME: Separates fetch failures from extraction failures so the client can pick a fallback stage.

use std::fmt;

/// Error codes representing the categories of scrape failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidUrl,
    Timeout,
    Render,
    Network,
    NoTitle,
    ErrorPage,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Render => "render error",
            ErrorCode::Network => "network error",
            ErrorCode::NoTitle => "no title",
            ErrorCode::ErrorPage => "error page",
        };
        write!(f, "{}", s)
    }
}

/// The error type for fetch and extraction operations.
#[derive(Debug, thiserror::Error)]
pub struct ScrapeError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wino: {} {}: {}", self.op, self.url, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl ScrapeError {
    fn with_code(
        code: ErrorCode,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create an InvalidUrl error.
    pub fn invalid_url(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::InvalidUrl, url, op, source)
    }

    /// Create a Timeout error.
    pub fn timeout(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Timeout, url, op, source)
    }

    /// Create a Render error (the page loaded but never became usable).
    pub fn render(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Render, url, op, source)
    }

    /// Create a Network error.
    pub fn network(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Network, url, op, source)
    }

    /// Create a NoTitle error.
    pub fn no_title(url: impl Into<String>, op: impl Into<String>) -> Self {
        Self::with_code(ErrorCode::NoTitle, url, op, None)
    }

    /// Create an ErrorPage error carrying the offending heading.
    pub fn error_page(url: impl Into<String>, op: impl Into<String>, heading: &str) -> Self {
        Self::with_code(
            ErrorCode::ErrorPage,
            url,
            op,
            Some(anyhow::anyhow!("heading {:?} looks like an error page", heading)),
        )
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true if the page could not be fetched (timeout, render or network).
    pub fn is_fetch(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::Timeout | ErrorCode::Render | ErrorCode::Network
        )
    }

    /// Returns true if the page was fetched but held no usable wine.
    pub fn is_extract(&self) -> bool {
        matches!(self.code, ErrorCode::NoTitle | ErrorCode::ErrorPage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_op_url_and_source() {
        let err = ScrapeError::network(
            "https://example.com/w/1",
            "Fetch",
            Some(anyhow::anyhow!("HTTP status 503")),
        );
        assert_eq!(
            err.to_string(),
            "wino: Fetch https://example.com/w/1: network error: HTTP status 503"
        );
    }

    #[test]
    fn test_categories() {
        assert!(ScrapeError::timeout("u", "Fetch", None).is_fetch());
        assert!(ScrapeError::render("u", "Fetch", None).is_fetch());
        assert!(ScrapeError::no_title("u", "Extract").is_extract());
        assert!(ScrapeError::error_page("u", "Extract", "404").is_extract());
        assert!(!ScrapeError::invalid_url("u", "Sanitize", None).is_fetch());
        assert!(ScrapeError::timeout("u", "Fetch", None).is_timeout());
    }
}

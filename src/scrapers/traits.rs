use std::time::Duration;

use async_trait::async_trait;

use crate::scrapers::error::ScrapeError;
use crate::scrapers::types::ScrapeReport;

/// The one browser capability the pipeline needs: load a URL, wait for an
/// element, hand back the rendered source. How the session is constructed,
/// configured or torn down is the caller's business; the scraper only ever
/// borrows it.
///
/// One session means one page at a time — implementations are not expected
/// to support concurrent navigation.
pub trait PageSession {
    /// Load `url` in the session. Transport failures here are fatal to the
    /// run, not retried.
    fn navigate(&self, url: &str) -> Result<(), ScrapeError>;

    /// Block until an element matching `selector` is present in the DOM or
    /// `timeout` elapses. Returns whether the element appeared. An elapsed
    /// timeout is a normal outcome, not an error.
    fn wait_until_present(&self, selector: &str, timeout: Duration) -> Result<bool, ScrapeError>;

    /// Full rendered source of the currently loaded page.
    fn page_source(&self) -> Result<String, ScrapeError>;
}

/// Common trait for all advert scrapers
/// This allows easy addition of new sources (ohne-makler etc) in the future
#[async_trait]
pub trait ScraperTrait: Send + Sync {
    /// Run the full pipeline: connection check, candidate discovery, then
    /// extraction with retries.
    async fn scrape(&self) -> Result<ScrapeReport, ScrapeError>;

    /// Get the name of the scraper source
    fn source_name(&self) -> &'static str;
}

use thiserror::Error;

/// Errors raised by the scraping pipeline.
///
/// Only `MalformedPage` is recoverable: the advert is logged and dropped
/// while the run continues. Everything else aborts the run — there is no
/// blanket catch-and-continue. Page timeouts are not errors at all; they
/// flow through [`crate::scrapers::types::FetchOutcome`] and the retry
/// rounds instead.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("connection check against {url} failed with HTTP status {status}")]
    Connectivity { url: String, status: u16 },

    #[error("HTTP error during connection check: {0}")]
    Http(#[from] reqwest::Error),

    #[error("browser session error: {0}")]
    Session(#[from] anyhow::Error),

    #[error("advert page {url} is missing the {region} region")]
    MalformedPage { url: String, region: &'static str },

    #[error("invalid delay range: low {low} is greater than high {high}")]
    InvalidDelayRange { low: f64, high: f64 },
}

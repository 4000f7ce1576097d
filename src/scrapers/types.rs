use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::ListingRecord;

/// One search on the classifieds site: a location, a radius around it and a
/// category. The page URLs of the paginated results feed derive from these
/// fields alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchTarget {
    /// Category base URL, e.g. `https://www.ebay-kleinanzeigen.de/s-haus-kaufen`
    pub base_url: String,
    /// Location slug as the site spells it, e.g. `berlin`
    pub location: String,
    /// Search radius in km around the location
    pub radius: String,
    /// Site-internal query code for this category/location pair, e.g. `c208l3331`
    pub category_code: String,
}

impl SearchTarget {
    /// URL of the first results page, without any page segment.
    pub fn search_url(&self) -> String {
        format!(
            "{}/{}/{}r{}",
            self.base_url, self.location, self.category_code, self.radius
        )
    }

    /// URL of results page `page` (1-based). Page 1 is the bare search URL;
    /// later pages carry a `seite:{page}` path segment.
    pub fn page_url(&self, page: usize) -> String {
        if page <= 1 {
            self.search_url()
        } else {
            format!(
                "{}/{}/seite:{}/{}r{}",
                self.base_url, self.location, page, self.category_code, self.radius
            )
        }
    }

    /// `scheme://host` of the site, used to absolutize the relative advert
    /// links on the results pages.
    pub fn origin(&self) -> String {
        reqwest::Url::parse(&self.base_url).map_or_else(
            |e| {
                tracing::warn!(
                    base_url = %self.base_url,
                    error = %e,
                    "could not parse base_url as URL, falling back to string split for origin"
                );
                // fallback: take "scheme://host" as the first 3 '/'-parts
                self.base_url
                    .trim_end_matches('/')
                    .splitn(4, '/')
                    .take(3)
                    .collect::<Vec<_>>()
                    .join("/")
            },
            |url| url.origin().ascii_serialization(),
        )
    }
}

/// An advert URL found on a results page, together with the posting-date
/// label shown on its result card (`Heute`, `Gestern`, or an actual date).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCandidate {
    pub url: String,
    pub recency: String,
}

/// Result of one navigate-and-wait attempt against an advert page.
///
/// A page either renders the awaited element within budget and yields its
/// full source, or it is treated as fully failed. Timeouts are expected and
/// drive the retry rounds; they are never surfaced as errors.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success(String),
    Timeout(String),
}

/// Tuning knobs for one scrape run. All values the engine needs are passed
/// in here explicitly; the engine itself holds no defaults beyond these.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Number of results pages to walk.
    pub page_count: usize,
    /// Posting-date labels that make a result card a candidate.
    pub recency_tags: Vec<String>,
    /// Retry rounds after the first pass before giving up on a URL.
    pub max_retry_rounds: u32,
    /// CSS selector that signals a rendered results page.
    pub results_marker: String,
    /// CSS selector that signals a rendered advert page.
    pub listing_marker: String,
    pub results_timeout: Duration,
    pub listing_timeout: Duration,
    /// Random delay bounds in seconds after each results page.
    pub discovery_delay: (f64, f64),
    /// Random delay bounds in seconds after each advert fetch.
    pub listing_delay: (f64, f64),
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            page_count: 5,
            recency_tags: vec!["Heute".to_string(), "Gestern".to_string()],
            max_retry_rounds: 5,
            results_marker: "#consentBanner".to_string(),
            listing_marker: "#viewad-description-text".to_string(),
            results_timeout: Duration::from_secs(10),
            listing_timeout: Duration::from_secs(20),
            // results pages are heavier, advert pages are more frequent
            discovery_delay: (0.2, 1.5),
            listing_delay: (0.1, 1.2),
        }
    }
}

/// Everything a finished (or cancelled) run produced.
///
/// Records are in completion order, not candidate order. URLs that kept
/// timing out after the final round end up in `failed`; pages that rendered
/// but were structurally broken end up in `malformed`. Every candidate URL
/// is accounted for in exactly one of the three lists.
#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub records: Vec<ListingRecord>,
    pub failed: Vec<String>,
    pub malformed: Vec<String>,
    pub cancelled: bool,
}

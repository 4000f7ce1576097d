//! Kleinanzeigen property-advert scraper: connectivity check, results-feed
//! discovery and advert-page extraction.
//!
//! Discovery and extraction both run through the borrowed browser session;
//! only the one-shot connection check uses a plain HTTP client, so an
//! unreachable site fails the run before a browser is ever needed.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{Duration, Local, Utc};
use scraper::{Html, Selector};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::models::{ListingRecord, Source};
use crate::scrapers::browser::PageFetcher;
use crate::scrapers::engine::ScrapeEngine;
use crate::scrapers::error::ScrapeError;
use crate::scrapers::rate_limit::delay_random;
use crate::scrapers::traits::{PageSession, ScraperTrait};
use crate::scrapers::types::{FetchOutcome, ListingCandidate, ScrapeConfig, ScrapeReport, SearchTarget};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Kleinanzeigen scraper implementation
pub struct KleinanzeigenScraper<'a, S: PageSession> {
    session: &'a S,
    target: SearchTarget,
    config: ScrapeConfig,
    cancel: CancellationToken,
}

impl<'a, S: PageSession + Sync> KleinanzeigenScraper<'a, S> {
    pub fn new(
        session: &'a S,
        target: SearchTarget,
        config: ScrapeConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session,
            target,
            config,
            cancel,
        }
    }

    /// Walk the paginated results feed and collect the advert URLs whose
    /// result card carries one of the configured recency labels.
    ///
    /// A results page that never renders is logged and skipped — partial
    /// discovery is fine, and so is an empty result. URLs repeated across
    /// pages collapse to their first sighting.
    pub fn discover(&self) -> Result<Vec<ListingCandidate>, ScrapeError> {
        let fetcher = PageFetcher::new(self.session);
        let origin = self.target.origin();
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for page in 1..=self.config.page_count {
            let url = self.target.page_url(page);
            info!("Scraping advert URLs from: {}", url);

            match fetcher.fetch(&url, &self.config.results_marker, self.config.results_timeout)? {
                FetchOutcome::Success(html) => {
                    for candidate in parse_result_cards(&html, &origin, &self.config.recency_tags)
                    {
                        if seen.insert(candidate.url.clone()) {
                            candidates.push(candidate);
                        }
                    }
                }
                FetchOutcome::Timeout(url) => {
                    warn!("{} did not load!! Skipping results page!", url);
                }
            }

            // random rate limit to prevent failed requests from spamming
            delay_random(self.config.discovery_delay.0, self.config.discovery_delay.1)?;
        }

        info!("{} advert URLs found!", candidates.len());
        Ok(candidates)
    }
}

#[async_trait]
impl<'a, S: PageSession + Sync> ScraperTrait for KleinanzeigenScraper<'a, S> {
    async fn scrape(&self) -> Result<ScrapeReport, ScrapeError> {
        check_connection(&self.target.search_url()).await?;

        let candidates = self.discover()?;
        let engine = ScrapeEngine::new(self.session, &self.config, self.cancel.clone());
        engine.run(&candidates)
    }

    fn source_name(&self) -> &'static str {
        "Kleinanzeigen"
    }
}

/// One plain HTTP GET against the search URL before any scraping starts.
///
/// Any status of 400 or above is fatal; redirects count as reachable. This
/// exists to fail fast before paying for a browser launch.
pub async fn check_connection(url: &str) -> Result<(), ScrapeError> {
    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    let response = client.get(url).send().await?;
    let status = response.status().as_u16();

    if status >= 400 {
        error!("Connection to Kleinanzeigen not possible! Status code: {}", status);
        return Err(ScrapeError::Connectivity {
            url: url.to_string(),
            status,
        });
    }

    info!("Connection to Kleinanzeigen successful with status code: {}!", status);
    Ok(())
}

/// Pull advert candidates out of a rendered results page.
///
/// Each result card is an `article` whose `data-href` holds the relative
/// advert link and whose top-right corner shows the posting-date label.
/// Cards without either are skipped; labels are matched by containment so
/// `Gestern, 21:15` still counts as `Gestern`.
pub fn parse_result_cards(html: &str, origin: &str, recency_tags: &[String]) -> Vec<ListingCandidate> {
    let document = Html::parse_document(html);
    let card_selector = Selector::parse("article").unwrap();
    let label_selector = Selector::parse("div.aditem-main--top--right").unwrap();

    let mut candidates = Vec::new();
    for card in document.select(&card_selector) {
        let Some(href) = card.value().attr("data-href") else {
            continue;
        };
        let Some(label_element) = card.select(&label_selector).next() else {
            continue;
        };
        let label = label_element.text().collect::<String>().trim().to_string();

        if recency_tags.iter().any(|tag| label.contains(tag.as_str())) {
            candidates.push(ListingCandidate {
                url: format!("{origin}{href}"),
                recency: label,
            });
        }
    }
    candidates
}

/// Extract a [`ListingRecord`] from an already-fetched advert page.
///
/// Pure parsing, no I/O: the caller has already waited for the page's
/// description marker. A page missing one of the mandatory regions is
/// reported as [`ScrapeError::MalformedPage`] — re-fetching a structurally
/// broken page will not fix it, so these never enter the retry queue.
pub fn extract_listing(url: &str, page_source: &str) -> Result<ListingRecord, ScrapeError> {
    let document = Html::parse_document(page_source);
    let malformed = |region: &'static str| ScrapeError::MalformedPage {
        url: url.to_string(),
        region,
    };

    let extra_selector = Selector::parse("#viewad-extra-info").unwrap();
    let span_selector = Selector::parse("span").unwrap();
    let extra_info = document
        .select(&extra_selector)
        .next()
        .ok_or_else(|| malformed("viewad-extra-info"))?;
    let posted = extra_info
        .select(&span_selector)
        .next()
        .ok_or_else(|| malformed("viewad-extra-info"))?
        .text()
        .collect::<String>()
        .trim()
        .to_string();

    let main_selector = Selector::parse("#viewad-main-info").unwrap();
    let price_selector = Selector::parse("#viewad-price").unwrap();
    let locality_selector = Selector::parse("#viewad-locality").unwrap();
    let main_info = document
        .select(&main_selector)
        .next()
        .ok_or_else(|| malformed("viewad-main-info"))?;
    let price = main_info
        .select(&price_selector)
        .next()
        .ok_or_else(|| malformed("viewad-price"))?
        .text()
        .collect::<String>()
        .trim()
        .to_string();
    let location = main_info
        .select(&locality_selector)
        .next()
        .ok_or_else(|| malformed("viewad-locality"))?
        .text()
        .collect::<String>()
        .trim()
        .to_string();

    // the heading is prefixed with a non-title element; the title is the
    // last newline-delimited segment
    let title_selector = Selector::parse("#viewad-title").unwrap();
    let title = document
        .select(&title_selector)
        .next()
        .ok_or_else(|| malformed("viewad-title"))?
        .text()
        .collect::<String>()
        .trim()
        .rsplit('\n')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    // many adverts have no details table at all; that is None, not an error
    let details_selector = Selector::parse("#viewad-details").unwrap();
    let li_selector = Selector::parse("li").unwrap();
    let summary_details: Option<BTreeMap<String, String>> =
        document.select(&details_selector).next().map(|details| {
            details
                .select(&li_selector)
                .filter_map(|item| {
                    let text = item.text().collect::<String>().replace(' ', "");
                    let mut lines = text.split('\n').filter(|line| !line.is_empty());
                    let key = lines.next()?.to_string();
                    let value = lines.next().unwrap_or_default().to_string();
                    Some((key, value))
                })
                .collect()
        });

    let description_selector = Selector::parse("#viewad-description").unwrap();
    let description = document
        .select(&description_selector)
        .next()
        .ok_or_else(|| malformed("viewad-description"))?
        .text()
        .collect::<String>()
        .trim()
        .to_string();

    Ok(ListingRecord {
        source: Source::Kleinanzeigen,
        posted,
        price,
        location,
        title,
        url: url.to_string(),
        summary_details,
        description,
        scraped_at: Utc::now(),
    })
}

/// Drop records whose advert text is empty. An empty description means the
/// poster wrote nothing — those adverts are not worth forwarding.
pub fn drop_blank_descriptions(records: Vec<ListingRecord>) -> Vec<ListingRecord> {
    let before = records.len();
    let kept: Vec<_> = records
        .into_iter()
        .filter(|record| !record.description.is_empty())
        .collect();
    info!(
        "{} removed as have no description: {} remaining",
        before - kept.len(),
        kept.len()
    );
    kept
}

/// Keep only records posted on `date` (site format `DD.MM.YYYY`).
pub fn posted_on(records: Vec<ListingRecord>, date: &str) -> Vec<ListingRecord> {
    records
        .into_iter()
        .filter(|record| record.posted == date)
        .collect()
}

/// Yesterday's date in the site's `DD.MM.YYYY` format. The search is meant
/// to run at midnight, covering the previous day's postings.
pub fn yesterday_stamp() -> String {
    (Local::now().date_naive() - Duration::days(1))
        .format("%d.%m.%Y")
        .to_string()
}

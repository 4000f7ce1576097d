//! Retry-coordinated extraction over the discovered candidates.
//!
//! Headless browsing against a site with bot mitigation times out a lot,
//! and most of those timeouts are transient. One pass over the candidates
//! is followed by bounded retry rounds over whatever failed, so a deleted
//! or blocked advert can never stall the run.

use std::mem;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::models::ListingRecord;
use crate::scrapers::browser::PageFetcher;
use crate::scrapers::error::ScrapeError;
use crate::scrapers::kleinanzeigen::extract_listing;
use crate::scrapers::rate_limit::delay_random;
use crate::scrapers::traits::PageSession;
use crate::scrapers::types::{FetchOutcome, ListingCandidate, ScrapeConfig, ScrapeReport};

/// Outcome of one fetch-and-extract attempt against an advert URL.
enum Attempt {
    Record(ListingRecord),
    TimedOut,
    Malformed,
}

/// Drives extraction over a candidate set: a first pass in discovery order,
/// then up to `max_retry_rounds` rounds over the failure queue.
///
/// Each retry round works on a snapshot of the queue and rebuilds a fresh
/// queue of the still-failing URLs, so completing a URL can never skip or
/// double-process another one in the same round.
pub struct ScrapeEngine<'a, S: PageSession + ?Sized> {
    session: &'a S,
    config: &'a ScrapeConfig,
    cancel: CancellationToken,
}

impl<'a, S: PageSession + ?Sized> ScrapeEngine<'a, S> {
    pub fn new(session: &'a S, config: &'a ScrapeConfig, cancel: CancellationToken) -> Self {
        Self {
            session,
            config,
            cancel,
        }
    }

    /// Run the full extraction over `candidates`.
    ///
    /// Every candidate URL ends up in exactly one of the report's lists:
    /// `records` (extracted), `failed` (still timing out after the final
    /// round, or not attempted before cancellation) or `malformed` (page
    /// rendered but a mandatory region was missing). Cancellation is
    /// honoured between URLs and finalizes the report without error.
    pub fn run(&self, candidates: &[ListingCandidate]) -> Result<ScrapeReport, ScrapeError> {
        let fetcher = PageFetcher::new(self.session);
        let mut report = ScrapeReport::default();
        let mut failed: Vec<String> = Vec::new();

        info!("Parsing {} adverts!", candidates.len());

        for (done, candidate) in candidates.iter().enumerate() {
            if self.cancel.is_cancelled() {
                failed.extend(candidates[done..].iter().map(|c| c.url.clone()));
                return Ok(self.finalize(report, failed, true));
            }

            match self.attempt(&fetcher, &candidate.url)? {
                Attempt::Record(record) => report.records.push(record),
                Attempt::TimedOut => {
                    warn!("{} did not load!! Skipping URL!", candidate.url);
                    failed.push(candidate.url.clone());
                }
                Attempt::Malformed => report.malformed.push(candidate.url.clone()),
            }

            // random rate limit to prevent failed requests
            delay_random(self.config.listing_delay.0, self.config.listing_delay.1)?;
            info!("{}/{} urls done in first round!", done + 1, candidates.len());
        }

        info!(
            "FIRST ROUND: parsed {}, {} failed URLs being re-tried!",
            report.records.len(),
            failed.len()
        );

        for round in 1..=self.config.max_retry_rounds {
            if failed.is_empty() {
                break;
            }

            let snapshot = mem::take(&mut failed);
            for (done, url) in snapshot.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    failed.extend(snapshot[done..].iter().cloned());
                    return Ok(self.finalize(report, failed, true));
                }

                match self.attempt(&fetcher, url)? {
                    Attempt::Record(record) => {
                        info!("Round {}: {} sorted in repeat round", round, url);
                        report.records.push(record);
                    }
                    Attempt::TimedOut => failed.push(url.clone()),
                    Attempt::Malformed => report.malformed.push(url.clone()),
                }

                delay_random(self.config.listing_delay.0, self.config.listing_delay.1)?;
            }

            info!(
                "Round {}: {} of {} URLs remain to be resolved!",
                round,
                failed.len(),
                snapshot.len()
            );
        }

        Ok(self.finalize(report, failed, false))
    }

    fn attempt(
        &self,
        fetcher: &PageFetcher<'_, S>,
        url: &str,
    ) -> Result<Attempt, ScrapeError> {
        let outcome = fetcher.fetch(url, &self.config.listing_marker, self.config.listing_timeout)?;
        match outcome {
            FetchOutcome::Success(page_source) => match extract_listing(url, &page_source) {
                Ok(record) => Ok(Attempt::Record(record)),
                Err(err @ ScrapeError::MalformedPage { .. }) => {
                    warn!("{} — dropping advert", err);
                    Ok(Attempt::Malformed)
                }
                Err(err) => Err(err),
            },
            FetchOutcome::Timeout(_) => Ok(Attempt::TimedOut),
        }
    }

    fn finalize(
        &self,
        mut report: ScrapeReport,
        failed: Vec<String>,
        cancelled: bool,
    ) -> ScrapeReport {
        if cancelled {
            warn!(
                "Run cancelled: {} records extracted, {} URLs pending",
                report.records.len(),
                failed.len()
            );
        } else if !failed.is_empty() {
            warn!(
                "{} failed URLs not loaded after {} retry rounds!",
                failed.len(),
                self.config.max_retry_rounds
            );
            warn!("Failed URLs: {:?}", failed);
        }
        report.failed = failed;
        report.cancelled = cancelled;
        report
    }
}

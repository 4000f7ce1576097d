use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{debug, info};

use crate::scrapers::error::ScrapeError;
use crate::scrapers::traits::PageSession;
use crate::scrapers::types::FetchOutcome;

/// How often the DOM is polled while waiting for a readiness marker.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A headless Chrome tab behind the [`PageSession`] capability.
///
/// The tab is borrowed from a [`Browser`] the caller launches and keeps
/// alive for the whole run; dropping the browser tears the session down on
/// every exit path.
pub struct ChromeSession {
    tab: Arc<Tab>,
}

impl ChromeSession {
    pub fn new(tab: Arc<Tab>) -> Self {
        Self { tab }
    }

    /// Launch a headless Chrome and open one tab for scraping. The returned
    /// [`Browser`] must outlive the session.
    pub fn launch() -> anyhow::Result<(Browser, Self)> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(true)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open tab")?;

        Ok((browser, Self::new(tab)))
    }
}

impl PageSession for ChromeSession {
    fn navigate(&self, url: &str) -> Result<(), ScrapeError> {
        self.tab.navigate_to(url)?;
        self.tab.wait_until_navigated()?;
        Ok(())
    }

    fn wait_until_present(&self, selector: &str, timeout: Duration) -> Result<bool, ScrapeError> {
        // Poll rather than use the tab's own waiter: an absent element must
        // come back as `false`, not as an opaque error.
        let deadline = Instant::now() + timeout;
        loop {
            if self.tab.find_element(selector).is_ok() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn page_source(&self) -> Result<String, ScrapeError> {
        Ok(self.tab.get_content()?)
    }
}

/// Navigate-and-wait wrapper shared by discovery and extraction.
pub struct PageFetcher<'a, S: PageSession + ?Sized> {
    session: &'a S,
}

impl<'a, S: PageSession + ?Sized> PageFetcher<'a, S> {
    pub fn new(session: &'a S) -> Self {
        Self { session }
    }

    /// Load `url` and block until `marker` is present or `timeout` elapses.
    ///
    /// A page that never renders its marker is fully failed: `Timeout`
    /// carries no partial source. Session-level failures (dead browser,
    /// unreachable host) propagate as errors and end the run.
    pub fn fetch(
        &self,
        url: &str,
        marker: &str,
        timeout: Duration,
    ) -> Result<FetchOutcome, ScrapeError> {
        self.session.navigate(url)?;
        if self.session.wait_until_present(marker, timeout)? {
            Ok(FetchOutcome::Success(self.session.page_source()?))
        } else {
            debug!(url, marker, "page did not render marker within budget");
            Ok(FetchOutcome::Timeout(url.to_string()))
        }
    }
}

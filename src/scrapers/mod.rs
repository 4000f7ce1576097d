pub mod browser;
pub mod engine;
pub mod error;
pub mod kleinanzeigen;
pub mod rate_limit;
pub mod traits;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use browser::{ChromeSession, PageFetcher};
pub use engine::ScrapeEngine;
pub use kleinanzeigen::KleinanzeigenScraper;
pub use traits::{PageSession, ScraperTrait};

pub mod models;
pub mod scrapers;

pub use models::{ListingRecord, Source};
pub use scrapers::error::ScrapeError;
pub use scrapers::KleinanzeigenScraper;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source of the property listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Source {
    Kleinanzeigen,
}

/// One extracted property advert.
///
/// `posted`, `price` and `location` keep the site's raw formats
/// (`11.03.2022`, `123.000 € VB`, free text) so downstream consumers decide
/// how to normalize them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRecord {
    pub source: Source,
    /// Posting date as displayed on the advert page, e.g. `11.03.2022`.
    pub posted: String,
    pub price: String,
    pub location: String,
    pub title: String,
    pub url: String,
    /// Structured "details" table of the advert. `None` when the advert has
    /// no details section at all, as opposed to an empty map.
    pub summary_details: Option<BTreeMap<String, String>>,
    /// Full advert text. Empty string when the advert has a description
    /// section with no text in it.
    pub description: String,
    pub scraped_at: DateTime<Utc>,
}

use std::env;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};

use haus_scout::scrapers::browser::ChromeSession;
use haus_scout::scrapers::kleinanzeigen::{self, KleinanzeigenScraper};
use haus_scout::scrapers::traits::ScraperTrait;
use haus_scout::scrapers::types::{ScrapeConfig, SearchTarget};

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn settings_from_env() -> (SearchTarget, ScrapeConfig) {
    let target = SearchTarget {
        base_url: env_or(
            "BASE_URL",
            "https://www.ebay-kleinanzeigen.de/s-haus-kaufen",
        ),
        location: env_or("SEARCH_LOCATION", "berlin"),
        radius: env_or("SEARCH_RADIUS", "20"),
        category_code: env_or("CAT_CODE", "c208l3331"),
    };

    let mut config = ScrapeConfig::default();
    if let Ok(pages) = env_or("PAGE_COUNT", "").parse() {
        config.page_count = pages;
    }
    if let Ok(rounds) = env_or("MAX_RETRY_ROUNDS", "").parse() {
        config.max_retry_rounds = rounds;
    }
    if let Ok(tags) = env::var("RECENCY_TAGS") {
        config.recency_tags = tags
            .split(',')
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
    }

    (target, config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let begin = Instant::now();
    info!("🏠 Haus Scout - Kleinanzeigen search started!");

    let (target, config) = settings_from_env();
    info!("Searching in {} km around {}!", target.radius, target.location);

    // The browser outlives the scraper, which only borrows the session.
    let (_browser, session) = ChromeSession::launch()?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received — finishing current advert and stopping");
            ctrl_c.cancel();
        }
    });

    let scraper = KleinanzeigenScraper::new(&session, target, config, cancel);
    let report = scraper.scrape().await?;

    if report.cancelled {
        warn!(
            "Run cancelled with {} adverts pending — keeping partial results",
            report.failed.len()
        );
    } else if !report.failed.is_empty() {
        warn!("{} adverts never loaded: {:?}", report.failed.len(), report.failed);
    }

    let mut records = kleinanzeigen::drop_blank_descriptions(report.records);
    if let Ok(date) = env::var("POSTED_ON") {
        let date = if date == "yesterday" {
            kleinanzeigen::yesterday_stamp()
        } else {
            date
        };
        records = kleinanzeigen::posted_on(records, &date);
        info!("{} adverts posted on {}", records.len(), date);
    }

    info!("\n✅ Scraped {} adverts\n", records.len());

    for (i, record) in records.iter().enumerate() {
        println!("{}. {} ({})", i + 1, record.title, record.price);
        println!("   {}", record.location);
        println!("   Posted: {}", record.posted);
        println!("   URL: {}", record.url);
        println!();
    }

    // Save to main JSON file
    let json = serde_json::to_string_pretty(&records)?;
    tokio::fs::write("listings.json", json).await?;
    info!("💾 Saved all adverts to listings.json");

    // Save each advert to separate file in raw_scrape/
    tokio::fs::create_dir_all("raw_scrape").await?;

    for record in &records {
        let id = record.url.rsplit('/').next().unwrap_or("advert");
        let filename = format!("raw_scrape/{id}.json");
        let record_json = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&filename, record_json).await?;
    }

    info!("💾 Saved {} individual advert files to raw_scrape/", records.len());
    info!(
        "Search finished in {:.2} minutes",
        begin.elapsed().as_secs_f64() / 60.0
    );

    Ok(())
}

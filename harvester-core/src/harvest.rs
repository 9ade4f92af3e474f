use crate::error::{HarvestError, Result};
use crate::ledger::Ledger;
use crate::report::{build_rows, write_report};
use harvester_scanner::extract::{
    LEADING_TILE_SKIP, count_tiles, extract_listings, extract_website,
};
use harvester_scanner::{
    Listing, PageSession, PaginationConfig, PaginationOutcome, ScanError, load_all_listings,
};
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

pub const DEFAULT_DIRECTORY_URL: &str = "https://appexchangejp.salesforce.com/consulting";
pub const DEFAULT_LEDGER_PATH: &str = "fetched.txt";
pub const DEFAULT_OUTPUT_PATH: &str = "result.csv";

/// Waits between page interactions
#[derive(Debug, Clone)]
pub struct HarvestTiming {
    /// Settle time after the directory page loads
    pub directory_render: Duration,
    /// Settle time after each detail page loads
    pub detail_render: Duration,
    /// Politeness delay before each detail visit, inclusive range in seconds
    pub min_delay_secs: u64,
    pub max_delay_secs: u64,
}

impl Default for HarvestTiming {
    fn default() -> Self {
        Self {
            directory_render: Duration::from_secs(5),
            detail_render: Duration::from_secs(3),
            min_delay_secs: 3,
            max_delay_secs: 5,
        }
    }
}

/// Options for configuring a harvest run
pub struct HarvestOptions {
    pub directory_url: Url,
    pub ledger_path: PathBuf,
    pub output_path: PathBuf,
    pub skip: usize,
    pub pagination: PaginationConfig,
    pub timing: HarvestTiming,
    pub show_progress_bars: bool,
}

impl HarvestOptions {
    pub fn new(directory_url: Url, ledger_path: PathBuf, output_path: PathBuf) -> Self {
        Self {
            directory_url,
            ledger_path,
            output_path,
            skip: LEADING_TILE_SKIP,
            pagination: PaginationConfig::default(),
            timing: HarvestTiming::default(),
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting harvest progress
pub type HarvestProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct HarvestSummary {
    pub pagination: Option<PaginationOutcome>,
    pub loaded_tiles: usize,
    pub extracted: usize,
    pub enriched: usize,
    pub failed_details: usize,
    pub listings: Vec<Listing>,
}

/// Run one harvest against `session`.
///
/// Only the directory load, the ledger read and the report write can fail
/// the run. Pagination trouble is logged; detail page trouble leaves that
/// listing without a website.
pub async fn execute_harvest<S: PageSession, R: Rng>(
    session: &mut S,
    options: &HarvestOptions,
    rng: &mut R,
    progress_callback: Option<HarvestProgressCallback>,
) -> Result<HarvestSummary> {
    let report = |msg: String| {
        if let Some(ref callback) = progress_callback {
            callback(msg);
        }
    };

    let mut ledger = Ledger::load(&options.ledger_path).map_err(|source| HarvestError::Ledger {
        path: options.ledger_path.display().to_string(),
        source,
    })?;

    let directory_url = options.directory_url.as_str();
    session
        .navigate(directory_url)
        .await
        .map_err(|source| startup_error(directory_url, source))?;
    session.sleep(options.timing.directory_render).await;

    let pagination = match load_all_listings(session, &options.pagination).await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            warn!("Could not load more listings: {}", e);
            report(format!("[!] Loading more listings failed: {}", e));
            None
        }
    };

    let html = session
        .read_content("body")
        .await
        .map_err(|source| startup_error(directory_url, source))?;

    let loaded_tiles = count_tiles(&html);
    let mut listings = extract_listings(&html, &options.directory_url, options.skip, ledger.ids());
    info!(
        "{} tiles on page, {} new listings",
        loaded_tiles,
        listings.len()
    );
    report(format!("New listings to fetch: {}", listings.len()));

    let failed_details = enrich_listings(
        session,
        &mut listings,
        &mut ledger,
        &options.timing,
        rng,
        options.show_progress_bars,
        &report,
    )
    .await;

    let rows = build_rows(&listings);
    write_report(&options.output_path, &rows).map_err(|source| HarvestError::Report {
        path: options.output_path.display().to_string(),
        source,
    })?;
    info!(
        "Wrote {} rows to {}",
        rows.len(),
        options.output_path.display()
    );

    Ok(HarvestSummary {
        pagination,
        loaded_tiles,
        extracted: listings.len(),
        enriched: listings.iter().filter(|l| l.is_enriched()).count(),
        failed_details,
        listings,
    })
}

/// Visit each listing's detail page in turn and fill in its website.
///
/// Every attempted id lands in the ledger whether or not the visit worked.
/// Returns the number of visits that failed.
pub async fn enrich_listings<S: PageSession, R: Rng>(
    session: &mut S,
    listings: &mut [Listing],
    ledger: &mut Ledger,
    timing: &HarvestTiming,
    rng: &mut R,
    show_progress_bars: bool,
    report: &dyn Fn(String),
) -> usize {
    let total = listings.len();
    let progress_bar = if show_progress_bars && total > 0 {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap(),
        );
        Some(pb)
    } else {
        None
    };

    let mut failed = 0;
    for (idx, listing) in listings.iter_mut().enumerate() {
        let delay = rng.gen_range(timing.min_delay_secs..=timing.max_delay_secs);
        let msg = format!(
            "[{}/{}] Fetching {} (waiting {}s)",
            idx + 1,
            total,
            listing.name,
            delay
        );
        match progress_bar {
            Some(ref pb) => {
                pb.set_message(listing.name.clone());
                pb.suspend(|| report(msg));
            }
            None => report(msg),
        }

        session.sleep(Duration::from_secs(delay)).await;

        match fetch_website(session, &listing.detail_url, timing.detail_render).await {
            Ok(Some(website)) => listing.website_url = Some(website),
            Ok(None) => info!("No website link on {}", listing.detail_url),
            Err(e) => {
                failed += 1;
                warn!("Detail page {} failed: {}", listing.detail_url, e);
            }
        }

        if let Err(e) = ledger.append(&listing.id) {
            warn!(
                "Could not record {} in ledger {}: {}",
                listing.id,
                ledger.path().display(),
                e
            );
        }

        if let Some(ref pb) = progress_bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!("{} detail pages visited", total));
    }

    failed
}

/// Load a detail page and read its publisher website link.
pub async fn fetch_website<S: PageSession>(
    session: &mut S,
    detail_url: &str,
    render_wait: Duration,
) -> std::result::Result<Option<String>, ScanError> {
    session.navigate(detail_url).await?;
    session.sleep(render_wait).await;
    let html = session.read_content("body").await?;
    Ok(extract_website(&html))
}

fn startup_error(url: &str, source: ScanError) -> HarvestError {
    HarvestError::Startup {
        url: url.to_string(),
        source,
    }
}

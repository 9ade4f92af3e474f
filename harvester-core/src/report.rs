// CSV report of the listings processed in one run

use harvester_scanner::Listing;
use serde::Serialize;
use std::path::Path;

/// Column titles: company name, detail page URL, website URL.
pub const REPORT_HEADER: [&str; 3] = ["会社名", "詳細ページURL", "WebサイトURL"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub detail_url: String,
    pub website_url: String,
}

impl From<&Listing> for ReportRow {
    fn from(listing: &Listing) -> Self {
        Self {
            name: listing.name.clone(),
            detail_url: listing.detail_url.clone(),
            website_url: listing.website_url.clone().unwrap_or_default(),
        }
    }
}

pub fn build_rows(listings: &[Listing]) -> Vec<ReportRow> {
    listings.iter().map(ReportRow::from).collect()
}

/// Replace whatever is at `path` with a fresh report. The header is always
/// written, even when there are no rows.
pub fn write_report(path: &Path, rows: &[ReportRow]) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(REPORT_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

use harvester_scanner::ScanError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Failed to load directory page {url}: {source}")]
    Startup { url: String, source: ScanError },

    #[error("Failed to read ledger {path}: {source}")]
    Ledger {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write report {path}: {source}")]
    Report { path: String, source: csv::Error },
}

pub type Result<T> = std::result::Result<T, HarvestError>;

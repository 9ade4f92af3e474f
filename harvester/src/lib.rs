pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    Engine, RunConfig, describe_pagination, expand_path, failure_label, format_summary,
};

// Re-export harvest functionality from harvester-core
pub use harvester_core::harvest::{
    DEFAULT_DIRECTORY_URL, DEFAULT_LEDGER_PATH, DEFAULT_OUTPUT_PATH, HarvestOptions,
    HarvestProgressCallback, HarvestSummary, execute_harvest,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Browser error: {0}")]
    BrowserError(#[from] chromiumoxide::error::CdpError),

    #[error("Browser launch failed: {0}")]
    LaunchError(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Script evaluation failed: {0}")]
    ScriptError(String),

    #[error("Unexpected script result: {0}")]
    ValueError(#[from] serde_json::Error),

    #[error("No element matches selector '{0}'")]
    MissingContent(String),

    #[error("No page loaded")]
    NoPage,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ScanError>;

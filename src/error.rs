use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Scan target is required")]
    MissingTarget,

    #[error("Invalid start URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("A scan is already running on this controller")]
    AlreadyRunning,

    #[error("Scan task failed: {0}")]
    TaskFailed(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;

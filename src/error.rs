use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("Browser session could not be started: {0}")]
    SessionSetup(String),

    #[error("Page did not finish loading: {0}")]
    PageLoad(String),

    #[error("Malformed show entry: {0}")]
    Extraction(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Report generation failed: {0}")]
    Report(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),
}

impl From<rust_xlsxwriter::XlsxError> for ScraperError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ScraperError::Report(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;

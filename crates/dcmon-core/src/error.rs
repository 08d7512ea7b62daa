// crates/dcmon-core/src/error.rs

use dcmon_parser::ParserError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("No data extracted: {0}")]
    NoData(String),

    #[error("Document parsing failed: {0}")]
    Parser(#[from] ParserError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Remote feed request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Remote feed request to {url} timed out after {timeout_secs}s")]
    FetchTimeout { url: String, timeout_secs: u64 },

    #[error("Remote feed {url} answered HTTP {status}")]
    FetchStatus { url: String, status: u16 },

    #[error("Remote feed is malformed: {0}")]
    Feed(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;

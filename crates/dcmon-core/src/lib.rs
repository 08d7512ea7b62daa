pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod ingestion;
pub mod session;
pub mod stats;
pub mod views;

pub use dcmon_parser as parser;
pub use dcmon_parser::{Metric, TimeSeriesRecord, Zone, ZoneSeries};
pub use error::{DashboardError, Result};

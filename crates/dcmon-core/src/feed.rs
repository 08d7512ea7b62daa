use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use dcmon_parser::{Metric, TimeSeriesRecord};
use tracing::{debug, info};

use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};

const DATE_COLUMNS: [&str; 4] = ["record_date", "date", "时间", "日期"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Somewhere the tabular feed can be read from.
pub trait FeedSource {
    /// Stable identity of the source, used as its cache key.
    fn describe(&self) -> String;
    fn fetch(&self) -> Result<Vec<u8>>;
}

/// The published CSV fetched over HTTP. A single attempt, no retry.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    url: String,
    timeout: Duration,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(config.feed_url.clone(), config.feed_timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request_error(&self, source: reqwest::Error) -> DashboardError {
        if source.is_timeout() {
            DashboardError::FetchTimeout {
                url: self.url.clone(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            DashboardError::Fetch {
                url: self.url.clone(),
                source,
            }
        }
    }
}

impl FeedSource for HttpFeed {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<Vec<u8>> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| self.request_error(err))?;

        debug!(url = %self.url, timeout_secs = self.timeout.as_secs(), "requesting feed");
        let response = client
            .get(&self.url)
            .send()
            .map_err(|err| self.request_error(err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::FetchStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(|err| self.request_error(err))?;
        Ok(body.to_vec())
    }
}

/// A feed snapshot on disk, for offline use and tests.
#[derive(Debug, Clone)]
pub struct LocalFeed {
    path: PathBuf,
}

impl LocalFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FeedSource for LocalFeed {
    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }

    fn fetch(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }
}

/// Fetches and parses a feed in one step.
pub fn load_feed(source: &dyn FeedSource) -> Result<TimeSeriesRecord> {
    let bytes = source.fetch()?;
    let record = parse_feed_csv(&bytes)?;
    info!(
        source = %source.describe(),
        rows = record.pue.len(),
        dates = record.dates.len(),
        "loaded remote feed"
    );
    Ok(record)
}

/// Parses the headed CSV feed into a record whose series all share the
/// row count.
///
/// Missing metric columns become zeros and unparsable numbers become `0.0`,
/// which downstream statistics treat as "no reading". A date column that is
/// present must parse in full.
pub fn parse_feed_csv(bytes: &[u8]) -> Result<TimeSeriesRecord> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_lowercase())
        .collect();

    let date_column = headers
        .iter()
        .position(|header| DATE_COLUMNS.contains(&header.as_str()));

    let metrics = Metric::all();
    let columns: Vec<(Metric, Option<usize>)> = metrics
        .iter()
        .map(|metric| {
            let name = metric.canonical_name();
            (*metric, headers.iter().position(|header| *header == name))
        })
        .collect();

    for (metric, column) in &columns {
        if column.is_none() {
            debug!(column = %metric, "feed column missing, filling with zeros");
        }
    }

    let mut record = TimeSeriesRecord::new();
    let mut rows = 0usize;
    for (row_idx, row) in reader.records().enumerate() {
        let row = row?;
        rows += 1;

        if let Some(column) = date_column {
            let raw = row.get(column).unwrap_or_default();
            let date = parse_feed_date(raw).ok_or_else(|| {
                DashboardError::Feed(format!(
                    "row {}: cannot parse date '{raw}' in column '{}'",
                    row_idx + 2,
                    headers[column]
                ))
            })?;
            record.dates.push(date);
        }

        for (metric, column) in &columns {
            let value = column
                .and_then(|column| row.get(column))
                .map(parse_feed_number)
                .unwrap_or(0.0);
            record.series_mut(*metric).push(value);
        }
    }

    if rows == 0 {
        return Err(DashboardError::NoData("feed has a header but no rows".to_string()));
    }

    Ok(record)
}

fn parse_feed_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|datetime| datetime.date())
        })
}

fn parse_feed_number(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

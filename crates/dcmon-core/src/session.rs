use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use dcmon_parser::{TimeSeriesRecord, Zone};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::TtlCache;
use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::feed::{load_feed, FeedSource};
use crate::ingestion::{batch_key, ingest_documents, DocumentInput, DocumentReport, IngestionBatch};
use crate::views::ClimateMetric;

/// Zones shown when a page is first opened.
pub const DEFAULT_SELECTED_ZONES: usize = 2;

/// Upload batches kept in memory; each holds the full cell stream.
pub const DOCUMENT_CACHE_ENTRIES: usize = 32;
/// Distinct feed URLs kept in memory.
pub const FEED_CACHE_ENTRIES: usize = 8;

/// The zones a user has chosen for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneSelection {
    zones: BTreeSet<Zone>,
}

impl ZoneSelection {
    pub fn new(zones: impl IntoIterator<Item = Zone>) -> Self {
        Self {
            zones: zones.into_iter().collect(),
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Self {
        Self::new(Zone::ALL.choose_multiple(rng, count).copied())
    }

    /// Flips one zone and returns whether it is now selected.
    pub fn toggle(&mut self, zone: Zone) -> bool {
        if self.zones.remove(&zone) {
            false
        } else {
            self.zones.insert(zone);
            true
        }
    }

    pub fn is_selected(&self, zone: Zone) -> bool {
        self.zones.contains(&zone)
    }

    /// Selected zones in dashboard order.
    pub fn zones(&self) -> Vec<Zone> {
        self.zones.iter().copied().collect()
    }

    pub fn display_names(&self) -> Vec<String> {
        self.zones
            .iter()
            .map(|zone| zone.display_name().to_string())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DataSource {
    Feed { url: String },
    Documents { names: Vec<String>, key: String },
}

/// Per-user dashboard state.
#[derive(Debug, Clone)]
pub struct Session {
    temperature_zones: ZoneSelection,
    humidity_zones: ZoneSelection,
    record: Option<Arc<TimeSeriesRecord>>,
    source: Option<DataSource>,
    reports: Vec<DocumentReport>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Starts empty, with a random pair of zones preselected on each page.
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        Self::with_selection(
            ZoneSelection::random(&mut rng, DEFAULT_SELECTED_ZONES),
            ZoneSelection::random(&mut rng, DEFAULT_SELECTED_ZONES),
        )
    }

    pub fn with_selection(temperature: ZoneSelection, humidity: ZoneSelection) -> Self {
        Self {
            temperature_zones: temperature,
            humidity_zones: humidity,
            record: None,
            source: None,
            reports: Vec::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.record.is_some()
    }

    pub fn record(&self) -> Option<&TimeSeriesRecord> {
        self.record.as_deref()
    }

    pub fn source(&self) -> Option<&DataSource> {
        self.source.as_ref()
    }

    /// Per-document outcomes of the last document load.
    pub fn reports(&self) -> &[DocumentReport] {
        &self.reports
    }

    pub fn selection(&self, metric: ClimateMetric) -> &ZoneSelection {
        match metric {
            ClimateMetric::Temperature => &self.temperature_zones,
            ClimateMetric::Humidity => &self.humidity_zones,
        }
    }

    pub fn toggle_zone(&mut self, metric: ClimateMetric, zone: Zone) -> bool {
        match metric {
            ClimateMetric::Temperature => self.temperature_zones.toggle(zone),
            ClimateMetric::Humidity => self.humidity_zones.toggle(zone),
        }
    }

    pub fn selected_zones(&self, metric: ClimateMetric) -> Vec<String> {
        self.selection(metric).display_names()
    }

    /// Forgets the loaded data so the next page view loads it again.
    /// Zone selections survive.
    pub fn reload(&mut self) {
        debug!("session reload requested");
        self.record = None;
        self.source = None;
        self.reports.clear();
    }

    fn attach(&mut self, record: Arc<TimeSeriesRecord>, source: DataSource) {
        self.record = Some(record);
        self.source = Some(source);
    }
}

/// Shared loading machinery: configuration and the memoised loaders.
#[derive(Debug)]
pub struct Dashboard {
    config: DashboardConfig,
    feed_cache: TtlCache<String, Arc<TimeSeriesRecord>>,
    document_cache: TtlCache<String, Arc<IngestionBatch>>,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        let feed_ttl = config.feed_cache_ttl();
        Self {
            config,
            feed_cache: TtlCache::new(Some(feed_ttl)).with_max_entries(FEED_CACHE_ENTRIES),
            document_cache: TtlCache::new(None).with_max_entries(DOCUMENT_CACHE_ENTRIES),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Loads the feed into the session, reusing a cached copy within the TTL.
    /// On failure the session is left as it was.
    pub fn load_feed(&mut self, session: &mut Session, source: &dyn FeedSource) -> Result<()> {
        let key = source.describe();
        let record = self
            .feed_cache
            .get_or_try_insert_with(key.clone(), Instant::now(), || {
                load_feed(source).map(Arc::new)
            })?;

        if record.is_empty() {
            return Err(DashboardError::NoData(format!("feed {key} holds no readings")));
        }

        session.reports.clear();
        session.attach(record, DataSource::Feed { url: key });
        Ok(())
    }

    /// Loads the feed only when the session has no data yet.
    pub fn ensure_feed_loaded(
        &mut self,
        session: &mut Session,
        source: &dyn FeedSource,
    ) -> Result<()> {
        if session.is_loaded() {
            return Ok(());
        }
        self.load_feed(session, source)
    }

    /// Extracts one record from an upload batch and loads it into the session.
    ///
    /// Identical batches, by content, are extracted once. A batch that yields
    /// no dates is reported as [`DashboardError::NoData`] and leaves the
    /// session as it was.
    pub fn load_documents(
        &mut self,
        session: &mut Session,
        inputs: &[DocumentInput<'_>],
    ) -> Result<Arc<IngestionBatch>> {
        let key = batch_key(inputs);
        let batch = self
            .document_cache
            .get_or_try_insert_with(key.clone(), Instant::now(), || {
                ingest_documents(inputs).map(Arc::new)
            })?;

        if batch.record.dates.is_empty() {
            return Err(DashboardError::NoData(format!(
                "no dates recognised in {} document(s)",
                inputs.len()
            )));
        }

        info!(
            documents = inputs.len(),
            dates = batch.record.dates.len(),
            key = %key,
            "loaded document batch into session"
        );
        session.reports = batch.reports.clone();
        session.attach(
            Arc::new(batch.record.clone()),
            DataSource::Documents {
                names: inputs.iter().map(|input| input.name.to_string()).collect(),
                key,
            },
        );
        Ok(batch)
    }
}

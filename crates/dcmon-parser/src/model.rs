use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One of the five monitored areas of the facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Zone {
    MainRoom,
    ColdAisle,
    BatteryRoom,
    CarrierRoom,
    PowerRoom,
}

impl Zone {
    pub const ALL: [Zone; 5] = [
        Zone::MainRoom,
        Zone::ColdAisle,
        Zone::BatteryRoom,
        Zone::CarrierRoom,
        Zone::PowerRoom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::MainRoom => "main_room",
            Zone::ColdAisle => "cold_aisle",
            Zone::BatteryRoom => "battery_room",
            Zone::CarrierRoom => "carrier_room",
            Zone::PowerRoom => "power_room",
        }
    }

    /// Name shown on the dashboard and used for zone selection.
    pub fn display_name(&self) -> &'static str {
        match self {
            Zone::MainRoom => "主机房",
            Zone::ColdAisle => "冷通道",
            Zone::BatteryRoom => "电池间",
            Zone::CarrierRoom => "运营间",
            Zone::PowerRoom => "配电间",
        }
    }

    /// Column stem in the remote feed, e.g. `computer_room` for `computer_room_temp`.
    pub fn csv_stem(&self) -> &'static str {
        match self {
            Zone::MainRoom => "computer_room",
            Zone::ColdAisle => "cold_aisle",
            Zone::BatteryRoom => "battery_room",
            Zone::CarrierRoom => "carrier_room",
            Zone::PowerRoom => "power_room",
        }
    }

    pub fn from_display_name(name: &str) -> Option<Zone> {
        let trimmed = name.trim();
        Zone::ALL
            .into_iter()
            .find(|zone| zone.display_name() == trimmed)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl TryFrom<&str> for Zone {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if let Some(zone) = Zone::from_display_name(value) {
            return Ok(zone);
        }
        let lower = value.trim().to_ascii_lowercase();
        Zone::ALL
            .into_iter()
            .find(|zone| zone.as_str() == lower || zone.csv_stem() == lower)
            .ok_or_else(|| format!("unknown zone '{}'", value.trim()))
    }
}

/// Every numeric series carried by a [`TimeSeriesRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Temperature(Zone),
    Humidity(Zone),
    Pue,
    Hydrogen,
}

impl Metric {
    pub fn all() -> Vec<Metric> {
        let mut metrics = Vec::with_capacity(12);
        for zone in Zone::ALL {
            metrics.push(Metric::Temperature(zone));
            metrics.push(Metric::Humidity(zone));
        }
        metrics.push(Metric::Hydrogen);
        metrics.push(Metric::Pue);
        metrics
    }

    pub fn canonical_name(&self) -> String {
        match self {
            Metric::Temperature(zone) => format!("{}_temp", zone.csv_stem()),
            Metric::Humidity(zone) => format!("{}_humidity", zone.csv_stem()),
            Metric::Pue => "pue".to_string(),
            Metric::Hydrogen => "hydrogen_sensor".to_string(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneSeries {
    pub temperature: Vec<f64>,
    pub humidity: Vec<f64>,
}

impl ZoneSeries {
    /// Appends one reading; temperature and humidity always grow together.
    pub fn push_reading(&mut self, temperature: f64, humidity: f64) {
        self.temperature.push(temperature);
        self.humidity.push(humidity);
    }

    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }
}

/// Named series recovered from one batch of reports or from the remote feed.
///
/// Each series grows on its own. Nothing guarantees that index `k` of
/// `dates` belongs to index `k` of any metric series; see [`Self::is_aligned`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    pub dates: Vec<NaiveDate>,
    pub main_room: ZoneSeries,
    pub cold_aisle: ZoneSeries,
    pub battery_room: ZoneSeries,
    pub carrier_room: ZoneSeries,
    pub power_room: ZoneSeries,
    pub pue: Vec<f64>,
    pub hydrogen: Vec<f64>,
}

impl TimeSeriesRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zone(&self, zone: Zone) -> &ZoneSeries {
        match zone {
            Zone::MainRoom => &self.main_room,
            Zone::ColdAisle => &self.cold_aisle,
            Zone::BatteryRoom => &self.battery_room,
            Zone::CarrierRoom => &self.carrier_room,
            Zone::PowerRoom => &self.power_room,
        }
    }

    pub fn zone_mut(&mut self, zone: Zone) -> &mut ZoneSeries {
        match zone {
            Zone::MainRoom => &mut self.main_room,
            Zone::ColdAisle => &mut self.cold_aisle,
            Zone::BatteryRoom => &mut self.battery_room,
            Zone::CarrierRoom => &mut self.carrier_room,
            Zone::PowerRoom => &mut self.power_room,
        }
    }

    pub fn series(&self, metric: Metric) -> &[f64] {
        match metric {
            Metric::Temperature(zone) => &self.zone(zone).temperature,
            Metric::Humidity(zone) => &self.zone(zone).humidity,
            Metric::Pue => &self.pue,
            Metric::Hydrogen => &self.hydrogen,
        }
    }

    pub fn series_mut(&mut self, metric: Metric) -> &mut Vec<f64> {
        match metric {
            Metric::Temperature(zone) => &mut self.zone_mut(zone).temperature,
            Metric::Humidity(zone) => &mut self.zone_mut(zone).humidity,
            Metric::Pue => &mut self.pue,
            Metric::Hydrogen => &mut self.hydrogen,
        }
    }

    /// Lengths of every numeric series in [`Metric::all`] order.
    pub fn series_lengths(&self) -> Vec<(Metric, usize)> {
        Metric::all()
            .into_iter()
            .map(|metric| (metric, self.series(metric).len()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
            && Metric::all()
                .into_iter()
                .all(|metric| self.series(metric).is_empty())
    }

    /// True when every non-empty series has exactly as many entries as `dates`.
    pub fn is_aligned(&self) -> bool {
        let expected = self.dates.len();
        self.series_lengths()
            .into_iter()
            .all(|(_, len)| len == 0 || len == expected)
    }
}

/// One table of text cells, rows top-to-bottom, cells left-to-right.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

/// The tables of one source document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDocument {
    pub tables: Vec<Table>,
}

impl TableDocument {
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    pub fn cell_count(&self) -> usize {
        self.tables.iter().map(Table::cell_count).sum()
    }
}

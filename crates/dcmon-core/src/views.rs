//! Chart-ready view models for each dashboard page.
//!
//! Nothing here renders; every type serialises to JSON for whichever front
//! end draws it.

use chrono::NaiveDate;
use dcmon_parser::{Metric, TimeSeriesRecord, Zone};
use serde::Serialize;

use crate::stats::{
    data_quality, overview, DataQuality, HydrogenStatus, Overview, PueRating, SeriesStats,
    HYDROGEN_SAFE_PPM, PUE_EXCELLENT, PUE_FAIR, PUE_GOOD,
};

/// Series colours, assigned to zones in selection order.
pub const PALETTE: [&str; 5] = ["red", "blue", "green", "orange", "purple"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ClimateMetric {
    Temperature,
    Humidity,
}

impl ClimateMetric {
    pub fn metric(&self, zone: Zone) -> Metric {
        match self {
            ClimateMetric::Temperature => Metric::Temperature(zone),
            ClimateMetric::Humidity => Metric::Humidity(zone),
        }
    }

    fn chart_title(&self) -> &'static str {
        match self {
            ClimateMetric::Temperature => "数据中心温度监控 (最近数据)",
            ClimateMetric::Humidity => "数据中心湿度监控 (最近数据)",
        }
    }

    fn y_label(&self) -> &'static str {
        match self {
            ClimateMetric::Temperature => "温度 (℃)",
            ClimateMetric::Humidity => "湿度 (%)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Position in the full series, used as the x value when `date` is absent.
    pub index: usize,
    pub date: Option<NaiveDate>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub color: &'static str,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub value: f64,
    pub color: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: &'static str,
    pub y_label: &'static str,
    pub series: Vec<ChartSeries>,
    pub reference_lines: Vec<ReferenceLine>,
}

impl Chart {
    pub fn has_data(&self) -> bool {
        self.series.iter().any(|series| !series.points.is_empty())
    }
}

/// Keeps the last `limit` non-zero values, each paired with the date at the
/// same index.
///
/// Series and dates are not guaranteed to line up; a value past the end of
/// `dates` gets no date rather than a borrowed one.
pub fn recent_points(dates: &[NaiveDate], values: &[f64], limit: usize) -> Vec<ChartPoint> {
    let points: Vec<ChartPoint> = values
        .iter()
        .enumerate()
        .filter(|(_, value)| **value != 0.0)
        .map(|(index, value)| ChartPoint {
            index,
            date: dates.get(index).copied(),
            value: *value,
        })
        .collect();
    let skip = points.len().saturating_sub(limit);
    points.into_iter().skip(skip).collect()
}

/// Zones named in `names` (display names or identifiers) that have data for
/// `metric`, in selection order. Unknown names are ignored.
pub fn filter_zones(
    record: &TimeSeriesRecord,
    metric: ClimateMetric,
    names: &[String],
) -> Vec<Zone> {
    let mut zones = Vec::new();
    for name in names {
        let Ok(zone) = Zone::try_from(name.as_str()) else {
            continue;
        };
        if zones.contains(&zone) {
            continue;
        }
        if record.series(metric.metric(zone)).iter().any(|value| *value != 0.0) {
            zones.push(zone);
        }
    }
    zones
}

pub fn climate_chart(
    record: &TimeSeriesRecord,
    metric: ClimateMetric,
    zones: &[Zone],
    limit: usize,
) -> Chart {
    let series = zones
        .iter()
        .enumerate()
        .map(|(idx, zone)| ChartSeries {
            label: zone.display_name().to_string(),
            color: PALETTE[idx % PALETTE.len()],
            points: recent_points(&record.dates, record.series(metric.metric(*zone)), limit),
        })
        .collect();

    Chart {
        title: metric.chart_title(),
        y_label: metric.y_label(),
        series,
        reference_lines: Vec::new(),
    }
}

pub fn pue_chart(record: &TimeSeriesRecord, limit: usize) -> Chart {
    Chart {
        title: "PUE能效指标 (最近数据)",
        y_label: "PUE值",
        series: vec![ChartSeries {
            label: "PUE".to_string(),
            color: "blue",
            points: recent_points(&record.dates, &record.pue, limit),
        }],
        reference_lines: vec![
            ReferenceLine {
                value: PUE_EXCELLENT,
                color: "green",
                label: "优秀目标 (1.5)",
            },
            ReferenceLine {
                value: PUE_GOOD,
                color: "orange",
                label: "良好目标 (1.6)",
            },
            ReferenceLine {
                value: PUE_FAIR,
                color: "red",
                label: "警戒线 (1.8)",
            },
        ],
    }
}

pub fn hydrogen_chart(record: &TimeSeriesRecord, limit: usize) -> Chart {
    Chart {
        title: "氢气浓度监测 (最近数据)",
        y_label: "氢气浓度 (ppm)",
        series: vec![ChartSeries {
            label: "氢气浓度".to_string(),
            color: "purple",
            points: recent_points(&record.dates, &record.hydrogen, limit),
        }],
        reference_lines: vec![ReferenceLine {
            value: HYDROGEN_SAFE_PPM,
            color: "green",
            label: "安全阈值 (50ppm)",
        }],
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewPage {
    pub overview: Overview,
    pub quality: DataQuality,
    pub temperature_trend: Chart,
    pub pue_trend: Chart,
}

/// Zones previewed on the overview temperature trend.
pub const OVERVIEW_TREND_ZONES: [Zone; 2] = [Zone::MainRoom, Zone::ColdAisle];

pub fn overview_page(record: &TimeSeriesRecord, preview_points: usize) -> OverviewPage {
    let temperature_trend = Chart {
        title: "温度趋势 (最近数据)",
        ..climate_chart(
            record,
            ClimateMetric::Temperature,
            &OVERVIEW_TREND_ZONES,
            preview_points,
        )
    };
    let pue_trend = Chart {
        title: "PUE趋势 (最近数据)",
        reference_lines: vec![ReferenceLine {
            value: PUE_EXCELLENT,
            color: "green",
            label: "目标值 1.5",
        }],
        ..pue_chart(record, preview_points)
    };

    OverviewPage {
        overview: overview(record),
        quality: data_quality(record),
        temperature_trend,
        pue_trend,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneStats {
    pub zone: Zone,
    pub name: &'static str,
    pub stats: Option<SeriesStats>,
}

/// Temperature or humidity page for the selected zones.
#[derive(Debug, Clone, Serialize)]
pub struct ZonePage {
    pub metric: ClimateMetric,
    pub chart: Chart,
    pub zones: Vec<ZoneStats>,
}

pub fn zone_page(
    record: &TimeSeriesRecord,
    metric: ClimateMetric,
    selected: &[String],
    limit: usize,
) -> ZonePage {
    let zones = filter_zones(record, metric, selected);
    let stats = zones
        .iter()
        .map(|zone| ZoneStats {
            zone: *zone,
            name: zone.display_name(),
            stats: SeriesStats::of(record.series(metric.metric(*zone))),
        })
        .collect();

    ZonePage {
        metric,
        chart: climate_chart(record, metric, &zones, limit),
        zones: stats,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PuePage {
    pub chart: Chart,
    pub stats: Option<SeriesStats>,
    pub rating: Option<PueRating>,
}

pub fn pue_page(record: &TimeSeriesRecord, limit: usize) -> PuePage {
    let stats = SeriesStats::of(&record.pue);
    PuePage {
        chart: pue_chart(record, limit),
        rating: stats.as_ref().map(|stats| PueRating::of(stats.last)),
        stats,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HydrogenPage {
    pub chart: Chart,
    pub stats: Option<SeriesStats>,
    pub status: Option<HydrogenStatus>,
}

pub fn hydrogen_page(record: &TimeSeriesRecord, limit: usize) -> HydrogenPage {
    let stats = SeriesStats::of(&record.hydrogen);
    HydrogenPage {
        chart: hydrogen_chart(record, limit),
        status: stats.as_ref().map(|stats| HydrogenStatus::of(stats.last)),
        stats,
    }
}

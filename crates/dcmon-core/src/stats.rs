use std::collections::BTreeSet;

use chrono::NaiveDate;
use dcmon_parser::{Metric, TimeSeriesRecord, Zone};
use serde::Serialize;

pub const PUE_EXCELLENT: f64 = 1.5;
pub const PUE_GOOD: f64 = 1.6;
pub const PUE_FAIR: f64 = 1.8;
pub const HYDROGEN_SAFE_PPM: f64 = 50.0;

/// Summary of a series, ignoring zeros (a zero is "no reading").
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub last: f64,
}

impl SeriesStats {
    pub fn of(values: &[f64]) -> Option<Self> {
        let mut readings = values.iter().copied().filter(|value| *value != 0.0);
        let first = readings.next()?;

        let mut stats = SeriesStats {
            count: 1,
            mean: first,
            min: first,
            max: first,
            last: first,
        };
        let mut sum = first;
        for value in readings {
            stats.count += 1;
            sum += value;
            stats.min = stats.min.min(value);
            stats.max = stats.max.max(value);
            stats.last = value;
        }
        stats.mean = sum / stats.count as f64;
        Some(stats)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PueRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl PueRating {
    pub fn of(pue: f64) -> Self {
        if pue < PUE_EXCELLENT {
            PueRating::Excellent
        } else if pue < PUE_GOOD {
            PueRating::Good
        } else if pue < PUE_FAIR {
            PueRating::Fair
        } else {
            PueRating::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PueRating::Excellent => "优秀",
            PueRating::Good => "良好",
            PueRating::Fair => "一般",
            PueRating::Poor => "较差",
        }
    }

    /// Coarser wording used on the overview card.
    pub fn overview_label(&self) -> &'static str {
        match self {
            PueRating::Excellent => "优秀",
            PueRating::Good => "良好",
            PueRating::Fair | PueRating::Poor => "需关注",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HydrogenStatus {
    Safe,
    Warning,
}

impl HydrogenStatus {
    pub fn of(ppm: f64) -> Self {
        if ppm < HYDROGEN_SAFE_PPM {
            HydrogenStatus::Safe
        } else {
            HydrogenStatus::Warning
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HydrogenStatus::Safe => "安全",
            HydrogenStatus::Warning => "注意",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityGrade {
    pub fn of(valid_rate: f64) -> Self {
        if valid_rate > 90.0 {
            QualityGrade::Excellent
        } else if valid_rate > 70.0 {
            QualityGrade::Good
        } else if valid_rate > 50.0 {
            QualityGrade::Fair
        } else {
            QualityGrade::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QualityGrade::Excellent => "优秀",
            QualityGrade::Good => "良好",
            QualityGrade::Fair => "一般",
            QualityGrade::Poor => "较差",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub average_temperature: Option<f64>,
    pub average_humidity: Option<f64>,
    pub latest_pue: Option<f64>,
    pub pue_rating: Option<PueRating>,
    pub latest_hydrogen: Option<f64>,
    pub hydrogen_status: Option<HydrogenStatus>,
}

/// Headline figures: zone averages over every non-zero reading, plus the
/// latest PUE and hydrogen readings with their ratings.
pub fn overview(record: &TimeSeriesRecord) -> Overview {
    let average_temperature = mean_non_zero(
        Zone::ALL
            .iter()
            .flat_map(|zone| record.zone(*zone).temperature.iter().copied()),
    );
    let average_humidity = mean_non_zero(
        Zone::ALL
            .iter()
            .flat_map(|zone| record.zone(*zone).humidity.iter().copied()),
    );
    let latest_pue = SeriesStats::of(&record.pue).map(|stats| stats.last);
    let latest_hydrogen = SeriesStats::of(&record.hydrogen).map(|stats| stats.last);

    Overview {
        average_temperature,
        average_humidity,
        latest_pue,
        pue_rating: latest_pue.map(PueRating::of),
        latest_hydrogen,
        hydrogen_status: latest_hydrogen.map(HydrogenStatus::of),
    }
}

fn mean_non_zero(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .filter(|value| *value != 0.0)
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}

#[derive(Debug, Clone, Serialize)]
pub struct DataQuality {
    pub total_datasets: usize,
    pub valid_datasets: usize,
    pub total_points: usize,
    pub valid_points: usize,
    /// Percentage of non-zero points across all series.
    pub valid_rate: f64,
    pub time_points: usize,
    pub unique_dates: usize,
    /// Date of the last row, which is not necessarily the greatest date.
    pub latest_date: Option<NaiveDate>,
    pub grade: QualityGrade,
}

impl DataQuality {
    /// Percentage of series holding at least one reading.
    pub fn completeness(&self) -> f64 {
        if self.total_datasets == 0 {
            return 0.0;
        }
        self.valid_datasets as f64 / self.total_datasets as f64 * 100.0
    }
}

pub fn data_quality(record: &TimeSeriesRecord) -> DataQuality {
    let metrics = Metric::all();
    let mut valid_datasets = 0;
    let mut total_points = 0;
    let mut valid_points = 0;

    for metric in &metrics {
        let values = record.series(*metric);
        let non_zero = values.iter().filter(|value| **value != 0.0).count();
        total_points += values.len();
        valid_points += non_zero;
        if non_zero > 0 {
            valid_datasets += 1;
        }
    }

    let valid_rate = if total_points == 0 {
        0.0
    } else {
        valid_points as f64 / total_points as f64 * 100.0
    };
    let unique: BTreeSet<NaiveDate> = record.dates.iter().copied().collect();

    DataQuality {
        total_datasets: metrics.len(),
        valid_datasets,
        total_points,
        valid_points,
        valid_rate,
        time_points: record.dates.len(),
        unique_dates: unique.len(),
        latest_date: record.dates.last().copied(),
        grade: QualityGrade::of(valid_rate),
    }
}

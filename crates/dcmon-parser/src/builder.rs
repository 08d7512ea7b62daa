use tracing::trace;

use crate::model::TimeSeriesRecord;
use crate::vocabulary::{FieldValue, FieldVocabulary};

pub fn build_record(cells: &[String]) -> TimeSeriesRecord {
    build_record_with(cells, FieldVocabulary::standard())
}

/// Scans a cleaned cell stream for vocabulary labels and appends the value
/// found at each label's offset.
///
/// Occurrences whose value cell is missing or malformed are skipped without
/// touching any series, so series lengths only count successful parses and
/// are not tied to each other.
pub fn build_record_with(cells: &[String], vocabulary: &FieldVocabulary) -> TimeSeriesRecord {
    let mut record = TimeSeriesRecord::new();

    for idx in 0..cells.len().saturating_sub(1) {
        let Some(rule) = vocabulary.lookup(&cells[idx]) else {
            continue;
        };

        let Some(cell) = cells.get(idx + rule.offset()) else {
            trace!(label = rule.label(), index = idx, "value cell past end of stream");
            continue;
        };

        match rule.parse(cell) {
            Some(value) => apply(&mut record, value),
            None => {
                trace!(label = rule.label(), index = idx, cell = %cell, "skipped unparsable value")
            }
        }
    }

    record
}

fn apply(record: &mut TimeSeriesRecord, value: FieldValue) {
    match value {
        FieldValue::Date(date) => record.dates.push(date),
        FieldValue::Scalar(field, value) => record.series_mut(field.metric()).push(value),
        FieldValue::ZoneClimate {
            zone,
            temperature,
            humidity,
        } => record.zone_mut(zone).push_reading(temperature, humidity),
    }
}

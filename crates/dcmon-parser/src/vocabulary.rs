use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::model::{Metric, Zone};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const TEMPERATURE_MARKS: &[&str] = &["℃", "°C", "°c", "°", "C", "c"];
const HUMIDITY_MARK: &str = "%";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarField {
    Pue,
    Hydrogen,
}

impl ScalarField {
    pub fn metric(&self) -> Metric {
        match self {
            ScalarField::Pue => Metric::Pue,
            ScalarField::Hydrogen => Metric::Hydrogen,
        }
    }
}

/// Shape of the value cell a label points at, and where its value goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    Date,
    Scalar {
        field: ScalarField,
        unit: Option<String>,
    },
    ZoneClimate(Zone),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Date(NaiveDate),
    Scalar(ScalarField, f64),
    ZoneClimate {
        zone: Zone,
        temperature: f64,
        humidity: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    label: String,
    offset: usize,
    kind: RuleKind,
}

impl FieldRule {
    pub fn new(label: impl Into<String>, offset: usize, kind: RuleKind) -> Self {
        Self {
            label: label.into(),
            offset,
            kind,
        }
    }

    pub fn date(label: impl Into<String>, offset: usize) -> Self {
        Self::new(label, offset, RuleKind::Date)
    }

    pub fn scalar(
        label: impl Into<String>,
        offset: usize,
        field: ScalarField,
        unit: Option<&str>,
    ) -> Self {
        Self::new(
            label,
            offset,
            RuleKind::Scalar {
                field,
                unit: unit.map(str::to_string),
            },
        )
    }

    pub fn zone_climate(label: impl Into<String>, offset: usize, zone: Zone) -> Self {
        Self::new(label, offset, RuleKind::ZoneClimate(zone))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    /// Parses the value cell this rule points at. `None` means the occurrence
    /// contributes nothing.
    pub fn parse(&self, cell: &str) -> Option<FieldValue> {
        match &self.kind {
            RuleKind::Date => parse_date(cell).map(FieldValue::Date),
            RuleKind::Scalar { field, unit } => {
                parse_scalar(cell, unit.as_deref()).map(|value| FieldValue::Scalar(*field, value))
            }
            RuleKind::ZoneClimate(zone) => {
                parse_climate_pair(cell).map(|(temperature, humidity)| FieldValue::ZoneClimate {
                    zone: *zone,
                    temperature,
                    humidity,
                })
            }
        }
    }
}

/// Closed table of labels recognised in inspection reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldVocabulary {
    rules: Vec<FieldRule>,
}

static STANDARD_VOCABULARY: Lazy<FieldVocabulary> = Lazy::new(|| {
    let mut rules = vec![FieldRule::date("日期:", 1)];
    for zone in Zone::ALL {
        rules.push(FieldRule::zone_climate(
            format!("{}温度湿度", zone.display_name()),
            2,
            zone,
        ));
    }
    rules.push(FieldRule::scalar("PUE", 2, ScalarField::Pue, None));
    rules.push(FieldRule::scalar(
        "电池间氢气传感器",
        2,
        ScalarField::Hydrogen,
        Some("PPM"),
    ));
    FieldVocabulary::new(rules)
});

impl FieldVocabulary {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        let mut vocabulary = Self { rules: Vec::new() };
        for rule in rules {
            vocabulary.insert(rule);
        }
        vocabulary
    }

    pub fn standard() -> &'static FieldVocabulary {
        &STANDARD_VOCABULARY
    }

    /// Adds a rule, replacing any rule with the same label.
    pub fn with_rule(mut self, rule: FieldRule) -> Self {
        self.insert(rule);
        self
    }

    fn insert(&mut self, rule: FieldRule) {
        match self.rules.iter_mut().find(|r| r.label == rule.label) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    pub fn lookup(&self, label: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|rule| rule.label == label)
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

pub(crate) fn parse_date(cell: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(cell.trim(), DATE_FORMAT).ok()
}

pub(crate) fn parse_scalar(cell: &str, unit: Option<&str>) -> Option<f64> {
    let trimmed = cell.trim();
    let body = match unit {
        Some(unit) => strip_suffix_ignore_case(trimmed, unit)?,
        None => trimmed,
    };
    parse_finite(body.trim())
}

/// Splits a combined `"23.5C 45%"` cell into temperature and humidity.
///
/// Unit marks are only recognised as suffixes: `%` at the end of the cell and
/// a temperature mark at the end of the first token. The two readings must be
/// separated by whitespace.
pub(crate) fn parse_climate_pair(cell: &str) -> Option<(f64, f64)> {
    let trimmed = cell.trim();
    let body = trimmed.strip_suffix(HUMIDITY_MARK).unwrap_or(trimmed);

    let tokens: Vec<&str> = body.split_whitespace().collect();
    let &[temperature, humidity] = tokens.as_slice() else {
        return None;
    };
    let temperature = TEMPERATURE_MARKS
        .iter()
        .find_map(|mark| temperature.strip_suffix(*mark))
        .unwrap_or(temperature);
    Some((parse_finite(temperature)?, parse_finite(humidity)?))
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|parsed| parsed.is_finite())
}

fn strip_suffix_ignore_case<'a>(value: &'a str, suffix: &str) -> Option<&'a str> {
    let split = value.len().checked_sub(suffix.len())?;
    if !value.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = value.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

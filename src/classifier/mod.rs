//! Property classification
//!
//! Inspects a dataset and assigns each column its [`ColumnProperties`]
//! triple. Name-based lexicon matches are authoritative and cheap;
//! value-pattern matches are the fallback for unlabeled data. The 0.9
//! match-fraction threshold tolerates noisy or missing values without
//! flipping a classification.

pub mod patterns;

use crate::domain::{
    Column, ColumnProperties, ColumnType, DType, Dataset, InformationType, PropertyTable,
    SensitivityType, Value,
};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use self::patterns::PatternRegistry;
use tracing::debug;

/// Distinct-to-row ratio at or above which a column is Unique/Sparse
const UNIQUE_RATIO_THRESHOLD: f64 = 0.9;

/// Fraction of sampled values that must parse as dates for Datetime
const DATETIME_PARSE_THRESHOLD: f64 = 0.9;

/// Share of the column sampled for date-format probing
const DATETIME_SAMPLE_RATIO: f64 = 0.1;

/// Maximum distinct values for the small-cardinality Categorical rule
const CATEGORICAL_MAX_DISTINCT: usize = 20;

/// Fraction of values a pattern must exceed to set a type
const PATTERN_MATCH_THRESHOLD: f64 = 0.9;

/// Multi-stage heuristic column classifier
pub struct PropertyClassifier<'a> {
    registry: &'a PatternRegistry,
}

impl<'a> PropertyClassifier<'a> {
    /// Create a classifier over a compiled pattern registry
    pub fn new(registry: &'a PatternRegistry) -> Self {
        Self { registry }
    }

    /// Classify every column of the dataset.
    ///
    /// Column-name uniqueness is guaranteed by [`Dataset`] construction, so
    /// classification itself cannot fail.
    pub fn classify(&self, dataset: &Dataset) -> PropertyTable {
        let mut entries = Vec::with_capacity(dataset.column_count());

        for (name, column) in dataset.iter() {
            let properties = ColumnProperties {
                column_type: self.detect_column_type(column),
                information_type: self.detect_information_type(name, column),
                sensitivity_type: self.detect_sensitivity_type(name, column),
            };
            debug!(
                column = name,
                column_type = properties.column_type.label(),
                information_type = properties.information_type.label(),
                sensitivity_type = properties.sensitivity_type.label(),
                "classified column"
            );
            entries.push((name.to_string(), properties));
        }

        PropertyTable::new(entries)
    }

    /// Column Type detection, fixed order, first match wins
    fn detect_column_type(&self, column: &Column) -> ColumnType {
        if column.is_empty() {
            return ColumnType::Others;
        }

        let distinct = column.distinct_count();
        if distinct as f64 / column.len() as f64 >= UNIQUE_RATIO_THRESHOLD {
            return ColumnType::UniqueSparse;
        }

        if column.dtype() == DType::Timestamp
            || self.sampled_date_fraction(column) >= DATETIME_PARSE_THRESHOLD
        {
            return ColumnType::Datetime;
        }

        if distinct <= CATEGORICAL_MAX_DISTINCT {
            return ColumnType::Categorical;
        }

        if column.dtype() == DType::Categorical {
            return ColumnType::Categorical;
        }

        if column.dtype().is_numeric() {
            return ColumnType::Continuous;
        }

        ColumnType::Others
    }

    /// Information Type detection: name lexicon first, then value patterns
    fn detect_information_type(&self, name: &str, column: &Column) -> InformationType {
        if let Some(info) = self.registry.lookup_information(name) {
            return info;
        }

        if match_fraction(column, self.registry.nric_patterns()) > PATTERN_MATCH_THRESHOLD {
            InformationType::Nric
        } else if match_fraction(column, self.registry.phone_patterns()) > PATTERN_MATCH_THRESHOLD {
            InformationType::PhoneNumber
        } else if match_fraction(column, self.registry.email_patterns()) > PATTERN_MATCH_THRESHOLD {
            InformationType::Email
        } else {
            InformationType::Others
        }
    }

    /// Sensitivity Type detection: name lexicon first, then value patterns
    fn detect_sensitivity_type(&self, name: &str, column: &Column) -> SensitivityType {
        if let Some(sensitivity) = self.registry.lookup_sensitivity(name) {
            return sensitivity;
        }

        if match_fraction(column, self.registry.nric_patterns()) > PATTERN_MATCH_THRESHOLD {
            SensitivityType::DirectIdentifier
        } else if match_fraction(column, self.registry.phone_patterns()) > PATTERN_MATCH_THRESHOLD
            || match_fraction(column, self.registry.email_patterns()) > PATTERN_MATCH_THRESHOLD
        {
            SensitivityType::Sensitive
        } else {
            SensitivityType::NonSensitive
        }
    }

    /// Fraction of a deterministic 10%-size sample that parses as a date.
    ///
    /// The sample is the first `ceil(len / 10)` non-null values, so repeated
    /// classification of the same dataset always agrees.
    fn sampled_date_fraction(&self, column: &Column) -> f64 {
        let sample_size = ((column.len() as f64 * DATETIME_SAMPLE_RATIO).ceil() as usize).max(1);
        let sample: Vec<&Value> = column.non_null().take(sample_size).collect();
        if sample.is_empty() {
            return 0.0;
        }

        let parsed = sample
            .iter()
            .filter(|value| match value {
                Value::Timestamp(_) => true,
                Value::Text(text) => parses_as_date(text, self.registry.date_formats()),
                _ => false,
            })
            .count();

        parsed as f64 / sample.len() as f64
    }
}

/// Fraction of non-null values whose canonical form matches any pattern
fn match_fraction(column: &Column, patterns: &[Regex]) -> f64 {
    let mut total = 0usize;
    let mut matched = 0usize;

    for value in column.non_null() {
        total += 1;
        let text = value.canonical();
        if patterns.iter().any(|pattern| pattern.is_match(&text)) {
            matched += 1;
        }
    }

    if total == 0 {
        return 0.0;
    }
    matched as f64 / total as f64
}

fn parses_as_date(text: &str, formats: &[String]) -> bool {
    formats.iter().any(|format| {
        NaiveDateTime::parse_from_str(text, format).is_ok()
            || NaiveDate::parse_from_str(text, format).is_ok()
    })
}

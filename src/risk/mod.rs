//! Re-identification risk engine
//!
//! Groups rows of a masked dataset by their quasi-identifier value tuple
//! (the columns classified as indirect identifiers) and derives aggregate
//! privacy metrics from the resulting equivalence classes. Classes are
//! transient: recomputed on demand, never persisted.

use crate::domain::{Dataset, PropertyTable, SensitivityType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// k-anonymity thresholds reported by the sensitivity curve
const K_THRESHOLDS: std::ops::RangeInclusive<usize> = 2..=5;

/// One equivalence class: a quasi-identifier tuple and its row count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquivalenceClass {
    /// Canonical quasi-identifier values shared by the class's rows
    pub key: Vec<String>,
    /// Number of rows with this tuple
    pub size: usize,
    /// Single-row re-identification probability, `100 / size`
    pub probability: f64,
}

/// A point on the k-anonymity sensitivity curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KThresholdPoint {
    pub k: usize,
    /// Percentage of rows in classes of size >= k
    pub pct_rows: f64,
}

/// Aggregate re-identification risk metrics for one masked dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    /// Quasi-identifier columns the classes were computed over
    pub quasi_identifiers: Vec<String>,
    /// Total rows assessed
    pub row_count: usize,
    /// Equivalence classes, largest first
    pub classes: Vec<EquivalenceClass>,
    /// Mean of every row's per-row re-identification probability
    pub average_probability: f64,
    /// Percentage of rows in classes of size exactly 1
    pub unique_row_percentage: f64,
    /// Percentage of rows in classes of size >= k, for k in 2..=5
    pub k_threshold_curve: Vec<KThresholdPoint>,
}

impl RiskReport {
    /// Curve value for a specific k, if it was computed
    pub fn pct_rows_at_least(&self, k: usize) -> Option<f64> {
        self.k_threshold_curve
            .iter()
            .find(|point| point.k == k)
            .map(|point| point.pct_rows)
    }

    /// Format the report as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Risk metrics for the active masking next to the recommendation baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskComparison {
    pub active: RiskReport,
    pub baseline: RiskReport,
}

/// Compute equivalence classes and risk metrics for a masked dataset.
///
/// The quasi-identifiers are the columns whose sensitivity is
/// `Indirect Identifier` in the property table. With no quasi-identifiers
/// every row shares the empty tuple and forms one class covering the whole
/// dataset.
pub fn assess(dataset: &Dataset, properties: &PropertyTable) -> RiskReport {
    let quasi_identifiers: Vec<String> = properties
        .iter()
        .filter(|(_, props)| props.sensitivity_type == SensitivityType::IndirectIdentifier)
        .map(|(name, _)| name.to_string())
        .filter(|name| dataset.contains_column(name))
        .collect();

    let row_count = dataset.row_count();
    let mut groups: HashMap<Vec<String>, usize> = HashMap::new();

    if row_count > 0 {
        let columns: Vec<_> = quasi_identifiers
            .iter()
            .filter_map(|name| dataset.column(name))
            .collect();

        for row in 0..row_count {
            let key: Vec<String> = columns
                .iter()
                .map(|column| column.values()[row].canonical())
                .collect();
            *groups.entry(key).or_insert(0) += 1;
        }
    }

    let mut classes: Vec<EquivalenceClass> = groups
        .into_iter()
        .map(|(key, size)| EquivalenceClass {
            key,
            size,
            probability: 100.0 / size as f64,
        })
        .collect();
    classes.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.key.cmp(&b.key)));

    let average_probability = if row_count == 0 {
        0.0
    } else {
        // Each row contributes its class's probability once, and a class of
        // size c contributes c * (100 / c) = 100 to the row total
        100.0 * classes.len() as f64 / row_count as f64
    };

    let unique_rows: usize = classes
        .iter()
        .filter(|class| class.size == 1)
        .map(|class| class.size)
        .sum();

    let k_threshold_curve = K_THRESHOLDS
        .map(|k| {
            let covered: usize = classes
                .iter()
                .filter(|class| class.size >= k)
                .map(|class| class.size)
                .sum();
            KThresholdPoint {
                k,
                pct_rows: percentage(covered, row_count),
            }
        })
        .collect();

    let report = RiskReport {
        quasi_identifiers,
        row_count,
        average_probability,
        unique_row_percentage: percentage(unique_rows, row_count),
        k_threshold_curve,
        classes,
    };

    debug!(
        rows = report.row_count,
        classes = report.classes.len(),
        average_probability = report.average_probability,
        "assessed re-identification risk"
    );

    report
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Column, ColumnProperties, ColumnType, InformationType, PropertyTable, Value,
    };

    fn qi_properties(columns: &[&str]) -> PropertyTable {
        PropertyTable::new(
            columns
                .iter()
                .map(|name| {
                    (
                        name.to_string(),
                        ColumnProperties {
                            column_type: ColumnType::Categorical,
                            information_type: InformationType::Others,
                            sensitivity_type: SensitivityType::IndirectIdentifier,
                        },
                    )
                })
                .collect(),
        )
    }

    fn int_column(values: &[i64]) -> Column {
        Column::new(values.iter().map(|v| Value::Int(*v)).collect())
    }

    #[test]
    fn test_single_class_of_identical_rows() {
        let dataset = Dataset::new(vec![("age".to_string(), int_column(&[25, 25]))]).unwrap();
        let report = assess(&dataset, &qi_properties(&["age"]));

        assert_eq!(report.classes.len(), 1);
        assert_eq!(report.classes[0].size, 2);
        assert_eq!(report.classes[0].probability, 50.0);
        assert_eq!(report.average_probability, 50.0);
        assert_eq!(report.unique_row_percentage, 0.0);
    }

    #[test]
    fn test_class_sizes_sum_to_row_count() {
        let dataset = Dataset::new(vec![
            ("age".to_string(), int_column(&[25, 25, 30, 30, 30, 41])),
            ("zip".to_string(), int_column(&[1, 1, 2, 2, 3, 3])),
        ])
        .unwrap();
        let report = assess(&dataset, &qi_properties(&["age", "zip"]));

        let total: usize = report.classes.iter().map(|class| class.size).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn test_probabilities_in_range() {
        let dataset = Dataset::new(vec![(
            "age".to_string(),
            int_column(&[1, 2, 3, 3, 3, 3, 4, 4]),
        )])
        .unwrap();
        let report = assess(&dataset, &qi_properties(&["age"]));

        for class in &report.classes {
            assert!(class.probability > 0.0);
            assert!(class.probability <= 100.0);
        }
    }

    #[test]
    fn test_k_threshold_curve_non_increasing() {
        let dataset = Dataset::new(vec![(
            "age".to_string(),
            int_column(&[1, 1, 2, 2, 2, 3, 3, 3, 3, 4]),
        )])
        .unwrap();
        let report = assess(&dataset, &qi_properties(&["age"]));

        let curve: Vec<f64> = report.k_threshold_curve.iter().map(|p| p.pct_rows).collect();
        assert_eq!(curve.len(), 4);
        for pair in curve.windows(2) {
            assert!(pair[0] >= pair[1], "curve must be non-increasing: {curve:?}");
        }
    }

    #[test]
    fn test_unique_rows_reported() {
        let dataset = Dataset::new(vec![(
            "age".to_string(),
            int_column(&[10, 20, 30, 30]),
        )])
        .unwrap();
        let report = assess(&dataset, &qi_properties(&["age"]));

        assert_eq!(report.unique_row_percentage, 50.0);
        assert_eq!(report.pct_rows_at_least(2), Some(50.0));
    }

    #[test]
    fn test_no_quasi_identifiers_forms_one_class() {
        let dataset = Dataset::new(vec![("age".to_string(), int_column(&[1, 2, 3]))]).unwrap();
        let report = assess(&dataset, &qi_properties(&[]));

        assert_eq!(report.classes.len(), 1);
        assert_eq!(report.classes[0].size, 3);
        assert!(report.quasi_identifiers.is_empty());
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = Dataset::new(vec![]).unwrap();
        let report = assess(&dataset, &qi_properties(&[]));

        assert_eq!(report.row_count, 0);
        assert!(report.classes.is_empty());
        assert_eq!(report.average_probability, 0.0);
        assert_eq!(report.unique_row_percentage, 0.0);
    }

    #[test]
    fn test_classes_sorted_largest_first() {
        let dataset = Dataset::new(vec![(
            "age".to_string(),
            int_column(&[1, 2, 2, 3, 3, 3]),
        )])
        .unwrap();
        let report = assess(&dataset, &qi_properties(&["age"]));

        assert_eq!(report.classes[0].size, 3);
        assert_eq!(report.classes[1].size, 2);
        assert_eq!(report.classes[2].size, 1);
    }
}

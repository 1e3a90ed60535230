//! Anonymization engine
//!
//! The [`Anonymizer`] owns one dataset, its property table, and the
//! transformer assignment tables (the frozen default and the user-editable
//! active copy). It walks a fixed state machine:
//!
//! `Classified` → [`build_mask_table`](Anonymizer::build_mask_table) →
//! `MaskTableBuilt` → [`apply_masking`](Anonymizer::apply_masking) →
//! `Applied`
//!
//! Property and masking overrides validate their input before touching any
//! table, so a failed call leaves the engine exactly as it was.
//!
//! # Examples
//!
//! ```
//! use veil::domain::{Column, Dataset, Value};
//! use veil::engine::Anonymizer;
//!
//! let dataset = Dataset::new(vec![(
//!     "nric".to_string(),
//!     Column::new(vec![
//!         Value::Text("S1234567A".to_string()),
//!         Value::Text("S7654321B".to_string()),
//!     ]),
//! )])?;
//!
//! let mut engine = Anonymizer::new(dataset)?;
//! engine.build_mask_table();
//! let outcome = engine.apply_masking()?;
//! assert_eq!(outcome.masked.row_count(), 2);
//! # Ok::<(), veil::VeilError>(())
//! ```

use crate::classifier::{patterns::PatternRegistry, PropertyClassifier};
use crate::domain::{
    ColumnType, Dataset, InformationType, PropertyKind, PropertyTable, Result, SensitivityType,
    VeilError,
};
use crate::masking::{MaskingCatalog, MaskingOptions, Transformer, TransformerTable};
use crate::risk::{self, RiskComparison};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A forced property override triggered by an information type.
///
/// Evaluated declaratively after every property change, so new cascades are
/// table entries rather than new branches in the override path.
struct CascadeRule {
    information_type: InformationType,
    forced_sensitivity: Option<SensitivityType>,
    forced_column_type: Option<ColumnType>,
}

/// Name and value heuristics may under-classify an NRIC-like column; tagging
/// one as NRIC always makes it a unique direct identifier.
const CASCADE_RULES: &[CascadeRule] = &[CascadeRule {
    information_type: InformationType::Nric,
    forced_sensitivity: Some(SensitivityType::DirectIdentifier),
    forced_column_type: Some(ColumnType::UniqueSparse),
}];

/// The two datasets produced by one [`Anonymizer::apply_masking`] call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskingOutcome {
    /// Dataset masked with the active transformer table
    pub masked: Dataset,
    /// Dataset masked with the frozen default table, for baseline comparison
    pub baseline: Dataset,
}

/// Anonymization controller for a single dataset
pub struct Anonymizer {
    dataset: Dataset,
    catalog: MaskingCatalog,
    options: MaskingOptions,
    properties: PropertyTable,
    default_table: Option<TransformerTable>,
    active_table: Option<TransformerTable>,
    outcome: Option<MaskingOutcome>,
}

impl Anonymizer {
    /// Create an engine with the embedded pattern library and default
    /// masking options, classifying the dataset immediately.
    ///
    /// # Errors
    ///
    /// Returns [`VeilError::Configuration`] if the embedded pattern library
    /// fails to compile.
    pub fn new(dataset: Dataset) -> Result<Self> {
        let registry = PatternRegistry::default_patterns()
            .map_err(|e| VeilError::Configuration(e.to_string()))?;
        Self::with_config(dataset, &registry, MaskingOptions::default())
    }

    /// Create an engine with a caller-supplied pattern registry and options
    pub fn with_config(
        dataset: Dataset,
        registry: &PatternRegistry,
        options: MaskingOptions,
    ) -> Result<Self> {
        options
            .validate()
            .map_err(|e| VeilError::Configuration(e.to_string()))?;

        let properties = PropertyClassifier::new(registry).classify(&dataset);
        info!(
            columns = dataset.column_count(),
            rows = dataset.row_count(),
            "classified dataset"
        );

        Ok(Self {
            dataset,
            catalog: MaskingCatalog::new(),
            options,
            properties,
            default_table: None,
            active_table: None,
            outcome: None,
        })
    }

    /// The original dataset
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The current property table
    pub fn properties(&self) -> &PropertyTable {
        &self.properties
    }

    /// The frozen default transformer table, once built
    pub fn default_mask_table(&self) -> Option<&TransformerTable> {
        self.default_table.as_ref()
    }

    /// The active transformer table, once built
    pub fn mask_table(&self) -> Option<&TransformerTable> {
        self.active_table.as_ref()
    }

    /// The datasets produced by the last successful apply, if any
    pub fn masking_outcome(&self) -> Option<&MaskingOutcome> {
        self.outcome.as_ref()
    }

    /// Transformations currently allowed for a column, in priority order.
    ///
    /// Recomputed from the column's live property values on every call; the
    /// first element is the recommended default.
    pub fn allowed_transformations(&self, column: &str) -> Result<Vec<Transformer>> {
        let props = self
            .properties
            .get(column)
            .ok_or_else(|| VeilError::UnknownColumn(column.to_string()))?;

        Ok(self.catalog.recommend(
            props.information_type,
            props.sensitivity_type,
            props.column_type,
        ))
    }

    /// Override one property of a column.
    ///
    /// `value` must be one of the approved labels for `kind`. After the
    /// change, the cascade rules run: tagging a column's information type as
    /// NRIC forces its sensitivity to Direct Identifier and its column type
    /// to Unique/Sparse.
    ///
    /// # Errors
    ///
    /// [`VeilError::UnknownColumn`] or [`VeilError::InvalidProperty`]; the
    /// property table is unchanged on failure.
    pub fn change_property(
        &mut self,
        column: &str,
        kind: PropertyKind,
        value: &str,
    ) -> Result<&PropertyTable> {
        if !self.dataset.contains_column(column) {
            return Err(VeilError::UnknownColumn(column.to_string()));
        }

        // Parse before mutating so a bad value leaves the table untouched
        match kind {
            PropertyKind::ColumnType => {
                let parsed = ColumnType::from_label(value)
                    .ok_or_else(|| invalid_property(kind, value))?;
                if let Some(props) = self.properties.get_mut(column) {
                    props.column_type = parsed;
                }
            }
            PropertyKind::InformationType => {
                let parsed = InformationType::from_label(value)
                    .ok_or_else(|| invalid_property(kind, value))?;
                if let Some(props) = self.properties.get_mut(column) {
                    props.information_type = parsed;
                }
            }
            PropertyKind::SensitivityType => {
                let parsed = SensitivityType::from_label(value)
                    .ok_or_else(|| invalid_property(kind, value))?;
                if let Some(props) = self.properties.get_mut(column) {
                    props.sensitivity_type = parsed;
                }
            }
        }

        self.apply_cascade_rules(column);
        debug!(column, kind = kind.label(), value, "changed column property");

        Ok(&self.properties)
    }

    fn apply_cascade_rules(&mut self, column: &str) {
        let Some(props) = self.properties.get_mut(column) else {
            return;
        };

        for rule in CASCADE_RULES {
            if props.information_type != rule.information_type {
                continue;
            }
            if let Some(sensitivity) = rule.forced_sensitivity {
                props.sensitivity_type = sensitivity;
            }
            if let Some(column_type) = rule.forced_column_type {
                props.column_type = column_type;
            }
        }
    }

    /// Build the transformer tables from the current property table.
    ///
    /// Every column gets the first entry of its recommendation list; the
    /// default table is frozen from this point, the active table remains
    /// editable via [`change_masking`](Self::change_masking). Rebuilding
    /// discards any previous tables and masking outcome.
    pub fn build_mask_table(&mut self) -> &TransformerTable {
        let entries: Vec<(String, Transformer)> = self
            .properties
            .iter()
            .map(|(name, props)| {
                let recommended = self.catalog.recommend(
                    props.information_type,
                    props.sensitivity_type,
                    props.column_type,
                );
                // Recommendation lists always end in a non-empty fallback
                let first = recommended.first().copied().unwrap_or(Transformer::Retain);
                (name.to_string(), first)
            })
            .collect();

        info!(columns = entries.len(), "built transformer tables");

        self.default_table = Some(TransformerTable::new(entries.clone()));
        self.outcome = None;
        &*self.active_table.insert(TransformerTable::new(entries))
    }

    /// Select a different transformation for a column in the active table.
    ///
    /// `name` must be the display name of a transformation in the column's
    /// currently allowed list. Only the active table changes; the default
    /// table keeps the original recommendation.
    ///
    /// # Errors
    ///
    /// [`VeilError::PreconditionViolated`] if the mask table was never
    /// built, [`VeilError::UnknownColumn`], or
    /// [`VeilError::UnknownTransformation`]; the active table is unchanged
    /// on failure.
    pub fn change_masking(&mut self, column: &str, name: &str) -> Result<()> {
        if self.active_table.is_none() {
            return Err(VeilError::PreconditionViolated(
                "mask table not built; call build_mask_table first".to_string(),
            ));
        }

        let allowed = self.allowed_transformations(column)?;
        let transformer = Transformer::from_name(name)
            .filter(|t| allowed.contains(t))
            .ok_or_else(|| unknown_transformation(column, name, &allowed))?;

        if let Some(table) = self.active_table.as_mut() {
            table.set(column, transformer);
        }
        self.outcome = None;
        debug!(column, transformation = name, "changed masking selection");

        Ok(())
    }

    /// Apply the active and default transformer tables to the original
    /// dataset, regenerating both masked datasets in full.
    ///
    /// # Errors
    ///
    /// [`VeilError::PreconditionViolated`] if the mask table was never
    /// built; [`VeilError::Transformation`] naming the offending column if
    /// any transform fails, in which case no outcome is stored.
    pub fn apply_masking(&mut self) -> Result<&MaskingOutcome> {
        let (active, default) = match (&self.active_table, &self.default_table) {
            (Some(active), Some(default)) => (active, default),
            _ => {
                return Err(VeilError::PreconditionViolated(
                    "mask table not built; call build_mask_table before apply_masking".to_string(),
                ))
            }
        };

        let masked = apply_table(&self.dataset, active, &self.options)?;
        let baseline = apply_table(&self.dataset, default, &self.options)?;
        info!(
            columns = self.dataset.column_count(),
            rows = self.dataset.row_count(),
            "applied masking"
        );

        Ok(&*self.outcome.insert(MaskingOutcome { masked, baseline }))
    }

    /// Risk metrics for the active masking next to the recommendation
    /// baseline.
    ///
    /// # Errors
    ///
    /// [`VeilError::PreconditionViolated`] unless
    /// [`apply_masking`](Self::apply_masking) has succeeded.
    pub fn assess_risk(&self) -> Result<RiskComparison> {
        let outcome = self.outcome.as_ref().ok_or_else(|| {
            VeilError::PreconditionViolated(
                "masking not applied; call apply_masking before assess_risk".to_string(),
            )
        })?;

        Ok(RiskComparison {
            active: risk::assess(&outcome.masked, &self.properties),
            baseline: risk::assess(&outcome.baseline, &self.properties),
        })
    }
}

fn invalid_property(kind: PropertyKind, value: &str) -> VeilError {
    VeilError::InvalidProperty {
        kind: kind.label(),
        value: value.to_string(),
        approved: kind.approved_labels().join(", "),
    }
}

fn unknown_transformation(column: &str, name: &str, allowed: &[Transformer]) -> VeilError {
    VeilError::UnknownTransformation {
        column: column.to_string(),
        name: name.to_string(),
        allowed: allowed
            .iter()
            .map(|t| t.name())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Resolve and apply one transformer table against a dataset
fn apply_table(
    dataset: &Dataset,
    table: &TransformerTable,
    options: &MaskingOptions,
) -> Result<Dataset> {
    let mut columns = Vec::with_capacity(dataset.column_count());

    for (name, column) in dataset.iter() {
        let transformer = table
            .get(name)
            .ok_or_else(|| VeilError::UnknownColumn(name.to_string()))?;
        let masked = transformer
            .apply(column, options)
            .map_err(|source| VeilError::Transformation {
                column: name.to_string(),
                name: transformer.name().to_string(),
                source,
            })?;
        columns.push((name.to_string(), masked));
    }

    Dataset::new(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Column, Value};

    fn text_column(values: &[&str]) -> Column {
        Column::new(values.iter().map(|v| Value::Text(v.to_string())).collect())
    }

    fn int_column(values: &[i64]) -> Column {
        Column::new(values.iter().map(|v| Value::Int(*v)).collect())
    }

    fn sample_dataset() -> Dataset {
        Dataset::new(vec![
            (
                "nric".to_string(),
                text_column(&["S1234567A", "S7654321B"]),
            ),
            ("age".to_string(), int_column(&[25, 25])),
            ("email".to_string(), text_column(&["a@x.com", "b@x.com"])),
        ])
        .unwrap()
    }

    #[test]
    fn test_engine_classifies_on_construction() {
        let engine = Anonymizer::new(sample_dataset()).unwrap();
        let props = engine.properties().get("nric").unwrap();

        assert_eq!(props.column_type, ColumnType::UniqueSparse);
        assert_eq!(props.information_type, InformationType::Nric);
        assert_eq!(props.sensitivity_type, SensitivityType::DirectIdentifier);
    }

    #[test]
    fn test_change_property_unknown_column() {
        let mut engine = Anonymizer::new(sample_dataset()).unwrap();
        let result = engine.change_property("missing", PropertyKind::ColumnType, "Continuous");

        assert!(matches!(result, Err(VeilError::UnknownColumn(_))));
    }

    #[test]
    fn test_change_property_invalid_value_leaves_table() {
        let mut engine = Anonymizer::new(sample_dataset()).unwrap();
        let before = *engine.properties().get("age").unwrap();

        let result = engine.change_property("age", PropertyKind::ColumnType, "Numeric");
        assert!(matches!(result, Err(VeilError::InvalidProperty { .. })));
        assert_eq!(engine.properties().get("age"), Some(&before));
    }

    #[test]
    fn test_nric_cascade_forces_identifier_properties() {
        let mut engine = Anonymizer::new(sample_dataset()).unwrap();

        engine
            .change_property("age", PropertyKind::InformationType, "NRIC")
            .unwrap();

        let props = engine.properties().get("age").unwrap();
        assert_eq!(props.information_type, InformationType::Nric);
        assert_eq!(props.sensitivity_type, SensitivityType::DirectIdentifier);
        assert_eq!(props.column_type, ColumnType::UniqueSparse);
    }

    #[test]
    fn test_apply_before_build_fails() {
        let mut engine = Anonymizer::new(sample_dataset()).unwrap();
        let result = engine.apply_masking();

        assert!(matches!(result, Err(VeilError::PreconditionViolated(_))));
    }

    #[test]
    fn test_change_masking_before_build_fails() {
        let mut engine = Anonymizer::new(sample_dataset()).unwrap();
        let result = engine.change_masking("age", "Retain");

        assert!(matches!(result, Err(VeilError::PreconditionViolated(_))));
    }

    #[test]
    fn test_build_seeds_both_tables_with_first_recommendation() {
        let mut engine = Anonymizer::new(sample_dataset()).unwrap();
        engine.build_mask_table();

        assert_eq!(
            engine.mask_table().unwrap().get("nric"),
            Some(Transformer::MaskNric)
        );
        assert_eq!(
            engine.default_mask_table().unwrap().get("nric"),
            Some(Transformer::MaskNric)
        );
        assert_eq!(
            engine.mask_table().unwrap().get("email"),
            Some(Transformer::MaskEmail)
        );
    }

    #[test]
    fn test_change_masking_updates_only_active_table() {
        let mut engine = Anonymizer::new(sample_dataset()).unwrap();
        engine.build_mask_table();

        engine.change_masking("nric", "Suppress").unwrap();

        assert_eq!(
            engine.mask_table().unwrap().get("nric"),
            Some(Transformer::Suppress)
        );
        assert_eq!(
            engine.default_mask_table().unwrap().get("nric"),
            Some(Transformer::MaskNric)
        );
    }

    #[test]
    fn test_change_masking_rejects_disallowed_transformation() {
        let mut engine = Anonymizer::new(sample_dataset()).unwrap();
        engine.build_mask_table();
        let before = engine.mask_table().unwrap().clone();

        // Encode is not in a direct identifier's allowed list
        let result = engine.change_masking("nric", "Encode");
        assert!(matches!(
            result,
            Err(VeilError::UnknownTransformation { .. })
        ));
        assert_eq!(engine.mask_table().unwrap(), &before);
    }

    #[test]
    fn test_change_masking_rejects_unknown_name() {
        let mut engine = Anonymizer::new(sample_dataset()).unwrap();
        engine.build_mask_table();

        let result = engine.change_masking("age", "Rot13");
        assert!(matches!(
            result,
            Err(VeilError::UnknownTransformation { .. })
        ));
    }

    #[test]
    fn test_apply_masking_produces_both_datasets() {
        let mut engine = Anonymizer::new(sample_dataset()).unwrap();
        engine.build_mask_table();
        let outcome = engine.apply_masking().unwrap();

        assert_eq!(outcome.masked.row_count(), 2);
        assert_eq!(outcome.baseline.row_count(), 2);
        assert_eq!(outcome.masked.column_names(), vec!["nric", "age", "email"]);

        let nric = outcome.masked.column("nric").unwrap();
        assert_eq!(nric.values()[0], Value::Text("*****567A".to_string()));
        assert_eq!(nric.values()[1], Value::Text("*****321B".to_string()));
    }

    #[test]
    fn test_assess_risk_requires_apply() {
        let mut engine = Anonymizer::new(sample_dataset()).unwrap();
        engine.build_mask_table();

        assert!(matches!(
            engine.assess_risk(),
            Err(VeilError::PreconditionViolated(_))
        ));
    }

    #[test]
    fn test_assess_risk_compares_active_and_baseline() {
        let mut engine = Anonymizer::new(sample_dataset()).unwrap();
        engine.build_mask_table();
        engine.apply_masking().unwrap();

        let comparison = engine.assess_risk().unwrap();

        // Both rows share age 25, the only quasi-identifier
        assert_eq!(comparison.active.classes.len(), 1);
        assert_eq!(comparison.active.classes[0].size, 2);
        assert_eq!(comparison.active.average_probability, 50.0);
        assert_eq!(comparison.baseline.average_probability, 50.0);
    }
}

//! End-to-end tests for the anonymization engine

use veil::domain::{
    Column, ColumnType, Dataset, InformationType, PropertyKind, SensitivityType, Value, VeilError,
};
use veil::engine::Anonymizer;
use veil::masking::Transformer;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

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
    .expect("failed to build sample dataset")
}

#[test]
fn test_full_pipeline_classify_recommend_mask_assess() {
    init_tracing();

    let mut engine = Anonymizer::new(sample_dataset()).expect("failed to create engine");

    // Classification
    let nric = engine.properties().get("nric").expect("nric missing");
    assert_eq!(nric.column_type, ColumnType::UniqueSparse);
    assert_eq!(nric.information_type, InformationType::Nric);
    assert_eq!(nric.sensitivity_type, SensitivityType::DirectIdentifier);

    // Recommendation
    let allowed = engine
        .allowed_transformations("nric")
        .expect("no allowed list for nric");
    assert_eq!(allowed[0], Transformer::MaskNric);

    // Masking
    engine.build_mask_table();
    let outcome = engine.apply_masking().expect("masking failed");

    let masked_nric = outcome.masked.column("nric").expect("nric missing");
    assert_eq!(
        masked_nric.values()[0],
        Value::Text("*****567A".to_string())
    );
    assert_eq!(
        masked_nric.values()[1],
        Value::Text("*****321B".to_string())
    );

    // Risk: both rows share age 25, the only quasi-identifier
    let risk = engine.assess_risk().expect("risk assessment failed");
    assert_eq!(risk.active.classes.len(), 1);
    assert_eq!(risk.active.classes[0].size, 2);
    assert_eq!(risk.active.classes[0].probability, 50.0);
    assert_eq!(risk.active.unique_row_percentage, 0.0);
}

#[test]
fn test_masked_datasets_preserve_shape() {
    let mut engine = Anonymizer::new(sample_dataset()).expect("failed to create engine");
    engine.build_mask_table();
    let outcome = engine.apply_masking().expect("masking failed");

    for dataset in [&outcome.masked, &outcome.baseline] {
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.column_names(), vec!["nric", "age", "email"]);
    }
}

#[test]
fn test_duplicate_columns_rejected_at_construction() {
    let result = Dataset::new(vec![
        ("id".to_string(), int_column(&[1])),
        ("id".to_string(), int_column(&[2])),
    ]);

    assert!(matches!(result, Err(VeilError::DuplicateColumn(name)) if name == "id"));
}

#[test]
fn test_state_machine_order_enforced() {
    let mut engine = Anonymizer::new(sample_dataset()).expect("failed to create engine");

    assert!(matches!(
        engine.apply_masking(),
        Err(VeilError::PreconditionViolated(_))
    ));
    assert!(matches!(
        engine.assess_risk(),
        Err(VeilError::PreconditionViolated(_))
    ));

    engine.build_mask_table();
    assert!(engine.apply_masking().is_ok());
    assert!(engine.assess_risk().is_ok());
}

#[test]
fn test_manual_override_flows_into_masked_output() {
    let mut engine = Anonymizer::new(sample_dataset()).expect("failed to create engine");
    engine.build_mask_table();

    engine
        .change_masking("nric", "Suppress")
        .expect("suppress should be allowed for a direct identifier");
    let outcome = engine.apply_masking().expect("masking failed");

    let masked = outcome.masked.column("nric").expect("nric missing");
    assert_eq!(masked.values()[0], Value::Text("-".to_string()));

    // The baseline keeps the original recommendation
    let baseline = outcome.baseline.column("nric").expect("nric missing");
    assert_eq!(baseline.values()[0], Value::Text("*****567A".to_string()));
}

#[test]
fn test_disallowed_masking_change_leaves_table_untouched() {
    let mut engine = Anonymizer::new(sample_dataset()).expect("failed to create engine");
    engine.build_mask_table();

    let before: Vec<(String, Transformer)> = engine
        .mask_table()
        .expect("table missing")
        .iter()
        .map(|(name, t)| (name.to_string(), t))
        .collect();

    let result = engine.change_masking("nric", "Encode");
    assert!(matches!(
        result,
        Err(VeilError::UnknownTransformation { .. })
    ));

    let after: Vec<(String, Transformer)> = engine
        .mask_table()
        .expect("table missing")
        .iter()
        .map(|(name, t)| (name.to_string(), t))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_nric_cascade_applies_immediately() {
    let mut engine = Anonymizer::new(sample_dataset()).expect("failed to create engine");

    engine
        .change_property("email", PropertyKind::InformationType, "NRIC")
        .expect("property change failed");

    let props = engine.properties().get("email").expect("email missing");
    assert_eq!(props.sensitivity_type, SensitivityType::DirectIdentifier);
    assert_eq!(props.column_type, ColumnType::UniqueSparse);
}

#[test]
fn test_transformation_failure_names_offending_column() {
    // A column that classifies as NRIC by name but holds a malformed value
    let dataset = Dataset::new(vec![(
        "nric".to_string(),
        text_column(&["S1234567A", "xy"]),
    )])
    .expect("failed to build dataset");

    let mut engine = Anonymizer::new(dataset).expect("failed to create engine");
    engine.build_mask_table();

    match engine.apply_masking() {
        Err(VeilError::Transformation { column, name, .. }) => {
            assert_eq!(column, "nric");
            assert_eq!(name, "Mask NRIC");
        }
        other => panic!("expected transformation error, got {other:?}"),
    }

    // No partial outcome was committed
    assert!(engine.masking_outcome().is_none());
}

#[test]
fn test_pseudonymize_links_equal_values_within_run() {
    let dataset = Dataset::new(vec![(
        "id".to_string(),
        text_column(&["alpha", "alpha", "beta"]),
    )])
    .expect("failed to build dataset");

    let mut engine = Anonymizer::new(dataset).expect("failed to create engine");
    engine
        .change_property("id", PropertyKind::SensitivityType, "Direct Identifier")
        .expect("property change failed");
    engine.build_mask_table();

    let outcome = engine.apply_masking().expect("masking failed");
    let hashed = outcome.masked.column("id").expect("id missing");

    assert_eq!(hashed.values()[0], hashed.values()[1]);
    assert_ne!(hashed.values()[0], hashed.values()[2]);
}

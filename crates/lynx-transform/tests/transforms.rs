//! Integration tests for the transformers.

use std::collections::BTreeMap;
use std::sync::Arc;

use lynx_model::{
    Bound, Constraints, FieldType, MappingConfig, MetadataValue, Schema, SchemaField, TargetType,
};
use lynx_transform::{
    ColumnMappingTransformer, DataTransformer, SchemaTransformer, TransformError,
};
use lynx_validate::{ErrorCategory, SchemaValidator, ValidationError};
use polars::prelude::*;

fn mapping(
    renames: &[(&str, &str)],
    conversions: &[(&str, TargetType)],
    metadata: &[(&str, MetadataValue)],
) -> MappingConfig {
    MappingConfig {
        column_mappings: renames
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect(),
        type_conversions: conversions
            .iter()
            .map(|(column, target)| (column.to_string(), *target))
            .collect(),
        metadata: metadata
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect::<BTreeMap<_, _>>(),
    }
}

fn process_validator() -> Arc<SchemaValidator> {
    let schema = Schema::from([(
        "Process".to_string(),
        vec![
            SchemaField::new("id", FieldType::String).required(),
            SchemaField::new("duration", FieldType::Integer)
                .required()
                .with_constraints(Constraints {
                    max: Some(Bound::Number(1440.0)),
                    ..Constraints::default()
                }),
        ],
    )]);
    Arc::new(SchemaValidator::new(schema).unwrap())
}

#[test]
fn rename_then_convert_uses_post_rename_name() {
    let batch = DataFrame::new(vec![Series::new("a".into(), vec!["1", "2"]).into()]).unwrap();
    let transformer = ColumnMappingTransformer::new(mapping(
        &[("a", "b")],
        &[("a", TargetType::Int64)],
        &[],
    ));

    let out = transformer.transform(&batch).unwrap();
    assert_eq!(out.get_column_names_str(), vec!["b"]);
    let b = out.column("b").unwrap();
    assert_eq!(b.dtype(), &DataType::Int64);
    assert_eq!(b.get(0).unwrap(), AnyValue::Int64(1));
    assert_eq!(b.get(1).unwrap(), AnyValue::Int64(2));

    // input is untouched
    assert_eq!(batch.get_column_names_str(), vec!["a"]);
    assert_eq!(batch.column("a").unwrap().dtype(), &DataType::String);
}

#[test]
fn conversion_keyed_by_target_name_also_applies() {
    let batch = DataFrame::new(vec![Series::new("equipment_id".into(), vec![1i64, 2]).into()])
        .unwrap();
    let transformer = ColumnMappingTransformer::new(mapping(
        &[("equipment_id", "id")],
        &[("id", TargetType::String)],
        &[],
    ));

    let out = transformer.transform(&batch).unwrap();
    assert_eq!(out.column("id").unwrap().dtype(), &DataType::String);
}

#[test]
fn conversions_for_absent_columns_are_skipped() {
    let batch = DataFrame::new(vec![Series::new("x".into(), vec![1i64]).into()]).unwrap();
    let transformer =
        ColumnMappingTransformer::new(mapping(&[], &[("missing", TargetType::Float64)], &[]));
    let out = transformer.transform(&batch).unwrap();
    assert!(out.equals(&batch));
}

#[test]
fn metadata_becomes_constant_columns() {
    let batch = DataFrame::new(vec![Series::new("id".into(), vec!["EQ1", "EQ2", "EQ3"]).into()])
        .unwrap();
    let transformer = ColumnMappingTransformer::new(mapping(
        &[],
        &[],
        &[
            ("source", MetadataValue::from("manufacturing")),
            ("version", MetadataValue::Integer(2)),
        ],
    ));

    let out = transformer.transform(&batch).unwrap();
    assert_eq!(out.height(), 3);
    assert_eq!(out.get_column_names_str(), vec!["id", "source", "version"]);
    for row in 0..3 {
        assert_eq!(
            out.column("source").unwrap().get(row).unwrap(),
            AnyValue::String("manufacturing")
        );
        assert_eq!(
            out.column("version").unwrap().get(row).unwrap(),
            AnyValue::Int64(2)
        );
    }
}

#[test]
fn rename_collision_is_an_error() {
    let batch = DataFrame::new(vec![
        Series::new("a".into(), vec![1i64]).into(),
        Series::new("b".into(), vec![2i64]).into(),
    ])
    .unwrap();
    let transformer = ColumnMappingTransformer::new(mapping(&[("a", "b")], &[], &[]));
    match transformer.transform(&batch) {
        Err(TransformError::DuplicateColumn { column }) => assert_eq!(column, "b"),
        other => panic!("expected duplicate column error, got {other:?}"),
    }
}

#[test]
fn conversion_failure_identifies_field() {
    let batch =
        DataFrame::new(vec![Series::new("duration".into(), vec!["5", "five"]).into()]).unwrap();
    let transformer =
        ColumnMappingTransformer::new(mapping(&[], &[("duration", TargetType::Int64)], &[]));
    let err = transformer.transform(&batch).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot convert field 'duration' to int64: value \"five\" at row 1"
    );
}

#[test]
fn schema_transformer_passes_valid_batches() {
    let batch = DataFrame::new(vec![
        Series::new("equipment_id".into(), vec!["EQ1"]).into(),
        Series::new("duration".into(), vec!["90"]).into(),
    ])
    .unwrap();
    let transformer = SchemaTransformer::new(
        mapping(
            &[("equipment_id", "id")],
            &[("duration", TargetType::Int64)],
            &[],
        ),
        process_validator(),
        "Process",
    )
    .unwrap();

    let out = transformer.transform(&batch).unwrap();
    assert_eq!(out.column("duration").unwrap().get(0).unwrap(), AnyValue::Int64(90));
}

#[test]
fn schema_transformer_fails_whole_batch_on_findings() {
    let batch = DataFrame::new(vec![
        Series::new("id".into(), vec!["EQ1", "EQ2"]).into(),
        Series::new("duration".into(), vec![30i64, 2000]).into(),
    ])
    .unwrap();
    let transformer =
        SchemaTransformer::new(MappingConfig::default(), process_validator(), "Process").unwrap();

    match transformer.transform(&batch) {
        Err(TransformError::Validation { metatype, errors }) => {
            assert_eq!(metatype, "Process");
            assert_eq!(
                errors.get(ErrorCategory::Constraint),
                ["Values in field 'duration' are above maximum: 1440".to_string()]
            );
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn schema_transformer_can_reject_unknown_columns() {
    let batch = DataFrame::new(vec![
        Series::new("id".into(), vec!["EQ1"]).into(),
        Series::new("duration".into(), vec![30i64]).into(),
        Series::new("notes".into(), vec!["ok"]).into(),
    ])
    .unwrap();
    let lenient =
        SchemaTransformer::new(MappingConfig::default(), process_validator(), "Process").unwrap();
    assert!(lenient.transform(&batch).is_ok());

    let strict = lenient.reject_unknown_columns(true);
    match strict.transform(&batch) {
        Err(TransformError::Validation { errors, .. }) => {
            assert!(errors.contains(ErrorCategory::Unexpected));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn schema_transformer_requires_known_metatype() {
    let result = SchemaTransformer::new(MappingConfig::default(), process_validator(), "Widget");
    assert!(matches!(
        result,
        Err(TransformError::UnknownEntityType(ValidationError::UnknownEntityType(name))) if name == "Widget"
    ));
}

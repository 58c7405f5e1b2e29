use lynx_model::{
    Bound, FieldType, MappingConfig, MetadataValue, ModelError, PipelineState, PipelineStatus,
    Schema, TargetType,
};

#[test]
fn schema_parses_from_toml() {
    let text = r#"
[[Process]]
name = "duration"
data_type = "number"
required = true
constraints = { min = 0, max = 1440 }

[[Process]]
name = "code"
data_type = "string"
constraints = { pattern = "[A-Z]{3}", unique = true }

[[Equipment]]
name = "installed"
type = "datetime"
constraints = { min = "2020-01-01" }
"#;
    let schema: Schema = toml::from_str(text).unwrap();
    let process = &schema["Process"];
    assert_eq!(process.len(), 2);
    assert_eq!(process[0].name, "duration");
    assert_eq!(process[0].data_type, FieldType::Number);
    assert!(process[0].required);
    let constraints = process[0].constraints.as_ref().unwrap();
    assert_eq!(constraints.max, Some(Bound::Number(1440.0)));
    assert!(!process[1].required);
    assert!(process[1].constraints.as_ref().unwrap().unique);

    let installed = &schema["Equipment"][0];
    assert_eq!(installed.data_type, FieldType::Datetime);
    assert_eq!(
        installed.constraints.as_ref().unwrap().min,
        Some(Bound::Timestamp("2020-01-01".to_string()))
    );
}

#[test]
fn schema_field_rejects_unknown_keys() {
    let text = r#"
[[Process]]
name = "duration"
data_type = "number"
nullable = true
"#;
    assert!(toml::from_str::<Schema>(text).is_err());
}

#[test]
fn mapping_config_rejects_unknown_keys() {
    let err = toml::from_str::<MappingConfig>("column_map = { a = \"b\" }");
    assert!(err.is_err());
}

#[test]
fn mapping_config_parses_types_and_metadata() {
    let text = r#"
column_mappings = { equipment_id = "id" }
type_conversions = { id = "string", duration = "int" }
metadata = { source = "manufacturing", version = 2, active = true }
"#;
    let config: MappingConfig = toml::from_str(text).unwrap();
    assert_eq!(config.type_conversions["duration"], TargetType::Int64);
    assert_eq!(config.metadata["source"], MetadataValue::from("manufacturing"));
    assert_eq!(config.metadata["version"], MetadataValue::Integer(2));
    assert_eq!(config.metadata["active"], MetadataValue::Bool(true));
}

#[test]
fn mapping_config_rejects_unknown_target_type() {
    let text = "type_conversions = { id = \"decimal128\" }";
    assert!(toml::from_str::<MappingConfig>(text).is_err());
}

#[test]
fn state_follows_run_lifecycle() {
    let mut state = PipelineState::new();
    assert_eq!(state.status, PipelineStatus::Initialized);
    assert!(state.duration().is_none());

    state.transition(PipelineStatus::Running).unwrap();
    assert!(state.start_time.is_some());
    assert!(state.end_time.is_none());

    state.transition(PipelineStatus::Completed).unwrap();
    assert!(state.end_time.is_some());
    assert!(state.duration().unwrap() >= chrono::TimeDelta::zero());
}

#[test]
fn state_rejects_invalid_transitions() {
    let mut state = PipelineState::new();
    assert_eq!(
        state.transition(PipelineStatus::Completed),
        Err(ModelError::InvalidTransition {
            from: PipelineStatus::Initialized,
            to: PipelineStatus::Completed,
        })
    );
    assert!(state.transition(PipelineStatus::Paused).is_err());

    state.transition(PipelineStatus::Running).unwrap();
    state.transition(PipelineStatus::Failed).unwrap();
    assert!(state.transition(PipelineStatus::Running).is_err());
    assert_eq!(state.status, PipelineStatus::Failed);
}

#[test]
fn state_serializes_lowercase_status() {
    let mut state = PipelineState::new();
    state.record_error("pipeline_error", "boom");
    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["status"], "initialized");
    assert_eq!(json["errors"]["pipeline_error"], "boom");
    assert_eq!(json["records_processed"], 0);
}

use std::collections::BTreeMap;
use std::path::Path;

use lynx_common::parse_timestamp;
use lynx_model::{Bound, FieldType, Schema, SchemaField};
use polars::prelude::DataFrame;
use regex::Regex;
use tracing::debug;

use crate::checks::constraints::{CompiledConstraints, Limit, coerce, evaluate};
use crate::checks::types::{TypeMismatch, check_type};
use crate::error::{SchemaError, ValidationError};
use crate::report::{ErrorCategory, ValidationErrors};
use crate::schema_file::load_schema;

#[derive(Debug, Clone)]
struct CompiledField {
    field: SchemaField,
    constraints: Option<CompiledConstraints>,
}

/// Validates batches against declared metatypes.
///
/// The schema is checked once at construction (patterns compile, bounds fit
/// their field types) and is read-only afterwards.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    metatypes: BTreeMap<String, Vec<CompiledField>>,
}

impl SchemaValidator {
    pub fn new(schema: Schema) -> Result<Self, SchemaError> {
        let mut metatypes = BTreeMap::new();
        for (metatype, fields) in schema {
            let compiled = fields
                .into_iter()
                .map(|field| {
                    let constraints = compile_constraints(&metatype, &field)?;
                    Ok(CompiledField { field, constraints })
                })
                .collect::<Result<Vec<_>, SchemaError>>()?;
            metatypes.insert(metatype, compiled);
        }
        Ok(Self { metatypes })
    }

    /// Load a TOML schema file and build a validator from it.
    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        Self::new(load_schema(path)?)
    }

    pub fn metatypes(&self) -> impl Iterator<Item = &str> {
        self.metatypes.keys().map(String::as_str)
    }

    pub fn has_metatype(&self, metatype: &str) -> bool {
        self.metatypes.contains_key(metatype)
    }

    /// Declared fields of a metatype, in declaration order.
    pub fn fields(&self, metatype: &str) -> Option<impl Iterator<Item = &SchemaField>> {
        self.metatypes
            .get(metatype)
            .map(|fields| fields.iter().map(|compiled| &compiled.field))
    }

    /// Check `df` against the fields of `entity_type`.
    ///
    /// For each declared field, in order: a missing required field is
    /// reported and skipped; a type mismatch is reported and its constraints
    /// are skipped; otherwise constraints are evaluated on coerced values.
    pub fn validate(
        &self,
        df: &DataFrame,
        entity_type: &str,
    ) -> Result<ValidationErrors, ValidationError> {
        let fields = self.declared(entity_type)?;
        let mut errors = ValidationErrors::new();

        for compiled in fields {
            let field = &compiled.field;
            let Ok(column) = df.column(&field.name) else {
                if field.required {
                    errors.push(
                        ErrorCategory::Missing,
                        format!("Required field '{}' is missing", field.name),
                    );
                }
                continue;
            };

            if let Err(mismatch) = check_type(column, field.data_type) {
                let message = match mismatch {
                    TypeMismatch::NotString => {
                        format!("Field '{}' contains non-string values", field.name)
                    }
                    TypeMismatch::Invalid(cause) => format!(
                        "Field '{}' has invalid {} values: {cause}",
                        field.name, field.data_type
                    ),
                };
                errors.push(ErrorCategory::TypeMismatch, message);
                continue;
            }

            let Some(constraints) = compiled.constraints.as_ref().filter(|c| !c.is_empty()) else {
                continue;
            };
            match coerce(column, field.data_type) {
                Some(typed) => errors.extend(
                    ErrorCategory::Constraint,
                    evaluate(&field.name, &typed, constraints),
                ),
                None => errors.push(
                    ErrorCategory::Constraint,
                    format!(
                        "Could not convert field '{}' for constraint validation",
                        field.name
                    ),
                ),
            }
        }

        debug!(
            metatype = entity_type,
            rows = df.height(),
            errors = errors.len(),
            "validated batch"
        );
        Ok(errors)
    }

    /// Columns of `df` that `entity_type` does not declare, in frame order.
    pub fn unexpected_columns(
        &self,
        df: &DataFrame,
        entity_type: &str,
    ) -> Result<Vec<String>, ValidationError> {
        let fields = self.declared(entity_type)?;
        Ok(df
            .get_column_names_str()
            .into_iter()
            .filter(|name| !fields.iter().any(|compiled| compiled.field.name == *name))
            .map(str::to_string)
            .collect())
    }

    /// [`validate`](Self::validate) plus an `unexpected` entry for every
    /// undeclared column.
    pub fn validate_strict(
        &self,
        df: &DataFrame,
        entity_type: &str,
    ) -> Result<ValidationErrors, ValidationError> {
        let mut errors = self.validate(df, entity_type)?;
        for column in self.unexpected_columns(df, entity_type)? {
            errors.push(
                ErrorCategory::Unexpected,
                format!("Column '{column}' is not declared for metatype '{entity_type}'"),
            );
        }
        Ok(errors)
    }

    fn declared(&self, entity_type: &str) -> Result<&[CompiledField], ValidationError> {
        self.metatypes
            .get(entity_type)
            .map(Vec::as_slice)
            .ok_or_else(|| ValidationError::UnknownEntityType(entity_type.to_string()))
    }
}

fn compile_constraints(
    metatype: &str,
    field: &SchemaField,
) -> Result<Option<CompiledConstraints>, SchemaError> {
    let Some(constraints) = &field.constraints else {
        return Ok(None);
    };

    let limit = |bound: &Bound| -> Result<(Limit, String), SchemaError> {
        if !field.data_type.is_ordered() {
            return Err(SchemaError::BoundOnUnorderedField {
                metatype: metatype.to_string(),
                field: field.name.clone(),
                data_type: field.data_type,
            });
        }
        let resolved = match (field.data_type, bound) {
            (FieldType::Number | FieldType::Integer, Bound::Number(value)) => {
                Some(Limit::Number(*value))
            }
            (FieldType::Datetime, Bound::Timestamp(text)) => {
                parse_timestamp(text).map(Limit::Timestamp)
            }
            _ => None,
        };
        resolved
            .map(|limit| (limit, bound.to_string()))
            .ok_or_else(|| SchemaError::InvalidBound {
                metatype: metatype.to_string(),
                field: field.name.clone(),
                bound: bound.to_string(),
                data_type: field.data_type,
            })
    };

    let pattern = match &constraints.pattern {
        Some(pattern) => {
            if field.data_type != FieldType::String {
                return Err(SchemaError::PatternOnNonString {
                    metatype: metatype.to_string(),
                    field: field.name.clone(),
                    data_type: field.data_type,
                });
            }
            let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|source| {
                SchemaError::InvalidPattern {
                    metatype: metatype.to_string(),
                    field: field.name.clone(),
                    pattern: pattern.clone(),
                    source,
                }
            })?;
            Some((pattern.clone(), regex))
        }
        None => None,
    };

    Ok(Some(CompiledConstraints {
        min: constraints.min.as_ref().map(limit).transpose()?,
        max: constraints.max.as_ref().map(limit).transpose()?,
        unique: constraints.unique,
        pattern,
    }))
}

//! Constraint evaluation on typed column values.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use chrono::NaiveDateTime;
use lynx_common::{any_to_f64, any_to_i64, any_to_string, any_to_timestamp, format_numeric, format_timestamp};
use lynx_model::FieldType;
use polars::prelude::{AnyValue, Column, DataType};
use regex::Regex;

use super::format_list;

/// A `min`/`max` bound resolved against the field type.
#[derive(Debug, Clone)]
pub(crate) enum Limit {
    Number(f64),
    Timestamp(NaiveDateTime),
}

/// Constraints of one field, ready to evaluate.
#[derive(Debug, Clone)]
pub(crate) struct CompiledConstraints {
    /// Bound plus its declared text, used in messages.
    pub min: Option<(Limit, String)>,
    pub max: Option<(Limit, String)>,
    pub unique: bool,
    /// Source pattern plus the start-anchored regex.
    pub pattern: Option<(String, Regex)>,
}

impl CompiledConstraints {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && !self.unique && self.pattern.is_none()
    }
}

/// Column values coerced to the field's semantic type.
pub(crate) enum Typed {
    Numbers(Vec<Option<f64>>),
    /// Integer fields stay exact; f64 loses precision past 2^53.
    Integers(Vec<Option<i64>>),
    Timestamps(Vec<Option<NaiveDateTime>>),
    Text {
        values: Vec<Option<String>>,
        quoted: bool,
    },
}

/// Coerce a column for constraint checks. `None` when a non-null cell
/// cannot be converted.
pub(crate) fn coerce(column: &Column, data_type: FieldType) -> Option<Typed> {
    let cells = (0..column.len()).map(|idx| column.get(idx).unwrap_or(AnyValue::Null));
    match data_type {
        FieldType::Number => cells
            .map(|value| match value {
                AnyValue::Null => Some(None),
                other => any_to_f64(other).map(Some),
            })
            .collect::<Option<Vec<_>>>()
            .map(Typed::Numbers),
        FieldType::Integer => cells
            .map(|value| match value {
                AnyValue::Null => Some(None),
                other => any_to_i64(other).map(Some),
            })
            .collect::<Option<Vec<_>>>()
            .map(Typed::Integers),
        FieldType::Datetime => cells
            .map(|value| match value {
                AnyValue::Null => Some(None),
                other => any_to_timestamp(other).map(Some),
            })
            .collect::<Option<Vec<_>>>()
            .map(Typed::Timestamps),
        _ => Some(Typed::Text {
            values: cells
                .map(|value| match value {
                    AnyValue::Null => None,
                    other => Some(any_to_string(other)),
                })
                .collect(),
            quoted: matches!(column.dtype(), DataType::String),
        }),
    }
}

/// Evaluate constraints in the fixed order min, max, unique, pattern.
pub(crate) fn evaluate(name: &str, typed: &Typed, constraints: &CompiledConstraints) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some((limit, shown)) = &constraints.min
        && below(typed, limit)
    {
        errors.push(format!("Values in field '{name}' are below minimum: {shown}"));
    }
    if let Some((limit, shown)) = &constraints.max
        && above(typed, limit)
    {
        errors.push(format!("Values in field '{name}' are above maximum: {shown}"));
    }
    if constraints.unique {
        let (duplicates, quoted) = duplicate_values(typed);
        if !duplicates.is_empty() {
            errors.push(format!(
                "Field '{name}' violates unique constraint with duplicate values: {}",
                format_list(&duplicates, quoted)
            ));
        }
    }
    if let Some((pattern, regex)) = &constraints.pattern
        && let Typed::Text { values, quoted } = typed
    {
        let invalid: Vec<String> = values
            .iter()
            .flatten()
            .filter(|value| !regex.is_match(value))
            .cloned()
            .collect();
        if !invalid.is_empty() {
            errors.push(format!(
                "Values in field '{name}' do not match pattern {pattern}: {}",
                format_list(&invalid, *quoted)
            ));
        }
    }

    errors
}

fn below(typed: &Typed, limit: &Limit) -> bool {
    match (typed, limit) {
        (Typed::Numbers(values), Limit::Number(bound)) => {
            numbers(values).reduce(f64::min).is_some_and(|min| min < *bound)
        }
        (Typed::Integers(values), Limit::Number(bound)) => values
            .iter()
            .flatten()
            .min()
            .is_some_and(|min| compare_to_bound(*min, *bound) == Some(Ordering::Less)),
        (Typed::Timestamps(values), Limit::Timestamp(bound)) => {
            values.iter().flatten().min().is_some_and(|min| min < bound)
        }
        _ => false,
    }
}

fn above(typed: &Typed, limit: &Limit) -> bool {
    match (typed, limit) {
        (Typed::Numbers(values), Limit::Number(bound)) => {
            numbers(values).reduce(f64::max).is_some_and(|max| max > *bound)
        }
        (Typed::Integers(values), Limit::Number(bound)) => values
            .iter()
            .flatten()
            .max()
            .is_some_and(|max| compare_to_bound(*max, *bound) == Some(Ordering::Greater)),
        (Typed::Timestamps(values), Limit::Timestamp(bound)) => {
            values.iter().flatten().max().is_some_and(|max| max > bound)
        }
        _ => false,
    }
}

/// Orders an integer against a float bound without rounding the integer.
fn compare_to_bound(value: i64, bound: f64) -> Option<Ordering> {
    // i64 covers [-2^63, 2^63)
    const EDGE: f64 = 9_223_372_036_854_775_808.0;
    if bound.is_nan() {
        return None;
    }
    if bound >= EDGE {
        return Some(Ordering::Less);
    }
    if bound < -EDGE {
        return Some(Ordering::Greater);
    }
    let whole = bound.trunc() as i64;
    let fract = bound.fract();
    Some(value.cmp(&whole).then(if fract > 0.0 {
        Ordering::Less
    } else if fract < 0.0 {
        Ordering::Greater
    } else {
        Ordering::Equal
    }))
}

fn numbers(values: &[Option<f64>]) -> impl Iterator<Item = f64> + '_ {
    values.iter().flatten().copied().filter(|v| !v.is_nan())
}

/// Duplicated non-null values, each reported once, in the order their
/// second occurrence appears.
fn duplicate_values(typed: &Typed) -> (Vec<String>, bool) {
    match typed {
        Typed::Numbers(values) => {
            // -0.0 and 0.0 are the same value
            let keys = numbers(values).map(|v| (v + 0.0).to_bits());
            let shown = repeated(keys)
                .into_iter()
                .map(|bits| format_numeric(f64::from_bits(bits)))
                .collect();
            (shown, false)
        }
        Typed::Integers(values) => {
            let shown = repeated(values.iter().flatten().copied())
                .into_iter()
                .map(|v| v.to_string())
                .collect();
            (shown, false)
        }
        Typed::Timestamps(values) => {
            let shown = repeated(values.iter().flatten().copied())
                .into_iter()
                .map(format_timestamp)
                .collect();
            (shown, true)
        }
        Typed::Text { values, quoted } => (repeated(values.iter().flatten().cloned()), *quoted),
    }
}

fn repeated<K: Hash + Eq + Clone>(keys: impl Iterator<Item = K>) -> Vec<K> {
    let mut counts: HashMap<K, usize> = HashMap::new();
    let mut repeated = Vec::new();
    for key in keys {
        let count = counts.entry(key.clone()).or_insert(0);
        *count += 1;
        if *count == 2 {
            repeated.push(key);
        }
    }
    repeated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_reports_each_duplicate_once() {
        let keys = ["a", "b", "b", "a", "b", "c"].into_iter();
        assert_eq!(repeated(keys), vec!["b", "a"]);
    }

    #[test]
    fn numeric_duplicates_are_formatted_plainly() {
        let typed = Typed::Numbers(vec![Some(1.0), Some(2.5), None, Some(2.5), Some(1.0), None]);
        assert_eq!(
            duplicate_values(&typed),
            (vec!["2.5".to_string(), "1".to_string()], false)
        );
    }

    #[test]
    fn bounds_ignore_nulls_and_nan() {
        let typed = Typed::Numbers(vec![None, Some(f64::NAN), Some(5.0)]);
        assert!(!below(&typed, &Limit::Number(0.0)));
        assert!(above(&typed, &Limit::Number(4.0)));
    }

    #[test]
    fn integers_beyond_f64_precision_stay_distinct() {
        let typed = Typed::Integers(vec![Some(9_007_199_254_740_992), Some(9_007_199_254_740_993)]);
        assert_eq!(duplicate_values(&typed), (Vec::new(), false));
        assert!(above(&typed, &Limit::Number(9_007_199_254_740_992.0)));
        assert!(!below(&typed, &Limit::Number(9_007_199_254_740_992.0)));
    }

    #[test]
    fn integer_bounds_compare_exactly() {
        assert_eq!(compare_to_bound(2, 2.5), Some(Ordering::Less));
        assert_eq!(compare_to_bound(-2, -2.5), Some(Ordering::Greater));
        assert_eq!(compare_to_bound(-3, -3.0), Some(Ordering::Equal));
        assert_eq!(compare_to_bound(i64::MAX, 9_223_372_036_854_775_808.0), Some(Ordering::Less));
        assert_eq!(compare_to_bound(i64::MIN, -9_223_372_036_854_775_808.0), Some(Ordering::Equal));
        assert_eq!(compare_to_bound(0, f64::NAN), None);
    }

    #[test]
    fn integer_duplicates_are_reported() {
        let typed = Typed::Integers(vec![Some(7), None, Some(-1), Some(7), Some(-1), Some(7)]);
        assert_eq!(
            duplicate_values(&typed),
            (vec!["7".to_string(), "-1".to_string()], false)
        );
    }
}

//! Grouped validation findings.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Kind of validation failure. Ordering follows the check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A required field is absent from the batch.
    Missing,
    /// A field's values do not fit its declared type.
    TypeMismatch,
    /// Typed values break a `min`/`max`/`unique`/`pattern` constraint.
    Constraint,
    /// A column is present that the metatype does not declare.
    Unexpected,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Missing => "missing",
            ErrorCategory::TypeMismatch => "type_mismatch",
            ErrorCategory::Constraint => "constraint",
            ErrorCategory::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category -> messages. Only categories with at least one message are
/// present, so an empty value means "valid".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<ErrorCategory, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, category: ErrorCategory, message: impl Into<String>) {
        self.errors.entry(category).or_default().push(message.into());
    }

    pub fn extend(&mut self, category: ErrorCategory, messages: impl IntoIterator<Item = String>) {
        for message in messages {
            self.push(category, message);
        }
    }

    /// Add `other`'s messages, skipping ones already recorded.
    pub fn merge(&mut self, other: ValidationErrors) {
        for (category, messages) in other.errors {
            let existing = self.errors.entry(category).or_default();
            for message in messages {
                if !existing.contains(&message) {
                    existing.push(message);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of messages across categories.
    pub fn len(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn get(&self, category: ErrorCategory) -> &[String] {
        self.errors.get(&category).map_or(&[], Vec::as_slice)
    }

    pub fn contains(&self, category: ErrorCategory) -> bool {
        self.errors.contains_key(&category)
    }

    pub fn categories(&self) -> impl Iterator<Item = ErrorCategory> + '_ {
        self.errors.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ErrorCategory, &str)> + '_ {
        self.errors.iter().flat_map(|(category, messages)| {
            messages.iter().map(move |message| (*category, message.as_str()))
        })
    }

    pub fn into_inner(self) -> BTreeMap<ErrorCategory, Vec<String>> {
        self.errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (category, message) in self.iter() {
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "{category}: {message}")?;
        }
        Ok(())
    }
}

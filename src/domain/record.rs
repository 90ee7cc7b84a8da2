// ============================================================
// RECORD TYPES
// ============================================================
// A complete set of finite feature values, one per schema field

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};
use crate::domain::schema::ColumnSchema;

/// Raw value for a single field as typed by the user or read from a form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

/// Why a field was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum FieldIssue {
    Missing,
    NotNumeric(String),
    NotFinite,
}

/// First offending field of a rejected record
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub issue: FieldIssue,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.issue {
            FieldIssue::Missing => write!(f, "{} is required", self.field),
            FieldIssue::NotNumeric(raw) => {
                write!(f, "{} must be a number (got '{}')", self.field, raw)
            }
            FieldIssue::NotFinite => write!(f, "{} must be a finite number", self.field),
        }
    }
}

impl From<FieldError> for AppError {
    fn from(err: FieldError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

/// One row of features, stored in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<ColumnSchema>,
    values: Vec<f64>,
}

impl Record {
    /// Build a record from values already in schema order.
    /// Rejects wrong arity and non-finite values.
    pub fn from_values(schema: Arc<ColumnSchema>, values: Vec<f64>) -> Result<Self> {
        if values.len() != schema.len() {
            return Err(AppError::ValidationError(format!(
                "Expected {} values, got {}",
                schema.len(),
                values.len()
            )));
        }
        if let Some((field, _)) = schema
            .iter()
            .zip(values.iter())
            .find(|(_, value)| !value.is_finite())
        {
            return Err(FieldError {
                field: field.to_string(),
                issue: FieldIssue::NotFinite,
            }
            .into());
        }
        Ok(Self { schema, values })
    }

    /// Build a record from values that were already checked field by field
    pub(crate) fn from_checked(schema: Arc<ColumnSchema>, values: Vec<f64>) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        debug_assert!(values.iter().all(|v| v.is_finite()));
        Self { schema, values }
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Field-name keyed view used by the `raw` request form
    pub fn to_named_map(&self) -> BTreeMap<String, f64> {
        self.schema
            .iter()
            .zip(self.values.iter())
            .map(|(field, value)| (field.to_string(), *value))
            .collect()
    }
}

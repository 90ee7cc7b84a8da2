// ============================================================
// COLUMN SCHEMA
// ============================================================
// Fixed, ordered list of feature names. Defines validation order,
// wire order and display order for the whole session.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::domain::error::{AppError, Result};

/// Feature columns of the Pima Indians Diabetes dataset the service is trained on
pub const DEFAULT_FIELDS: [&str; 8] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

/// Immutable ordered set of field names
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    fields: Vec<String>,
}

impl ColumnSchema {
    /// Build a schema, rejecting empty, blank or duplicate field names
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields
            .into_iter()
            .map(|f| f.into().trim().to_string())
            .collect();

        if fields.is_empty() {
            return Err(AppError::ValidationError(
                "Column schema must contain at least one field".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if field.is_empty() {
                return Err(AppError::ValidationError(
                    "Column schema contains a blank field name".to_string(),
                ));
            }
            if !seen.insert(field.as_str()) {
                return Err(AppError::ValidationError(format!(
                    "Column schema contains duplicate field: {}",
                    field
                )));
            }
        }

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl fmt::Display for ColumnSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fields.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema_order() {
        let schema = ColumnSchema::default();
        assert_eq!(schema.len(), 8);
        assert_eq!(schema.fields()[0], "Pregnancies");
        assert_eq!(schema.fields()[7], "Age");
        assert_eq!(schema.fields()[5], "BMI");
    }

    #[test]
    fn test_rejects_duplicates() {
        let err = ColumnSchema::new(["a", "b", "a"]).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("duplicate field: a")));
    }

    #[test]
    fn test_rejects_empty_and_blank() {
        assert!(ColumnSchema::new(Vec::<String>::new()).is_err());
        assert!(ColumnSchema::new(["a", "  "]).is_err());
    }

    #[test]
    fn test_trims_names() {
        let schema = ColumnSchema::new([" x ", "y"]).unwrap();
        assert_eq!(schema.fields(), &["x".to_string(), "y".to_string()]);
    }
}

// ============================================================
// RECORD VALIDATOR
// ============================================================
// Turn raw per-field input into a complete Record or name the
// first offending field in schema order.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::record::{FieldError, FieldIssue, RawValue, Record};
use crate::domain::schema::ColumnSchema;

/// Strict validator for single-entry input
pub struct RecordValidator {
    schema: Arc<ColumnSchema>,
}

impl RecordValidator {
    pub fn new(schema: Arc<ColumnSchema>) -> Self {
        Self { schema }
    }

    /// Validate a field-name keyed input. Keys outside the schema are ignored.
    pub fn validate(&self, raw: &HashMap<String, RawValue>) -> Result<Record, FieldError> {
        let mut values = Vec::with_capacity(self.schema.len());

        for field in self.schema.iter() {
            let value = match raw.get(field) {
                None => {
                    return Err(FieldError {
                        field: field.to_string(),
                        issue: FieldIssue::Missing,
                    })
                }
                Some(value) => parse_field(field, value)?,
            };
            values.push(value);
        }

        Ok(Record::from_checked(self.schema.clone(), values))
    }
}

/// Parse one raw cell into a finite number
pub fn parse_field(field: &str, value: &RawValue) -> Result<f64, FieldError> {
    let number = match value {
        RawValue::Number(n) => *n,
        RawValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(FieldError {
                    field: field.to_string(),
                    issue: FieldIssue::Missing,
                });
            }
            trimmed.parse::<f64>().map_err(|_| FieldError {
                field: field.to_string(),
                issue: FieldIssue::NotNumeric(trimmed.to_string()),
            })?
        }
    };

    if !number.is_finite() {
        return Err(FieldError {
            field: field.to_string(),
            issue: FieldIssue::NotFinite,
        });
    }
    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::DEFAULT_FIELDS;

    fn full_input() -> HashMap<String, RawValue> {
        let values = [2.0, 120.0, 70.0, 20.0, 79.0, 32.0, 0.47, 33.0];
        DEFAULT_FIELDS
            .iter()
            .zip(values)
            .map(|(f, v)| (f.to_string(), RawValue::Number(v)))
            .collect()
    }

    fn validator() -> RecordValidator {
        RecordValidator::new(Arc::new(ColumnSchema::default()))
    }

    #[test]
    fn test_valid_input_follows_schema_order() {
        let record = validator().validate(&full_input()).unwrap();
        assert_eq!(
            record.values(),
            &[2.0, 120.0, 70.0, 20.0, 79.0, 32.0, 0.47, 33.0]
        );
    }

    #[test]
    fn test_text_values_are_trimmed_and_parsed() {
        let mut input = full_input();
        input.insert("Glucose".to_string(), RawValue::from(" 148 "));
        let record = validator().validate(&input).unwrap();
        assert_eq!(record.to_named_map()["Glucose"], 148.0);
    }

    #[test]
    fn test_each_missing_field_is_named() {
        for field in DEFAULT_FIELDS {
            let mut input = full_input();
            input.remove(field);
            let err = validator().validate(&input).unwrap_err();
            assert_eq!(err.field, field);
            assert_eq!(err.issue, FieldIssue::Missing);
        }
    }

    #[test]
    fn test_each_corrupted_field_is_named() {
        for field in DEFAULT_FIELDS {
            let mut input = full_input();
            input.insert(field.to_string(), RawValue::from("abc"));
            let err = validator().validate(&input).unwrap_err();
            assert_eq!(err.field, field);
            assert_eq!(err.issue, FieldIssue::NotNumeric("abc".to_string()));
        }
    }

    #[test]
    fn test_first_offender_in_schema_order_wins() {
        let mut input = full_input();
        input.remove("Age");
        input.insert("Glucose".to_string(), RawValue::from(""));
        let err = validator().validate(&input).unwrap_err();
        assert_eq!(err.field, "Glucose");
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut input = full_input();
        input.insert("BMI".to_string(), RawValue::Number(f64::INFINITY));
        let err = validator().validate(&input).unwrap_err();
        assert_eq!(err.field, "BMI");
        assert_eq!(err.issue, FieldIssue::NotFinite);

        input.insert("BMI".to_string(), RawValue::from("NaN"));
        let err = validator().validate(&input).unwrap_err();
        assert_eq!(err.issue, FieldIssue::NotFinite);
    }

    #[test]
    fn test_extra_keys_are_ignored() {
        let mut input = full_input();
        input.insert("Outcome".to_string(), RawValue::from("oops"));
        assert!(validator().validate(&input).is_ok());
    }
}

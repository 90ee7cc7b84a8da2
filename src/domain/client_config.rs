use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::{Validate, ValidationError};

use crate::domain::prediction::PayloadForm;
use crate::domain::schema::DEFAULT_FIELDS;

/// Port the prediction service listens on when derived from an origin
pub const DEFAULT_SERVICE_PORT: u16 = 8000;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Explicit base URL of the prediction service; wins over `origin`
    #[validate(url)]
    pub service_url: Option<String>,
    /// Origin whose port is swapped for `service_port` when no URL is set
    #[validate(url)]
    pub origin: Option<String>,
    #[validate(range(min = 1))]
    pub service_port: u16,
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: u64,
    pub payload_form: PayloadForm,
    pub export_dir: PathBuf,
    #[validate(length(min = 1), custom(function = "validate_schema_fields"))]
    pub schema: Vec<String>,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_url: None,
            origin: None,
            service_port: DEFAULT_SERVICE_PORT,
            request_timeout_secs: 30,
            payload_form: PayloadForm::default(),
            export_dir: PathBuf::from("."),
            schema: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
            log_filter: "info".to_string(),
        }
    }
}

fn validate_schema_fields(fields: &Vec<String>) -> Result<(), ValidationError> {
    let mut seen = std::collections::HashSet::new();
    for field in fields {
        let name = field.trim();
        if name.is_empty() {
            return Err(ValidationError::new("blank_schema_field"));
        }
        if !seen.insert(name) {
            return Err(ValidationError::new("duplicate_schema_field"));
        }
    }
    Ok(())
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Body for `POST /predict`. Serializes as `{"raw": {...}}` or `{"features": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictRequest {
    Raw(BTreeMap<String, f64>),
    Features(Vec<f64>),
}

/// Which body form single predictions are sent with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PayloadForm {
    Raw,
    #[default]
    Features,
}

#[derive(Debug, Serialize)]
pub struct BatchRequest<'a> {
    pub batch: &'a [Vec<f64>],
}

/// Response of `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinglePrediction {
    #[serde(default)]
    pub prediction: Value,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Any additional keys the service returns
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `POST /predict_batch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPredictions {
    pub predictions: Vec<Value>,
    pub probabilities: Vec<f64>,
}

/// Response of `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
}

/// One accumulated single-prediction call
#[derive(Debug, Clone, PartialEq)]
pub struct SinglePredictionEntry {
    pub input: Vec<f64>,
    pub output: SinglePrediction,
}

/// Batch results aligned with the matrix that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResultSet {
    pub matrix: Vec<Vec<f64>>,
    pub predictions: Vec<Value>,
    pub probabilities: Vec<f64>,
    /// Buffer version the matrix was taken from
    pub buffer_version: u64,
}

impl BatchResultSet {
    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }
}

pub mod http;

use crate::domain::error::Result;
use crate::domain::prediction::{BatchPredictions, HealthStatus, PredictRequest, SinglePrediction};
use async_trait::async_trait;

pub use http::HttpPredictionClient;

#[async_trait]
pub trait PredictionClient {
    async fn predict(&self, request: &PredictRequest) -> Result<SinglePrediction>;
    async fn predict_batch(&self, batch: &[Vec<f64>]) -> Result<BatchPredictions>;
    async fn health(&self) -> Result<HealthStatus>;
}

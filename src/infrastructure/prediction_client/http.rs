use super::PredictionClient;
use crate::domain::error::{AppError, Result};
use crate::domain::prediction::{
    BatchPredictions, BatchRequest, HealthStatus, PredictRequest, SinglePrediction,
};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub struct HttpPredictionClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpPredictionClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn send<T: DeserializeOwned>(&self, url: &str, request: RequestBuilder) -> Result<T> {
        debug!(url = %url, "Calling prediction service");

        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| map_transport_error(url, e))?;

        let response = check_status(response).await?;

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                map_transport_error(url, e)
            } else {
                AppError::ParseError(format!("Failed to parse JSON: {}", e))
            }
        })
    }
}

#[async_trait]
impl PredictionClient for HttpPredictionClient {
    async fn predict(&self, request: &PredictRequest) -> Result<SinglePrediction> {
        let url = self.endpoint("predict");
        self.send(&url, self.client.post(&url).json(request)).await
    }

    async fn predict_batch(&self, batch: &[Vec<f64>]) -> Result<BatchPredictions> {
        let url = self.endpoint("predict_batch");
        let body = BatchRequest { batch };
        self.send(&url, self.client.post(&url).json(&body)).await
    }

    async fn health(&self) -> Result<HealthStatus> {
        let url = self.endpoint("health");
        self.send(&url, self.client.get(&url)).await
    }
}

fn map_transport_error(url: &str, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout(url.to_string())
    } else {
        AppError::TransportError(format!("Request failed: {}", err))
    }
}

/// Turn a non-2xx response into a service error carrying the `detail` text
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = extract_detail(&text).unwrap_or_else(|| {
        if text.trim().is_empty() {
            format!("API error ({})", status)
        } else {
            format!("API error ({}): {}", status, text.trim())
        }
    });
    warn!(status = %status, detail = %message, "Prediction service returned an error");
    Err(AppError::ServiceError(message))
}

/// `{"detail": "..."}` yields the string; a structured detail yields its JSON text
fn extract_detail(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    match json.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

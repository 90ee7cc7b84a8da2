// ============================================================
// PREDICT USE CASE
// ============================================================
// Single and batch prediction against the remote service, with
// results recorded on the session.

use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};

use crate::application::use_cases::session::Session;
use crate::domain::error::{AppError, Result};
use crate::domain::prediction::{
    BatchResultSet, HealthStatus, PayloadForm, PredictRequest, SinglePrediction,
    SinglePredictionEntry,
};
use crate::domain::record::Record;
use crate::infrastructure::prediction_client::PredictionClient;

pub struct PredictUseCase {
    client: Arc<dyn PredictionClient + Send + Sync>,
    payload_form: PayloadForm,
}

impl PredictUseCase {
    pub fn new(client: Arc<dyn PredictionClient + Send + Sync>, payload_form: PayloadForm) -> Self {
        Self {
            client,
            payload_form,
        }
    }

    /// Predict one validated record and append it to the session history
    pub async fn predict_record(
        &self,
        session: &mut Session,
        record: &Record,
    ) -> Result<SinglePrediction> {
        let request = match self.payload_form {
            PayloadForm::Raw => PredictRequest::Raw(record.to_named_map()),
            PayloadForm::Features => PredictRequest::Features(record.values().to_vec()),
        };
        self.predict_single(session, request, record.values().to_vec())
            .await
    }

    /// Legacy positional form; input is sent exactly as given
    pub async fn predict_features(
        &self,
        session: &mut Session,
        features: Vec<f64>,
    ) -> Result<SinglePrediction> {
        if features.is_empty() {
            return Err(AppError::ValidationError(
                "Please enter values.".to_string(),
            ));
        }
        let request = PredictRequest::Features(features.clone());
        self.predict_single(session, request, features).await
    }

    async fn predict_single(
        &self,
        session: &mut Session,
        request: PredictRequest,
        input: Vec<f64>,
    ) -> Result<SinglePrediction> {
        let output = self.client.predict(&request).await?;
        info!(
            session_id = %session.id(),
            prediction = %output.prediction,
            probability = ?output.probability,
            "Single prediction received"
        );
        session.record_single(SinglePredictionEntry {
            input,
            output: output.clone(),
        });
        Ok(output)
    }

    /// Submit the whole buffer. Results are stored only when they align
    /// with the submitted rows.
    pub async fn predict_batch(&self, session: &mut Session) -> Result<BatchResultSet> {
        if session.buffer().is_empty() {
            return Err(AppError::ValidationError(
                "Batch is empty. Add rows or import a CSV first.".to_string(),
            ));
        }

        let matrix = session.buffer().to_ordered_matrix();
        let buffer_version = session.buffer().version();

        let response = self.client.predict_batch(&matrix).await?;

        if response.predictions.len() != matrix.len()
            || response.probabilities.len() != matrix.len()
        {
            warn!(
                rows = matrix.len(),
                predictions = response.predictions.len(),
                probabilities = response.probabilities.len(),
                "Batch response is not aligned with the submitted rows"
            );
            return Err(AppError::ServiceError(format!(
                "Service returned {} predictions and {} probabilities for {} rows",
                response.predictions.len(),
                response.probabilities.len(),
                matrix.len()
            )));
        }

        let results = BatchResultSet {
            matrix,
            predictions: response.predictions,
            probabilities: response.probabilities,
            buffer_version,
        };
        info!(session_id = %session.id(), rows = results.len(), "Batch prediction received");
        session.store_batch_results(results.clone());
        Ok(results)
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        self.client.health().await
    }
}

/// Split comma-separated text into numbers, dropping entries that do not
/// parse. Returns the parsed values and how many entries were dropped.
pub fn parse_feature_list(raw: &str) -> (Vec<f64>, usize) {
    let mut dropped = 0;
    let values = raw
        .split(',')
        .filter_map(|part| match part.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                dropped += 1;
                None
            }
        })
        .collect();
    (values, dropped)
}

/// Race a request against a cancellation signal. Whichever finishes first
/// wins; a cancelled request is dropped without touching session state.
pub async fn with_cancel<T, F, C>(request: F, cancel: C) -> Result<T>
where
    F: Future<Output = Result<T>>,
    C: Future<Output = ()>,
{
    tokio::select! {
        result = request => result,
        _ = cancel => Err(AppError::Cancelled("cancelled by user".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prediction::{BatchPredictions, HealthStatus};
    use crate::domain::schema::ColumnSchema;
    use async_trait::async_trait;
    use serde_json::{json, Map};
    use std::sync::Mutex;

    /// Records requests and answers with canned responses
    struct StubClient {
        requests: Mutex<Vec<PredictRequest>>,
        batch: Mutex<Vec<Vec<Vec<f64>>>>,
        batch_response: BatchPredictions,
    }

    impl StubClient {
        fn new(batch_response: BatchPredictions) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                batch: Mutex::new(Vec::new()),
                batch_response,
            }
        }
    }

    #[async_trait]
    impl PredictionClient for StubClient {
        async fn predict(&self, request: &PredictRequest) -> Result<SinglePrediction> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(SinglePrediction {
                prediction: json!(1),
                probability: Some(0.7),
                class_name: Some("Positive".to_string()),
                extra: Map::new(),
            })
        }

        async fn predict_batch(&self, batch: &[Vec<f64>]) -> Result<BatchPredictions> {
            self.batch.lock().unwrap().push(batch.to_vec());
            Ok(self.batch_response.clone())
        }

        async fn health(&self) -> Result<HealthStatus> {
            Ok(HealthStatus {
                status: "healthy".to_string(),
                model_loaded: true,
            })
        }
    }

    fn session() -> Session {
        let schema = Arc::new(ColumnSchema::new(["a", "b"]).unwrap());
        let mut session = Session::new(schema.clone());
        session
            .append_record(Record::from_values(schema.clone(), vec![1.0, 2.0]).unwrap())
            .unwrap();
        session
            .append_record(Record::from_values(schema, vec![3.0, 4.0]).unwrap())
            .unwrap();
        session
    }

    fn aligned() -> BatchPredictions {
        BatchPredictions {
            predictions: vec![json!(0), json!(1)],
            probabilities: vec![0.12, 0.81],
        }
    }

    #[tokio::test]
    async fn test_predict_record_uses_configured_form() {
        let stub = Arc::new(StubClient::new(aligned()));
        let use_case = PredictUseCase::new(stub.clone(), PayloadForm::Raw);
        let mut session = session();
        let record = session.buffer().records()[0].clone();

        use_case.predict_record(&mut session, &record).await.unwrap();

        let requests = stub.requests.lock().unwrap();
        assert!(matches!(&requests[0], PredictRequest::Raw(map) if map["b"] == 2.0));
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].input, vec![1.0, 2.0]);
    }

    #[tokio::test]
    async fn test_predict_features_rejects_empty_input() {
        let use_case = PredictUseCase::new(Arc::new(StubClient::new(aligned())), PayloadForm::Features);
        let mut session = session();
        let err = use_case
            .predict_features(&mut session, Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_predict_batch_stores_aligned_results() {
        let stub = Arc::new(StubClient::new(aligned()));
        let use_case = PredictUseCase::new(stub.clone(), PayloadForm::Features);
        let mut session = session();

        let results = use_case.predict_batch(&mut session).await.unwrap();

        assert_eq!(stub.batch.lock().unwrap()[0], vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(results.buffer_version, session.buffer().version());
        assert_eq!(session.current_batch_results(), Some(&results));
    }

    #[tokio::test]
    async fn test_misaligned_batch_response_stores_nothing() {
        let stub = Arc::new(StubClient::new(BatchPredictions {
            predictions: vec![json!(0)],
            probabilities: vec![0.1],
        }));
        let use_case = PredictUseCase::new(stub, PayloadForm::Features);
        let mut session = session();

        let err = use_case.predict_batch(&mut session).await.unwrap_err();
        assert!(matches!(err, AppError::ServiceError(msg) if msg.contains("for 2 rows")));
        assert!(session.current_batch_results().is_none());
    }

    #[tokio::test]
    async fn test_empty_buffer_is_rejected() {
        let stub = Arc::new(StubClient::new(aligned()));
        let use_case = PredictUseCase::new(stub.clone(), PayloadForm::Features);
        let mut session = Session::new(Arc::new(ColumnSchema::default()));

        assert!(use_case.predict_batch(&mut session).await.is_err());
        assert!(stub.batch.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_with_cancel_prefers_cancellation() {
        let result: Result<u8> =
            with_cancel(std::future::pending(), std::future::ready(())).await;
        assert!(matches!(result, Err(AppError::Cancelled(_))));

        let result = with_cancel(async { Ok(7u8) }, std::future::pending()).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_parse_feature_list_drops_garbage() {
        let (values, dropped) = parse_feature_list("6, 148 ,x,,72.5");
        assert_eq!(values, vec![6.0, 148.0, 72.5]);
        assert_eq!(dropped, 2);
    }
}

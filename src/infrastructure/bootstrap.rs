use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::application::{PredictUseCase, Session};
use crate::domain::client_config::AppConfig;
use crate::domain::error::Result;
use crate::domain::schema::ColumnSchema;
use crate::infrastructure::config::resolve_service_url;
use crate::infrastructure::prediction_client::HttpPredictionClient;
use crate::infrastructure::storage::DirectorySink;

/// Everything a front end needs to drive one session
pub struct AppState {
    pub session: Session,
    pub predict: PredictUseCase,
    pub sink: DirectorySink,
}

pub fn setup(config: &AppConfig) -> Result<AppState> {
    let schema = Arc::new(ColumnSchema::new(config.schema.iter().map(String::as_str))?);
    let base_url = resolve_service_url(config)?;
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let client = Arc::new(HttpPredictionClient::new(base_url, timeout));
    info!(
        service_url = %client.base_url(),
        timeout_secs = config.request_timeout_secs,
        payload_form = ?config.payload_form,
        export_dir = %config.export_dir.display(),
        "Prediction client configured"
    );
    Ok(AppState {
        session: Session::new(schema),
        predict: PredictUseCase::new(client, config.payload_form),
        sink: DirectorySink::new(config.export_dir.clone()),
    })
}

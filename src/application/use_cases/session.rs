// ============================================================
// SESSION STATE
// ============================================================
// Everything one user session accumulates: the batch buffer, the
// last batch result set, and the single-prediction history.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::use_cases::batch_buffer::BatchBuffer;
use crate::application::use_cases::csv_exporter::CsvExporter;
use crate::domain::error::Result;
use crate::domain::prediction::{BatchResultSet, SinglePredictionEntry};
use crate::domain::record::Record;
use crate::domain::schema::ColumnSchema;
use crate::infrastructure::storage::FileSink;

/// Result of an export request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved(PathBuf),
    /// No current results; nothing was built or written
    NothingToExport,
}

pub struct Session {
    id: Uuid,
    started_at: DateTime<Local>,
    buffer: BatchBuffer,
    last_batch: Option<BatchResultSet>,
    history: Vec<SinglePredictionEntry>,
}

impl Session {
    pub fn new(schema: Arc<ColumnSchema>) -> Self {
        let id = Uuid::new_v4();
        info!(session_id = %id, fields = schema.len(), "Session started");
        Self {
            id,
            started_at: Local::now(),
            buffer: BatchBuffer::new(schema),
            last_batch: None,
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn schema(&self) -> &Arc<ColumnSchema> {
        self.buffer.schema()
    }

    pub fn buffer(&self) -> &BatchBuffer {
        &self.buffer
    }

    /// Mutable access for importers. Any mutation invalidates the last batch results.
    pub fn buffer_mut(&mut self) -> &mut BatchBuffer {
        &mut self.buffer
    }

    pub fn append_record(&mut self, record: Record) -> Result<()> {
        self.buffer.append(record)
    }

    /// Empty the buffer and drop any batch results computed from it
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
        self.last_batch = None;
        debug!(session_id = %self.id, "Batch buffer cleared");
    }

    pub fn store_batch_results(&mut self, results: BatchResultSet) {
        self.last_batch = Some(results);
    }

    /// Last batch results, only while the buffer is unchanged since submission
    pub fn current_batch_results(&self) -> Option<&BatchResultSet> {
        self.last_batch
            .as_ref()
            .filter(|r| r.buffer_version == self.buffer.version())
    }

    /// True when results exist but the buffer changed after they were computed
    pub fn has_stale_results(&self) -> bool {
        self.last_batch.is_some() && self.current_batch_results().is_none()
    }

    pub fn record_single(&mut self, entry: SinglePredictionEntry) {
        self.history.push(entry);
    }

    pub fn history(&self) -> &[SinglePredictionEntry] {
        &self.history
    }

    /// Drop everything accumulated so far, keeping the schema
    pub fn reset(&mut self) {
        self.clear_buffer();
        self.history.clear();
        info!(session_id = %self.id, "Session reset");
    }

    pub fn export_single_log(&self, sink: &dyn FileSink, name: &str) -> Result<ExportOutcome> {
        if self.history.is_empty() {
            return Ok(ExportOutcome::NothingToExport);
        }
        let csv = CsvExporter::single_log_csv(&self.history)?;
        let path = sink.save(name, csv.as_bytes())?;
        Ok(ExportOutcome::Saved(path))
    }

    pub fn export_batch(&self, sink: &dyn FileSink, name: &str) -> Result<ExportOutcome> {
        let Some(results) = self.current_batch_results() else {
            return Ok(ExportOutcome::NothingToExport);
        };
        let csv = CsvExporter::batch_csv(self.buffer.schema(), results)?;
        let path = sink.save(name, csv.as_bytes())?;
        Ok(ExportOutcome::Saved(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::DirectorySink;
    use serde_json::json;

    fn session_with_rows() -> Session {
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

    fn results_for(session: &Session) -> BatchResultSet {
        BatchResultSet {
            matrix: session.buffer().to_ordered_matrix(),
            predictions: vec![json!(0), json!(1)],
            probabilities: vec![0.2, 0.9],
            buffer_version: session.buffer().version(),
        }
    }

    #[test]
    fn test_export_without_results_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());
        let session = session_with_rows();

        assert_eq!(
            session.export_batch(&sink, "batch.csv").unwrap(),
            ExportOutcome::NothingToExport
        );
        assert_eq!(
            session.export_single_log(&sink, "log.csv").unwrap(),
            ExportOutcome::NothingToExport
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_export_batch_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());
        let mut session = session_with_rows();
        let results = results_for(&session);
        session.store_batch_results(results);

        let outcome = session.export_batch(&sink, "batch.csv").unwrap();
        let ExportOutcome::Saved(path) = outcome else {
            panic!("expected a saved file");
        };
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text, "a,b,prediction,probability\n1,2,0,0.2\n3,4,1,0.9");
    }

    #[test]
    fn test_clear_discards_results() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());
        let mut session = session_with_rows();
        let results = results_for(&session);
        session.store_batch_results(results);

        session.clear_buffer();
        assert!(session.current_batch_results().is_none());
        assert!(!session.has_stale_results());
        assert_eq!(
            session.export_batch(&sink, "batch.csv").unwrap(),
            ExportOutcome::NothingToExport
        );
    }

    #[test]
    fn test_mutation_after_batch_makes_results_stale() {
        let mut session = session_with_rows();
        let results = results_for(&session);
        session.store_batch_results(results);
        assert!(session.current_batch_results().is_some());

        let schema = session.schema().clone();
        session
            .append_record(Record::from_values(schema, vec![5.0, 6.0]).unwrap())
            .unwrap();
        assert!(session.current_batch_results().is_none());
        assert!(session.has_stale_results());
    }

    #[test]
    fn test_reset_clears_history() {
        let mut session = session_with_rows();
        session.record_single(SinglePredictionEntry {
            input: vec![1.0, 2.0],
            output: serde_json::from_value(json!({"prediction": 0, "probability": 0.1})).unwrap(),
        });
        session.reset();
        assert!(session.history().is_empty());
        assert!(session.buffer().is_empty());
    }
}

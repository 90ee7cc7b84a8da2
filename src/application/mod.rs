pub mod use_cases;

pub use use_cases::batch_buffer::BatchBuffer;
pub use use_cases::csv_exporter::CsvExporter;
pub use use_cases::csv_importer::{CsvImporter, ImportSummary};
pub use use_cases::predict::PredictUseCase;
pub use use_cases::record_validator::RecordValidator;
pub use use_cases::session::{ExportOutcome, Session};

pub mod batch_buffer;
pub mod csv_exporter;
pub mod csv_importer;
pub mod predict;
pub mod record_validator;
pub mod session;

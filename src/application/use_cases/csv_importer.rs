// ============================================================
// CSV IMPORTER USE CASE
// ============================================================
// Map arbitrary header order onto the column schema and append
// the parsed records to the batch buffer, all or nothing.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::use_cases::batch_buffer::BatchBuffer;
use crate::application::use_cases::record_validator::parse_field;
use crate::domain::error::{AppError, Result};
use crate::domain::record::{RawValue, Record};
use crate::domain::schema::ColumnSchema;
use crate::infrastructure::csv::{read_text_file, CsvParser, CsvTable};

/// Outcome of a successful import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Data lines imported, header excluded
    pub rows: usize,
}

pub struct CsvImporter {
    schema: Arc<ColumnSchema>,
    parser: CsvParser,
}

impl CsvImporter {
    pub fn new(schema: Arc<ColumnSchema>) -> Self {
        Self {
            schema,
            parser: CsvParser::new(),
        }
    }

    /// Parse text into records without touching any buffer
    pub fn parse(&self, content: &str) -> Result<Vec<Record>> {
        let table = self.parser.parse_content(content)?;
        self.records_from_table(&table)
    }

    /// Parse text and append every record, or nothing on failure
    pub fn import_text(&self, content: &str, buffer: &mut BatchBuffer) -> Result<ImportSummary> {
        let records = self.parse(content)?;
        self.append_all(records, buffer)
    }

    /// Read a file (any supported encoding) and import it
    pub fn import_file(&self, path: &Path, buffer: &mut BatchBuffer) -> Result<ImportSummary> {
        let content = read_text_file(path)?;
        let summary = self.import_text(&content, buffer)?;
        info!(path = %path.display(), rows = summary.rows, "CSV imported");
        Ok(summary)
    }

    fn append_all(&self, records: Vec<Record>, buffer: &mut BatchBuffer) -> Result<ImportSummary> {
        let rows = records.len();
        buffer.extend(records)?;
        Ok(ImportSummary { rows })
    }

    fn records_from_table(&self, table: &CsvTable) -> Result<Vec<Record>> {
        if table.is_empty() {
            debug!("CSV import: no lines");
            return Ok(Vec::new());
        }

        let indices = self.resolve_columns(&table.headers)?;

        let mut records = Vec::with_capacity(table.rows.len());
        for (row_idx, row) in table.rows.iter().enumerate() {
            let mut values = Vec::with_capacity(indices.len());
            for (field, &col) in self.schema.iter().zip(&indices) {
                let cell = row.get(col).map(String::as_str).unwrap_or("");
                let value = parse_field(field, &RawValue::from(cell)).map_err(|e| {
                    AppError::ImportError(format!("Line {}: {}", row_idx + 1, e))
                })?;
                values.push(value);
            }
            records.push(Record::from_checked(self.schema.clone(), values));
        }

        Ok(records)
    }

    /// Header index of each schema field, in schema order.
    /// Duplicate header names resolve to the first occurrence.
    fn resolve_columns(&self, headers: &[String]) -> Result<Vec<usize>> {
        self.schema
            .iter()
            .map(|field| {
                headers
                    .iter()
                    .position(|h| h == field)
                    .ok_or_else(|| AppError::ImportError(format!("CSV missing column: {}", field)))
            })
            .collect()
    }
}

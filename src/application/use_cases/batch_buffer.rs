// ============================================================
// BATCH BUFFER
// ============================================================
// Ordered, append-only list of records staged for batch prediction.
// The buffer is the single source of truth; rendering is a projection.

use std::sync::Arc;

use crate::domain::error::{AppError, Result};
use crate::domain::record::Record;
use crate::domain::schema::ColumnSchema;
use crate::shared::number_format::format_number;

pub struct BatchBuffer {
    schema: Arc<ColumnSchema>,
    records: Vec<Record>,
    /// Bumped on every mutation; result sets remember the version they came from
    version: u64,
}

impl BatchBuffer {
    pub fn new(schema: Arc<ColumnSchema>) -> Self {
        Self {
            schema,
            records: Vec::new(),
            version: 0,
        }
    }

    pub fn schema(&self) -> &Arc<ColumnSchema> {
        &self.schema
    }

    /// Add a validated record at the end. No dedup, no size limit.
    pub fn append(&mut self, record: Record) -> Result<()> {
        self.check_schema(&record)?;
        self.records.push(record);
        self.version += 1;
        Ok(())
    }

    /// Append many records as a single mutation, or none of them
    pub fn extend(&mut self, records: Vec<Record>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        for record in &records {
            self.check_schema(record)?;
        }
        self.records.extend(records);
        self.version += 1;
        Ok(())
    }

    fn check_schema(&self, record: &Record) -> Result<()> {
        if record.schema() != self.schema.as_ref() {
            return Err(AppError::ValidationError(format!(
                "Record fields ({}) do not match the batch columns ({})",
                record.schema(),
                self.schema
            )));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.version += 1;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Wire payload for batch prediction, each row in schema order
    pub fn to_ordered_matrix(&self) -> Vec<Vec<f64>> {
        self.records.iter().map(|r| r.values().to_vec()).collect()
    }

    /// Text table with the schema as header and one row per record
    pub fn render(&self) -> String {
        let headers: Vec<&str> = self.schema.iter().collect();
        let rows: Vec<Vec<String>> = self
            .records
            .iter()
            .map(|r| r.values().iter().map(|v| format_number(*v)).collect())
            .collect();
        render_table(&headers, &rows)
    }
}

/// Render a left-aligned text table with a `#` column of 1-based row numbers
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let index_width = rows.len().to_string().len().max(1);
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(idx) {
                *width = (*width).max(cell.len());
            }
        }
    }

    let mut out = String::new();
    let header_line = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{:<width$}", h, width = *w))
        .collect::<Vec<_>>()
        .join(" | ");
    out.push_str(&format!("{:>width$} | {}\n", "#", header_line, width = index_width));

    let rule = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");
    out.push_str(&format!("{}-+-{}\n", "-".repeat(index_width), rule));

    for (idx, row) in rows.iter().enumerate() {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join(" | ");
        out.push_str(&format!("{:>width$} | {}\n", idx + 1, line, width = index_width));
    }

    out.trim_end().to_string()
}

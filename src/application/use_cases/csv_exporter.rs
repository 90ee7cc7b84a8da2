// ============================================================
// CSV EXPORTER USE CASE
// ============================================================
// Build the single-prediction log and the batch result CSVs.
// Output is LF-joined, unquoted, with no trailing newline.

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::domain::error::{AppError, Result};
use crate::domain::prediction::{BatchResultSet, SinglePredictionEntry};
use crate::domain::schema::ColumnSchema;
use crate::shared::number_format::{format_number, format_number_array, format_scalar};

pub const SINGLE_LOG_HEADER: [&str; 4] = ["index", "input", "prediction", "probability"];

/// Default file names offered for download
pub const SINGLE_LOG_FILE: &str = "predictions.csv";
pub const BATCH_FILE: &str = "batch_predictions.csv";

pub struct CsvExporter;

impl CsvExporter {
    /// `index,input,prediction,probability` with the input as quoted JSON array text
    pub fn single_log_csv(entries: &[SinglePredictionEntry]) -> Result<String> {
        let mut rows = Vec::with_capacity(entries.len() + 1);
        rows.push(SINGLE_LOG_HEADER.iter().map(|h| h.to_string()).collect());

        for (idx, entry) in entries.iter().enumerate() {
            rows.push(vec![
                (idx + 1).to_string(),
                format!("\"{}\"", format_number_array(&entry.input)),
                format_scalar(&entry.output.prediction),
                entry
                    .output
                    .probability
                    .map(format_number)
                    .unwrap_or_default(),
            ]);
        }

        write_rows(&rows)
    }

    /// Schema fields then `prediction,probability`, one row per submitted record
    pub fn batch_csv(schema: &ColumnSchema, results: &BatchResultSet) -> Result<String> {
        if results.predictions.len() != results.matrix.len()
            || results.probabilities.len() != results.matrix.len()
        {
            return Err(AppError::Internal(format!(
                "Result set is not aligned: {} rows, {} predictions, {} probabilities",
                results.matrix.len(),
                results.predictions.len(),
                results.probabilities.len()
            )));
        }

        let mut header: Vec<String> = schema.iter().map(|f| f.to_string()).collect();
        header.push("prediction".to_string());
        header.push("probability".to_string());

        let mut rows = Vec::with_capacity(results.len() + 1);
        rows.push(header);

        for ((values, prediction), probability) in results
            .matrix
            .iter()
            .zip(&results.predictions)
            .zip(&results.probabilities)
        {
            let mut row: Vec<String> = values.iter().map(|v| format_number(*v)).collect();
            row.push(format_scalar(prediction));
            row.push(format_number(*probability));
            rows.push(row);
        }

        write_rows(&rows)
    }
}

fn write_rows(rows: &[Vec<String>]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush CSV writer: {}", e)))?;
    let mut text = String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("CSV output is not UTF-8: {}", e)))?;

    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

// ============================================================
// INTERACTIVE CONSOLE
// ============================================================
// Reads commands line by line, runs them against the session and
// reports every outcome on the status board.

mod commands;

pub use commands::{parse_command, Command};

use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::application::use_cases::batch_buffer::render_table;
use crate::application::use_cases::csv_exporter::{BATCH_FILE, SINGLE_LOG_FILE};
use crate::application::use_cases::predict::{parse_feature_list, with_cancel};
use crate::application::{CsvImporter, ExportOutcome, PredictUseCase, RecordValidator, Session};
use crate::domain::error::{AppError, Result};
use crate::domain::prediction::{BatchResultSet, SinglePrediction};
use crate::infrastructure::storage::FileSink;
use crate::interfaces::ctrl_c;
use crate::interfaces::status::StatusBoard;
use crate::shared::number_format::{format_number, format_scalar};

const HELP_TEXT: &str = "\
Commands:
  schema                      list the feature fields in order
  add F=v [F=v ...]           validate a row and add it to the batch
  predict F=v [F=v ...]       validate a row and predict it now
  predict v1,v2,...           predict raw comma-separated values
  import <path.csv>           append every row of a CSV file to the batch
  show                        show the batch table
  clear                       empty the batch
  batch                       predict every row in the batch
  results                     show the last batch results
  export-log [file]           save single predictions (default predictions.csv)
  export-batch [file]         save batch results (default batch_predictions.csv)
  health                      check the prediction service
  status                      show the current status
  log                         show recent status messages
  reset                       forget the batch and prediction history
  quit                        leave
Ctrl-C cancels a running network call, or quits at the prompt.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// What one command produced
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub flow: Flow,
    pub output: String,
    pub status: Option<String>,
}

impl Reply {
    fn output(output: impl Into<String>) -> Self {
        Self {
            flow: Flow::Continue,
            output: output.into(),
            status: None,
        }
    }

    fn empty() -> Self {
        Self::output(String::new())
    }

    fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }
}

pub struct Console {
    session: Session,
    predict: PredictUseCase,
    validator: RecordValidator,
    importer: CsvImporter,
    sink: Box<dyn FileSink + Send + Sync>,
    status: StatusBoard,
}

impl Console {
    pub fn new(
        session: Session,
        predict: PredictUseCase,
        sink: Box<dyn FileSink + Send + Sync>,
    ) -> Self {
        let schema = session.schema().clone();
        Self {
            session,
            predict,
            validator: RecordValidator::new(schema.clone()),
            importer: CsvImporter::new(schema),
            sink,
            status: StatusBoard::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    /// Read commands until `quit`, end of input or Ctrl-C. Network
    /// commands race against Ctrl-C.
    pub async fn run<R, W>(&mut self, input: R, output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.run_with_interrupt(input, output, ctrl_c).await
    }

    /// `run` with a custom interrupt source. An interrupt at the prompt
    /// ends the session; during a network call it cancels only that call.
    pub async fn run_with_interrupt<R, W, S, F>(
        &mut self,
        input: R,
        mut output: W,
        interrupt: S,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Fn() -> F,
        F: Future<Output = ()>,
    {
        let banner = format!(
            "Prediction console. Fields: {}\nType 'help' for commands.\n",
            self.session.schema()
        );
        output.write_all(banner.as_bytes()).await?;

        let mut lines = input.lines();
        loop {
            output.write_all(b"> ").await?;
            output.flush().await?;

            let next = tokio::select! {
                line = lines.next_line() => Some(line?),
                _ = interrupt() => None,
            };
            let Some(next) = next else {
                self.status.set("WARN", "Console", "Interrupted.");
                output.write_all(b"\nStatus: Interrupted.\n").await?;
                break;
            };
            let Some(line) = next else {
                break;
            };

            let reply = match parse_command(&line) {
                Ok(command) => {
                    if command.is_network() {
                        output.write_all(b"Predicting... (Ctrl-C to cancel)\n").await?;
                        output.flush().await?;
                    }
                    self.execute(command, interrupt()).await
                }
                Err(err) => self.fail("Console", &err),
            };

            if !reply.output.is_empty() {
                output.write_all(reply.output.as_bytes()).await?;
                output.write_all(b"\n").await?;
            }
            if let Some(status) = &reply.status {
                output
                    .write_all(format!("Status: {}\n", status).as_bytes())
                    .await?;
            }
            if reply.flow == Flow::Quit {
                break;
            }
        }

        output.flush().await?;
        Ok(())
    }

    /// Run one command. Errors never escape; they end up on the status board.
    pub async fn execute<C>(&mut self, command: Command, cancel: C) -> Reply
    where
        C: Future<Output = ()>,
    {
        let source = source_of(&command);
        if command.is_network() {
            self.status.set("INFO", source, "Predicting...");
        }
        match self.dispatch(command, cancel).await {
            Ok(reply) => reply,
            Err(err) => self.fail(source, &err),
        }
    }

    async fn dispatch<C>(&mut self, command: Command, cancel: C) -> Result<Reply>
    where
        C: Future<Output = ()>,
    {
        match command {
            Command::Empty => Ok(Reply::empty()),
            Command::Help => Ok(Reply::output(HELP_TEXT)),
            Command::Schema => Ok(Reply::output(format!(
                "Fields (in order): {}",
                self.session.schema()
            ))),

            Command::Add(values) => {
                let record = self.validator.validate(&values)?;
                self.session.append_record(record)?;
                let message = format!(
                    "Row added. {} row(s) in batch.",
                    self.session.buffer().len()
                );
                Ok(self.ok("Batch", self.session.buffer().render(), &message))
            }

            Command::Predict(values) => {
                let record = self.validator.validate(&values)?;
                let prediction = with_cancel(
                    self.predict.predict_record(&mut self.session, &record),
                    cancel,
                )
                .await?;
                self.single_reply(&prediction, 0)
            }

            Command::PredictFeatures(text) => {
                let (features, dropped) = parse_feature_list(&text);
                let prediction = with_cancel(
                    self.predict.predict_features(&mut self.session, features),
                    cancel,
                )
                .await?;
                self.single_reply(&prediction, dropped)
            }

            Command::Import(path) => {
                let summary = self
                    .importer
                    .import_file(&path, self.session.buffer_mut())?;
                let message = format!(
                    "Imported {} row(s). {} row(s) in batch.",
                    summary.rows,
                    self.session.buffer().len()
                );
                Ok(self.ok("Import", self.session.buffer().render(), &message))
            }

            Command::Show => {
                let mut output = self.session.buffer().render();
                output.push_str(&format!("\n{} row(s)", self.session.buffer().len()));
                if self.session.has_stale_results() {
                    output.push_str(" (batch changed since the last prediction)");
                }
                Ok(Reply::output(output))
            }

            Command::Clear => {
                self.session.clear_buffer();
                Ok(self.ok("Batch", "", "Batch cleared."))
            }

            Command::Batch => {
                let results =
                    with_cancel(self.predict.predict_batch(&mut self.session), cancel).await?;
                let message = format!("Predicted {} row(s).", results.len());
                let table = self.results_table(&results);
                Ok(self.ok("Batch", table, &message))
            }

            Command::Results => match self.session.current_batch_results() {
                Some(results) => Ok(Reply::output(self.results_table(results))),
                None if self.session.has_stale_results() => Ok(self.warn(
                    "Batch",
                    "Batch changed since the last prediction. Run 'batch' again.",
                )),
                None => Ok(self.warn("Batch", "No batch results yet.")),
            },

            Command::ExportLog(name) => {
                let name = name.unwrap_or_else(|| SINGLE_LOG_FILE.to_string());
                match self.session.export_single_log(self.sink.as_ref(), &name)? {
                    ExportOutcome::Saved(path) => {
                        let message = format!("Saved {}", path.display());
                        Ok(self.ok("Export", "", &message))
                    }
                    ExportOutcome::NothingToExport => {
                        Ok(self.warn("Export", "No predictions to export yet."))
                    }
                }
            }

            Command::ExportBatch(name) => {
                let name = name.unwrap_or_else(|| BATCH_FILE.to_string());
                match self.session.export_batch(self.sink.as_ref(), &name)? {
                    ExportOutcome::Saved(path) => {
                        let message = format!("Saved {}", path.display());
                        Ok(self.ok("Export", "", &message))
                    }
                    ExportOutcome::NothingToExport if self.session.has_stale_results() => {
                        Ok(self.warn(
                            "Export",
                            "Batch changed since the last prediction. Run 'batch' before exporting.",
                        ))
                    }
                    ExportOutcome::NothingToExport => {
                        Ok(self.warn("Export", "No batch results to export yet."))
                    }
                }
            }

            Command::Health => {
                let health = with_cancel(self.predict.health(), cancel).await?;
                let message = format!(
                    "Service {} (model loaded: {})",
                    health.status, health.model_loaded
                );
                Ok(self.ok("Health", "", &message))
            }

            Command::Status => {
                let current = if self.status.current().is_empty() {
                    "Ready"
                } else {
                    self.status.current()
                };
                Ok(Reply::output(format!(
                    "Session {} (started {})\nBatch rows: {}\nSingle predictions: {}\nStatus: {}",
                    self.session.id(),
                    self.session.started_at().format("%Y-%m-%d %H:%M:%S"),
                    self.session.buffer().len(),
                    self.session.history().len(),
                    current
                )))
            }

            Command::Log => Ok(Reply::output(self.status.render_log())),

            Command::Reset => {
                self.session.reset();
                Ok(self.ok("Console", "", "Session reset."))
            }

            Command::Quit => Ok(Reply {
                flow: Flow::Quit,
                output: String::new(),
                status: None,
            }),
        }
    }

    fn single_reply(&mut self, prediction: &SinglePrediction, dropped: usize) -> Result<Reply> {
        let body = serde_json::to_string_pretty(prediction)
            .map_err(|e| AppError::Internal(format!("Failed to render prediction: {}", e)))?;

        let mut message = format!("Prediction: {}", format_scalar(&prediction.prediction));
        if let Some(probability) = prediction.probability {
            message.push_str(&format!(" (probability {})", format_number(probability)));
        }
        if dropped > 0 {
            message.push_str(&format!(". Ignored {} invalid value(s)", dropped));
        }
        Ok(self.ok("Predict", body, &message))
    }

    fn results_table(&self, results: &BatchResultSet) -> String {
        let mut headers: Vec<&str> = self.session.schema().iter().collect();
        headers.push("prediction");
        headers.push("probability");

        let rows: Vec<Vec<String>> = results
            .matrix
            .iter()
            .zip(&results.predictions)
            .zip(&results.probabilities)
            .map(|((row, prediction), probability)| {
                let mut cells: Vec<String> = row.iter().map(|v| format_number(*v)).collect();
                cells.push(format_scalar(prediction));
                cells.push(format_number(*probability));
                cells
            })
            .collect();
        render_table(&headers, &rows)
    }

    fn ok(&mut self, source: &str, output: impl Into<String>, message: &str) -> Reply {
        self.status.set("INFO", source, message);
        Reply::output(output).with_status(message)
    }

    fn warn(&mut self, source: &str, message: &str) -> Reply {
        self.status.set("WARN", source, message);
        Reply::empty().with_status(message)
    }

    fn fail(&mut self, source: &str, err: &AppError) -> Reply {
        let message = err.to_string();
        self.status.set("ERROR", source, &message);
        Reply::empty().with_status(&message)
    }
}

fn source_of(command: &Command) -> &'static str {
    match command {
        Command::Add(_) | Command::Clear | Command::Batch | Command::Results => "Batch",
        Command::Predict(_) | Command::PredictFeatures(_) => "Predict",
        Command::Import(_) => "Import",
        Command::ExportLog(_) | Command::ExportBatch(_) => "Export",
        Command::Health => "Health",
        _ => "Console",
    }
}

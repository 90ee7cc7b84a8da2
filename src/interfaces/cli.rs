// ============================================================
// COMMAND LINE
// ============================================================

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use crate::application::use_cases::predict::with_cancel;
use crate::application::{CsvImporter, ExportOutcome};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::bootstrap::AppState;
use crate::infrastructure::config::ConfigOverrides;
use crate::infrastructure::storage::DirectorySink;
use crate::interfaces::ctrl_c;

/// Terminal client for a remote tabular prediction service
#[derive(Parser, Debug)]
#[command(name = "predictdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file (defaults to ./predictdesk.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the prediction service
    #[arg(long, global = true, env = "PREDICTDESK_SERVICE_URL")]
    pub service_url: Option<String>,

    /// Per-request deadline in seconds
    #[arg(long = "timeout", global = true)]
    pub timeout_secs: Option<u64>,

    /// Directory exported files are written to
    #[arg(long, global = true)]
    pub export_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Interactive session (default)
    Console,

    /// Import a CSV, predict every row and write the results
    Batch {
        /// CSV file with a header row naming the feature fields
        #[arg(long, short)]
        input: PathBuf,

        /// Where to write the results CSV
        #[arg(long, short, default_value = "batch_predictions.csv")]
        output: PathBuf,
    },
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            service_url: self.service_url.clone(),
            request_timeout_secs: self.timeout_secs,
            export_dir: self.export_dir.clone(),
        }
    }
}

/// One-shot batch: import, predict, export. Any failure aborts the run.
pub async fn run_batch_job(state: AppState, input: &Path, output: &Path) -> Result<PathBuf> {
    let AppState {
        mut session,
        predict,
        ..
    } = state;

    let importer = CsvImporter::new(session.schema().clone());
    let summary = importer.import_file(input, session.buffer_mut())?;
    if summary.rows == 0 {
        return Err(AppError::ImportError(format!(
            "{} has no data rows",
            input.display()
        )));
    }

    let results = with_cancel(predict.predict_batch(&mut session), ctrl_c()).await?;
    info!(rows = results.len(), "Batch job predicted");

    let (dir, name) = split_output(output)?;
    match session.export_batch(&DirectorySink::new(dir), name)? {
        ExportOutcome::Saved(path) => Ok(path),
        ExportOutcome::NothingToExport => Err(AppError::Internal(
            "Batch results were not available for export".to_string(),
        )),
    }
}

fn split_output(output: &Path) -> Result<(PathBuf, &str)> {
    let name = output
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            AppError::ValidationError(format!("Invalid output path: {}", output.display()))
        })?;
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::client_config::AppConfig;
    use crate::infrastructure::bootstrap::setup;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_batch_subcommand() {
        let cli = Cli::parse_from([
            "predictdesk",
            "--timeout",
            "5",
            "batch",
            "--input",
            "rows.csv",
            "-o",
            "out/results.csv",
        ]);
        assert_eq!(cli.overrides().request_timeout_secs, Some(5));
        assert_eq!(
            cli.command,
            Some(Commands::Batch {
                input: PathBuf::from("rows.csv"),
                output: PathBuf::from("out/results.csv"),
            })
        );
    }

    #[test]
    fn test_console_is_default() {
        let cli = Cli::parse_from(["predictdesk"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_split_output() {
        let (dir, name) = split_output(Path::new("results.csv")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "results.csv");

        let (dir, name) = split_output(Path::new("out/r.csv")).unwrap();
        assert_eq!(dir, PathBuf::from("out"));
        assert_eq!(name, "r.csv");
    }

    #[tokio::test]
    async fn test_batch_job_writes_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict_batch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": ["yes", "no"],
                "probabilities": [0.9, 0.25]
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("rows.csv");
        std::fs::write(&input, "b,a,label\n2,1,x\n4,3,y\n").unwrap();

        let config = AppConfig {
            service_url: Some(server.uri()),
            schema: vec!["a".to_string(), "b".to_string()],
            ..AppConfig::default()
        };
        let output = dir.path().join("results.csv");
        let saved = run_batch_job(setup(&config).unwrap(), &input, &output)
            .await
            .unwrap();

        assert_eq!(saved, output);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "a,b,prediction,probability\n1,2,yes,0.9\n3,4,no,0.25"
        );
    }

    #[tokio::test]
    async fn test_batch_job_fails_on_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("rows.csv");
        std::fs::write(&input, "a\n1\n").unwrap();

        let config = AppConfig {
            service_url: Some("http://127.0.0.1:9".to_string()),
            schema: vec!["a".to_string(), "b".to_string()],
            ..AppConfig::default()
        };
        let err = run_batch_job(setup(&config).unwrap(), &input, &dir.path().join("o.csv"))
            .await
            .unwrap_err();
        assert_eq!(err, AppError::ImportError("CSV missing column: b".to_string()));
        assert!(!dir.path().join("o.csv").exists());
    }
}

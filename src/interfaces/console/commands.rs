// ============================================================
// CONSOLE COMMANDS
// ============================================================
// Parse one input line into a Command

use std::collections::HashMap;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::error::{AppError, Result};
use crate::domain::record::RawValue;

static ASSIGNMENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)=(.*)$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Empty,
    Help,
    Schema,
    /// Validate a record and stage it in the batch buffer
    Add(HashMap<String, RawValue>),
    /// Validate a record and predict it right away
    Predict(HashMap<String, RawValue>),
    /// Legacy positional form: comma-separated values sent as-is
    PredictFeatures(String),
    Import(PathBuf),
    Show,
    Clear,
    Batch,
    Results,
    ExportLog(Option<String>),
    ExportBatch(Option<String>),
    Health,
    Status,
    Log,
    Reset,
    Quit,
}

impl Command {
    /// Commands that call the prediction service
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Command::Predict(_) | Command::PredictFeatures(_) | Command::Batch | Command::Health
        )
    }
}

pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "help" | "?" => Command::Help,
        "schema" => Command::Schema,
        "add" => Command::Add(parse_assignments(rest)?),
        "predict" => {
            if rest.is_empty() {
                return Err(AppError::ValidationError("Please enter values.".to_string()));
            }
            if rest.contains('=') {
                Command::Predict(parse_assignments(rest)?)
            } else {
                Command::PredictFeatures(rest.to_string())
            }
        }
        "import" => {
            if rest.is_empty() {
                return Err(AppError::ValidationError(
                    "Usage: import <path.csv>".to_string(),
                ));
            }
            Command::Import(PathBuf::from(rest))
        }
        "show" | "table" => Command::Show,
        "clear" => Command::Clear,
        "batch" => Command::Batch,
        "results" => Command::Results,
        "export-log" => Command::ExportLog(optional_arg(rest)),
        "export-batch" => Command::ExportBatch(optional_arg(rest)),
        "health" => Command::Health,
        "status" => Command::Status,
        "log" => Command::Log,
        "reset" => Command::Reset,
        "quit" | "exit" => Command::Quit,
        other => {
            return Err(AppError::ParseError(format!(
                "Unknown command '{}'. Type 'help' for a list.",
                other
            )))
        }
    };

    Ok(command)
}

/// `Field=value` tokens separated by whitespace or commas. Later duplicates win.
fn parse_assignments(args: &str) -> Result<HashMap<String, RawValue>> {
    let mut values = HashMap::new();
    for token in args
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        let captures = ASSIGNMENT_PATTERN.captures(token).ok_or_else(|| {
            AppError::ParseError(format!("Expected Field=value, got '{}'", token))
        })?;
        values.insert(
            captures[1].to_string(),
            RawValue::Text(captures[2].to_string()),
        );
    }
    Ok(values)
}

fn optional_arg(rest: &str) -> Option<String> {
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command("  ").unwrap(), Command::Empty);
        assert_eq!(parse_command("SHOW").unwrap(), Command::Show);
        assert_eq!(parse_command("batch").unwrap(), Command::Batch);
        assert_eq!(parse_command("exit").unwrap(), Command::Quit);
        assert_eq!(
            parse_command("export-batch out.csv").unwrap(),
            Command::ExportBatch(Some("out.csv".to_string()))
        );
        assert_eq!(parse_command("export-log").unwrap(), Command::ExportLog(None));
    }

    #[test]
    fn test_parse_assignments() {
        let Command::Add(values) = parse_command("add Glucose=120, Age=33 BMI=").unwrap() else {
            panic!("expected add");
        };
        assert_eq!(values.get("Glucose"), Some(&RawValue::from("120")));
        assert_eq!(values.get("Age"), Some(&RawValue::from("33")));
        assert_eq!(values.get("BMI"), Some(&RawValue::from("")));
    }

    #[test]
    fn test_predict_forms() {
        assert!(matches!(
            parse_command("predict Glucose=1").unwrap(),
            Command::Predict(_)
        ));
        assert_eq!(
            parse_command("predict 6, 148, 72").unwrap(),
            Command::PredictFeatures("6, 148, 72".to_string())
        );
        assert!(parse_command("predict").is_err());
    }

    #[test]
    fn test_bad_tokens_and_unknown_commands() {
        assert!(matches!(
            parse_command("add Glucose"),
            Err(AppError::ParseError(msg)) if msg.contains("'Glucose'")
        ));
        assert!(parse_command("frobnicate").is_err());
        assert!(parse_command("import").is_err());
    }

    #[test]
    fn test_import_keeps_path_with_spaces() {
        assert_eq!(
            parse_command("import my data.csv").unwrap(),
            Command::Import(PathBuf::from("my data.csv"))
        );
    }

    #[test]
    fn test_network_commands() {
        assert!(Command::Batch.is_network());
        assert!(Command::Health.is_network());
        assert!(!Command::Show.is_network());
    }
}

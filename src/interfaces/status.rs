use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

const MAX_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

/// User-visible status line plus a bounded history of past updates
#[derive(Debug, Default)]
pub struct StatusBoard {
    current: String,
    entries: Vec<LogEntry>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the status line and remember the update
    pub fn set(&mut self, level: &str, source: &str, message: &str) -> LogEntry {
        match level {
            "ERROR" => error!(source = source, "{}", message),
            "WARN" => warn!(source = source, "{}", message),
            _ => info!(source = source, "{}", message),
        }

        let entry = LogEntry {
            time: Local::now().format("%H:%M:%S").to_string(),
            level: level.to_string(),
            source: source.to_string(),
            message: message.to_string(),
        };
        self.current = message.to_string();
        self.entries.push(entry.clone());
        if self.entries.len() > MAX_ENTRIES {
            self.entries.remove(0);
        }
        entry
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// `[HH:MM:SS] LEVEL source: message`, one line per entry
    pub fn render_log(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("[{}] {} {}: {}", e.time, e.level, e.source, e.message))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

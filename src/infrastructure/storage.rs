use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::domain::error::{AppError, Result};

/// "Save bytes as a named file" primitive used by the exporters
pub trait FileSink {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes downloads into a directory. Each file is written to a scoped
/// temporary file first and atomically renamed; a failed write drops the
/// temporary file.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSink for DirectorySink {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let file_name = sanitize_file_name(name)?;
        ensure_dir(&self.dir)?;
        let target = self.dir.join(file_name);

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.persist(&target).map_err(|e| {
            AppError::IoError(format!("Failed to save {}: {}", target.display(), e.error))
        })?;

        info!(path = %target.display(), bytes = bytes.len(), "File saved");
        Ok(target)
    }
}

/// Only a bare file name is accepted; directories come from the sink
fn sanitize_file_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    let is_bare = Path::new(trimmed)
        .file_name()
        .map(|f| f == trimmed)
        .unwrap_or(false);
    if trimmed.is_empty() || !is_bare {
        return Err(AppError::ValidationError(format!(
            "Invalid export file name: '{}'",
            name
        )));
    }
    Ok(trimmed)
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

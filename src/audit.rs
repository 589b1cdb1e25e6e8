use crate::error::AuditError;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only audit trail stored in a plain text file.
///
/// Each entry is one line, `[YYYY-MM-DD HH:MM:SS] <message>`, stamped with
/// local time. The file is opened, appended to and closed on every call; it
/// is never truncated.
#[derive(Debug, Clone)]
pub struct AuditLog {
    target: PathBuf,
}

impl AuditLog {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Appends one entry, creating the file if needed.
    ///
    /// Line breaks inside `message` are escaped so an entry never spans lines.
    pub fn record(&self, message: &str) -> Result<(), AuditError> {
        let line = format!(
            "[{}] {}\n",
            Local::now().format(TIMESTAMP_FORMAT),
            escape_line_breaks(message)
        );
        let io_err = |source: std::io::Error| AuditError {
            path: self.target.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.target)
            .map_err(io_err)?;
        file.write_all(line.as_bytes()).map_err(io_err)
    }
}

fn escape_line_breaks(message: &str) -> String {
    message.replace('\r', "\\r").replace('\n', "\\n")
}

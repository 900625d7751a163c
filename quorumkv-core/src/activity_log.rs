//! Append-only activity log files.
//!
//! The server and the client each keep one plain-text log
//! (`serverLog.txt` / `clientLog.txt`) with millisecond timestamps. Every
//! line is `Activity - <msg> - <ts>` or `Error - <msg> - <ts>`. Writes are
//! best-effort: an I/O failure is printed to stderr and otherwise ignored,
//! so logging can never take a peer down. Operational logging stays on
//! `tracing`; these files are a feature surface of their own.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Handle on one append-only log file.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a normal activity line.
    pub fn activity(&self, message: &str) {
        self.append("Activity", message);
    }

    /// Record an error line.
    pub fn error(&self, message: &str) {
        self.append("Error", message);
    }

    fn append(&self, kind: &str, message: &str) {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        let line = format!("{kind} - {message} - {timestamp}\n");
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(e) = result {
            eprintln!("failed to write {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(name: &str) -> ActivityLog {
        let path = std::env::temp_dir().join(format!("quorumkv-{name}-{}.txt", std::process::id()));
        let _ = std::fs::remove_file(&path);
        ActivityLog::new(path)
    }

    #[test]
    fn lines_are_appended_with_kind_and_timestamp() {
        let log = temp_log("activity");
        log.activity("client connected");
        log.error("malformed command");

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Activity - client connected - "));
        assert!(lines[1].starts_with("Error - malformed command - "));

        let _ = std::fs::remove_file(log.path());
    }
}

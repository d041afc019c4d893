//! Durable log of failed regions.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::overlay::CleaningVariant;

/// First line of every error log.
pub const ERROR_LOG_HEADER: &str = "ERROR LOG";

/// Append-only text log, one line per failed region attempt:
/// `<region> <variant> <error>`.
///
/// Safe to share between parallel region workers; writes are serialized.
#[derive(Debug)]
pub struct ErrorLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl ErrorLog {
    /// Opens `path` for appending, creating it with a header if missing.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let existed = path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if !existed {
            writeln!(file, "{ERROR_LOG_HEADER}")?;
            file.flush()?;
        }

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one failure line. Newlines in `error` are flattened.
    pub fn append(
        &self,
        region: &str,
        variant: CleaningVariant,
        error: &dyn std::fmt::Display,
    ) -> io::Result<()> {
        let message = error.to_string().replace(['\r', '\n'], " ");
        let mut file = self.file.lock().expect("error log mutex poisoned");
        writeln!(file, "{region} {variant} {message}")?;
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn test_new_log_has_header() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("logs").join("errors.log");

        ErrorLog::open(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "ERROR LOG\n");
    }

    #[test]
    fn test_append_preserves_existing_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("errors.log");

        let log = ErrorLog::open(&path).unwrap();
        log.append("TX", CleaningVariant::Lenient, &"difference failed")
            .unwrap();
        drop(log);
        let log = ErrorLog::open(&path).unwrap();
        log.append("TX", CleaningVariant::Strict, &"still\nfailing")
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "ERROR LOG\nTX lenient difference failed\nTX strict still failing\n"
        );
    }

    #[test]
    fn test_concurrent_appends_do_not_interleave() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("errors.log");
        let log = Arc::new(ErrorLog::open(&path).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for _ in 0..20 {
                        log.append(&format!("R{i}"), CleaningVariant::Lenient, &"boom")
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1 + 8 * 20);
        assert!(lines[1..]
            .iter()
            .all(|l| l.starts_with('R') && l.ends_with(" lenient boom")));
    }
}

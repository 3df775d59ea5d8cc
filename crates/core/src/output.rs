//! The shared results file. Every worker writes through one handle.

use crate::error::LabelerError;
use crate::models::OutputRecord;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Destination for output records. Implementations must keep each record
/// on a single, whole line when called from several workers at once.
pub trait RecordSink: Send + Sync {
    fn append(&self, record: &OutputRecord) -> Result<(), LabelerError>;
}

#[derive(Debug)]
pub struct ResultWriter {
    path: PathBuf,
    file: Mutex<File>,
}

impl ResultWriter {
    /// Opens `path` for appending, or truncates it when `append` is false.
    /// Missing parent directories are created.
    pub fn open(path: impl AsRef<Path>, append: bool) -> Result<Self, LabelerError> {
        let path = path.as_ref().to_path_buf();
        let write_err = |source| LabelerError::Write {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(!append)
            .append(append)
            .truncate(!append)
            .open(&path)
            .map_err(write_err)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, source: io::Error) -> LabelerError {
        LabelerError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl RecordSink for ResultWriter {
    /// Writes one full line. The lock is held for the whole line so lines
    /// from concurrent workers never interleave. This blocks; async callers
    /// go through `spawn_blocking`.
    fn append(&self, record: &OutputRecord) -> Result<(), LabelerError> {
        let line = format!("{record}\n");
        let mut file = self
            .file
            .lock()
            .map_err(|_| self.write_error(io::Error::new(io::ErrorKind::Other, "writer lock poisoned")))?;
        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| self.write_error(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn record(name: &str, labels: &[&str]) -> OutputRecord {
        OutputRecord {
            file_name: name.to_string(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn appends_to_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "old.jpg: x\n").unwrap();
        let writer = ResultWriter::open(&path, true).unwrap();
        writer.append(&record("cat.jpg", &["cat", "animal"])).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "old.jpg: x\ncat.jpg: cat, animal\n"
        );
    }

    #[test]
    fn truncate_mode_discards_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.txt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "old.jpg: x\n").unwrap();
        let writer = ResultWriter::open(&path, false).unwrap();
        writer.append(&record("dog.png", &["dog"])).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "dog.png: dog\n");
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("out.txt");
        ResultWriter::open(&path, true).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn unopenable_output_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as the results file.
        let err = ResultWriter::open(dir.path(), true).unwrap_err();
        assert!(matches!(err, LabelerError::Write { .. }));
    }

    #[test]
    fn concurrent_writers_produce_whole_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let writer = Arc::new(ResultWriter::open(&path, true).unwrap());
        let labels: Vec<String> = (0..50).map(|i| format!("label{i}")).collect();
        let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        let expected = record("x.jpg", &label_refs).to_string();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let writer = writer.clone();
                let rec = record("x.jpg", &label_refs);
                thread::spawn(move || {
                    for _ in 0..25 {
                        writer.append(&rec).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 200);
        assert!(lines.iter().all(|l| *l == expected));
    }
}

// src/protocol/output.rs
//
// Trial records and their sinks.
// - TrialResult: {learner_name: [protocol parameter, outcome...]}
// - ResultSink:  trait used by the protocol's collecting thread
// - FileSink:    appends one JSON line per trial, flushed per record
// - MemorySink:  keeps records in memory (tests, library callers)

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// One trial's outcome, keyed by learner name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrialResult(BTreeMap<String, Vec<f64>>);

impl TrialResult {
    pub fn single(learner: impl Into<String>, values: Vec<f64>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(learner.into(), values);
        Self(map)
    }

    pub fn get(&self, learner: &str) -> Option<&[f64]> {
        self.0.get(learner).map(Vec::as_slice)
    }

    pub fn learners(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Last value of the learner's record (the goal's outcome metric).
    pub fn outcome(&self, learner: &str) -> Option<f64> {
        self.get(learner).and_then(|v| v.last().copied())
    }
}

/// Destination of trial records.
pub trait ResultSink {
    fn write(&mut self, record: &TrialResult) -> Result<()>;

    /// Write the sweep-list of one trial.
    fn write_batch(&mut self, records: &[TrialResult]) -> Result<()> {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }
}

/// JSONL sink opened in append mode.
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    /// Open `path` for appending, creating it if missing.
    pub fn append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileSink {
    fn write_line(&mut self, record: &TrialResult) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl ResultSink for FileSink {
    fn write(&mut self, record: &TrialResult) -> Result<()> {
        self.write_line(record)?;
        // A crash loses at most the records not yet written.
        self.writer.flush()?;
        Ok(())
    }

    /// All records of a trial land in one flush.
    fn write_batch(&mut self, records: &[TrialResult]) -> Result<()> {
        for record in records {
            self.write_line(record)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub records: Vec<TrialResult>,
}

impl ResultSink for MemorySink {
    fn write(&mut self, record: &TrialResult) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Parse a JSONL results file; blank lines are skipped.
pub fn read_results(path: impl AsRef<Path>) -> Result<Vec<TrialResult>> {
    let file = File::open(path.as_ref())?;
    let mut out = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        out.push(serde_json::from_str(&line)?);
    }
    Ok(out)
}

/// Write data to a file atomically (write to temp, then rename).
///
/// The temp file lives in the same directory so the rename stays on one
/// filesystem.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        HarnessError::config(format!("path has no file name: {}", path.display()))
    })?;
    let temp_path = parent.join(format!(
        ".tmp_{}_{}",
        std::process::id(),
        file_name.to_string_lossy()
    ));

    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_a_flat_json_object() {
        let r = TrialResult::single("sr", vec![100.0, 0.0]);
        assert_eq!(serde_json::to_string(&r).unwrap(), r#"{"sr":[100.0,0.0]}"#);
        assert_eq!(r.outcome("sr"), Some(0.0));
        assert_eq!(r.learners().collect::<Vec<_>>(), vec!["sr"]);
    }

    #[test]
    fn file_sink_appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let mut sink = FileSink::append(&path).unwrap();
        sink.write(&TrialResult::single("a", vec![1.0, 0.5])).unwrap();
        drop(sink);
        let mut sink = FileSink::append(&path).unwrap();
        sink.write(&TrialResult::single("a", vec![2.0, 0.25])).unwrap();

        let records = read_results(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("a"), Some(&[2.0, 0.25][..]));
    }

    #[test]
    fn batch_lands_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.jsonl");
        let batch: Vec<TrialResult> = [50.0, 100.0, 200.0]
            .iter()
            .map(|&b| TrialResult::single("sr", vec![b, 0.0]))
            .collect();

        let mut sink = FileSink::append(&path).unwrap();
        sink.write_batch(&batch).unwrap();
        let mut memory = MemorySink::default();
        memory.write_batch(&batch).unwrap();

        assert_eq!(read_results(&path).unwrap(), batch);
        assert_eq!(memory.records, batch);
    }

    #[test]
    fn read_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.jsonl");
        fs::write(&path, "{\"x\":[1.0,2.0]}\n\n{\"x\":[3.0,4.0]}\n").unwrap();
        assert_eq!(read_results(&path).unwrap().len(), 2);
    }

    #[test]
    fn atomic_write_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        atomic_write(&path, b"old").unwrap();
        atomic_write(&path, b"new").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }
}

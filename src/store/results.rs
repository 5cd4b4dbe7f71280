use crate::errors::ScanError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A committed scan, as handed to the result store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub record_id: String,
    pub quiz_id: String,
    pub student_id: String,
    pub external_id: String,
    pub student_name: String,
    pub score: f64,
    pub percentage: u32,
    pub answers: Vec<String>,
    pub correct_answers: usize,
    pub wrong_answers: usize,
    pub verified: bool,
    /// Overall extraction confidence (0-100)
    pub confidence: f64,
    pub strategy: String,
    pub scanned_at: DateTime<Utc>,
}

/// Destination for committed results. A successful `commit` is final.
pub trait ResultStore: Send + Sync {
    fn commit(&self, record: &ResultRecord) -> Result<(), ScanError>;
}

/// Keeps committed records in memory.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    records: Mutex<Vec<ResultRecord>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ResultRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultStore for InMemoryResultStore {
    fn commit(&self, record: &ResultRecord) -> Result<(), ScanError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| ScanError::StoreError("result store lock poisoned".to_string()))?;
        records.push(record.clone());
        Ok(())
    }
}

/// Appends one JSON object per line to a file.
#[derive(Debug)]
pub struct JsonLinesResultStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesResultStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every record in the file. A missing file holds no records.
    pub fn load_all(&self) -> Result<Vec<ResultRecord>, ScanError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(&self.path)?;
        let mut records = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| {
                ScanError::StoreError(format!(
                    "{}:{}: invalid record: {}",
                    self.path.display(),
                    line_no + 1,
                    e
                ))
            })?;
            records.push(record);
        }
        Ok(records)
    }
}

impl ResultStore for JsonLinesResultStore {
    fn commit(&self, record: &ResultRecord) -> Result<(), ScanError> {
        let line = serde_json::to_string(record)
            .map_err(|e| ScanError::StoreError(format!("Failed to serialize record: {}", e)))?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| ScanError::StoreError("result file lock poisoned".to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        file.flush()?;

        log::debug!(
            "Appended result {} to {}",
            record.record_id,
            self.path.display()
        );
        Ok(())
    }
}

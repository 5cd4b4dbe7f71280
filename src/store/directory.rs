use crate::errors::ScanError;
use crate::types::Student;
use std::path::Path;

/// Read access to the roster of known students.
pub trait StudentDirectory: Send + Sync {
    fn students(&self) -> Vec<Student>;
}

/// Directory backed by an in-memory roster.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    students: Vec<Student>,
}

impl InMemoryDirectory {
    pub fn new(students: Vec<Student>) -> Self {
        Self { students }
    }

    /// Load a roster from a JSON array of `{id, externalId, firstName, lastName}`.
    pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let students: Vec<Student> = serde_json::from_str(&contents).map_err(|e| {
            ScanError::ConfigError(format!("Failed to parse roster {:?}: {}", path, e))
        })?;
        log::info!("Loaded {} students from {:?}", students.len(), path);
        Ok(Self { students })
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

impl StudentDirectory for InMemoryDirectory {
    fn students(&self) -> Vec<Student> {
        self.students.clone()
    }
}

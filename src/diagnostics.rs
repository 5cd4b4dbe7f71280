//! Append-only diagnostic trace returned alongside extraction and scoring results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One line of a diagnostic trace. `question` is the zero-based question index
/// when the entry concerns a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    pub question: Option<usize>,
    pub message: String,
}

impl fmt::Display for DiagnosticEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.question {
            Some(q) => write!(f, "Q{}: {}", q + 1, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Ordered, append-only log. Each result owns its own log so repeated or
/// concurrent calls never share one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticLog {
    entries: Vec<DiagnosticEntry>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.entries.push(DiagnosticEntry {
            question: None,
            message: message.into(),
        });
    }

    pub fn question(&mut self, index: usize, message: impl Into<String>) {
        self.entries.push(DiagnosticEntry {
            question: Some(index),
            message: message.into(),
        });
    }

    /// Append every entry of `other`, each prefixed with `label`.
    pub fn absorb(&mut self, label: &str, other: &DiagnosticLog) {
        for entry in &other.entries {
            self.entries.push(DiagnosticEntry {
                question: entry.question,
                message: format!("[{}] {}", label, entry.message),
            });
        }
    }

    pub fn entries(&self) -> &[DiagnosticEntry] {
        &self.entries
    }

    /// Entries concerning question `index`.
    pub fn for_question(&self, index: usize) -> impl Iterator<Item = &DiagnosticEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.question == Some(index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

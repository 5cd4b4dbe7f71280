//! Interfaces to the collaborators that surround the scanning pipeline
//!
//! The student directory and settings store are consumed; the result store is
//! produced to. Each comes with a simple in-process implementation that the
//! CLI and tests use.

pub mod directory;
pub mod results;
pub mod settings;

pub use directory::{InMemoryDirectory, StudentDirectory};
pub use results::{InMemoryResultStore, JsonLinesResultStore, ResultRecord, ResultStore};
pub use settings::{InMemorySettings, SettingsProvider};

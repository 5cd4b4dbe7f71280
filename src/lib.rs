//! SheetScan: optical mark recognition for printed multiple-choice answer sheets
//!
//! This crate scores a captured image of the standard 20-question answer
//! sheet against a quiz's answer key.
//!
//! # Features
//! - Corner-mark frame quality assessment for capture readiness
//! - Identity marker decoding with a three-pass enhancement cascade
//! - Darkness, visibility and hybrid answer extraction strategies
//! - Deterministic scoring with a full diagnostic trace
//! - Serialized, paced capture sessions with a cancellable quality monitor
//!
//! # Usage
//! ```rust,no_run
//! use sheetscan::{
//!     CaptureOutcome, Frame, InMemoryDirectory, InMemoryResultStore, Quiz, ScanConfig,
//!     ScanSession,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), sheetscan::ScanError> {
//! let config = ScanConfig::load_or_default();
//! let quiz = Quiz::load_from_file("quiz.toml")?;
//! let directory = Arc::new(InMemoryDirectory::load_from_json("students.json")?);
//! let store = Arc::new(InMemoryResultStore::new());
//!
//! let session = ScanSession::new(config, quiz, directory, store)?;
//! if let CaptureOutcome::Committed(report) = session.capture_and_score(&Frame::open("sheet.png")?)? {
//!     println!("{}: {}%", report.record.student_name, report.record.percentage);
//! }
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod extraction;
pub mod identity;
pub mod quality;
pub mod scoring;
pub mod session;
pub mod store;
pub mod timing;
pub mod types;

// Testing utilities - synthetic sheets for offline testing
pub mod testing;

// Re-exports for convenience
pub use config::{ConflictPolicy, MultipleAnswerPolicy, ScanConfig, StrategyKind};
pub use diagnostics::{DiagnosticEntry, DiagnosticLog};
pub use errors::ScanError;
pub use extraction::{
    strategy_for, Answer, ExtractionResult, ExtractionStrategy, OptionLabel, SheetLayout,
};
pub use identity::{IdentityDecoder, IdentityPayload, MarkerDecoder, QrMarkerDecoder, ResolvedIdentity};
pub use quality::{FrameQuality, FrameQualityAssessor, QualityTier};
pub use scoring::{ScoreResult, ScoringEngine};
pub use session::{
    CaptureOutcome, CaptureReport, FrameSource, LatestFrame, QualityMonitor, ScanPipeline,
    ScanSession, SessionError,
};
pub use store::{
    InMemoryDirectory, InMemoryResultStore, InMemorySettings, JsonLinesResultStore, ResultRecord,
    ResultStore, SettingsProvider, StudentDirectory,
};
pub use types::{AnswerKey, Frame, Quiz, Student, MAX_QUESTIONS};

/// Initialize logging for the scanning pipeline
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "sheetscan=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        max_questions: MAX_QUESTIONS,
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub max_questions: usize,
}

//! Scanning session
//!
//! Owns the capture pipeline for one quiz. Captures are serialized and paced;
//! while armed, a background task assesses the latest preview frame on a fixed
//! cadence and skips its tick whenever a capture is in flight.

pub mod errors;
pub mod monitor;
pub mod pipeline;
#[allow(clippy::module_inception)]
pub mod session;

pub use errors::{SessionError, SessionErrorKind};
pub use monitor::{FrameSource, LatestFrame, QualityMonitor};
pub use pipeline::{CaptureReport, ScanPipeline};
pub use session::{CaptureOutcome, ScanSession};

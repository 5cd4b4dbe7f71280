/// Frame quality assessment module
///
/// Scores a captured frame by looking for the four printed corner alignment
/// marks of the answer sheet. The result is advisory: it tells the operator
/// when the sheet is framed well enough to capture.
pub mod assessor;
pub mod corners;

pub use assessor::{FrameQuality, FrameQualityAssessor, QualityTier};
pub use corners::{Corner, CornerReading, CornerScanner};

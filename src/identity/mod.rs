//! Identity decoding
//!
//! Reads the identity marker printed on the sheet and resolves it against the
//! student directory.

pub mod decoder;
pub mod payload;
pub mod resolve;

pub use decoder::{
    DecodeAttempt, DecodeStage, DecodedMarker, IdentityDecoder, MarkerDecoder, QrMarkerDecoder,
};
pub use payload::IdentityPayload;
pub use resolve::{resolve, MatchKind, ResolvedIdentity};

use crate::errors::ScanError;
use crate::store::StudentDirectory;
use crate::types::Frame;

/// A decoded marker resolved to a directory entry
#[derive(Debug, Clone, PartialEq)]
pub struct Identification {
    pub marker: DecodedMarker,
    pub identity: ResolvedIdentity,
}

impl IdentityDecoder {
    /// Decode the marker on `frame` and resolve its external id.
    pub fn identify(
        &self,
        frame: &Frame,
        directory: &dyn StudentDirectory,
    ) -> Result<Identification, ScanError> {
        let marker = self.decode(frame)?;
        let identity = resolve(&marker.payload.external_id, directory)?;
        log::debug!(
            "Marker '{}' ({}) resolved to student {}",
            marker.payload,
            marker.stage,
            identity.student_id
        );
        Ok(Identification { marker, identity })
    }
}

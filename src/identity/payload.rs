use serde::{Deserialize, Serialize};
use std::fmt;

/// Field separator of the marker payload
pub const PAYLOAD_SEPARATOR: char = '|';

/// Decoded identity marker: `externalId|quizId|ordinal|firstName|lastName`.
///
/// Only the external id is required. Trailing fields may be missing, and an
/// ordinal that is not a positive integer is treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPayload {
    pub raw: String,
    pub external_id: String,
    pub quiz_id: Option<String>,
    /// 1-based position within a printed batch
    pub ordinal: Option<u32>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

fn field(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl IdentityPayload {
    /// Parse a raw marker string. Returns `None` when the external id is blank.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut fields = raw.split(PAYLOAD_SEPARATOR);
        let external_id = field(fields.next())?;
        let quiz_id = field(fields.next());
        let ordinal = field(fields.next())
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|&n| n > 0);
        let first_name = field(fields.next());
        let last_name = field(fields.next());

        Some(Self {
            raw: raw.to_string(),
            external_id,
            quiz_id,
            ordinal,
            first_name,
            last_name,
        })
    }

    /// Wire form of a payload, as printed on the sheet.
    pub fn encode(
        external_id: &str,
        quiz_id: &str,
        ordinal: u32,
        first_name: &str,
        last_name: &str,
    ) -> String {
        [
            external_id,
            quiz_id,
            &ordinal.to_string(),
            first_name,
            last_name,
        ]
        .join(&PAYLOAD_SEPARATOR.to_string())
    }
}

impl fmt::Display for IdentityPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

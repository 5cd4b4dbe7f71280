use crate::errors::ScanError;
use crate::store::StudentDirectory;
use crate::types::Student;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Identifier equal byte for byte
    Exact,
    /// Equal or contained after trimming and case folding
    Normalized,
}

/// A directory entry matched to a decoded payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedIdentity {
    pub student_id: String,
    pub external_id: String,
    pub display_name: String,
    pub match_kind: MatchKind,
}

impl ResolvedIdentity {
    fn from_student(student: &Student, match_kind: MatchKind) -> Self {
        Self {
            student_id: student.id.clone(),
            external_id: student.external_id.clone(),
            display_name: student.display_name(),
            match_kind,
        }
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Find the student an external id refers to.
///
/// Exact matches win. Otherwise identifiers are compared after trimming and
/// case folding, accepting equality first and then containment in either
/// direction. The first directory entry to match is returned.
pub fn resolve(
    external_id: &str,
    directory: &dyn StudentDirectory,
) -> Result<ResolvedIdentity, ScanError> {
    let students = directory.students();

    if let Some(student) = students.iter().find(|s| s.external_id == external_id) {
        return Ok(ResolvedIdentity::from_student(student, MatchKind::Exact));
    }

    let query = normalize(external_id);
    if !query.is_empty() {
        let normalized: Vec<(String, &Student)> = students
            .iter()
            .map(|s| (normalize(&s.external_id), s))
            .filter(|(id, _)| !id.is_empty())
            .collect();

        let found = normalized
            .iter()
            .find(|(id, _)| *id == query)
            .or_else(|| {
                normalized
                    .iter()
                    .find(|(id, _)| id.contains(&query) || query.contains(id.as_str()))
            });

        if let Some((_, student)) = found {
            log::debug!(
                "Resolved '{}' to '{}' by normalized match",
                external_id,
                student.external_id
            );
            return Ok(ResolvedIdentity::from_student(student, MatchKind::Normalized));
        }
    }

    Err(ScanError::IdentityNotFound {
        external_id: external_id.to_string(),
    })
}

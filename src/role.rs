use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account role of an authenticated actor.
///
/// Stored on uploaded file entries (and inside JWT claims) in lowercase
/// form, matching the `mentors`/`students` collection split.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Mentor,
    Student,
}

impl Role {
    pub fn is_mentor(self) -> bool {
        self == Role::Mentor
    }

    pub fn is_student(self) -> bool {
        self == Role::Student
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Mentor => write!(f, "mentor"),
            Role::Student => write!(f, "student"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Mentor).unwrap(), "\"mentor\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"student\"").unwrap(),
            Role::Student
        );
    }

    #[test]
    fn display_matches_wire_form() {
        assert_eq!(Role::Mentor.to_string(), "mentor");
        assert_eq!(Role::Student.to_string(), "student");
    }
}

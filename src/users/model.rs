//! User data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Platform role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Instructor,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Self::Student
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Student => "student",
            Self::Instructor => "instructor",
            Self::Admin => "admin",
        };
        write!(f, "{s}")
    }
}

/// The user's chosen onboarding track. Determines which step sequence
/// applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareerPath {
    ShortCourse,
    DegreeProgram,
}

impl std::fmt::Display for CareerPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ShortCourse => "short_course",
            Self::DegreeProgram => "degree_program",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for CareerPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short_course" => Ok(Self::ShortCourse),
            "degree_program" => Ok(Self::DegreeProgram),
            other => Err(format!("Unknown career path: {other}")),
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Opaque password hash; hashing is handled at registration, outside
    /// this core.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: String,
    pub role: Role,
    /// Unset until the user picks a track in onboarding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career_path: Option<CareerPath>,
    pub has_completed_onboarding: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new student with onboarding not yet started.
    pub fn new(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: password_hash.into(),
            display_name: display_name.into(),
            role: Role::Student,
            career_path: None,
            has_completed_onboarding: false,
            created_at: Utc::now(),
        }
    }
}

//! Course and enrollment data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Course difficulty on the ordinal scale beginner < intermediate < advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    /// Position on the ordinal difficulty scale.
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Beginner => 0,
            Self::Intermediate => 1,
            Self::Advanced => 2,
        }
    }
}

impl std::fmt::Display for CourseLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for CourseLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!("Unknown course level: {other}")),
        }
    }
}

/// A catalog entry. Read-only from the onboarding perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub level: CourseLevel,
    /// Topic tags, e.g. "compositing", "lighting".
    pub topics: Vec<String>,
    /// Total course duration in hours.
    pub duration_hours: u32,
    /// Number of weeks the course runs.
    pub total_weeks: u32,
    /// Outcome statements matched against user goals.
    pub learning_outcomes: Vec<String>,
    pub instructor: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl Course {
    /// Required weekly commitment in hours.
    ///
    /// A course with zero weeks on record is treated as demanding its
    /// whole duration in one week.
    pub fn weekly_hours(&self) -> u32 {
        if self.total_weeks == 0 {
            self.duration_hours
        } else {
            self.duration_hours / self.total_weeks
        }
    }
}

/// Enrollment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Withdrawn,
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Withdrawn => "withdrawn",
        };
        write!(f, "{s}")
    }
}

/// Links a user to a course with accruing progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub status: EnrollmentStatus,
    /// Percentage 0-100.
    pub progress: u8,
    pub enrolled_at: DateTime<Utc>,
}

impl Enrollment {
    /// Create a fresh active enrollment at zero progress.
    pub fn new(user_id: Uuid, course_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            course_id,
            status: EnrollmentStatus::Active,
            progress: 0,
            enrolled_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(duration_hours: u32, total_weeks: u32) -> Course {
        Course {
            id: Uuid::new_v4(),
            title: "Intro to Compositing".to_string(),
            description: String::new(),
            level: CourseLevel::Beginner,
            topics: vec!["compositing".to_string()],
            duration_hours,
            total_weeks,
            learning_outcomes: vec![],
            instructor: "Jane".to_string(),
            category: "vfx".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn weekly_hours_divides_duration() {
        assert_eq!(course(40, 8).weekly_hours(), 5);
        assert_eq!(course(40, 0).weekly_hours(), 40);
    }

    #[test]
    fn level_ordinal_is_strictly_increasing() {
        assert!(CourseLevel::Beginner.ordinal() < CourseLevel::Intermediate.ordinal());
        assert!(CourseLevel::Intermediate.ordinal() < CourseLevel::Advanced.ordinal());
    }

    #[test]
    fn new_enrollment_is_active_at_zero() {
        let e = Enrollment::new(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(e.status, EnrollmentStatus::Active);
        assert_eq!(e.progress, 0);
    }
}

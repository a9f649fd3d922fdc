//! Deterministic weighted-sum match scoring between survey answers and
//! catalog courses.
//!
//! Given identical inputs, repeated calls produce identical scores and
//! ordering — there is no randomness anywhere in this path.

use serde::{Deserialize, Serialize};

use crate::catalog::{Course, CourseLevel};
use crate::onboarding::model::SurveyResponse;

/// Result-list cap for short-course users.
pub const DEFAULT_LIMIT: usize = 6;
/// Result-list cap for degree-program users.
pub const DEGREE_LIMIT: usize = 10;

const LEVEL_MATCH_POINTS: u32 = 30;
const LEVEL_STRETCH_POINTS: u32 = 15;
const TOPIC_POINTS_EACH: u32 = 20;
const TIME_FIT_POINTS: u32 = 15;
const GOAL_POINTS: u32 = 25;

/// A scoring factor that contributed non-zero points, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFactor {
    /// Course level equals the stated experience level.
    LevelMatch,
    /// Course level is exactly one step above — progressive difficulty.
    LevelStretch,
    /// One or more course topics intersect the stated interests.
    TopicOverlap,
    /// Weekly commitment fits the stated availability.
    TimeFit,
    /// A stated goal matches a learning outcome.
    GoalAlignment,
}

impl std::fmt::Display for MatchFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::LevelMatch => "matches your experience level",
            Self::LevelStretch => "one step up in difficulty",
            Self::TopicOverlap => "covers your interests",
            Self::TimeFit => "fits your weekly schedule",
            Self::GoalAlignment => "aligned with your goals",
        };
        write!(f, "{s}")
    }
}

/// A course with its computed match score and contributing factors.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCourse {
    pub course: Course,
    pub score: u32,
    pub factors: Vec<MatchFactor>,
}

/// Whether a course passes the experience-level filter: its level equals
/// the user's or sits exactly one step above.
fn passes_level_filter(user_level: CourseLevel, course_level: CourseLevel) -> bool {
    let user = user_level.ordinal();
    let course = course_level.ordinal();
    course == user || course == user + 1
}

/// Score one course against the survey. Total over all courses and inputs.
pub fn score_course(survey: &SurveyResponse, course: &Course) -> (u32, Vec<MatchFactor>) {
    let mut score = 0;
    let mut factors = Vec::new();

    let user = survey.experience_level.ordinal();
    let level = course.level.ordinal();
    if level == user {
        score += LEVEL_MATCH_POINTS;
        factors.push(MatchFactor::LevelMatch);
    } else if level == user + 1 {
        score += LEVEL_STRETCH_POINTS;
        factors.push(MatchFactor::LevelStretch);
    }
    // Below the user's level, or more than one step above: no level points.

    let interests: Vec<String> = survey.interests.iter().map(|i| i.to_lowercase()).collect();
    let overlap = course
        .topics
        .iter()
        .filter(|t| interests.contains(&t.to_lowercase()))
        .count() as u32;
    if overlap > 0 {
        score += TOPIC_POINTS_EACH * overlap;
        factors.push(MatchFactor::TopicOverlap);
    }

    if course.weekly_hours() <= survey.weekly_hours {
        score += TIME_FIT_POINTS;
        factors.push(MatchFactor::TimeFit);
    }

    let goal_hit = survey.goals.iter().any(|goal| {
        let goal = goal.to_lowercase();
        course
            .learning_outcomes
            .iter()
            .any(|outcome| outcome.to_lowercase().contains(&goal))
    });
    if goal_hit {
        score += GOAL_POINTS;
        factors.push(MatchFactor::GoalAlignment);
    }

    (score, factors)
}

/// Filter candidates by experience level, score, and rank.
///
/// Descending by score; ties break by course creation time descending
/// (newest first); the list is truncated to `limit`. An empty post-filter
/// candidate set yields an empty list.
pub fn rank(survey: &SurveyResponse, courses: Vec<Course>, limit: usize) -> Vec<ScoredCourse> {
    let mut scored: Vec<ScoredCourse> = courses
        .into_iter()
        .filter(|c| passes_level_filter(survey.experience_level, c.level))
        .map(|course| {
            let (score, factors) = score_course(survey, &course);
            ScoredCourse {
                course,
                score,
                factors,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.course.created_at.cmp(&a.course.created_at))
    });
    scored.truncate(limit);
    scored
}

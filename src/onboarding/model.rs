//! Onboarding progress record and per-step response payloads.
//!
//! Responses are a typed aggregate keyed by step rather than an open-ended
//! JSON bag: each step owns one slot, and re-submitting a step replaces
//! that slot wholesale. Other steps' answers are never touched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::CourseLevel;
use crate::users::CareerPath;

use super::state::Step;

/// Payload recorded at the career-path step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerPathResponse {
    pub career_path: CareerPath,
}

/// Survey answers. The degree-program variant carries the extra fields;
/// they stay `None` for short-course users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub experience_level: CourseLevel,
    pub interests: Vec<String>,
    pub weekly_hours: u32,
    pub goals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career_goals: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_url: Option<String>,
}

/// Outcome of the recommendations step.
///
/// Short-course users confirm they viewed the list and may select a course;
/// degree-program users accept the proposed curriculum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RecommendationsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewed_recommendations: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_course: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_curriculum: Option<bool>,
}

/// Profile details collected near the end of the flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_url: Option<String>,
}

/// Tour acknowledgment — the terminal step's payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourResponse {
    pub tour_acknowledged: bool,
}

/// A validated payload for one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepPayload {
    CareerPath(CareerPathResponse),
    Survey(SurveyResponse),
    Recommendations(RecommendationsResponse),
    Profile(ProfileResponse),
    Tour(TourResponse),
}

impl StepPayload {
    /// The step this payload belongs to.
    pub fn step(&self) -> Step {
        match self {
            Self::CareerPath(_) => Step::CareerPath,
            Self::Survey(_) => Step::Survey,
            Self::Recommendations(_) => Step::Recommendations,
            Self::Profile(_) => Step::Profile,
            Self::Tour(_) => Step::Tour,
        }
    }
}

/// All responses collected so far, one slot per step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResponses {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career_path: Option<CareerPathResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey: Option<SurveyResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<RecommendationsResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tour: Option<TourResponse>,
}

impl StepResponses {
    /// Merge a validated payload in: the payload's step slot is replaced,
    /// everything else is left as-is.
    pub fn apply(&mut self, payload: StepPayload) {
        match payload {
            StepPayload::CareerPath(r) => self.career_path = Some(r),
            StepPayload::Survey(r) => self.survey = Some(r),
            StepPayload::Recommendations(r) => self.recommendations = Some(r),
            StepPayload::Profile(r) => self.profile = Some(r),
            StepPayload::Tour(r) => self.tour = Some(r),
        }
    }
}

/// Persisted onboarding progress, one-to-one with a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingProgress {
    pub user_id: Uuid,
    pub current_step: Step,
    pub completed: bool,
    pub responses: StepResponses,
    /// Degree-program gate between Recommendations and Profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_curriculum: Option<bool>,
    /// Short-course users: the course picked from the recommendations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_course: Option<Uuid>,
    /// Short-course gate between Recommendations and Profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewed_recommendations: Option<bool>,
    /// Steps whose data has been recorded, in the order they were reached.
    pub completed_steps: Vec<Step>,
    pub updated_at: DateTime<Utc>,
}

impl OnboardingProgress {
    /// Fresh progress at the first step.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            current_step: Step::CareerPath,
            completed: false,
            responses: StepResponses::default(),
            accepted_curriculum: None,
            selected_course: None,
            viewed_recommendations: None,
            completed_steps: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Record a step as completed, once.
    pub fn mark_step_completed(&mut self, step: Step) {
        if !self.completed_steps.contains(&step) {
            self.completed_steps.push(step);
        }
    }
}

impl SurveyResponse {
    /// A minimal valid survey, used across unit tests.
    #[cfg(test)]
    pub fn sample() -> Self {
        Self {
            experience_level: CourseLevel::Beginner,
            interests: vec!["compositing".to_string()],
            weekly_hours: 10,
            goals: vec!["get a job".to_string()],
            specialization: None,
            career_goals: None,
            portfolio_url: None,
        }
    }
}

//! OnboardingManager — coordinates step transitions, validation, and
//! persistence.
//!
//! Advance is read-validate-write against a single progress row. There is
//! no optimistic-concurrency token: two near-simultaneous requests from the
//! same user can race and the last write wins. Onboarding is single-user
//! driven, so this is a known, low-risk race rather than something a lock
//! would earn its keep on.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::catalog::Enrollment;
use crate::error::{DatabaseError, OnboardingError};
use crate::recommend::{self, ScoredCourse};
use crate::store::Database;
use crate::users::{CareerPath, User};

use super::model::{OnboardingProgress, StepPayload};
use super::state::{self, Step};
use super::validate::validate_step;

/// Coordinates the onboarding flow over the persistence store.
pub struct OnboardingManager {
    db: Arc<dyn Database>,
}

impl OnboardingManager {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// The user's current progress row.
    pub async fn progress(&self, user_id: Uuid) -> Result<OnboardingProgress, OnboardingError> {
        self.db
            .get_progress(user_id)
            .await?
            .ok_or(OnboardingError::NoProgress { user_id })
    }

    /// Resolve where the user should land in the flow.
    pub async fn entry_step(&self, user: &User) -> Result<Step, OnboardingError> {
        let progress = self.db.get_progress(user.id).await?;
        Ok(state::resolve_entry_step(user, progress.as_ref()))
    }

    /// Validate and apply a step submission.
    ///
    /// Rejects out-of-order steps with a sequence error carrying the
    /// resolved entry step; rejects bad payloads with field errors. The
    /// whole transition lands in one row write.
    pub async fn advance(
        &self,
        user: &User,
        step: Step,
        payload: &Value,
    ) -> Result<OnboardingProgress, OnboardingError> {
        if step == Step::CareerPath {
            return self.advance_career_path(user, payload).await;
        }

        let Some(path) = user.career_path else {
            return Err(OnboardingError::PrerequisiteMissing {
                redirect_to: Step::CareerPath.to_string(),
            });
        };

        let Some(mut progress) = self.db.get_progress(user.id).await? else {
            return Err(OnboardingError::Sequence {
                requested: step.to_string(),
                expected: Step::CareerPath.to_string(),
            });
        };

        if !state::can_enter(step, path, &progress) {
            let expected = state::resolve_entry_step(user, Some(&progress));
            return Err(OnboardingError::Sequence {
                requested: step.to_string(),
                expected: expected.to_string(),
            });
        }

        let validated = validate_step(step, path, payload).map_err(|errors| {
            OnboardingError::Validation {
                step: step.to_string(),
                errors,
            }
        })?;

        if let StepPayload::Recommendations(ref r) = validated {
            progress.viewed_recommendations = r.viewed_recommendations;
            progress.accepted_curriculum = r.accepted_curriculum;
            progress.selected_course = r.selected_course;

            if path == CareerPath::ShortCourse {
                if let Some(course_id) = r.selected_course {
                    self.enroll(user.id, course_id).await?;
                }
            }
        }

        progress.responses.apply(validated);
        progress.mark_step_completed(step);

        let next = state::next_step(path, step).unwrap_or(Step::Completed);
        progress.current_step = next;
        if next == Step::Completed {
            progress.completed = true;
            progress.mark_step_completed(Step::Completed);
            self.db.set_onboarding_complete(user.id).await?;
        }
        progress.updated_at = Utc::now();
        self.db.upsert_progress(&progress).await?;

        tracing::info!(
            user = %user.id,
            step = %step,
            next = %next,
            "Onboarding step advanced"
        );
        Ok(progress)
    }

    /// The career-path step creates (or reuses) the progress row and pins
    /// the chosen path on the user record.
    async fn advance_career_path(
        &self,
        user: &User,
        payload: &Value,
    ) -> Result<OnboardingProgress, OnboardingError> {
        // The chosen path comes from the payload itself, so validation does
        // not depend on one being set yet.
        let validated = validate_step(
            Step::CareerPath,
            user.career_path.unwrap_or(CareerPath::ShortCourse),
            payload,
        )
        .map_err(|errors| OnboardingError::Validation {
            step: Step::CareerPath.to_string(),
            errors,
        })?;

        let StepPayload::CareerPath(ref response) = validated else {
            unreachable!("career-path validation yields a career-path payload");
        };
        let path = response.career_path;

        let mut progress = self
            .db
            .get_progress(user.id)
            .await?
            .unwrap_or_else(|| OnboardingProgress::new(user.id));

        progress.responses.apply(validated);
        progress.mark_step_completed(Step::CareerPath);
        progress.current_step =
            state::next_step(path, Step::CareerPath).unwrap_or(Step::Completed);
        progress.updated_at = Utc::now();

        self.db.set_career_path(user.id, path).await?;
        self.db.upsert_progress(&progress).await?;

        tracing::info!(user = %user.id, path = %path, "Career path chosen");
        Ok(progress)
    }

    /// Move one step back without touching responses.
    pub async fn retreat(&self, user: &User) -> Result<OnboardingProgress, OnboardingError> {
        let mut progress = self.progress(user.id).await?;
        let Some(path) = user.career_path else {
            return Err(OnboardingError::AtFirstStep);
        };
        let Some(previous) = state::previous_step(path, progress.current_step) else {
            return Err(OnboardingError::AtFirstStep);
        };

        progress.current_step = previous;
        progress.updated_at = Utc::now();
        self.db.upsert_progress(&progress).await?;
        Ok(progress)
    }

    /// Rank the catalog against the user's survey answers.
    ///
    /// Requires the survey to have been answered; redirects there
    /// otherwise. An empty post-filter candidate set is an empty result,
    /// not an error.
    pub async fn recommendations(
        &self,
        user: &User,
    ) -> Result<(Vec<ScoredCourse>, Step), OnboardingError> {
        let Some(path) = user.career_path else {
            return Err(OnboardingError::PrerequisiteMissing {
                redirect_to: Step::CareerPath.to_string(),
            });
        };

        let progress = self.db.get_progress(user.id).await?;
        let survey = progress
            .as_ref()
            .and_then(|p| p.responses.survey.clone())
            .ok_or(OnboardingError::PrerequisiteMissing {
                redirect_to: Step::Survey.to_string(),
            })?;

        let limit = match path {
            CareerPath::ShortCourse => recommend::DEFAULT_LIMIT,
            CareerPath::DegreeProgram => recommend::DEGREE_LIMIT,
        };

        let courses = self.db.list_courses().await?;
        let ranked = recommend::rank(&survey, courses, limit);
        let next = state::resolve_entry_step(user, progress.as_ref());
        Ok((ranked, next))
    }

    /// Create the enrollment for an accepted course. Re-selecting a course
    /// the user is already enrolled in is a no-op.
    async fn enroll(&self, user_id: Uuid, course_id: Uuid) -> Result<(), OnboardingError> {
        match self
            .db
            .insert_enrollment(&Enrollment::new(user_id, course_id))
            .await
        {
            Ok(()) => {
                tracing::info!(user = %user_id, course = %course_id, "Enrollment created");
                Ok(())
            }
            Err(DatabaseError::Constraint(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

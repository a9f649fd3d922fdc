//! Unified `Database` trait — single async interface for all persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::catalog::{Course, Enrollment};
use crate::error::DatabaseError;
use crate::onboarding::model::OnboardingProgress;
use crate::users::{CareerPath, User};

/// Backend-agnostic database trait covering users, onboarding progress,
/// courses, and enrollments.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    // ── Users ───────────────────────────────────────────────────────

    /// Insert a new user. Fails on duplicate email.
    async fn insert_user(&self, user: &User) -> Result<(), DatabaseError>;

    /// Get a user by ID.
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    /// Look up a user by email.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// Record the user's chosen career path.
    async fn set_career_path(
        &self,
        user_id: Uuid,
        path: CareerPath,
    ) -> Result<(), DatabaseError>;

    /// Flip the user's onboarding-complete flag.
    async fn set_onboarding_complete(&self, user_id: Uuid) -> Result<(), DatabaseError>;

    // ── Onboarding progress ─────────────────────────────────────────

    /// Insert or replace the user's progress row in one write.
    async fn upsert_progress(&self, progress: &OnboardingProgress) -> Result<(), DatabaseError>;

    /// Get a user's progress row, if one exists.
    async fn get_progress(
        &self,
        user_id: Uuid,
    ) -> Result<Option<OnboardingProgress>, DatabaseError>;

    // ── Courses ─────────────────────────────────────────────────────

    /// Insert a catalog entry (seeding and admin tooling).
    async fn insert_course(&self, course: &Course) -> Result<(), DatabaseError>;

    /// Get a course by ID.
    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, DatabaseError>;

    /// List the whole catalog, newest first.
    async fn list_courses(&self) -> Result<Vec<Course>, DatabaseError>;

    // ── Enrollments ─────────────────────────────────────────────────

    /// Insert a new enrollment. Fails if the user is already enrolled.
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), DatabaseError>;

    /// List a user's enrollments, newest first.
    async fn list_enrollments(&self, user_id: Uuid) -> Result<Vec<Enrollment>, DatabaseError>;
}

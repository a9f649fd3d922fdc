//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. All timestamps are written
//! as RFC 3339 text; JSON columns hold the serde representation of the
//! typed models.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::info;
use uuid::Uuid;

use crate::catalog::{Course, CourseLevel, Enrollment, EnrollmentStatus};
use crate::error::DatabaseError;
use crate::onboarding::model::{OnboardingProgress, StepResponses};
use crate::onboarding::state::Step;
use crate::store::migrations;
use crate::store::traits::Database;
use crate::users::{CareerPath, Role, User};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    s.parse()
        .map_err(|e| DatabaseError::Serialization(format!("Invalid UUID {s}: {e}")))
}

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::Student => "student",
        Role::Instructor => "instructor",
        Role::Admin => "admin",
    }
}

fn str_to_role(s: &str) -> Role {
    match s {
        "instructor" => Role::Instructor,
        "admin" => Role::Admin,
        _ => Role::Student,
    }
}

fn enrollment_status_to_str(status: EnrollmentStatus) -> &'static str {
    match status {
        EnrollmentStatus::Active => "active",
        EnrollmentStatus::Completed => "completed",
        EnrollmentStatus::Withdrawn => "withdrawn",
    }
}

fn str_to_enrollment_status(s: &str) -> EnrollmentStatus {
    match s {
        "completed" => EnrollmentStatus::Completed,
        "withdrawn" => EnrollmentStatus::Withdrawn,
        _ => EnrollmentStatus::Active,
    }
}

fn json_column<T: serde::de::DeserializeOwned>(raw: &str, what: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(raw)
        .map_err(|e| DatabaseError::Serialization(format!("Invalid {what} JSON: {e}")))
}

fn to_json_column<T: serde::Serialize>(value: &T, what: &str) -> Result<String, DatabaseError> {
    serde_json::to_string(value)
        .map_err(|e| DatabaseError::Serialization(format!("Cannot serialize {what}: {e}")))
}

/// Map a libsql row to a User.
///
/// Column order: 0:id, 1:email, 2:password_hash, 3:display_name, 4:role,
/// 5:career_path, 6:has_completed_onboarding, 7:created_at
fn row_to_user(row: &libsql::Row) -> Result<User, DatabaseError> {
    let get_err = |e: libsql::Error| DatabaseError::Query(format!("Bad user row: {e}"));

    let id_str: String = row.get(0).map_err(get_err)?;
    let email: String = row.get(1).map_err(get_err)?;
    let password_hash: String = row.get(2).map_err(get_err)?;
    let display_name: String = row.get(3).map_err(get_err)?;
    let role_str: String = row.get(4).map_err(get_err)?;
    let career_path_str: Option<String> = row.get(5).ok();
    let completed: i64 = row.get(6).map_err(get_err)?;
    let created_str: String = row.get(7).map_err(get_err)?;

    Ok(User {
        id: parse_uuid(&id_str)?,
        email,
        password_hash,
        display_name,
        role: str_to_role(&role_str),
        career_path: career_path_str.and_then(|s| s.parse().ok()),
        has_completed_onboarding: completed != 0,
        created_at: parse_datetime(&created_str),
    })
}

/// Map a libsql row to an OnboardingProgress.
///
/// Column order: 0:user_id, 1:current_step, 2:completed, 3:responses,
/// 4:accepted_curriculum, 5:selected_course, 6:viewed_recommendations,
/// 7:completed_steps, 8:updated_at
fn row_to_progress(row: &libsql::Row) -> Result<OnboardingProgress, DatabaseError> {
    let get_err = |e: libsql::Error| DatabaseError::Query(format!("Bad progress row: {e}"));

    let user_id_str: String = row.get(0).map_err(get_err)?;
    let step_str: String = row.get(1).map_err(get_err)?;
    let completed: i64 = row.get(2).map_err(get_err)?;
    let responses_str: String = row.get(3).map_err(get_err)?;
    let accepted: Option<i64> = row.get(4).ok();
    let selected_str: Option<String> = row.get(5).ok();
    let viewed: Option<i64> = row.get(6).ok();
    let steps_str: String = row.get(7).map_err(get_err)?;
    let updated_str: String = row.get(8).map_err(get_err)?;

    let current_step: Step = step_str
        .parse()
        .map_err(|e| DatabaseError::Serialization(format!("Bad current_step: {e}")))?;
    let responses: StepResponses = json_column(&responses_str, "responses")?;
    let completed_steps: Vec<Step> = json_column(&steps_str, "completed_steps")?;

    Ok(OnboardingProgress {
        user_id: parse_uuid(&user_id_str)?,
        current_step,
        completed: completed != 0,
        responses,
        accepted_curriculum: accepted.map(|v| v != 0),
        selected_course: selected_str.and_then(|s| s.parse().ok()),
        viewed_recommendations: viewed.map(|v| v != 0),
        completed_steps,
        updated_at: parse_datetime(&updated_str),
    })
}

/// Map a libsql row to a Course.
///
/// Column order: 0:id, 1:title, 2:description, 3:level, 4:topics,
/// 5:duration_hours, 6:total_weeks, 7:learning_outcomes, 8:instructor,
/// 9:category, 10:created_at
fn row_to_course(row: &libsql::Row) -> Result<Course, DatabaseError> {
    let get_err = |e: libsql::Error| DatabaseError::Query(format!("Bad course row: {e}"));

    let id_str: String = row.get(0).map_err(get_err)?;
    let title: String = row.get(1).map_err(get_err)?;
    let description: String = row.get(2).map_err(get_err)?;
    let level_str: String = row.get(3).map_err(get_err)?;
    let topics_str: String = row.get(4).map_err(get_err)?;
    let duration_hours: i64 = row.get(5).map_err(get_err)?;
    let total_weeks: i64 = row.get(6).map_err(get_err)?;
    let outcomes_str: String = row.get(7).map_err(get_err)?;
    let instructor: String = row.get(8).map_err(get_err)?;
    let category: String = row.get(9).map_err(get_err)?;
    let created_str: String = row.get(10).map_err(get_err)?;

    let level: CourseLevel = level_str
        .parse()
        .map_err(|e| DatabaseError::Serialization(format!("Bad course level: {e}")))?;

    Ok(Course {
        id: parse_uuid(&id_str)?,
        title,
        description,
        level,
        topics: json_column(&topics_str, "topics")?,
        duration_hours: duration_hours.max(0) as u32,
        total_weeks: total_weeks.max(0) as u32,
        learning_outcomes: json_column(&outcomes_str, "learning_outcomes")?,
        instructor,
        category,
        created_at: parse_datetime(&created_str),
    })
}

/// Map a libsql row to an Enrollment.
///
/// Column order: 0:id, 1:user_id, 2:course_id, 3:status, 4:progress,
/// 5:enrolled_at
fn row_to_enrollment(row: &libsql::Row) -> Result<Enrollment, DatabaseError> {
    let get_err = |e: libsql::Error| DatabaseError::Query(format!("Bad enrollment row: {e}"));

    let id_str: String = row.get(0).map_err(get_err)?;
    let user_id_str: String = row.get(1).map_err(get_err)?;
    let course_id_str: String = row.get(2).map_err(get_err)?;
    let status_str: String = row.get(3).map_err(get_err)?;
    let progress: i64 = row.get(4).map_err(get_err)?;
    let enrolled_str: String = row.get(5).map_err(get_err)?;

    Ok(Enrollment {
        id: parse_uuid(&id_str)?,
        user_id: parse_uuid(&user_id_str)?,
        course_id: parse_uuid(&course_id_str)?,
        status: str_to_enrollment_status(&status_str),
        progress: progress.clamp(0, 100) as u8,
        enrolled_at: parse_datetime(&enrolled_str),
    })
}

fn map_exec_err(e: libsql::Error, what: &str) -> DatabaseError {
    let msg = e.to_string();
    if msg.contains("UNIQUE constraint failed") {
        DatabaseError::Constraint(format!("{what}: {msg}"))
    } else {
        DatabaseError::Query(format!("{what}: {msg}"))
    }
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Users ───────────────────────────────────────────────────────

    async fn insert_user(&self, user: &User) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO users (id, email, password_hash, display_name, role,
                    career_path, has_completed_onboarding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    user.id.to_string(),
                    user.email.clone(),
                    user.password_hash.clone(),
                    user.display_name.clone(),
                    role_to_str(user.role),
                    user.career_path.map(|p| p.to_string()),
                    i64::from(user.has_completed_onboarding),
                    user.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| map_exec_err(e, "insert_user"))?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, email, password_hash, display_name, role,
                    career_path, has_completed_onboarding, created_at
                 FROM users WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_user: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_user: {e}")))?
        {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, email, password_hash, display_name, role,
                    career_path, has_completed_onboarding, created_at
                 FROM users WHERE email = ?1",
                params![email],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_user_by_email: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_user_by_email: {e}")))?
        {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn set_career_path(
        &self,
        user_id: Uuid,
        path: CareerPath,
    ) -> Result<(), DatabaseError> {
        let affected = self
            .conn()
            .execute(
                "UPDATE users SET career_path = ?1 WHERE id = ?2",
                params![path.to_string(), user_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set_career_path: {e}")))?;
        if affected == 0 {
            return Err(DatabaseError::NotFound {
                entity: "user".to_string(),
                id: user_id.to_string(),
            });
        }
        Ok(())
    }

    async fn set_onboarding_complete(&self, user_id: Uuid) -> Result<(), DatabaseError> {
        let affected = self
            .conn()
            .execute(
                "UPDATE users SET has_completed_onboarding = 1 WHERE id = ?1",
                params![user_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set_onboarding_complete: {e}")))?;
        if affected == 0 {
            return Err(DatabaseError::NotFound {
                entity: "user".to_string(),
                id: user_id.to_string(),
            });
        }
        Ok(())
    }

    // ── Onboarding progress ─────────────────────────────────────────

    async fn upsert_progress(&self, progress: &OnboardingProgress) -> Result<(), DatabaseError> {
        let responses = to_json_column(&progress.responses, "responses")?;
        let completed_steps = to_json_column(&progress.completed_steps, "completed_steps")?;

        self.conn()
            .execute(
                "INSERT INTO onboarding_progress (user_id, current_step, completed,
                    responses, accepted_curriculum, selected_course,
                    viewed_recommendations, completed_steps, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT (user_id) DO UPDATE SET
                    current_step = excluded.current_step,
                    completed = excluded.completed,
                    responses = excluded.responses,
                    accepted_curriculum = excluded.accepted_curriculum,
                    selected_course = excluded.selected_course,
                    viewed_recommendations = excluded.viewed_recommendations,
                    completed_steps = excluded.completed_steps,
                    updated_at = excluded.updated_at",
                params![
                    progress.user_id.to_string(),
                    progress.current_step.to_string(),
                    i64::from(progress.completed),
                    responses,
                    progress.accepted_curriculum.map(i64::from),
                    progress.selected_course.map(|id| id.to_string()),
                    progress.viewed_recommendations.map(i64::from),
                    completed_steps,
                    progress.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_progress: {e}")))?;
        Ok(())
    }

    async fn get_progress(
        &self,
        user_id: Uuid,
    ) -> Result<Option<OnboardingProgress>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT user_id, current_step, completed, responses,
                    accepted_curriculum, selected_course, viewed_recommendations,
                    completed_steps, updated_at
                 FROM onboarding_progress WHERE user_id = ?1",
                params![user_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_progress: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_progress: {e}")))?
        {
            Some(row) => Ok(Some(row_to_progress(&row)?)),
            None => Ok(None),
        }
    }

    // ── Courses ─────────────────────────────────────────────────────

    async fn insert_course(&self, course: &Course) -> Result<(), DatabaseError> {
        let topics = to_json_column(&course.topics, "topics")?;
        let outcomes = to_json_column(&course.learning_outcomes, "learning_outcomes")?;

        self.conn()
            .execute(
                "INSERT INTO courses (id, title, description, level, topics,
                    duration_hours, total_weeks, learning_outcomes, instructor,
                    category, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    course.id.to_string(),
                    course.title.clone(),
                    course.description.clone(),
                    course.level.to_string(),
                    topics,
                    i64::from(course.duration_hours),
                    i64::from(course.total_weeks),
                    outcomes,
                    course.instructor.clone(),
                    course.category.clone(),
                    course.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| map_exec_err(e, "insert_course"))?;
        Ok(())
    }

    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, title, description, level, topics, duration_hours,
                    total_weeks, learning_outcomes, instructor, category, created_at
                 FROM courses WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_course: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_course: {e}")))?
        {
            Some(row) => Ok(Some(row_to_course(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_courses(&self) -> Result<Vec<Course>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, title, description, level, topics, duration_hours,
                    total_weeks, learning_outcomes, instructor, category, created_at
                 FROM courses ORDER BY created_at DESC",
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_courses: {e}")))?;

        let mut courses = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_courses: {e}")))?
        {
            courses.push(row_to_course(&row)?);
        }
        Ok(courses)
    }

    // ── Enrollments ─────────────────────────────────────────────────

    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO enrollments (id, user_id, course_id, status, progress,
                    enrolled_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    enrollment.id.to_string(),
                    enrollment.user_id.to_string(),
                    enrollment.course_id.to_string(),
                    enrollment_status_to_str(enrollment.status),
                    i64::from(enrollment.progress),
                    enrollment.enrolled_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| map_exec_err(e, "insert_enrollment"))?;
        Ok(())
    }

    async fn list_enrollments(&self, user_id: Uuid) -> Result<Vec<Enrollment>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, user_id, course_id, status, progress, enrolled_at
                 FROM enrollments WHERE user_id = ?1 ORDER BY enrolled_at DESC",
                params![user_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_enrollments: {e}")))?;

        let mut enrollments = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_enrollments: {e}")))?
        {
            enrollments.push(row_to_enrollment(&row)?);
        }
        Ok(enrollments)
    }
}

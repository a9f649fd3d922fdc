//! Error types for VFX Academy.

use uuid::Uuid;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Onboarding error: {0}")]
    Onboarding(#[from] OnboardingError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A single field-level validation failure, surfaced to the client.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldError {
    /// The offending field, e.g. `"weekly_hours"`.
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Onboarding flow errors.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    /// Payload failed schema validation. User-correctable; surfaced as
    /// field messages with a 400.
    #[error("Validation failed for step {step}: {} error(s)", errors.len())]
    Validation {
        step: String,
        errors: Vec<FieldError>,
    },

    /// Requested step is not reachable from the user's current progress.
    /// Not user-facing; the caller redirects to the resolved entry step.
    #[error("Step {requested} is out of sequence, expected {expected}")]
    Sequence { requested: String, expected: String },

    /// A prior step's data is required but absent. Redirects to that step.
    #[error("Missing prerequisite data, redirect to {redirect_to}")]
    PrerequisiteMissing { redirect_to: String },

    /// Cannot retreat from the first step of a path.
    #[error("Already at the first step")]
    AtFirstStep,

    /// Progress record does not exist yet.
    #[error("No onboarding progress for user {user_id}")]
    NoProgress { user_id: Uuid },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing user credentials")]
    MissingCredentials,

    #[error("Unknown user: {0}")]
    UnknownUser(String),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;

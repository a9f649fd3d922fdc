//! Shared HTTP plumbing: request authentication and error-to-response
//! mapping used by every route module.

use std::sync::Arc;

use axum::Json;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::{AuthError, DatabaseError, OnboardingError};
use crate::store::Database;
use crate::users::User;

/// Header carrying the authenticated user's id. Session mechanics live
/// outside this core; routes only need a resolvable identity.
pub const USER_HEADER: &str = "x-user-id";

/// Resolve the calling user from request headers, or 401.
pub async fn authenticate(db: &Arc<dyn Database>, headers: &HeaderMap) -> Result<User, ApiError> {
    let raw = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Auth(AuthError::MissingCredentials))?;

    let user_id = raw
        .parse()
        .map_err(|_| ApiError::Auth(AuthError::UnknownUser(raw.to_string())))?;

    db.get_user(user_id)
        .await
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::Auth(AuthError::UnknownUser(raw.to_string())))
}

/// Route-level error, mapped onto HTTP statuses.
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    Onboarding(OnboardingError),
    Database(DatabaseError),
}

impl From<OnboardingError> for ApiError {
    fn from(e: OnboardingError) -> Self {
        match e {
            OnboardingError::Database(db) => Self::Database(db),
            other => Self::Onboarding(other),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        Self::Database(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Auth(_) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "unauthorized"})),
            )
                .into_response(),

            Self::Onboarding(OnboardingError::Validation { step, errors }) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "validation_failed",
                    "step": step,
                    "fields": errors,
                })),
            )
                .into_response(),

            // Out-of-order and missing-prerequisite both resolve to a
            // redirect target; the client navigates rather than showing
            // the error.
            Self::Onboarding(OnboardingError::Sequence { expected, .. }) => (
                StatusCode::CONFLICT,
                Json(json!({"error": "out_of_sequence", "redirect_to": expected})),
            )
                .into_response(),
            Self::Onboarding(OnboardingError::PrerequisiteMissing { redirect_to }) => (
                StatusCode::CONFLICT,
                Json(json!({"error": "prerequisite_missing", "redirect_to": redirect_to})),
            )
                .into_response(),

            Self::Onboarding(OnboardingError::AtFirstStep) => (
                StatusCode::CONFLICT,
                Json(json!({"error": "at_first_step"})),
            )
                .into_response(),

            Self::Onboarding(OnboardingError::NoProgress { .. }) => (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "not_found"})),
            )
                .into_response(),

            Self::Onboarding(OnboardingError::Database(e)) | Self::Database(e) => {
                // Never leak datastore detail to the client.
                tracing::error!(error = %e, "Persistence failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "internal_error"})),
                )
                    .into_response()
            }
        }
    }
}

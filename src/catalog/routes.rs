//! Thin read endpoints for the course catalog and the caller's
//! enrollments.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use uuid::Uuid;

use crate::api::{ApiError, authenticate};
use crate::store::Database;

/// Shared state for catalog routes.
#[derive(Clone)]
pub struct CatalogRouteState {
    pub db: Arc<dyn Database>,
}

/// GET /api/courses
async fn list_courses(
    State(state): State<CatalogRouteState>,
) -> Result<impl IntoResponse, ApiError> {
    let courses = state.db.list_courses().await?;
    Ok(Json(courses))
}

/// GET /api/courses/{id}
async fn get_course(
    State(state): State<CatalogRouteState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    match state.db.get_course(id).await? {
        Some(course) => Ok(Json(course).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "not_found"})),
        )
            .into_response()),
    }
}

/// GET /api/enrollments — the caller's enrollments, newest first.
async fn list_enrollments(
    State(state): State<CatalogRouteState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state.db, &headers).await?;
    let enrollments = state.db.list_enrollments(user.id).await?;
    Ok(Json(enrollments))
}

/// Build the catalog REST routes.
pub fn catalog_routes(state: CatalogRouteState) -> Router {
    Router::new()
        .route("/api/courses", get(list_courses))
        .route("/api/courses/{id}", get(get_course))
        .route("/api/enrollments", get(list_enrollments))
        .with_state(state)
}

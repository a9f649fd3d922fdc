//! REST endpoints for the onboarding flow.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::api::{ApiError, authenticate};
use crate::store::Database;

use super::manager::OnboardingManager;
use super::model::{OnboardingProgress, StepResponses};
use super::state::Step;

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct OnboardingRouteState {
    pub db: Arc<dyn Database>,
    pub manager: Arc<OnboardingManager>,
}

/// The progress shape returned to clients.
#[derive(Debug, Serialize)]
pub struct ProgressView {
    pub current_step: Step,
    pub completed: bool,
    pub responses: StepResponses,
}

impl From<OnboardingProgress> for ProgressView {
    fn from(p: OnboardingProgress) -> Self {
        Self {
            current_step: p.current_step,
            completed: p.completed,
            responses: p.responses,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AdvanceRequest {
    step: Step,
    #[serde(default)]
    payload: Value,
}

/// GET /api/onboarding/progress
///
/// The caller's progress record, or 404 if onboarding was never started.
async fn get_progress(
    State(state): State<OnboardingRouteState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state.db, &headers).await?;
    let progress = state.manager.progress(user.id).await?;
    Ok(Json(ProgressView::from(progress)))
}

/// GET /api/onboarding/entry
///
/// Where the caller should land in the flow.
async fn get_entry(
    State(state): State<OnboardingRouteState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state.db, &headers).await?;
    let step = state.manager.entry_step(&user).await?;
    Ok(Json(json!({ "step": step })))
}

/// POST /api/onboarding/advance
///
/// Submit a step payload. 400 with field errors on validation failure,
/// 409 with a redirect target when the step is out of sequence.
async fn post_advance(
    State(state): State<OnboardingRouteState>,
    headers: HeaderMap,
    Json(request): Json<AdvanceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state.db, &headers).await?;
    let progress = state
        .manager
        .advance(&user, request.step, &request.payload)
        .await?;
    Ok(Json(ProgressView::from(progress)))
}

/// POST /api/onboarding/retreat
///
/// Step back one stage, keeping all responses.
async fn post_retreat(
    State(state): State<OnboardingRouteState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state.db, &headers).await?;
    let progress = state.manager.retreat(&user).await?;
    Ok(Json(ProgressView::from(progress)))
}

/// GET /api/onboarding/recommendations
///
/// Ranked course matches for the caller's survey answers.
async fn get_recommendations(
    State(state): State<OnboardingRouteState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state.db, &headers).await?;
    let (recommendations, next_step) = state.manager.recommendations(&user).await?;
    Ok(Json(json!({
        "recommendations": recommendations,
        "next_step": next_step,
    })))
}

/// Build the onboarding REST routes.
pub fn onboarding_routes(state: OnboardingRouteState) -> Router {
    Router::new()
        .route("/api/onboarding/progress", get(get_progress))
        .route("/api/onboarding/entry", get(get_entry))
        .route("/api/onboarding/advance", post(post_advance))
        .route("/api/onboarding/retreat", post(post_retreat))
        .route("/api/onboarding/recommendations", get(get_recommendations))
        .with_state(state)
}

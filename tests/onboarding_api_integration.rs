//! Integration tests for the onboarding REST API.
//!
//! Each test spins up an Axum server on a random port and exercises the
//! real HTTP contract with reqwest.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;
use uuid::Uuid;

use vfx_academy::catalog::routes::{CatalogRouteState, catalog_routes};
use vfx_academy::catalog::{Course, CourseLevel};
use vfx_academy::onboarding::OnboardingManager;
use vfx_academy::onboarding::routes::{OnboardingRouteState, onboarding_routes};
use vfx_academy::ratelimit::{InMemoryRateLimitStore, RateLimiter, rate_limit_middleware};
use vfx_academy::store::{Database, LibSqlBackend};
use vfx_academy::users::User;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Start a server on a random port. `rate_limit` installs the limiter
/// middleware with the given cap.
async fn start_server(rate_limit: Option<u32>) -> (u16, Arc<dyn Database>) {
    let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let manager = Arc::new(OnboardingManager::new(Arc::clone(&db)));

    let mut app = onboarding_routes(OnboardingRouteState {
        db: Arc::clone(&db),
        manager,
    })
    .merge(catalog_routes(CatalogRouteState {
        db: Arc::clone(&db),
    }));

    if let Some(limit) = rate_limit {
        let limiter = RateLimiter::new(
            Arc::new(InMemoryRateLimitStore::new(Duration::from_secs(900))),
            limit,
        );
        app = app.layer(axum::middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ));
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (port, db)
}

/// Seed a user and return it.
async fn seed_user(db: &Arc<dyn Database>) -> User {
    let user = User::new("student@vfx.academy", "hash", "Alice");
    db.insert_user(&user).await.unwrap();
    user
}

/// Seed a beginner course matching the standard test survey.
async fn seed_course(db: &Arc<dyn Database>) -> Course {
    let course = Course {
        id: Uuid::new_v4(),
        title: "Compositing 101".to_string(),
        description: "Node-based compositing from scratch".to_string(),
        level: CourseLevel::Beginner,
        topics: vec!["compositing".to_string()],
        duration_hours: 40,
        total_weeks: 8,
        learning_outcomes: vec!["Get a job as a junior VFX artist".to_string()],
        instructor: "Jane".to_string(),
        category: "vfx".to_string(),
        created_at: Utc::now(),
    };
    db.insert_course(&course).await.unwrap();
    course
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

fn url(port: u16, path: &str) -> String {
    format!("http://127.0.0.1:{port}{path}")
}

async fn advance(
    port: u16,
    user: &User,
    step: &str,
    payload: Value,
) -> reqwest::Response {
    client()
        .post(url(port, "/api/onboarding/advance"))
        .header("x-user-id", user.id.to_string())
        .json(&json!({"step": step, "payload": payload}))
        .send()
        .await
        .unwrap()
}

fn survey_payload() -> Value {
    json!({
        "experience_level": "beginner",
        "interests": ["compositing"],
        "weekly_hours": 10,
        "goals": ["get a job"],
    })
}

#[tokio::test]
async fn unauthenticated_requests_are_401() {
    timeout(TEST_TIMEOUT, async {
        let (port, _db) = start_server(None).await;

        let resp = client()
            .get(url(port, "/api/onboarding/progress"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);

        // Unknown user id is also a 401, not a 500
        let resp = client()
            .get(url(port, "/api/onboarding/progress"))
            .header("x-user-id", Uuid::new_v4().to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn progress_is_404_before_onboarding_starts() {
    timeout(TEST_TIMEOUT, async {
        let (port, db) = start_server(None).await;
        let user = seed_user(&db).await;

        let resp = client()
            .get(url(port, "/api/onboarding/progress"))
            .header("x-user-id", user.id.to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        // But the entry endpoint still resolves to the first step
        let resp = client()
            .get(url(port, "/api/onboarding/entry"))
            .header("x-user-id", user.id.to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["step"], "career_path");
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn short_course_walkthrough() {
    timeout(TEST_TIMEOUT, async {
        let (port, db) = start_server(None).await;
        let user = seed_user(&db).await;
        let course = seed_course(&db).await;

        let resp = advance(port, &user, "career_path", json!({"career_path": "short_course"})).await;
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["current_step"], "survey");

        let resp = advance(port, &user, "survey", survey_payload()).await;
        assert_eq!(resp.status(), 200);

        // Recommendations rank the seeded course with the worked-example score
        let resp = client()
            .get(url(port, "/api/onboarding/recommendations"))
            .header("x-user-id", user.id.to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        let recs = body["recommendations"].as_array().unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0]["score"], 90);
        assert_eq!(body["next_step"], "recommendations");

        let resp = advance(
            port,
            &user,
            "recommendations",
            json!({
                "viewed_recommendations": true,
                "selected_course": course.id.to_string(),
            }),
        )
        .await;
        assert_eq!(resp.status(), 200);

        // Accepting the course shows up under /api/enrollments
        let resp = client()
            .get(url(port, "/api/enrollments"))
            .header("x-user-id", user.id.to_string())
            .send()
            .await
            .unwrap();
        let enrollments: Value = resp.json().await.unwrap();
        assert_eq!(enrollments.as_array().unwrap().len(), 1);
        assert_eq!(enrollments[0]["course_id"], course.id.to_string());

        advance(port, &user, "profile", json!({"display_name": "Alice"})).await;
        let resp = advance(port, &user, "tour", json!({"tour_acknowledged": true})).await;
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["current_step"], "completed");
        assert_eq!(body["completed"], true);

        // Entry now resolves to completed (dashboard redirect)
        let resp = client()
            .get(url(port, "/api/onboarding/entry"))
            .header("x-user-id", user.id.to_string())
            .send()
            .await
            .unwrap();
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["step"], "completed");

        // Progress re-fetch returns exactly what was written
        let resp = client()
            .get(url(port, "/api/onboarding/progress"))
            .header("x-user-id", user.id.to_string())
            .send()
            .await
            .unwrap();
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["current_step"], "completed");
        assert_eq!(body["responses"]["survey"]["weekly_hours"], 10);
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn invalid_payload_returns_field_errors() {
    timeout(TEST_TIMEOUT, async {
        let (port, db) = start_server(None).await;
        let user = seed_user(&db).await;

        advance(port, &user, "career_path", json!({"career_path": "short_course"})).await;

        let mut payload = survey_payload();
        payload["weekly_hours"] = json!(0);
        payload["interests"] = json!([]);
        let resp = advance(port, &user, "survey", payload).await;
        assert_eq!(resp.status(), 400);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "validation_failed");
        assert_eq!(body["step"], "survey");
        let fields: Vec<&str> = body["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"weekly_hours"));
        assert!(fields.contains(&"interests"));
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn deep_link_redirects_to_expected_step() {
    timeout(TEST_TIMEOUT, async {
        let (port, db) = start_server(None).await;
        let user = seed_user(&db).await;

        advance(port, &user, "career_path", json!({"career_path": "short_course"})).await;

        let resp = advance(port, &user, "tour", json!({"tour_acknowledged": true})).await;
        assert_eq!(resp.status(), 409);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "out_of_sequence");
        assert_eq!(body["redirect_to"], "survey");
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn recommendations_before_survey_redirect_there() {
    timeout(TEST_TIMEOUT, async {
        let (port, db) = start_server(None).await;
        let user = seed_user(&db).await;

        advance(port, &user, "career_path", json!({"career_path": "short_course"})).await;

        let resp = client()
            .get(url(port, "/api/onboarding/recommendations"))
            .header("x-user-id", user.id.to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 409);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "prerequisite_missing");
        assert_eq!(body["redirect_to"], "survey");
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn retreat_steps_back_without_losing_responses() {
    timeout(TEST_TIMEOUT, async {
        let (port, db) = start_server(None).await;
        let user = seed_user(&db).await;

        advance(port, &user, "career_path", json!({"career_path": "short_course"})).await;
        advance(port, &user, "survey", survey_payload()).await;

        let resp = client()
            .post(url(port, "/api/onboarding/retreat"))
            .header("x-user-id", user.id.to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["current_step"], "survey");
        assert_eq!(body["responses"]["survey"]["weekly_hours"], 10);
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn catalog_endpoints_serve_courses() {
    timeout(TEST_TIMEOUT, async {
        let (port, db) = start_server(None).await;
        let course = seed_course(&db).await;

        let resp = client().get(url(port, "/api/courses")).send().await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body.as_array().unwrap().len(), 1);

        let resp = client()
            .get(url(port, &format!("/api/courses/{}", course.id)))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["title"], "Compositing 101");

        let resp = client()
            .get(url(port, &format!("/api/courses/{}", Uuid::new_v4())))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn over_limit_requests_get_429() {
    timeout(TEST_TIMEOUT, async {
        let (port, _db) = start_server(Some(3)).await;

        for _ in 0..3 {
            let resp = client().get(url(port, "/api/courses")).send().await.unwrap();
            assert_eq!(resp.status(), 200);
        }
        let resp = client().get(url(port, "/api/courses")).send().await.unwrap();
        assert_eq!(resp.status(), 429);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "rate_limited");
    })
    .await
    .unwrap();
}

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;

use vfx_academy::catalog::routes::{CatalogRouteState, catalog_routes};
use vfx_academy::config::ServerConfig;
use vfx_academy::onboarding::OnboardingManager;
use vfx_academy::onboarding::routes::{OnboardingRouteState, onboarding_routes};
use vfx_academy::ratelimit::{InMemoryRateLimitStore, RateLimiter, rate_limit_middleware};
use vfx_academy::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env();

    eprintln!("🎬 VFX Academy v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/api", config.port);
    eprintln!("   Database: {}", config.db_path);
    eprintln!(
        "   Rate limit: {} requests / {}s window\n",
        config.rate_limit,
        config.rate_window.as_secs()
    );

    // ── Database ─────────────────────────────────────────────────────────
    let db_path = std::path::Path::new(&config.db_path);
    let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_local(db_path).await?);

    // ── Onboarding ───────────────────────────────────────────────────────
    let manager = Arc::new(OnboardingManager::new(Arc::clone(&db)));

    // ── Rate limiting ────────────────────────────────────────────────────
    let limiter = RateLimiter::new(
        Arc::new(InMemoryRateLimitStore::new(config.rate_window)),
        config.rate_limit,
    );

    // ── Router ───────────────────────────────────────────────────────────
    let app = onboarding_routes(OnboardingRouteState {
        db: Arc::clone(&db),
        manager,
    })
    .merge(catalog_routes(CatalogRouteState {
        db: Arc::clone(&db),
    }))
    .layer(axum::middleware::from_fn_with_state(
        limiter,
        rate_limit_middleware,
    ))
    .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Server started");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, security_headers_middleware, trace_id,
};
use crate::routes::{admin, health, notifications, preferences};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        pool,
        config: config.clone(),
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Production: only allow specified origins
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Data routes under the versioned prefix. Every handler here takes
    // the AuthenticatedOwner extractor, so a missing or invalid Bearer
    // token is rejected before any work happens.
    let api_routes = Router::new()
        // Alert rule routes (v1)
        .route("/api/v1/notifications", post(notifications::create_rule))
        .route(
            "/api/v1/notifications/user/:owner_id",
            get(notifications::list_rules),
        )
        .route(
            "/api/v1/notifications/user/:owner_id/active",
            get(notifications::list_active_rules),
        )
        .route(
            "/api/v1/notifications/user/:owner_id/stats",
            get(notifications::rule_stats),
        )
        .route(
            "/api/v1/notifications/:rule_id",
            get(notifications::get_rule)
                .put(notifications::update_rule)
                .delete(notifications::delete_rule),
        )
        .route(
            "/api/v1/notifications/:rule_id/activate",
            put(notifications::activate_rule),
        )
        .route(
            "/api/v1/notifications/:rule_id/deactivate",
            put(notifications::deactivate_rule),
        )
        // Preference routes (v1)
        .route(
            "/api/v1/preferences",
            get(preferences::list_preferences).post(preferences::upsert_preferences),
        )
        .route(
            "/api/v1/preferences/stats",
            get(preferences::preference_stats),
        )
        .route(
            "/api/v1/preferences/:owner_id",
            get(preferences::get_preferences)
                .put(preferences::update_preferences)
                .delete(preferences::delete_preferences),
        )
        .route(
            "/api/v1/preferences/:owner_id/sensor",
            get(preferences::preferred_sensor),
        )
        // Admin routes (v1)
        .route(
            "/api/v1/admin/reconciliation/run",
            post(admin::run_reconciliation),
        )
        .route(
            "/api/v1/admin/accounts/:owner_id",
            delete(admin::delete_account),
        );

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware)) // Security headers
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware)) // Prometheus metrics
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id)) // Request ID and logging
        .layer(cors)
        .with_state(state)
}

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AuthConfig;
use crate::middleware::{guard_middleware, RoleRequirement};
use crate::models::Role;
use crate::services::{AuthService, EmailProvider, JwtService, MongoDb};
use service_core::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub db: MongoDb,
    pub email: Arc<dyn EmailProvider>,
    pub jwt: JwtService,
    pub auth_service: AuthService,
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Example protected route: token required, admin role only
    let admin_routes = Router::new()
        .route("/auth/admin-only", get(handlers::protected::admin_only))
        .layer(from_fn_with_state(
            RoleRequirement::new(state.jwt.clone(), vec![Role::Admin]),
            guard_middleware,
        ));

    let allowed_origins: Vec<HeaderValue> = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();

    let app = Router::new()
        .route("/health", get(health_check))
        // Authentication routes
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/send-otp", post(handlers::auth::send_otp))
        .route("/auth/verify-otp", post(handlers::auth::verify_otp))
        .merge(admin_routes)
        .with_state(state)
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add CORS layer
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        );

    Ok(app)
}

/// Service health check
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.db.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "MongoDB health check failed");
        e
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "mongodb": "up"
        }
    })))
}

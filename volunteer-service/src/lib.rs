pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::services::{AuthService, AuthStore, JwtService, OtpService, TokenDenylist};
use relief_core::error::AppError;
use relief_core::middleware::rate_limit::{ip_rate_limit_middleware, IpRateLimiter};
use relief_core::middleware::security_headers::security_headers_middleware;
use relief_core::middleware::tracing::request_id_middleware;

#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    pub store: Arc<dyn AuthStore>,
    pub denylist: Arc<dyn TokenDenylist>,
    pub jwt: Arc<JwtService>,
    pub auth_service: Arc<AuthService>,
    pub otp_service: Arc<OtpService>,
    pub login_rate_limiter: IpRateLimiter,
    pub otp_rate_limiter: IpRateLimiter,
    pub ip_rate_limiter: IpRateLimiter,
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Credential-guessing surfaces get their own, tighter limiters.
    let login_route = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let otp_routes = Router::new()
        .route("/auth/otp/request", post(handlers::otp::request_otp))
        .layer(from_fn_with_state(
            state.otp_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let protected_routes = Router::new()
        .route("/auth/logout", post(handlers::auth::logout))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_methods(tower_http::cors::AllowMethods::any())
        .allow_headers(tower_http::cors::AllowHeaders::any());
    let cors = if state.config.security.allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(tower_http::cors::AllowOrigin::any())
    } else {
        let origins = state
            .config
            .security
            .allowed_origins
            .iter()
            .map(|origin| {
                origin.parse::<HeaderValue>().map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("Invalid origin {}: {}", origin, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        cors.allow_origin(origins)
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/otp/verify", post(handlers::otp::verify_otp))
        // List and delete are public like the rest of the volunteer
        // surface; attach authenticates via the AuthAccount extractor.
        .route(
            "/volunteers",
            get(handlers::volunteer::list_volunteers)
                .post(handlers::volunteer::create_volunteer),
        )
        .route(
            "/volunteers/:id",
            delete(handlers::volunteer::delete_volunteer),
        )
        .route("/check_user", post(handlers::volunteer::check_user))
        .merge(login_route)
        .merge(otp_routes)
        .merge(protected_routes)
        .layer(from_fn_with_state(
            state.ip_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(app)
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub cache: String,
}

/// GET /health
///
/// Reports dependency status; degraded dependencies flip the overall
/// status without failing the request.
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<HealthResponse> {
    let database = match state.store.health_check().await {
        Ok(()) => "up",
        Err(_) => "down",
    };
    let cache = match state.denylist.health_check().await {
        Ok(()) => "up",
        Err(_) => "down",
    };
    let status = if database == "up" && cache == "up" {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        database: database.to_string(),
        cache: cache.to_string(),
    })
}

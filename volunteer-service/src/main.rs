use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

use relief_core::middleware::rate_limit::create_ip_rate_limiter;
use relief_core::observability::logging::init_tracing;
use volunteer_service::{
    build_router,
    config::ServiceConfig,
    services::{
        AuthService, ConsoleSms, HttpSms, JwtService, OtpService, PgStore, RedisDenylist,
        SmsProvider,
    },
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), relief_core::error::AppError> {
    // Load configuration, fail fast if invalid
    let config = ServiceConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting volunteer service"
    );

    let pool = volunteer_service::db::create_pool(&config.database).await?;
    volunteer_service::db::run_migrations(&pool)
        .await
        .map_err(|e| relief_core::error::AppError::DatabaseError(anyhow::anyhow!(e)))?;
    tracing::info!("Database initialized");

    let store = Arc::new(PgStore::new(pool));

    let denylist = Arc::new(
        RedisDenylist::connect(&config.redis.url)
            .await
            .map_err(relief_core::error::AppError::InternalError)?,
    );
    tracing::info!("Denylist initialized");

    let sms: Arc<dyn SmsProvider> = match &config.sms.gateway_url {
        Some(url) => Arc::new(HttpSms::new(url.clone(), &config.sms)),
        None => {
            tracing::warn!("No SMS gateway configured; codes will be logged");
            Arc::new(ConsoleSms)
        }
    };

    let jwt = Arc::new(JwtService::new(&config.jwt));

    let auth_service = Arc::new(AuthService::new(
        store.clone(),
        denylist.clone(),
        jwt.clone(),
    ));
    let otp_service = Arc::new(OtpService::new(
        store.clone(),
        sms.clone(),
        config.otp.ttl_minutes,
    ));

    let login_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.login_attempts,
        config.rate_limit.login_window_seconds,
    );
    let otp_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.otp_request_attempts,
        config.rate_limit.otp_request_window_seconds,
    );
    let ip_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.global_ip_limit,
        config.rate_limit.global_ip_window_seconds,
    );

    let state = AppState {
        config: config.clone(),
        store,
        denylist,
        jwt,
        auth_service,
        otp_service,
        login_rate_limiter,
        otp_rate_limiter,
        ip_rate_limiter,
    };

    let app = build_router(state).await?;

    let addr = config.common.socket_addr()?;
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}

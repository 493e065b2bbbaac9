use auth_service::{
    build_router,
    config::AuthConfig,
    services::{AuthService, EmailService, JwtService, MongoDb, OtpService},
    AppState,
};
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(&config.service_name, &config.common.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting authentication service"
    );

    // Initialize database connection
    tracing::info!("Initializing database connection");
    let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database).await?;

    // Unique email indexes back the store-level invariants; refuse to
    // serve without them
    db.initialize_indexes().await?;
    tracing::info!("Database initialized successfully");

    // Initialize email service
    let email = EmailService::new(&config.smtp)?;
    let email = std::sync::Arc::new(email);
    tracing::info!("Email service initialized");

    // Initialize JWT service
    let jwt = JwtService::new(&config.jwt)?;
    tracing::info!("JWT service initialized");

    // Initialize services
    let otp = OtpService::new(db.clone(), config.otp.ttl_minutes);
    let auth_service = AuthService::new(db.clone(), email.clone(), jwt.clone(), otp);

    // Create application state
    let state = AppState {
        config: config.clone(),
        db,
        email,
        jwt,
        auth_service,
    };

    // Build application router
    let app = build_router(state).await?;

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

//! Test helper module for auth-service integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use auth_service::{
    config::{
        AuthConfig, Environment, JwtConfig, MongoConfig, OtpConfig, SecurityConfig, SmtpConfig,
    },
    services::{AuthService, EmailProvider, JwtService, MongoDb, OtpService},
    AppState,
};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use service_core::config as core_config;
use service_core::error::AppError;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789";

/// Email provider that records every OTP code instead of sending it.
#[derive(Clone, Default)]
pub struct RecordingEmailService {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingEmailService {
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl EmailProvider for RecordingEmailService {
    async fn send_otp_email(
        &self,
        to_email: &str,
        code: &str,
        _ttl_minutes: i64,
    ) -> Result<(), AppError> {
        self.sent
            .lock()
            .unwrap()
            .push((to_email.to_string(), code.to_string()));
        Ok(())
    }
}

/// Email provider whose every delivery fails.
#[derive(Clone)]
pub struct FailingEmailService;

#[async_trait]
impl EmailProvider for FailingEmailService {
    async fn send_otp_email(
        &self,
        _to_email: &str,
        _code: &str,
        _ttl_minutes: i64,
    ) -> Result<(), AppError> {
        Err(AppError::DeliveryFailed("SMTP relay refused".to_string()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub email: RecordingEmailService,
}

impl TestApp {
    /// Build the application with a lazily connecting MongoDB client.
    ///
    /// The driver does not touch the server until a query runs, so tests
    /// that never hit the store (guard behavior, validation) run without
    /// any infrastructure.
    pub async fn spawn() -> Self {
        Self::spawn_inner(format!("auth_test_{}", uuid::Uuid::new_v4().simple())).await
    }

    /// Same, but with the unique-email indexes created up front. Requires
    /// a running MongoDB at `MONGODB_URI` (default localhost).
    pub async fn spawn_with_store() -> Self {
        let app = Self::spawn().await;
        app.state
            .db
            .initialize_indexes()
            .await
            .expect("Failed to create indexes; is MongoDB running?");
        app
    }

    async fn spawn_inner(database: String) -> Self {
        let config = test_config(database);

        let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .expect("Failed to create MongoDB client");

        let email = RecordingEmailService::default();
        let jwt = JwtService::new(&config.jwt).expect("Failed to create JWT service");
        let otp = OtpService::new(db.clone(), config.otp.ttl_minutes);
        let auth_service = AuthService::new(
            db.clone(),
            Arc::new(email.clone()),
            jwt.clone(),
            otp,
        );

        let state = AppState {
            config,
            db,
            email: Arc::new(email.clone()),
            jwt,
            auth_service,
        };

        let router = auth_service::build_router(state.clone())
            .await
            .expect("Failed to build router");

        Self {
            router,
            state,
            email,
        }
    }

    pub fn otp_service(&self) -> OtpService {
        OtpService::new(self.state.db.clone(), self.state.config.otp.ttl_minutes)
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        send(self.router.clone(), request).await
    }

    pub async fn get_with_token(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = builder.body(Body::empty()).unwrap();

        send(self.router.clone(), request).await
    }

    /// Drop the throwaway test database.
    pub async fn cleanup(&self) {
        let _ = self
            .state
            .db
            .users()
            .drop(None)
            .await;
        let _ = self
            .state
            .db
            .otp_challenges()
            .drop(None)
            .await;
    }
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes();

    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}

fn test_config(database: String) -> AuthConfig {
    AuthConfig {
        common: core_config::Config {
            port: 0,
            log_level: "info".to_string(),
        },
        environment: Environment::Dev,
        service_name: "auth-service".to_string(),
        service_version: "test".to_string(),
        mongodb: MongoConfig {
            uri: std::env::var("MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            database,
        },
        smtp: SmtpConfig {
            host: "smtp.gmail.com".to_string(),
            user: "test@example.com".to_string(),
            password: "test_password".to_string(),
            from: "test@example.com".to_string(),
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            token_expiry_hours: 24,
        },
        otp: OtpConfig { ttl_minutes: 10 },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    }
}

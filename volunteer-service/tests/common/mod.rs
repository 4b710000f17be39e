//! Test helpers: an in-memory application with captured SMS delivery.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use relief_core::middleware::rate_limit::create_ip_rate_limiter;
use volunteer_service::{
    build_router,
    config::{
        DatabaseConfig, Environment, JwtConfig, OtpConfig, RateLimitConfig, RedisConfig,
        SecurityConfig, ServiceConfig, SmsConfig,
    },
    services::{
        AuthService, AuthStore, InMemoryStore, JwtService, MockDenylist, MockSms, OtpService,
    },
    AppState,
};

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub denylist: Arc<MockDenylist>,
    pub sms: Arc<MockSms>,
}

pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        common: relief_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "volunteer-service".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "info".to_string(),
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        redis: RedisConfig {
            url: "redis://unused".to_string(),
        },
        jwt: JwtConfig {
            secret: "integration-test-secret-key-32-bytes!".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        },
        otp: OtpConfig { ttl_minutes: 5 },
        sms: SmsConfig {
            gateway_url: None,
            api_key: String::new(),
            sender_id: "RELIEF".to_string(),
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        rate_limit: RateLimitConfig {
            login_attempts: 1000,
            login_window_seconds: 60,
            otp_request_attempts: 1000,
            otp_request_window_seconds: 60,
            global_ip_limit: 10_000,
            global_ip_window_seconds: 60,
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let config = test_config();
        let store = Arc::new(InMemoryStore::new());
        let denylist = Arc::new(MockDenylist::new());
        let sms = Arc::new(MockSms::new());
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

        let state = AppState {
            login_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.login_attempts,
                config.rate_limit.login_window_seconds,
            ),
            otp_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.otp_request_attempts,
                config.rate_limit.otp_request_window_seconds,
            ),
            ip_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.global_ip_limit,
                config.rate_limit.global_ip_window_seconds,
            ),
            config,
            store: store.clone(),
            denylist: denylist.clone(),
            jwt,
            auth_service,
            otp_service,
        };

        let router = build_router(state).await.expect("router builds");

        Self {
            router,
            store,
            denylist,
            sms,
        }
    }

    pub async fn post_json(&self, path: &str, body: Value) -> Response<Body> {
        self.request(Method::POST, path, Some(body), None).await
    }

    pub async fn post_json_authed(
        &self,
        path: &str,
        body: Value,
        token: &str,
    ) -> Response<Body> {
        self.request(Method::POST, path, Some(body), Some(token))
            .await
    }

    pub async fn get_authed(&self, path: &str, token: &str) -> Response<Body> {
        self.request(Method::GET, path, None, Some(token)).await
    }

    pub async fn delete(&self, path: &str) -> Response<Body> {
        self.request(Method::DELETE, path, None, None).await
    }

    pub async fn get(&self, path: &str) -> Response<Body> {
        self.request(Method::GET, path, None, None).await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("request builds"))
            .await
            .expect("request completes")
    }

    /// Register an account and verify its phone number through the OTP
    /// endpoints. Returns the delivered code's phone.
    pub async fn register_and_verify(&self, username: &str, phone: &str) {
        let response = self
            .post_json(
                "/auth/register",
                serde_json::json!({
                    "name": "Asha Rao",
                    "username": username,
                    "phone_number": phone,
                    "password": "hunter2hunter2",
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = self
            .post_json("/auth/otp/request", serde_json::json!({ "phone_number": phone }))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let code = self.stored_otp_code(phone).await;
        let response = self
            .post_json(
                "/auth/otp/verify",
                serde_json::json!({ "phone_number": phone, "otp": code }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    pub async fn login(&self, username: &str) -> (String, String) {
        let response = self
            .post_json(
                "/auth/login",
                serde_json::json!({ "username": username, "password": "hunter2hunter2" }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn stored_otp_code(&self, phone: &str) -> String {
        self.store
            .find_otp(phone)
            .await
            .unwrap()
            .expect("OTP record exists")
            .code
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

//! Shared harness for org-service integration tests.
//!
//! Builds the real router over the in-memory datastore and mock token cache.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use org_service::{
    build_router,
    config::{
        Environment, JwtConfig, MongoConfig, OrgConfig, RedisConfig, SecurityConfig,
        SwaggerConfig, SwaggerMode,
    },
    services::{InMemoryDatastore, JwtService, MockTokenCache},
    AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_PASSWORD: &str = "password123";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub db: Arc<InMemoryDatastore>,
    pub cache: Arc<MockTokenCache>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub fn test_config() -> OrgConfig {
    OrgConfig {
        common: service_core::config::Config { port: 0 },
        environment: Environment::Dev,
        service_name: "org-service".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        request_timeout_seconds: 10,
        mongodb: MongoConfig {
            uri: "mongodb://unused".to_string(),
            database: "unused".to_string(),
        },
        redis: RedisConfig {
            url: "redis://unused".to_string(),
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_token_lifespan_hours: 1,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        swagger: SwaggerConfig {
            enabled: SwaggerMode::Public,
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(test_config()).await
    }

    pub async fn spawn_with(config: OrgConfig) -> Self {
        let db = Arc::new(InMemoryDatastore::new());
        let cache = Arc::new(MockTokenCache::new());
        let jwt = JwtService::new(&config.jwt).expect("Failed to create JWT service");

        let state = AppState::new(config, db.clone(), cache.clone(), jwt, None);
        let router = build_router(state.clone())
            .await
            .expect("Failed to build router");

        Self {
            router,
            state,
            db,
            cache,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse { status, body }
    }

    pub async fn signup(&self, name: &str, email: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/signup",
            Some(json!({ "name": name, "email": email, "password": TEST_PASSWORD })),
            None,
        )
        .await
    }

    pub async fn signin(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/signin",
            Some(json!({ "email": email, "password": password })),
            None,
        )
        .await
    }

    /// Registers and signs in, returning `(access_token, refresh_token)`.
    pub async fn login_new_user(&self, email: &str) -> (String, String) {
        let res = self.signup("Test User", email).await;
        assert_eq!(res.status, StatusCode::CREATED, "signup failed: {}", res.body);

        let res = self.signin(email, TEST_PASSWORD).await;
        assert_eq!(res.status, StatusCode::OK, "signin failed: {}", res.body);

        (
            res.body["access_token"].as_str().unwrap().to_string(),
            res.body["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn create_organization(&self, token: &str, name: &str) -> String {
        let res = self
            .request(
                Method::POST,
                "/organization",
                Some(json!({ "name": name, "description": "Test organization" })),
                Some(token),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "create failed: {}", res.body);
        res.body["organization_id"].as_str().unwrap().to_string()
    }
}

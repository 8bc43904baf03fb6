pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{OrgConfig, SwaggerMode};
use crate::services::{AuthService, Datastore, JwtService, OrganizationService, TokenCache};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::signup,
        handlers::auth::signin,
        handlers::auth::refresh_token,
        handlers::auth::revoke_token,
        handlers::organization::create_organization,
        handlers::organization::list_organizations,
        handlers::organization::get_organization,
        handlers::organization::update_organization,
        handlers::organization::delete_organization,
        handlers::organization::invite_user,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::auth::SignupRequest,
            dtos::auth::SignupResponse,
            dtos::auth::InsertedId,
            dtos::auth::SigninRequest,
            dtos::auth::RefreshRequest,
            dtos::auth::TokenPairResponse,
            dtos::organization::CreateOrganizationRequest,
            dtos::organization::CreatedOrganizationResponse,
            dtos::organization::UpdateOrganizationRequest,
            dtos::organization::InviteRequest,
            dtos::organization::OrganizationResponse,
            models::Member,
            models::AccessLevel,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Sign-up, sign-in and token lifecycle"),
        (name = "Organizations", description = "Organization management and invitations"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: OrgConfig,
    pub db: Arc<dyn Datastore>,
    pub cache: Arc<dyn TokenCache>,
    pub jwt: JwtService,
    pub auth_service: AuthService,
    pub org_service: OrganizationService,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wires the services over the given store and cache.
    pub fn new(
        config: OrgConfig,
        db: Arc<dyn Datastore>,
        cache: Arc<dyn TokenCache>,
        jwt: JwtService,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let auth_service = AuthService::new(db.clone(), jwt.clone(), cache.clone());
        let org_service = OrganizationService::new(db.clone());
        Self {
            config,
            db,
            cache,
            jwt,
            auth_service,
            org_service,
            metrics,
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    let protected = Router::new()
        .route(
            "/organization",
            post(handlers::create_organization).get(handlers::list_organizations),
        )
        .route(
            "/organization/:organization_id",
            get(handlers::get_organization)
                .put(handlers::update_organization)
                .delete(handlers::delete_organization),
        )
        .route(
            "/organization/:organization_id/invite",
            post(handlers::invite_user),
        )
        .route("/revoke-token", post(handlers::revoke_token))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics))
        .route("/signup", post(handlers::signup))
        .route("/signin", post(handlers::signin))
        .route("/refresh-token", post(handlers::refresh_token))
        .merge(protected);

    app = match state.config.swagger.enabled {
        SwaggerMode::Public => {
            app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()))
        }
        SwaggerMode::Disabled => app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        ),
    };

    let timeout = Duration::from_secs(state.config.request_timeout_seconds);
    let cors = cors_layer(&state.config.security.allowed_origins);

    let app = app
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors);

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "A dependency is unreachable")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.db.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "MongoDB health check failed");
        AppError::ServiceUnavailable
    })?;

    state.cache.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Redis health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "mongodb": "up",
            "redis": "up"
        }
    })))
}

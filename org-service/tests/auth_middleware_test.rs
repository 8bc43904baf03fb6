mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::Utc;
use common::{TestApp, TEST_SECRET};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use org_service::services::{TokenClaims, TokenType};
use tower::ServiceExt;

fn signed_claims(secret: &str, exp_offset_seconds: i64) -> String {
    signed_claims_of_type(secret, TokenType::Access, exp_offset_seconds)
}

fn signed_claims_of_type(secret: &str, token_type: TokenType, exp_offset_seconds: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = TokenClaims {
        user_id: "user_123".to_string(),
        email: "test@example.com".to_string(),
        authorized: true,
        token_type,
        exp: now + exp_offset_seconds,
        iat: now,
        jti: uuid::Uuid::new_v4().to_string(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = TestApp::spawn().await;

    let res = app.request(Method::GET, "/organization", None, None).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "Unauthorized");
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let app = TestApp::spawn().await;
    let token = signed_claims(TEST_SECRET, -60);

    let res = app
        .request(Method::GET, "/organization", None, Some(&token))
        .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_other_secret_is_unauthorized() {
    let app = TestApp::spawn().await;
    let token = signed_claims("some-other-secret", 3600);

    let res = app
        .request(Method::GET, "/organization", None, Some(&token))
        .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() {
    let app = TestApp::spawn().await;
    let token = signed_claims_of_type(TEST_SECRET, TokenType::Refresh, 3600);

    let res = app
        .request(Method::GET, "/organization", None, Some(&token))
        .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "Unauthorized");
}

#[tokio::test]
async fn valid_token_in_header_is_accepted() {
    let app = TestApp::spawn().await;
    let token = signed_claims(TEST_SECRET, 3600);

    let res = app
        .request(Method::GET, "/organization", None, Some(&token))
        .await;

    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn token_query_parameter_is_accepted() {
    let app = TestApp::spawn().await;
    let token = signed_claims(TEST_SECRET, 3600);

    let res = app
        .request(
            Method::GET,
            &format!("/organization?token={}", token),
            None,
            None,
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn query_parameter_wins_over_header() {
    let app = TestApp::spawn().await;
    let good = signed_claims(TEST_SECRET, 3600);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/organization?token=garbage")
        .header(header::AUTHORIZATION, format!("Bearer {}", good))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn any_authorization_scheme_is_accepted() {
    let app = TestApp::spawn().await;
    let token = signed_claims(TEST_SECRET, 3600);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/organization")
        .header(header::AUTHORIZATION, format!("Token {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn public_routes_do_not_require_token() {
    let app = TestApp::spawn().await;

    let res = app.signup("John Doe", "john@example.com").await;

    assert_eq!(res.status, StatusCode::CREATED);
}

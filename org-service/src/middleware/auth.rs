use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use service_core::error::AppError;

use crate::{services::TokenClaims, AppState};

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Finds the access token: the `token` query parameter wins, otherwise the
/// second word of `Authorization: <scheme> <token>`.
pub fn extract_token(headers: &HeaderMap, query: Option<&str>) -> Option<String> {
    let from_query = query
        .and_then(|q| serde_urlencoded::from_str::<TokenQuery>(q).ok())
        .and_then(|q| q.token)
        .filter(|token| !token.is_empty());
    if from_query.is_some() {
        return from_query;
    }

    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_scheme), Some(token), None) if !token.is_empty() => Some(token.to_string()),
        _ => None,
    }
}

/// Rejects the request with 401 unless it carries a valid access token.
/// Validation is stateless: signature, expiry and token type only.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(req.headers(), req.uri().query())
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Unauthorized")))?;

    let claims = state.jwt.validate_access_token(&token).map_err(|e| {
        tracing::debug!(error = %e, expired = e.is_expired(), "Access token rejected");
        AppError::Unauthorized(anyhow::anyhow!("Unauthorized"))
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Claims of the authenticated caller, placed by `auth_middleware`.
pub struct AuthUser(pub TokenClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<TokenClaims>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Auth claims missing from request extensions"
            ))
        })?;

        Ok(AuthUser(claims.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn reads_token_from_authorization_header() {
        assert_eq!(
            extract_token(&headers("Bearer abc.def.ghi"), None).as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn accepts_any_scheme() {
        assert_eq!(
            extract_token(&headers("Token xyz"), None).as_deref(),
            Some("xyz")
        );
    }

    #[test]
    fn query_parameter_takes_precedence() {
        assert_eq!(
            extract_token(&headers("Bearer from-header"), Some("a=1&token=from-query")).as_deref(),
            Some("from-query")
        );
    }

    #[test]
    fn empty_query_token_falls_back_to_header() {
        assert_eq!(
            extract_token(&headers("Bearer from-header"), Some("token=")).as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn malformed_header_yields_nothing() {
        assert!(extract_token(&headers("Bearer"), None).is_none());
        assert!(extract_token(&headers("Bearer a b"), None).is_none());
        assert!(extract_token(&HeaderMap::new(), None).is_none());
    }
}

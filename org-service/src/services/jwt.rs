use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::JwtConfig;

/// Refresh tokens live for a fixed 30 days regardless of configuration.
pub const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 30;

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token configuration error: {0}")]
    Config(String),

    #[error("Token signing secret is not configured")]
    MissingSecret,

    #[error("Failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error("Invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("Token is not authorized")]
    NotAuthorized,

    #[error("Expected {expected} token, got {actual} token")]
    WrongType {
        expected: TokenType,
        actual: TokenType,
    },
}

impl TokenError {
    pub fn is_expired(&self) -> bool {
        matches!(self, TokenError::Invalid(e) if matches!(e.kind(), ErrorKind::ExpiredSignature))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims carried by both access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: String,
    pub email: String,
    pub authorized: bool,
    pub token_type: TokenType,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Unique per token
    pub jti: String,
}

impl TokenClaims {
    fn new(user_id: &str, email: &str, token_type: TokenType, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            email: email.to_string(),
            authorized: true,
            token_type,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// Who a token was issued to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and validates HMAC-signed tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_lifespan_hours: i64,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("keys", &"[hidden]")
            .field(
                "access_token_lifespan_hours",
                &self.access_token_lifespan_hours,
            )
            .finish()
    }
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, TokenError> {
        if config.access_token_lifespan_hours <= 0 {
            return Err(TokenError::Config(format!(
                "access token lifespan must be positive, got {}",
                config.access_token_lifespan_hours
            )));
        }
        if config.secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        tracing::info!(
            lifespan_hours = config.access_token_lifespan_hours,
            "JWT service initialized with HS256 secret"
        );

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_token_lifespan_hours: config.access_token_lifespan_hours,
        })
    }

    /// Signs a fresh access/refresh pair for the given identity.
    pub fn issue_token_pair(&self, user_id: &str, email: &str) -> Result<TokenPair, TokenError> {
        let access = TokenClaims::new(
            user_id,
            email,
            TokenType::Access,
            Duration::hours(self.access_token_lifespan_hours),
        );
        let refresh = TokenClaims::new(
            user_id,
            email,
            TokenType::Refresh,
            Duration::days(REFRESH_TOKEN_LIFETIME_DAYS),
        );

        Ok(TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
        })
    }

    /// Checks signature, algorithm family and expiry, and returns the claims.
    ///
    /// A token is expired from the second its `exp` is reached; there is no leeway.
    pub fn validate_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.leeway = 0;

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &validation)?.claims;

        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Invalid(ErrorKind::ExpiredSignature.into()));
        }
        if !claims.authorized {
            return Err(TokenError::NotAuthorized);
        }

        Ok(claims)
    }

    /// Validates the token and requires it to be an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.validate_token_of_type(token, TokenType::Access)
    }

    /// Validates a refresh token and issues a new pair for the same identity.
    pub fn refresh_token_pair(&self, refresh_token: &str) -> Result<TokenPair, TokenError> {
        let claims = self.validate_token_of_type(refresh_token, TokenType::Refresh)?;
        self.issue_token_pair(&claims.user_id, &claims.email)
    }

    fn validate_token_of_type(
        &self,
        token: &str,
        expected: TokenType,
    ) -> Result<TokenClaims, TokenError> {
        let claims = self.validate_token(token)?;
        if claims.token_type != expected {
            return Err(TokenError::WrongType {
                expected,
                actual: claims.token_type,
            });
        }
        Ok(claims)
    }

    /// Reads the identity out of a token that was already validated upstream.
    /// Neither the signature nor the expiry is checked here.
    pub fn extract_identity(&self, token: &str) -> Result<Identity, TokenError> {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Ok(decode::<Identity>(token, &self.decoding_key, &validation)?.claims)
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }
}

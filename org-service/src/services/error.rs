use service_core::error::AppError;
use thiserror::Error;

use super::jwt::TokenError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Cache error: {0}")]
    Cache(anyhow::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Token error: {0}")]
    Token(TokenError),

    #[error("Invalid or expired refresh token")]
    InvalidToken,

    #[error("Refresh token has been revoked")]
    RefreshTokenRevoked,

    #[error("User with this email already exists")]
    EmailAlreadyRegistered,

    #[error("User with this email does not exist")]
    UnknownEmail,

    #[error("Password is incorrect")]
    IncorrectPassword,

    #[error("Organization not found")]
    OrganizationNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("User is already a member of the organization")]
    DuplicateMember,
}

/// Signing and configuration failures are server faults; anything else
/// means the presented token is unusable.
impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Config(_) | TokenError::MissingSecret | TokenError::Signing(_) => {
                ServiceError::Token(err)
            }
            TokenError::Invalid(_) | TokenError::NotAuthorized | TokenError::WrongType { .. } => {
                ServiceError::InvalidToken
            }
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Cache(e) | ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::Token(e) => AppError::InternalError(anyhow::Error::new(e)),
            ServiceError::EmailAlreadyRegistered => AppError::Conflict(anyhow::anyhow!(message)),
            ServiceError::OrganizationNotFound => AppError::NotFound(anyhow::anyhow!(message)),
            ServiceError::InvalidToken
            | ServiceError::RefreshTokenRevoked
            | ServiceError::UnknownEmail
            | ServiceError::IncorrectPassword
            | ServiceError::UserNotFound
            | ServiceError::DuplicateMember => AppError::BadRequest(anyhow::anyhow!(message)),
        }
    }
}

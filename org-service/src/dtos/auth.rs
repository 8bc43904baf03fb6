use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::services::TokenPair;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "John Doe")]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    #[schema(example = "john@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InsertedId {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub inserted_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignupResponse {
    #[schema(example = 201)]
    pub status: u16,
    #[schema(example = "success")]
    pub message: String,
    pub data: InsertedId,
}

impl SignupResponse {
    pub fn created(user_id: String) -> Self {
        Self {
            status: 201,
            message: "success".to_string(),
            data: InsertedId {
                inserted_id: user_id,
            },
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SigninRequest {
    #[validate(email(message = "Invalid email address"))]
    #[schema(example = "john@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "Authentication successful")]
    pub message: String,
}

impl TokenPairResponse {
    pub fn new(pair: TokenPair, message: &str) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            message: message.to_string(),
        }
    }
}

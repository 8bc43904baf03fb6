use std::sync::Arc;

use crate::{
    dtos::auth::{SigninRequest, SignupRequest},
    models::User,
    services::{
        jwt::REFRESH_TOKEN_LIFETIME_DAYS, Datastore, JwtService, ServiceError, TokenCache,
        TokenPair,
    },
    utils::{hash_password, verify_password, Password, PasswordHashString},
};

const REFRESH_TOKEN_TTL_SECONDS: i64 = REFRESH_TOKEN_LIFETIME_DAYS * 24 * 60 * 60;

#[derive(Clone)]
pub struct AuthService {
    db: Arc<dyn Datastore>,
    jwt: JwtService,
    cache: Arc<dyn TokenCache>,
}

impl AuthService {
    pub fn new(db: Arc<dyn Datastore>, jwt: JwtService, cache: Arc<dyn TokenCache>) -> Self {
        Self { db, jwt, cache }
    }

    /// Creates the account and returns its id.
    pub async fn register(&self, req: SignupRequest) -> Result<String, ServiceError> {
        if self.db.find_user_by_email(&req.email).await?.is_some() {
            return Err(ServiceError::EmailAlreadyRegistered);
        }

        let password = Password::new(req.password);
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))?
            .map_err(ServiceError::Internal)?;

        let user = User::new(req.name, req.email, password_hash.into_string());
        // The unique index still catches a signup racing this one.
        self.db.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.id)
    }

    /// Checks the credentials and returns the stored user.
    pub async fn authenticate(&self, email: &str, password: String) -> Result<User, ServiceError> {
        let user = self
            .db
            .find_user_by_email(email)
            .await?
            .ok_or(ServiceError::UnknownEmail)?;

        let password = Password::new(password);
        let stored = PasswordHashString::new(user.password_hash.clone());
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))?
            .map_err(ServiceError::Internal)?;

        if !matches {
            tracing::warn!(user_id = %user.id, "Sign-in rejected: incorrect password");
            return Err(ServiceError::IncorrectPassword);
        }

        Ok(user)
    }

    pub async fn login(&self, req: SigninRequest) -> Result<TokenPair, ServiceError> {
        let user = self.authenticate(&req.email, req.password).await?;

        let pair = self.jwt.issue_token_pair(&user.id, &user.email)?;
        self.store_refresh_token(&user.id, &pair.refresh_token).await?;

        tracing::info!(user_id = %user.id, "User signed in");
        Ok(pair)
    }

    /// Exchanges a refresh token for a new pair. Only the most recently
    /// issued refresh token of a user is accepted; it is rotated out here
    /// with a compare-and-swap, so concurrent refreshes cannot both win.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ServiceError> {
        let pair = self.jwt.refresh_token_pair(refresh_token)?;
        let identity = self.jwt.extract_identity(refresh_token)?;

        let rotated = self
            .cache
            .rotate_refresh_token(
                &identity.user_id,
                refresh_token,
                &pair.refresh_token,
                REFRESH_TOKEN_TTL_SECONDS,
            )
            .await
            .map_err(ServiceError::Cache)?;

        if !rotated {
            tracing::warn!(user_id = %identity.user_id, "Refresh token not current for user");
            return Err(ServiceError::RefreshTokenRevoked);
        }

        tracing::info!(user_id = %identity.user_id, "Token refreshed for user");
        Ok(pair)
    }

    /// Invalidates every outstanding refresh token of the user. Access
    /// tokens remain valid until they expire.
    pub async fn revoke(&self, user_id: &str) -> Result<(), ServiceError> {
        self.cache
            .revoke_refresh_token(user_id)
            .await
            .map_err(ServiceError::Cache)?;

        tracing::info!(user_id = %user_id, "Refresh token revoked");
        Ok(())
    }

    async fn store_refresh_token(&self, user_id: &str, token: &str) -> Result<(), ServiceError> {
        self.cache
            .set_refresh_token(user_id, token, REFRESH_TOKEN_TTL_SECONDS)
            .await
            .map_err(ServiceError::Cache)
    }
}

//! Business logic for authentication, token handling and organizations.

pub mod auth;
mod database;
pub mod error;
pub mod jwt;
pub mod organization;
pub mod redis;

pub use auth::AuthService;
pub use database::{Datastore, InMemoryDatastore, MongoDb};
pub use error::ServiceError;
pub use jwt::{Identity, JwtService, TokenClaims, TokenError, TokenPair, TokenType};
pub use organization::OrganizationService;
pub use self::redis::{MockTokenCache, RedisService, TokenCache};

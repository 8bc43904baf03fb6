pub mod auth;

pub use auth::{auth_middleware, extract_token, AuthUser};

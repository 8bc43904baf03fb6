pub mod organization;
pub mod user;

pub use organization::{AccessLevel, Member, Organization};
pub use user::User;

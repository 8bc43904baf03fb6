pub mod auth;
pub mod metrics;
pub mod organization;

pub use auth::*;
pub use metrics::metrics;
pub use organization::*;

//! HTTP API layer for grievance-rs.
//!
//! - **Endpoints**: OTP and officer login, grievance submission, tracking,
//!   listing and status updates, reminders, feedback, statistics, catalog
//! - **Extractors**: Citizen and officer tokens, validated JSON and queries
//! - **Middleware**: Token resolution, per-IP rate limiting
//!
//! Built on Axum 0.8. Every response uses the `{success, ...}` envelope.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod rate_limit;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
pub use rate_limit::{ApiRateLimiter, RateLimitConfig, RateLimiterState};

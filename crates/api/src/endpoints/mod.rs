//! API endpoints.

#![allow(missing_docs)]

mod auth;
mod catalog;
mod feedback;
mod grievances;
mod health;
mod reminders;
mod stats;

use axum::{Router, http::Uri};
use grievance_common::AppError;

use crate::middleware::AppState;
use crate::rate_limit::RateLimiterState;

/// Create the API router, nested under `/api`, plus `/health`.
///
/// `rate_limiter` guards the authentication endpoints.
pub fn router(rate_limiter: RateLimiterState) -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth::router(rate_limiter))
        .nest("/grievances", grievances::router())
        .nest("/reminders", reminders::router())
        .nest("/feedback", feedback::router())
        .nest("/stats", stats::router())
        .merge(catalog::router());

    Router::new()
        .merge(health::router())
        .nest("/api", api)
        .fallback(not_found)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Route {}", uri.path()))
}

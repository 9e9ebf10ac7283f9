//! Dashboard statistics endpoint.

use axum::{Router, extract::State, routing::get};
use grievance_common::AppResult;
use grievance_core::DashboardStats;
use serde::Serialize;

use crate::{middleware::AppState, response::ApiResponse};

#[derive(Serialize)]
pub struct StatsResponse {
    pub counts: DashboardStats,
}

async fn stats(State(state): State<AppState>) -> AppResult<ApiResponse<StatsResponse>> {
    let counts = state.stats_service.dashboard().await?;
    Ok(ApiResponse::ok(StatsResponse { counts }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(stats))
}

//! Reminder endpoints.

use axum::{Router, extract::State, routing::post};
use grievance_common::AppResult;
use serde::Deserialize;
use validator::Validate;

use crate::{
    extractors::ValidatedJson,
    middleware::AppState,
    response::{ApiResponse, Empty},
};

/// Reminder request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    #[validate(length(min = 1, max = 32))]
    pub ref_id: String,
    #[validate(length(min = 1, max = 16))]
    pub mobile: String,
}

/// Nudge the department about a pending grievance.
async fn send(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ReminderRequest>,
) -> AppResult<ApiResponse<Empty>> {
    state
        .reminder_service
        .send_reminder(&req.ref_id, &req.mobile)
        .await?;

    Ok(ApiResponse::done())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(send))
}

//! Feedback endpoints.

use axum::{Router, extract::State, routing::post};
use grievance_common::AppResult;
use grievance_core::SubmitFeedbackInput;
use serde::Deserialize;
use validator::Validate;

use crate::{
    extractors::ValidatedJson,
    middleware::AppState,
    response::{ApiResponse, Empty},
};

/// Feedback request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    #[validate(length(min = 1, max = 32))]
    pub ref_id: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    pub resolved: bool,
    #[validate(length(max = 2000))]
    pub comments: Option<String>,
}

/// Rate the resolution of a grievance.
async fn submit(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<FeedbackRequest>,
) -> AppResult<ApiResponse<Empty>> {
    let input = SubmitFeedbackInput {
        rating: req.rating,
        resolved: req.resolved,
        comments: req.comments,
    };

    state.feedback_service.submit(&req.ref_id, input).await?;

    Ok(ApiResponse::done())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(submit))
}

//! Grievance endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use grievance_common::{AppError, AppResult};
use grievance_core::{
    GrievanceResponse, Identity, SubmitGrievanceInput, TimelineEntryResponse,
};
use grievance_db::entities::GrievanceState;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extractors::{CitizenAuth, MaybeIdentity, OfficerAuth, ValidatedJson, ValidatedQuery},
    middleware::AppState,
    response::{ApiResponse, Created, Empty},
};

/// Submit response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub ref_id: String,
}

/// Submit a grievance as the verified citizen.
async fn submit(
    State(state): State<AppState>,
    citizen: CitizenAuth,
    ValidatedJson(req): ValidatedJson<SubmitGrievanceInput>,
) -> AppResult<Created<SubmitResponse>> {
    let grievance = state
        .grievance_service
        .submit(&citizen.mobile, req)
        .await?;

    Ok(Created(ApiResponse::ok(SubmitResponse {
        ref_id: grievance.ref_id,
    })))
}

/// Tracking response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResponse {
    pub grievance: GrievanceResponse,
    pub timeline: Vec<TimelineEntryResponse>,
}

/// Track a grievance by reference id.
async fn track(
    State(state): State<AppState>,
    Path(ref_id): Path<String>,
) -> AppResult<ApiResponse<TrackResponse>> {
    let detail = state.grievance_service.track(&ref_id).await?;

    Ok(ApiResponse::ok(TrackResponse {
        grievance: detail.grievance.into(),
        timeline: detail.timeline.into_iter().map(Into::into).collect(),
    }))
}

/// List query.
///
/// Citizens pass `mobile`; officers page through their department with
/// `status`, `limit` and `untilId`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    pub mobile: Option<String>,
    pub status: Option<GrievanceState>,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1))]
    pub limit: u64,
    pub until_id: Option<String>,
}

const fn default_limit() -> u64 {
    20
}

const fn max_limit() -> u64 {
    100
}

/// List response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub grievances: Vec<GrievanceResponse>,
}

/// List the caller's grievances.
async fn list(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    ValidatedQuery(req): ValidatedQuery<ListRequest>,
) -> AppResult<ApiResponse<ListResponse>> {
    let grievances = match (identity, req.mobile) {
        // A citizen may only list their own mobile
        (Some(Identity::Citizen { mobile }), Some(requested)) if mobile != requested => {
            return Err(AppError::Unauthenticated);
        }
        (Some(Identity::Citizen { mobile }), _) => {
            state.grievance_service.my_grievances(&mobile).await?
        }
        (Some(Identity::Officer { department, .. }), None) => {
            state
                .grievance_service
                .department_grievances(
                    &department,
                    req.status,
                    req.limit.min(max_limit()),
                    req.until_id.as_deref(),
                )
                .await?
        }
        (Some(Identity::Officer { .. }) | None, _) => return Err(AppError::Unauthenticated),
    };

    Ok(ApiResponse::ok(ListResponse {
        grievances: grievances.into_iter().map(Into::into).collect(),
    }))
}

/// Status update request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: GrievanceState,
    #[validate(length(max = 1000))]
    pub remarks: Option<String>,
}

/// Move a grievance to a new state as an officer of its department.
async fn update_status(
    State(state): State<AppState>,
    officer: OfficerAuth,
    Path(ref_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateStatusRequest>,
) -> AppResult<ApiResponse<Empty>> {
    state
        .grievance_service
        .transition(&ref_id, req.status, &officer.actor(), req.remarks)
        .await?;

    Ok(ApiResponse::done())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(submit))
        .route("/{ref_id}", get(track).patch(update_status))
}

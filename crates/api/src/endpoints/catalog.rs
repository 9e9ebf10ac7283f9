//! Department and location catalog endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use grievance_common::AppResult;
use grievance_core::DepartmentSummary;
use serde::Serialize;

use crate::{middleware::AppState, response::ApiResponse};

/// Catalog list response.
#[derive(Serialize)]
pub struct ListResponse<T: Serialize> {
    pub list: Vec<T>,
}

/// Departments with their categories.
async fn departments(
    State(state): State<AppState>,
) -> ApiResponse<ListResponse<DepartmentSummary>> {
    ApiResponse::ok(ListResponse {
        list: state.catalog_service.list_departments(),
    })
}

/// Districts of a state.
async fn districts(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<ApiResponse<ListResponse<String>>> {
    let list = state.catalog_service.list_districts(&name)?;
    Ok(ApiResponse::ok(ListResponse { list }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/departments", get(departments))
        .route("/districts/{state}", get(districts))
}

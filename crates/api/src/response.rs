//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Standard success envelope.
///
/// The body's fields are flattened next to `success`, so
/// `ApiResponse::ok(RefIdBody { ref_id })` renders as
/// `{"success": true, "refId": "..."}`. Failures are rendered by
/// [`grievance_common::AppError`].
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Always `true`.
    pub success: bool,
    /// Payload fields.
    #[serde(flatten)]
    pub body: T,
}

/// Body for responses that carry nothing but `success`.
#[derive(Debug, Default, Serialize)]
pub struct Empty {}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}

impl ApiResponse<Empty> {
    /// Success without a body.
    #[must_use]
    pub const fn done() -> Self {
        Self::ok(Empty {})
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Success response for a newly created resource.
#[derive(Debug)]
pub struct Created<T: Serialize>(pub ApiResponse<T>);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

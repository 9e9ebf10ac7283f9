//! Authentication endpoints.

use axum::{Router, extract::State, middleware, routing::post};
use grievance_common::AppResult;
use grievance_core::{OfficerLoginInput, OfficerResponse, bounded};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extractors::ValidatedJson,
    middleware::AppState,
    rate_limit::{RateLimiterState, rate_limit_middleware},
    response::ApiResponse,
};

/// Send OTP request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    #[validate(length(min = 1, max = 16))]
    pub mobile: String,
}

/// Send OTP response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpResponse {
    pub message: String,
}

/// Issue a one-time code to a mobile number.
async fn send_otp(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SendOtpRequest>,
) -> AppResult<ApiResponse<SendOtpResponse>> {
    bounded(
        "identity verifier",
        state.auth_timeout,
        state.identity.send_otp(&req.mobile),
    )
    .await?;

    Ok(ApiResponse::ok(SendOtpResponse {
        message: "OTP sent".to_string(),
    }))
}

/// Verify OTP request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    #[validate(length(min = 1, max = 16))]
    pub mobile: String,
    #[validate(length(min = 1, max = 16))]
    pub otp: String,
}

/// Token response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
}

/// Exchange a one-time code for a citizen token.
async fn verify_otp(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<VerifyOtpRequest>,
) -> AppResult<ApiResponse<TokenResponse>> {
    let token = bounded(
        "identity verifier",
        state.auth_timeout,
        state.identity.verify_otp(&req.mobile, &req.otp),
    )
    .await?;

    Ok(ApiResponse::ok(TokenResponse { token }))
}

/// Officer login response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub officer: OfficerResponse,
}

/// Officer login.
async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<OfficerLoginInput>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let (token, officer) = state.officer_service.login(req).await?;

    Ok(ApiResponse::ok(LoginResponse {
        token,
        officer: officer.into(),
    }))
}

pub fn router(rate_limiter: RateLimiterState) -> Router<AppState> {
    Router::new()
        .route("/send-otp", post(send_otp))
        .route("/verify-otp", post(verify_otp))
        .route("/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ))
}

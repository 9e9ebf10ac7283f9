//! Request extractors.

#![allow(missing_docs)]

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use grievance_common::AppError;
use grievance_core::{Actor, Identity};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Caller holding a citizen token.
#[derive(Debug, Clone)]
pub struct CitizenAuth {
    pub mobile: String,
}

impl<S> FromRequestParts<S> for CitizenAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Identity is set by the auth middleware
        match parts.extensions.get::<Identity>() {
            Some(Identity::Citizen { mobile }) => Ok(Self {
                mobile: mobile.clone(),
            }),
            Some(Identity::Officer { .. }) => Err(AppError::Unauthorized(
                "A citizen token is required".to_string(),
            )),
            None => Err(AppError::Unauthenticated),
        }
    }
}

/// Caller holding an officer token.
#[derive(Debug, Clone)]
pub struct OfficerAuth {
    pub officer_id: String,
    pub employee_id: String,
    pub department: String,
}

impl OfficerAuth {
    /// The officer as a state machine actor.
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor::Officer {
            officer_id: self.officer_id.clone(),
            department: self.department.clone(),
        }
    }
}

impl<S> FromRequestParts<S> for OfficerAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Identity>() {
            Some(Identity::Officer {
                officer_id,
                employee_id,
                department,
            }) => Ok(Self {
                officer_id: officer_id.clone(),
                employee_id: employee_id.clone(),
                department: department.clone(),
            }),
            Some(Identity::Citizen { .. }) => Err(AppError::Unauthorized(
                "An officer token is required".to_string(),
            )),
            None => Err(AppError::Unauthenticated),
        }
    }
}

/// Optional identity extractor.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Identity>);

impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Identity>().cloned()))
    }
}

/// JSON body that is deserialized and validated, failing with
/// `VALIDATION_ERROR` in the API envelope.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string that is deserialized and validated like [`ValidatedJson`].
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

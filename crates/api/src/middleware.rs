//! Application state and request middleware.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use grievance_common::{Config, SharedClock, TokenSigner};
use grievance_core::{
    CatalogService, FeedbackService, GrievanceService, OfficerService, OtpIdentityVerifier,
    ReminderService, SharedIdentityVerifier, SharedNotificationSender, SlaPolicy, StatsService,
    bounded,
};
use grievance_db::repositories::{
    CitizenRepository, FeedbackRepository, GrievanceRepository, OfficerRepository,
    ReminderRepository, StatsRepository, TimelineRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub grievance_service: GrievanceService,
    pub reminder_service: ReminderService,
    pub feedback_service: FeedbackService,
    pub officer_service: OfficerService,
    pub stats_service: StatsService,
    pub catalog_service: CatalogService,
    pub identity: SharedIdentityVerifier,
    /// Upper bound for a single identity verifier call.
    pub auth_timeout: Duration,
}

impl AppState {
    /// Wire every service over one connection pool.
    #[must_use]
    pub fn build(
        db: Arc<DatabaseConnection>,
        config: &Config,
        notifier: SharedNotificationSender,
        clock: SharedClock,
    ) -> Self {
        let signer = TokenSigner::new(&config.auth.jwt_secret);
        let catalog_service = CatalogService::new(config.catalog.clone());
        let sla = SlaPolicy::new(config.workflow.clone());
        let notify_timeout = config.notification.timeout();

        let grievance_repo = GrievanceRepository::new(db.clone());
        let citizen_repo = CitizenRepository::new(db.clone());

        let identity = OtpIdentityVerifier::new(
            &config.auth,
            signer.clone(),
            notifier.clone(),
            clock.clone(),
            notify_timeout,
        );

        Self {
            grievance_service: GrievanceService::new(
                grievance_repo.clone(),
                TimelineRepository::new(db.clone()),
                citizen_repo.clone(),
                catalog_service.clone(),
                sla.clone(),
                notifier.clone(),
                notify_timeout,
                clock.clone(),
            ),
            reminder_service: ReminderService::new(
                grievance_repo.clone(),
                citizen_repo,
                ReminderRepository::new(db.clone()),
                catalog_service.clone(),
                sla.clone(),
                notifier,
                notify_timeout,
                clock.clone(),
            ),
            feedback_service: FeedbackService::new(
                grievance_repo,
                FeedbackRepository::new(db.clone()),
                sla,
                clock.clone(),
            ),
            officer_service: OfficerService::new(
                OfficerRepository::new(db.clone()),
                signer,
                config.auth.token_ttl(),
                clock,
            ),
            stats_service: StatsService::new(StatsRepository::new(db)),
            catalog_service,
            identity: Arc::new(identity),
            auth_timeout: config.auth.timeout(),
        }
    }
}

/// Bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication middleware.
///
/// Resolves the bearer token, if any, and stores the identity in the request
/// extensions. Invalid tokens are dropped here and rejected by the extractors
/// of routes that need one; a verifier timeout fails the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(req.headers()).map(str::to_owned) {
        match bounded(
            "identity verifier",
            state.auth_timeout,
            state.identity.verify(&token),
        )
        .await
        {
            Ok(identity) => {
                req.extensions_mut().insert(identity);
            }
            Err(e) if e.is_dependency_error() => return e.into_response(),
            Err(e) => tracing::debug!(error = %e, "Ignoring invalid bearer token"),
        }
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}

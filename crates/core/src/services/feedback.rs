//! Citizen feedback on resolved grievances.

use chrono::Utc;
use grievance_common::{AppError, AppResult, IdGenerator, SharedClock};
use grievance_db::entities::{GrievanceState, feedback, grievance, timeline_entry};
use grievance_db::repositories::{FeedbackRepository, GrievanceRepository};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::sla::SlaPolicy;

/// Input for submitting feedback.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFeedbackInput {
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    /// The citizen confirms the problem is fixed.
    pub resolved: bool,
    #[validate(length(max = 2000))]
    pub comments: Option<String>,
}

/// Response for feedback.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub rating: i16,
    pub resolved: bool,
    pub comments: Option<String>,
    pub created_at: String,
}

impl From<feedback::Model> for FeedbackResponse {
    fn from(f: feedback::Model) -> Self {
        Self {
            rating: f.rating,
            resolved: f.resolved,
            comments: f.comments,
            created_at: f.created_at.to_rfc3339(),
        }
    }
}

/// Service for feedback.
#[derive(Clone)]
pub struct FeedbackService {
    grievance_repo: GrievanceRepository,
    feedback_repo: FeedbackRepository,
    sla: SlaPolicy,
    clock: SharedClock,
    id_gen: IdGenerator,
}

impl FeedbackService {
    /// Create a new feedback service.
    #[must_use]
    pub const fn new(
        grievance_repo: GrievanceRepository,
        feedback_repo: FeedbackRepository,
        sla: SlaPolicy,
        clock: SharedClock,
    ) -> Self {
        Self {
            grievance_repo,
            feedback_repo,
            sla,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Record feedback on a resolved grievance.
    ///
    /// When the citizen confirms the resolution the grievance is closed in the
    /// same transaction; otherwise it stays `Resolved` until the feedback
    /// window runs out.
    pub async fn submit(
        &self,
        ref_id: &str,
        input: SubmitFeedbackInput,
    ) -> AppResult<(feedback::Model, grievance::Model)> {
        input.validate()?;

        let g = self.grievance_repo.get_by_ref_id(ref_id).await?;
        let now = self.clock.now();

        if g.status != GrievanceState::Resolved {
            return Err(AppError::NotEligible(format!(
                "Feedback is only accepted for resolved grievances, this one is {}",
                g.status
            )));
        }
        if !self.sla.accepts_feedback(&g, now) {
            return Err(AppError::NotEligible(
                "The feedback window has closed".to_string(),
            ));
        }

        let model = feedback::ActiveModel {
            id: Set(self.id_gen.generate()),
            grievance_id: Set(g.id.clone()),
            rating: Set(input.rating),
            resolved: Set(input.resolved),
            comments: Set(input.comments),
            created_at: Set(now.into()),
        };

        let close = input.resolved.then(|| timeline_entry::ActiveModel {
            id: Set(self.id_gen.generate()),
            action: Set(GrievanceState::Closed.to_string()),
            remarks: Set(Some(format!(
                "Closed after citizen feedback (rating {})",
                input.rating
            ))),
            officer_id: Set(None),
            ..Default::default()
        });

        let (created, updated) = self
            .feedback_repo
            .create_and_close(&g, model, close, now.max(g.state_changed_at.with_timezone(&Utc)))
            .await?;

        tracing::info!(
            ref_id = %updated.ref_id,
            rating = created.rating,
            status = %updated.status,
            "Feedback recorded"
        );
        Ok((created, updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_range() {
        let input = |rating| SubmitFeedbackInput {
            rating,
            resolved: true,
            comments: None,
        };

        assert!(input(0).validate().is_err());
        assert!(input(1).validate().is_ok());
        assert!(input(5).validate().is_ok());
        assert!(input(6).validate().is_err());
    }
}

//! Feedback repository.

use std::sync::Arc;

use crate::entities::{Feedback, GrievanceState, feedback, grievance, timeline_entry};
use crate::map_db_err;
use crate::repositories::grievance::transition_in;
use chrono::{DateTime, Utc};
use grievance_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait,
};

/// Feedback repository for database operations.
#[derive(Clone)]
pub struct FeedbackRepository {
    db: Arc<DatabaseConnection>,
}

impl FeedbackRepository {
    /// Create a new feedback repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the feedback left on a grievance.
    pub async fn find_by_grievance(&self, grievance_id: &str) -> AppResult<Option<feedback::Model>> {
        Feedback::find()
            .filter(feedback::Column::GrievanceId.eq(grievance_id))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Store feedback and, when `close` carries a timeline entry, move the
    /// grievance to `Closed` in the same transaction.
    ///
    /// A second feedback for the same grievance fails with
    /// [`AppError::NotEligible`]; a concurrent transition fails with
    /// [`AppError::ConcurrentModification`]. Either way nothing is written.
    pub async fn create_and_close(
        &self,
        current: &grievance::Model,
        model: feedback::ActiveModel,
        close: Option<timeline_entry::ActiveModel>,
        at: DateTime<Utc>,
    ) -> AppResult<(feedback::Model, grievance::Model)> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let created = model.insert(&txn).await.map_err(|e| match map_db_err(e) {
            AppError::Conflict(_) => {
                AppError::NotEligible("Feedback already submitted".to_string())
            }
            other => other,
        })?;

        let updated = match close {
            Some(entry) => transition_in(&txn, current, GrievanceState::Closed, at, entry).await?,
            None => current.clone(),
        };

        txn.commit().await.map_err(map_db_err)?;
        Ok((created, updated))
    }
}

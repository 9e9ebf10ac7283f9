//! Reminder repository.

use std::sync::Arc;

use crate::entities::{Grievance, GrievanceState, Reminder, grievance, reminder};
use crate::map_db_err;
use chrono::{DateTime, Utc};
use grievance_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

/// Reminder repository for database operations.
#[derive(Clone)]
pub struct ReminderRepository {
    db: Arc<DatabaseConnection>,
}

impl ReminderRepository {
    /// Create a new reminder repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get the reminders sent for a grievance, oldest first.
    pub async fn find_by_grievance(&self, grievance_id: &str) -> AppResult<Vec<reminder::Model>> {
        Reminder::find()
            .filter(reminder::Column::GrievanceId.eq(grievance_id))
            .order_by_asc(reminder::Column::SentAt)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Record a reminder against `current`.
    ///
    /// The counter only moves if nobody else recorded a reminder since
    /// `current` was read and the grievance is not yet resolved or closed;
    /// otherwise nothing is written and [`AppError::NotEligible`] is returned.
    pub async fn record(
        &self,
        current: &grievance::Model,
        model: reminder::ActiveModel,
        at: DateTime<Utc>,
    ) -> AppResult<grievance::Model> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let changes = grievance::ActiveModel {
            reminder_count: Set(current.reminder_count + 1),
            last_reminded_at: Set(Some(at.into())),
            ..Default::default()
        };

        let result = Grievance::update_many()
            .set(changes)
            .filter(grievance::Column::Id.eq(current.id.as_str()))
            .filter(grievance::Column::ReminderCount.eq(current.reminder_count))
            .filter(
                grievance::Column::Status
                    .is_not_in([GrievanceState::Resolved, GrievanceState::Closed]),
            )
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotEligible(
                "A reminder was already sent for this grievance".to_string(),
            ));
        }

        model.insert(&txn).await.map_err(map_db_err)?;
        txn.commit().await.map_err(map_db_err)?;

        Ok(grievance::Model {
            reminder_count: current.reminder_count + 1,
            last_reminded_at: Some(at.into()),
            ..current.clone()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::{insert_citizen, insert_grievance, setup_test_db};

    fn reminder(id: &str, at: DateTime<Utc>) -> reminder::ActiveModel {
        reminder::ActiveModel {
            id: Set(id.to_string()),
            grievance_id: Set("g1".to_string()),
            mobile: Set("9876543210".to_string()),
            sent_at: Set(at.into()),
        }
    }

    #[tokio::test]
    async fn test_record_increments_counter() {
        let db = setup_test_db().await.unwrap();
        let now = Utc::now();
        insert_citizen(&db, "c1", "9876543210", now).await.unwrap();
        let g = insert_grievance(&db, "g1", "JA10000001", "c1", "Water", GrievanceState::Submitted, now)
            .await
            .unwrap();

        let repo = ReminderRepository::new(Arc::new(db));
        let updated = repo.record(&g, reminder("r1", now), now).await.unwrap();

        assert_eq!(updated.reminder_count, 1);
        assert!(updated.last_reminded_at.is_some());
        assert_eq!(repo.find_by_grievance("g1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_racing_reminder_is_not_eligible() {
        let db = setup_test_db().await.unwrap();
        let now = Utc::now();
        insert_citizen(&db, "c1", "9876543210", now).await.unwrap();
        let g = insert_grievance(&db, "g1", "JA10000001", "c1", "Water", GrievanceState::Submitted, now)
            .await
            .unwrap();

        let repo = ReminderRepository::new(Arc::new(db));
        repo.record(&g, reminder("r1", now), now).await.unwrap();

        // Same snapshot, counter already moved
        let result = repo.record(&g, reminder("r2", now), now).await;
        assert!(matches!(result, Err(AppError::NotEligible(_))));
        assert_eq!(repo.find_by_grievance("g1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resolved_grievance_is_not_eligible() {
        let db = setup_test_db().await.unwrap();
        let now = Utc::now();
        insert_citizen(&db, "c1", "9876543210", now).await.unwrap();
        let g = insert_grievance(&db, "g1", "JA10000001", "c1", "Water", GrievanceState::Resolved, now)
            .await
            .unwrap();

        let repo = ReminderRepository::new(Arc::new(db));
        let result = repo.record(&g, reminder("r1", now), now).await;

        assert!(matches!(result, Err(AppError::NotEligible(_))));
        assert!(repo.find_by_grievance("g1").await.unwrap().is_empty());
    }
}

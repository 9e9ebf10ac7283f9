//! Aggregate statistics repository.

use std::sync::Arc;

use crate::entities::{Feedback, Grievance, GrievanceState, feedback, grievance};
use crate::map_db_err;
use grievance_common::AppResult;
use sea_orm::{
    AccessMode, ColumnTrait, DatabaseConnection, EntityTrait, IsolationLevel, QuerySelect,
    TransactionTrait,
};

/// Counts taken from a single consistent read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSnapshot {
    pub total: u64,
    pub by_status: Vec<(GrievanceState, i64)>,
    pub by_department: Vec<(String, i64)>,
    pub rating_sum: i64,
    pub rating_count: i64,
}

impl StatsSnapshot {
    /// Mean feedback rating, `None` when no feedback exists.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_rating(&self) -> Option<f64> {
        (self.rating_count > 0).then(|| self.rating_sum as f64 / self.rating_count as f64)
    }
}

/// Read-only aggregate queries.
#[derive(Clone)]
pub struct StatsRepository {
    db: Arc<DatabaseConnection>,
}

impl StatsRepository {
    /// Create a new stats repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Take all aggregates from one read-only repeatable-read transaction.
    ///
    /// `total` is the sum of the per-status counts, so the two always agree.
    pub async fn snapshot(&self) -> AppResult<StatsSnapshot> {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await
            .map_err(map_db_err)?;

        let by_status: Vec<(GrievanceState, i64)> = Grievance::find()
            .select_only()
            .column(grievance::Column::Status)
            .column_as(grievance::Column::Id.count(), "count")
            .group_by(grievance::Column::Status)
            .into_tuple()
            .all(&txn)
            .await
            .map_err(map_db_err)?;

        let by_department: Vec<(String, i64)> = Grievance::find()
            .select_only()
            .column(grievance::Column::Department)
            .column_as(grievance::Column::Id.count(), "count")
            .group_by(grievance::Column::Department)
            .into_tuple()
            .all(&txn)
            .await
            .map_err(map_db_err)?;

        let ratings: Option<(Option<i64>, i64)> = Feedback::find()
            .select_only()
            .column_as(feedback::Column::Rating.sum(), "rating_sum")
            .column_as(feedback::Column::Id.count(), "rating_count")
            .into_tuple()
            .one(&txn)
            .await
            .map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;

        let total = u64::try_from(by_status.iter().map(|(_, n)| n).sum::<i64>()).unwrap_or(0);
        let (rating_sum, rating_count) = ratings
            .map(|(sum, count)| (sum.unwrap_or(0), count))
            .unwrap_or_default();

        Ok(StatsSnapshot {
            total,
            by_status,
            by_department,
            rating_sum,
            rating_count,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::{insert_citizen, insert_grievance, setup_test_db};
    use chrono::Utc;
    use sea_orm::{ActiveModelTrait, Set};

    #[tokio::test]
    async fn test_empty_snapshot() {
        let db = setup_test_db().await.unwrap();
        let repo = StatsRepository::new(Arc::new(db));

        let snapshot = repo.snapshot().await.unwrap();
        assert_eq!(snapshot.total, 0);
        assert!(snapshot.by_status.is_empty());
        assert_eq!(snapshot.average_rating(), None);
    }

    #[tokio::test]
    async fn test_snapshot_counts() {
        let db = setup_test_db().await.unwrap();
        let now = Utc::now();
        insert_citizen(&db, "c1", "9876543210", now).await.unwrap();
        insert_grievance(&db, "g1", "JA10000001", "c1", "Water", GrievanceState::Submitted, now)
            .await
            .unwrap();
        insert_grievance(&db, "g2", "JA10000002", "c1", "Water", GrievanceState::Resolved, now)
            .await
            .unwrap();
        insert_grievance(&db, "g3", "JA10000003", "c1", "Roads", GrievanceState::Resolved, now)
            .await
            .unwrap();

        for (id, grievance_id, rating) in [("f1", "g2", 5), ("f2", "g3", 2)] {
            feedback::ActiveModel {
                id: Set(id.to_string()),
                grievance_id: Set(grievance_id.to_string()),
                rating: Set(rating),
                resolved: Set(false),
                comments: Set(None),
                created_at: Set(now.into()),
            }
            .insert(&db)
            .await
            .unwrap();
        }

        let repo = StatsRepository::new(Arc::new(db));
        let mut snapshot = repo.snapshot().await.unwrap();
        snapshot.by_department.sort();

        assert_eq!(snapshot.total, 3);
        assert!(snapshot.by_status.contains(&(GrievanceState::Resolved, 2)));
        assert!(snapshot.by_status.contains(&(GrievanceState::Submitted, 1)));
        assert_eq!(
            snapshot.by_department,
            vec![("Roads".to_string(), 1), ("Water".to_string(), 2)]
        );
        assert_eq!(snapshot.average_rating(), Some(3.5));
    }

    #[tokio::test]
    async fn test_snapshot_breakdowns_sum_to_total() {
        let db = setup_test_db().await.unwrap();
        let now = Utc::now();
        insert_citizen(&db, "c1", "9876543210", now).await.unwrap();
        let rows = [
            ("g1", "Water", GrievanceState::Submitted),
            ("g2", "Water", GrievanceState::Escalated),
            ("g3", "Roads", GrievanceState::Closed),
            ("g4", "Electricity", GrievanceState::InProgress),
            ("g5", "Roads", GrievanceState::Escalated),
        ];
        for (n, (id, department, status)) in rows.into_iter().enumerate() {
            insert_grievance(&db, id, &format!("JA2000000{n}"), "c1", department, status, now)
                .await
                .unwrap();
        }

        let snapshot = StatsRepository::new(Arc::new(db)).snapshot().await.unwrap();

        let by_status: i64 = snapshot.by_status.iter().map(|(_, n)| n).sum();
        let by_department: i64 = snapshot.by_department.iter().map(|(_, n)| n).sum();
        assert_eq!(snapshot.total, 5);
        assert_eq!(by_status, 5);
        assert_eq!(by_department, 5);
        assert!(snapshot.by_status.contains(&(GrievanceState::Escalated, 2)));
    }
}

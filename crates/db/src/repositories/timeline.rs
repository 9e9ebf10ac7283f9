//! Timeline repository.

use std::sync::Arc;

use crate::entities::timeline_entry;
use crate::repositories::grievance::timeline_of;
use grievance_common::AppResult;
use sea_orm::DatabaseConnection;

/// Read access to grievance timelines.
///
/// Entries are only ever written together with the transition they record,
/// see [`super::GrievanceRepository::apply_transition`].
#[derive(Clone)]
pub struct TimelineRepository {
    db: Arc<DatabaseConnection>,
}

impl TimelineRepository {
    /// Create a new timeline repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get all entries of a grievance in the order they were appended.
    pub async fn find_by_grievance(
        &self,
        grievance_id: &str,
    ) -> AppResult<Vec<timeline_entry::Model>> {
        timeline_of(self.db.as_ref(), grievance_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::GrievanceState;
    use crate::test_utils::{insert_citizen, insert_grievance, setup_test_db};
    use chrono::Utc;

    #[tokio::test]
    async fn test_find_by_grievance() {
        let db = setup_test_db().await.unwrap();
        let now = Utc::now();
        insert_citizen(&db, "c1", "9876543210", now).await.unwrap();
        insert_grievance(&db, "g1", "JA10000001", "c1", "Water", GrievanceState::Submitted, now)
            .await
            .unwrap();

        let repo = TimelineRepository::new(Arc::new(db));
        let entries = repo.find_by_grievance("g1").await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sequence, 1);
        assert_eq!(entries[0].action, "Submitted");
        assert!(repo.find_by_grievance("g2").await.unwrap().is_empty());
    }
}

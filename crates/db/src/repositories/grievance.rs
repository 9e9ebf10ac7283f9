//! Grievance repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use crate::entities::{Grievance, GrievanceState, TimelineEntry, grievance, timeline_entry};
use crate::map_db_err;
use grievance_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// Grievance repository for database operations.
#[derive(Clone)]
pub struct GrievanceRepository {
    db: Arc<DatabaseConnection>,
}

impl GrievanceRepository {
    /// Create a new grievance repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a grievance by internal ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<grievance::Model>> {
        Grievance::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Find a grievance by reference id.
    pub async fn find_by_ref_id(&self, ref_id: &str) -> AppResult<Option<grievance::Model>> {
        Grievance::find()
            .filter(grievance::Column::RefId.eq(ref_id))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Get a grievance by reference id, returning an error if not found.
    pub async fn get_by_ref_id(&self, ref_id: &str) -> AppResult<grievance::Model> {
        self.find_by_ref_id(ref_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Grievance {ref_id}")))
    }

    /// Get a citizen's grievances, newest first.
    pub async fn find_by_citizen(&self, citizen_id: &str) -> AppResult<Vec<grievance::Model>> {
        Grievance::find()
            .filter(grievance::Column::CitizenId.eq(citizen_id))
            .order_by_desc(grievance::Column::CreatedAt)
            .order_by_desc(grievance::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Get a department's grievances (paginated), newest first.
    pub async fn find_by_department(
        &self,
        department: &str,
        status: Option<GrievanceState>,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<grievance::Model>> {
        let mut query = Grievance::find()
            .filter(grievance::Column::Department.eq(department))
            .order_by_desc(grievance::Column::Id);

        if let Some(status) = status {
            query = query.filter(grievance::Column::Status.eq(status));
        }

        if let Some(id) = until_id {
            query = query.filter(grievance::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Insert a new grievance together with its first timeline entry.
    ///
    /// A reference id collision surfaces as [`AppError::Conflict`] and leaves
    /// nothing behind.
    pub async fn create_with_entry(
        &self,
        model: grievance::ActiveModel,
        entry: timeline_entry::ActiveModel,
    ) -> AppResult<grievance::Model> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let created = model.insert(&txn).await.map_err(map_db_err)?;
        entry.insert(&txn).await.map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(created)
    }

    /// Move a grievance to `to` and append `entry`, atomically.
    ///
    /// `current` is the version the caller validated the transition against.
    /// If another transition committed in the meantime nothing is written and
    /// [`AppError::ConcurrentModification`] is returned.
    pub async fn apply_transition(
        &self,
        current: &grievance::Model,
        to: GrievanceState,
        at: DateTime<Utc>,
        entry: timeline_entry::ActiveModel,
    ) -> AppResult<grievance::Model> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let updated = transition_in(&txn, current, to, at, entry).await?;
        txn.commit().await.map_err(map_db_err)?;
        Ok(updated)
    }
}

/// Compare-and-set transition on an open connection or transaction.
///
/// The update only matches while the stored version equals `current.version`;
/// the timeline entry takes the new version as its sequence, so the unique
/// `(grievance_id, sequence)` index rejects any interleaved append as well.
pub(crate) async fn transition_in<C: ConnectionTrait>(
    conn: &C,
    current: &grievance::Model,
    to: GrievanceState,
    at: DateTime<Utc>,
    mut entry: timeline_entry::ActiveModel,
) -> AppResult<grievance::Model> {
    let next_version = current.version + 1;

    let changes = grievance::ActiveModel {
        status: Set(to),
        version: Set(next_version),
        state_changed_at: Set(at.into()),
        updated_at: Set(Some(at.into())),
        ..Default::default()
    };

    let result = Grievance::update_many()
        .set(changes)
        .filter(grievance::Column::Id.eq(current.id.as_str()))
        .filter(grievance::Column::Version.eq(current.version))
        .exec(conn)
        .await
        .map_err(map_db_err)?;

    if result.rows_affected == 0 {
        return Err(AppError::ConcurrentModification);
    }

    entry.grievance_id = Set(current.id.clone());
    entry.sequence = Set(next_version);
    entry.status = Set(to);
    entry.created_at = Set(at.into());
    entry.insert(conn).await.map_err(|e| match map_db_err(e) {
        AppError::Conflict(_) => AppError::ConcurrentModification,
        other => other,
    })?;

    Ok(grievance::Model {
        status: to,
        version: next_version,
        state_changed_at: at.into(),
        updated_at: Some(at.into()),
        ..current.clone()
    })
}

/// Timeline entries of a grievance in sequence order.
pub(crate) async fn timeline_of<C: ConnectionTrait>(
    conn: &C,
    grievance_id: &str,
) -> AppResult<Vec<timeline_entry::Model>> {
    TimelineEntry::find()
        .filter(timeline_entry::Column::GrievanceId.eq(grievance_id))
        .order_by_asc(timeline_entry::Column::Sequence)
        .all(conn)
        .await
        .map_err(map_db_err)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::{insert_citizen, insert_grievance, setup_test_db};
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn entry(id: &str) -> timeline_entry::ActiveModel {
        timeline_entry::ActiveModel {
            id: Set(id.to_string()),
            action: Set("Acknowledged".to_string()),
            remarks: Set(Some("Assigned to field team".to_string())),
            officer_id: Set(Some("o1".to_string())),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_find_by_ref_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<grievance::Model>::new()])
                .into_connection(),
        );

        let repo = GrievanceRepository::new(db);
        let result = repo.get_by_ref_id("JA00000000").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_apply_transition_bumps_version_and_appends() {
        let db = setup_test_db().await.unwrap();
        let now = Utc::now();
        insert_citizen(&db, "c1", "9876543210", now).await.unwrap();
        let g = insert_grievance(&db, "g1", "JA10000001", "c1", "Water", GrievanceState::Submitted, now)
            .await
            .unwrap();

        let db = Arc::new(db);
        let repo = GrievanceRepository::new(db.clone());
        let later = now + Duration::minutes(5);
        let updated = repo
            .apply_transition(&g, GrievanceState::Acknowledged, later, entry("e2"))
            .await
            .unwrap();

        assert_eq!(updated.status, GrievanceState::Acknowledged);
        assert_eq!(updated.version, 2);

        let stored = repo.find_by_id("g1").await.unwrap().unwrap();
        assert_eq!(stored.status, GrievanceState::Acknowledged);
        assert_eq!(stored.version, 2);

        let timeline = timeline_of(db.as_ref(), "g1").await.unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[1].sequence, 2);
        assert_eq!(timeline[1].status, GrievanceState::Acknowledged);
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected_without_writes() {
        let db = setup_test_db().await.unwrap();
        let now = Utc::now();
        insert_citizen(&db, "c1", "9876543210", now).await.unwrap();
        let g = insert_grievance(&db, "g1", "JA10000001", "c1", "Water", GrievanceState::Submitted, now)
            .await
            .unwrap();

        let db = Arc::new(db);
        let repo = GrievanceRepository::new(db.clone());
        repo.apply_transition(&g, GrievanceState::Acknowledged, now, entry("e2"))
            .await
            .unwrap();

        // Second writer still holds version 1
        let result = repo
            .apply_transition(&g, GrievanceState::Escalated, now, entry("e3"))
            .await;
        assert!(matches!(result, Err(AppError::ConcurrentModification)));

        let stored = repo.find_by_id("g1").await.unwrap().unwrap();
        assert_eq!(stored.status, GrievanceState::Acknowledged);
        assert_eq!(timeline_of(db.as_ref(), "g1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_ref_id_is_conflict() {
        let db = setup_test_db().await.unwrap();
        let now = Utc::now();
        insert_citizen(&db, "c1", "9876543210", now).await.unwrap();
        let existing =
            insert_grievance(&db, "g1", "JA10000001", "c1", "Water", GrievanceState::Submitted, now)
                .await
                .unwrap();

        let repo = GrievanceRepository::new(Arc::new(db));
        let mut duplicate: grievance::ActiveModel = existing.into();
        duplicate.id = Set("g2".to_string());
        let first_entry = timeline_entry::ActiveModel {
            id: Set("g2-1".to_string()),
            grievance_id: Set("g2".to_string()),
            sequence: Set(1),
            action: Set("Submitted".to_string()),
            status: Set(GrievanceState::Submitted),
            remarks: Set(None),
            officer_id: Set(None),
            created_at: Set(now.into()),
        };

        let result = repo.create_with_entry(duplicate, first_entry).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert!(repo.find_by_id("g2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_department_filters_status() {
        let db = setup_test_db().await.unwrap();
        let now = Utc::now();
        insert_citizen(&db, "c1", "9876543210", now).await.unwrap();
        insert_grievance(&db, "g1", "JA10000001", "c1", "Water", GrievanceState::Submitted, now)
            .await
            .unwrap();
        insert_grievance(&db, "g2", "JA10000002", "c1", "Water", GrievanceState::Resolved, now)
            .await
            .unwrap();
        insert_grievance(&db, "g3", "JA10000003", "c1", "Roads", GrievanceState::Submitted, now)
            .await
            .unwrap();

        let repo = GrievanceRepository::new(Arc::new(db));

        let all = repo.find_by_department("Water", None, 10, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "g2");

        let submitted = repo
            .find_by_department("Water", Some(GrievanceState::Submitted), 10, None)
            .await
            .unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].id, "g1");

        let page = repo.find_by_department("Water", None, 10, Some("g2")).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "g1");
    }
}

//! Officer repository.

use std::sync::Arc;

use crate::entities::{Officer, officer};
use crate::map_db_err;
use grievance_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Officer repository for database operations.
#[derive(Clone)]
pub struct OfficerRepository {
    db: Arc<DatabaseConnection>,
}

impl OfficerRepository {
    /// Create a new officer repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an officer by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<officer::Model>> {
        Officer::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Get an officer by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<officer::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Officer {id}")))
    }

    /// Find an officer by employee id.
    pub async fn find_by_employee_id(&self, employee_id: &str) -> AppResult<Option<officer::Model>> {
        Officer::find()
            .filter(officer::Column::EmployeeId.eq(employee_id))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Create a new officer.
    pub async fn create(&self, model: officer::ActiveModel) -> AppResult<officer::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Replace an officer's name, department and password hash.
    pub async fn update(&self, model: officer::ActiveModel) -> AppResult<officer::Model> {
        model.update(self.db.as_ref()).await.map_err(map_db_err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::{insert_officer, setup_test_db};
    use chrono::Utc;
    use sea_orm::Set;

    #[tokio::test]
    async fn test_find_by_employee_id() {
        let db = setup_test_db().await.unwrap();
        insert_officer(&db, "o1", "WTR001", "Water", Utc::now())
            .await
            .unwrap();

        let repo = OfficerRepository::new(Arc::new(db));
        let officer = repo.find_by_employee_id("WTR001").await.unwrap().unwrap();
        assert_eq!(officer.id, "o1");
        assert_eq!(officer.department, "Water");
        assert!(repo.find_by_employee_id("WTR002").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_employee_id_is_conflict() {
        let db = setup_test_db().await.unwrap();
        let now = Utc::now();
        insert_officer(&db, "o1", "WTR001", "Water", now)
            .await
            .unwrap();

        let repo = OfficerRepository::new(Arc::new(db));
        let result = repo
            .create(officer::ActiveModel {
                id: Set("o2".to_string()),
                employee_id: Set("WTR001".to_string()),
                name: Set("Second".to_string()),
                department: Set("Water".to_string()),
                password_hash: Set("unused".to_string()),
                created_at: Set(now.into()),
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = setup_test_db().await.unwrap();
        let repo = OfficerRepository::new(Arc::new(db));

        assert!(matches!(
            repo.get_by_id("missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}

//! Citizen repository.

use std::sync::Arc;

use crate::entities::{Citizen, citizen};
use crate::map_db_err;
use chrono::{DateTime, Utc};
use grievance_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Citizen repository for database operations.
#[derive(Clone)]
pub struct CitizenRepository {
    db: Arc<DatabaseConnection>,
}

impl CitizenRepository {
    /// Create a new citizen repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a citizen by mobile number.
    pub async fn find_by_mobile(&self, mobile: &str) -> AppResult<Option<citizen::Model>> {
        Citizen::find()
            .filter(citizen::Column::Mobile.eq(mobile))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Return the citizen registered under `mobile`, registering it with `id`
    /// and the given contact details on first use.
    ///
    /// Two first submissions racing on the same mobile both end up with the
    /// row that won the unique index.
    pub async fn find_or_create(
        &self,
        id: String,
        mobile: &str,
        name: Option<String>,
        email: Option<String>,
        at: DateTime<Utc>,
    ) -> AppResult<citizen::Model> {
        if let Some(existing) = self.find_by_mobile(mobile).await? {
            return Ok(existing);
        }

        let model = citizen::ActiveModel {
            id: Set(id),
            mobile: Set(mobile.to_string()),
            name: Set(name),
            email: Set(email),
            created_at: Set(at.into()),
        };

        match model.insert(self.db.as_ref()).await.map_err(map_db_err) {
            Ok(created) => Ok(created),
            Err(AppError::Conflict(_)) => self
                .find_by_mobile(mobile)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Citizen {mobile}"))),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_find_or_create_is_idempotent() {
        let db = Arc::new(setup_test_db().await.unwrap());
        let repo = CitizenRepository::new(db);
        let now = Utc::now();

        let first = repo
            .find_or_create(
                "c1".to_string(),
                "9876543210",
                Some("Asha".to_string()),
                None,
                now,
            )
            .await
            .unwrap();
        let second = repo
            .find_or_create("c2".to_string(), "9876543210", None, None, now)
            .await
            .unwrap();

        assert_eq!(first.id, "c1");
        assert_eq!(second.id, "c1");
        assert_eq!(second.name.as_deref(), Some("Asha"));
    }

    #[tokio::test]
    async fn test_find_by_mobile_missing() {
        let db = Arc::new(setup_test_db().await.unwrap());
        let repo = CitizenRepository::new(db);

        assert!(repo.find_by_mobile("9000000000").await.unwrap().is_none());
    }
}

//! Officer login and provisioning.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Duration;
use std::sync::LazyLock;
use grievance_common::config::OfficerSeed;
use grievance_common::{AppError, AppResult, Claims, IdGenerator, SharedClock, TokenSigner};
use grievance_db::entities::officer;
use grievance_db::repositories::OfficerRepository;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Verified against when the employee id is unknown, so both login failures
/// cost one Argon2 verification.
static UNKNOWN_OFFICER_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("no-such-officer").ok());

/// Input for officer login.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OfficerLoginInput {
    #[validate(length(min = 1, max = 32))]
    pub employee_id: String,
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

/// Response for an officer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficerResponse {
    pub id: String,
    pub employee_id: String,
    pub name: String,
    pub department: String,
}

impl From<officer::Model> for OfficerResponse {
    fn from(o: officer::Model) -> Self {
        Self {
            id: o.id,
            employee_id: o.employee_id,
            name: o.name,
            department: o.department,
        }
    }
}

/// Service for officers.
#[derive(Clone)]
pub struct OfficerService {
    officer_repo: OfficerRepository,
    signer: TokenSigner,
    token_ttl: Duration,
    clock: SharedClock,
    id_gen: IdGenerator,
}

impl OfficerService {
    /// Create a new officer service.
    #[must_use]
    pub const fn new(
        officer_repo: OfficerRepository,
        signer: TokenSigner,
        token_ttl: Duration,
        clock: SharedClock,
    ) -> Self {
        Self {
            officer_repo,
            signer,
            token_ttl,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Check credentials and issue an officer token.
    ///
    /// Unknown employee ids and wrong passwords fail the same way.
    pub async fn login(&self, input: OfficerLoginInput) -> AppResult<(String, officer::Model)> {
        input.validate()?;

        let found = self
            .officer_repo
            .find_by_employee_id(&input.employee_id)
            .await?;

        let hash = found
            .as_ref()
            .map(|o| o.password_hash.as_str())
            .or(UNKNOWN_OFFICER_HASH.as_deref());
        let verified = match hash {
            Some(hash) => verify_password(&input.password, hash)?,
            None => false,
        };

        let Some(officer) = found.filter(|_| verified) else {
            tracing::debug!(employee_id = %input.employee_id, "Officer login rejected");
            return Err(AppError::Unauthenticated);
        };

        let claims = Claims::officer(
            &officer.id,
            &officer.employee_id,
            &officer.department,
            self.clock.now(),
            self.token_ttl,
        );
        let token = self.signer.sign(&claims)?;

        tracing::info!(employee_id = %officer.employee_id, "Officer logged in");
        Ok((token, officer))
    }

    /// Insert configured officers that do not exist yet.
    ///
    /// Entries whose hash is not a valid PHC string are skipped. Returns the
    /// number of officers created.
    pub async fn provision(&self, seeds: &[OfficerSeed]) -> AppResult<usize> {
        let mut created = 0;

        for seed in seeds {
            if PasswordHash::new(&seed.password_hash).is_err() {
                tracing::warn!(
                    employee_id = %seed.employee_id,
                    "Skipping officer with an invalid password hash"
                );
                continue;
            }

            if self
                .officer_repo
                .find_by_employee_id(&seed.employee_id)
                .await?
                .is_some()
            {
                continue;
            }

            let model = officer::ActiveModel {
                id: Set(self.id_gen.generate()),
                employee_id: Set(seed.employee_id.clone()),
                name: Set(seed.name.clone()),
                department: Set(seed.department.clone()),
                password_hash: Set(seed.password_hash.clone()),
                created_at: Set(self.clock.now().into()),
            };

            match self.officer_repo.create(model).await {
                Ok(_) => created += 1,
                // Another instance provisioned it first
                Err(AppError::Conflict(_)) => {}
                Err(e) => return Err(e),
            }
        }

        if created > 0 {
            tracing::info!(count = created, "Provisioned officers");
        }
        Ok(created)
    }
}

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let hash = hash_password("field-team-42").unwrap();
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("field-team-42").unwrap();

        assert!(verify_password("field-team-42", &hash).unwrap());
        assert!(!verify_password("field-team-43", &hash).unwrap());
    }

    #[test]
    fn test_unknown_officer_hash_is_verifiable() {
        let hash = UNKNOWN_OFFICER_HASH.as_deref().unwrap();
        assert!(PasswordHash::new(hash).is_ok());
        assert!(!verify_password("pipes-and-pumps", hash).unwrap());
    }

    #[tokio::test]
    async fn test_login_rejects_unknown_and_wrong_alike() {
        let db = std::sync::Arc::new(grievance_db::test_utils::setup_test_db().await.unwrap());
        let clock: SharedClock = std::sync::Arc::new(grievance_common::SystemClock);
        let service = OfficerService::new(
            OfficerRepository::new(db),
            TokenSigner::new("test-secret"),
            Duration::hours(1),
            clock,
        );
        let seed = OfficerSeed {
            employee_id: "WTR001".to_string(),
            name: "Water Officer".to_string(),
            department: "Water".to_string(),
            password_hash: hash_password("pipes-and-pumps").unwrap(),
        };
        assert_eq!(service.provision(&[seed]).await.unwrap(), 1);

        let login = |employee_id: &str, password: &str| OfficerLoginInput {
            employee_id: employee_id.to_string(),
            password: password.to_string(),
        };

        assert!(matches!(
            service.login(login("NOPE001", "pipes-and-pumps")).await,
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            service.login(login("NOPE001", "no-such-officer")).await,
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            service.login(login("WTR001", "wrong")).await,
            Err(AppError::Unauthenticated)
        ));
        let (token, officer) = service.login(login("WTR001", "pipes-and-pumps")).await.unwrap();
        assert!(!token.is_empty());
        assert_eq!(officer.department, "Water");
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("anything", "replace-with-argon2id-hash").is_err());
    }
}

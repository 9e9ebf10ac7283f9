//! Authentication token signing.
//!
//! Tokens are HS256 JWTs. Expiry is checked against the caller's clock rather
//! than the system time so that expiry is testable.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

/// Who a token was issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A citizen verified by OTP.
    Citizen,
    /// A department officer.
    Officer,
}

/// Token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: mobile number for citizens, officer id for officers.
    pub sub: String,
    /// Role of the subject.
    pub role: Role,
    /// Officer employee id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emp: Option<String>,
    /// Officer department.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dept: Option<String>,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
    /// Token id.
    pub jti: String,
}

impl Claims {
    /// Claims for a citizen identified by mobile number.
    #[must_use]
    pub fn citizen(mobile: &str, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: mobile.to_string(),
            role: Role::Citizen,
            emp: None,
            dept: None,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: uuid::Uuid::new_v4().simple().to_string(),
        }
    }

    /// Claims for an officer.
    #[must_use]
    pub fn officer(
        officer_id: &str,
        employee_id: &str,
        department: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: officer_id.to_string(),
            role: Role::Officer,
            emp: Some(employee_id.to_string()),
            dept: Some(department.to_string()),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: uuid::Uuid::new_v4().simple().to_string(),
        }
    }
}

/// Signs and verifies tokens with a shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Create a signer from an HMAC secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Sign claims into a token.
    pub fn sign(&self, claims: &Claims) -> AppResult<String> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verify a token's signature and expiry at `now`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| AppError::Unauthenticated)?
            .claims;

        if claims.exp <= now.timestamp() {
            return Err(AppError::Unauthenticated);
        }
        Ok(claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let signer = TokenSigner::new("secret");
        let now = Utc::now();
        let claims = Claims::officer("o1", "WTR001", "Water", now, Duration::hours(1));

        let token = signer.sign(&claims).unwrap();
        let decoded = signer.verify(&token, now).unwrap();

        assert_eq!(decoded, claims);
        assert_eq!(decoded.role, Role::Officer);
        assert_eq!(decoded.dept.as_deref(), Some("Water"));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let signer = TokenSigner::new("secret");
        let now = Utc::now();
        let claims = Claims::citizen("9876543210", now, Duration::minutes(10));
        let token = signer.sign(&claims).unwrap();

        let result = signer.verify(&token, now + Duration::minutes(11));
        assert!(matches!(result, Err(AppError::Unauthenticated)));
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let now = Utc::now();
        let claims = Claims::citizen("9876543210", now, Duration::minutes(10));
        let token = TokenSigner::new("other").sign(&claims).unwrap();

        let result = TokenSigner::new("secret").verify(&token, now);
        assert!(matches!(result, Err(AppError::Unauthenticated)));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let result = TokenSigner::new("secret").verify("not-a-token", Utc::now());
        assert!(matches!(result, Err(AppError::Unauthenticated)));
    }
}

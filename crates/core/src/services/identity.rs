//! Identity verification: mobile OTP challenges and bearer tokens.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use grievance_common::config::AuthConfig;
use grievance_common::{AppError, AppResult, Claims, Role, SharedClock, TokenSigner};
use rand::Rng;
use regex::Regex;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;

use crate::bounded;
use crate::services::notification::SharedNotificationSender;

/// Number of digits in an OTP.
const OTP_DIGITS: usize = 6;

#[allow(clippy::unwrap_used)]
static MOBILE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{10}$").unwrap());

/// Whether `mobile` is a 10-digit mobile number.
#[must_use]
pub fn is_valid_mobile(mobile: &str) -> bool {
    MOBILE_RE.is_match(mobile)
}

/// The verified caller behind a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Citizen {
        mobile: String,
    },
    Officer {
        officer_id: String,
        employee_id: String,
        department: String,
    },
}

impl Identity {
    /// Mobile number of a citizen identity.
    #[must_use]
    pub fn mobile(&self) -> Option<&str> {
        match self {
            Self::Citizen { mobile } => Some(mobile),
            Self::Officer { .. } => None,
        }
    }
}

impl TryFrom<Claims> for Identity {
    type Error = AppError;

    fn try_from(claims: Claims) -> AppResult<Self> {
        match claims.role {
            Role::Citizen => Ok(Self::Citizen { mobile: claims.sub }),
            Role::Officer => match (claims.emp, claims.dept) {
                (Some(employee_id), Some(department)) => Ok(Self::Officer {
                    officer_id: claims.sub,
                    employee_id,
                    department,
                }),
                _ => Err(AppError::Unauthenticated),
            },
        }
    }
}

/// Trait for identity verification.
///
/// The engine only consumes these capabilities; how codes are delivered and
/// tokens are minted is up to the implementation.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Issue a one-time code to `mobile`, replacing any earlier one.
    async fn send_otp(&self, mobile: &str) -> AppResult<()>;

    /// Check a code and return a citizen token on success.
    async fn verify_otp(&self, mobile: &str, otp: &str) -> AppResult<String>;

    /// Resolve a bearer token to an identity.
    async fn verify(&self, token: &str) -> AppResult<Identity>;
}

/// Shared identity verifier.
pub type SharedIdentityVerifier = Arc<dyn IdentityVerifier>;

#[derive(Debug)]
struct OtpChallenge {
    code_hash: String,
    expires_at: DateTime<Utc>,
    attempts: u32,
    exhausted: bool,
}

/// OTP verifier keeping live challenges in memory and signing JWTs.
#[derive(Clone)]
pub struct OtpIdentityVerifier {
    challenges: Arc<Mutex<HashMap<String, OtpChallenge>>>,
    sender: SharedNotificationSender,
    signer: TokenSigner,
    clock: SharedClock,
    otp_ttl: Duration,
    token_ttl: Duration,
    max_attempts: u32,
    send_timeout: std::time::Duration,
}

impl OtpIdentityVerifier {
    /// Create a new verifier.
    #[must_use]
    pub fn new(
        auth: &AuthConfig,
        signer: TokenSigner,
        sender: SharedNotificationSender,
        clock: SharedClock,
        send_timeout: std::time::Duration,
    ) -> Self {
        Self {
            challenges: Arc::new(Mutex::new(HashMap::new())),
            sender,
            signer,
            clock,
            otp_ttl: auth.otp_ttl(),
            token_ttl: auth.token_ttl(),
            max_attempts: auth.otp_max_attempts.max(1),
            send_timeout,
        }
    }

    fn generate_code() -> String {
        let mut rng = rand::thread_rng();
        (0..OTP_DIGITS)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }
}

fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

#[async_trait]
impl IdentityVerifier for OtpIdentityVerifier {
    async fn send_otp(&self, mobile: &str) -> AppResult<()> {
        if !is_valid_mobile(mobile) {
            return Err(AppError::Validation(
                "Mobile number must be 10 digits".to_string(),
            ));
        }

        let now = self.clock.now();
        let code = Self::generate_code();
        {
            let mut challenges = self.challenges.lock().await;
            challenges.retain(|_, c| c.expires_at > now);
            challenges.insert(
                mobile.to_string(),
                OtpChallenge {
                    code_hash: hash_code(&code),
                    expires_at: now + self.otp_ttl,
                    attempts: 0,
                    exhausted: false,
                },
            );
        }

        let message = format!(
            "Your grievance portal verification code is {code}. It expires in {} minutes.",
            self.otp_ttl.num_minutes().max(1)
        );
        bounded(
            "sms gateway",
            self.send_timeout,
            self.sender.send_sms(mobile, &message),
        )
        .await?;

        tracing::info!(mobile = %mobile, "OTP issued");
        Ok(())
    }

    async fn verify_otp(&self, mobile: &str, otp: &str) -> AppResult<String> {
        let now = self.clock.now();
        let mut challenges = self.challenges.lock().await;

        let Some(challenge) = challenges.get_mut(mobile) else {
            return Err(AppError::OtpExpired);
        };

        if challenge.expires_at <= now {
            challenges.remove(mobile);
            return Err(AppError::OtpExpired);
        }

        if challenge.exhausted {
            return Err(AppError::OtpAttemptsExceeded);
        }

        let code_matches: bool = challenge
            .code_hash
            .as_bytes()
            .ct_eq(hash_code(otp).as_bytes())
            .into();
        if !code_matches {
            challenge.attempts += 1;
            if challenge.attempts >= self.max_attempts {
                challenge.exhausted = true;
                tracing::warn!(mobile = %mobile, "OTP attempts exhausted");
                return Err(AppError::OtpAttemptsExceeded);
            }
            return Err(AppError::OtpMismatch);
        }

        challenges.remove(mobile);
        drop(challenges);

        self.signer
            .sign(&Claims::citizen(mobile, now, self.token_ttl))
    }

    async fn verify(&self, token: &str) -> AppResult<Identity> {
        self.signer.verify(token, self.clock.now())?.try_into()
    }
}

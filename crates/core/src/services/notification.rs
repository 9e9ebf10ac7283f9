//! SMS notification dispatch.
//!
//! Services send through the [`NotificationSender`] trait so the engine does
//! not depend on a particular gateway.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use grievance_common::config::{NotificationConfig, NotificationProvider};
use grievance_common::{AppError, AppResult};
use serde::Serialize;

/// Trait for SMS delivery.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Send a text message to a 10-digit mobile number.
    async fn send_sms(&self, to: &str, message: &str) -> AppResult<()>;
}

/// Shared notification sender.
pub type SharedNotificationSender = Arc<dyn NotificationSender>;

/// Build the sender selected by configuration.
pub fn from_config(config: &NotificationConfig) -> AppResult<SharedNotificationSender> {
    match config.provider {
        NotificationProvider::Log => Ok(Arc::new(LogNotificationSender)),
        NotificationProvider::Http => Ok(Arc::new(HttpSmsSender::new(config)?)),
    }
}

/// Sender that only writes messages to the log.
#[derive(Clone, Default)]
pub struct LogNotificationSender;

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send_sms(&self, to: &str, message: &str) -> AppResult<()> {
        tracing::info!(to = %to, message = %message, "SMS (log only)");
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SmsPayload<'a> {
    to: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sender_id: Option<&'a str>,
}

/// Sender that POSTs messages to an HTTP SMS gateway.
#[derive(Clone)]
pub struct HttpSmsSender {
    http_client: reqwest::Client,
    gateway_url: String,
    api_key: Option<String>,
    sender_id: Option<String>,
}

impl HttpSmsSender {
    /// Create a sender from configuration. `gateway_url` is required.
    pub fn new(config: &NotificationConfig) -> AppResult<Self> {
        let gateway_url = config
            .gateway_url
            .clone()
            .ok_or_else(|| AppError::Config("notification.gateway_url is required".to_string()))?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            gateway_url,
            api_key: config.api_key.clone(),
            sender_id: config.sender_id.clone(),
        })
    }
}

#[async_trait]
impl NotificationSender for HttpSmsSender {
    async fn send_sms(&self, to: &str, message: &str) -> AppResult<()> {
        let payload = SmsPayload {
            to,
            message,
            sender_id: self.sender_id.as_deref(),
        };

        let mut request = self
            .http_client
            .post(&self.gateway_url)
            .header("User-Agent", "Grievance-SMS/1.0")
            .json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::DependencyTimeout("sms gateway".to_string())
            } else {
                AppError::NotificationDeliveryFailed(format!("Request failed: {e}"))
            }
        })?;

        if response.status().is_success() {
            tracing::debug!(to = %to, "SMS delivered to gateway");
            Ok(())
        } else {
            Err(AppError::NotificationDeliveryFailed(format!(
                "HTTP {}",
                response.status()
            )))
        }
    }
}

/// A message captured by [`MemoryNotificationSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub message: String,
}

/// Sender that keeps messages in memory, for tests and local runs.
#[derive(Clone, Default)]
pub struct MemoryNotificationSender {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failing: Arc<Mutex<bool>>,
}

impl MemoryNotificationSender {
    /// Create an empty sender.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail with [`AppError::NotificationDeliveryFailed`].
    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut flag) = self.failing.lock() {
            *flag = failing;
        }
    }

    /// Messages sent so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Messages sent to one recipient.
    #[must_use]
    pub fn sent_to(&self, to: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|m| m.to == to)
            .map(|m| m.message)
            .collect()
    }
}

#[async_trait]
impl NotificationSender for MemoryNotificationSender {
    async fn send_sms(&self, to: &str, message: &str) -> AppResult<()> {
        if self.failing.lock().map(|f| *f).unwrap_or(false) {
            return Err(AppError::NotificationDeliveryFailed(
                "gateway unavailable".to_string(),
            ));
        }

        self.sent
            .lock()
            .map_err(|_| AppError::Internal("notification log poisoned".to_string()))?
            .push(SentMessage {
                to: to.to_string(),
                message: message.to_string(),
            });
        Ok(())
    }
}

//! Application configuration.
//!
//! Workflow timings (SLA thresholds, OTP lifetime and attempt limit, reminder
//! cooldown, feedback window) are product decisions and have no built-in
//! defaults: a configuration missing any of them fails to load.

use chrono::Duration;
use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Authentication and OTP configuration.
    pub auth: AuthConfig,
    /// Notification sender configuration.
    pub notification: NotificationConfig,
    /// Lifecycle timings.
    pub workflow: WorkflowConfig,
    /// Departments, categories and locations.
    pub catalog: CatalogConfig,
    /// Officers provisioned at startup.
    #[serde(default)]
    pub officers: Vec<OfficerSeed>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Key rate limits on `X-Forwarded-For`/`X-Real-IP`. Only enable behind
    /// a proxy that overwrites those headers.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign tokens.
    pub jwt_secret: String,
    /// Lifetime of issued tokens in seconds.
    pub token_ttl_secs: u64,
    /// Lifetime of an issued OTP in seconds.
    pub otp_ttl_secs: u64,
    /// Wrong codes allowed per issued OTP.
    pub otp_max_attempts: u32,
    /// Upper bound for a single identity verifier call, in milliseconds.
    pub timeout_ms: u64,
}

impl AuthConfig {
    /// Token lifetime.
    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        Duration::seconds(self.token_ttl_secs as i64)
    }

    /// OTP lifetime.
    #[must_use]
    pub fn otp_ttl(&self) -> Duration {
        Duration::seconds(self.otp_ttl_secs as i64)
    }

    /// Identity verifier call timeout.
    #[must_use]
    pub const fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

/// Which notification backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationProvider {
    /// Write messages to the log only.
    #[default]
    Log,
    /// POST messages to an HTTP SMS gateway.
    Http,
}

/// Notification sender configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Backend selection.
    #[serde(default)]
    pub provider: NotificationProvider,
    /// SMS gateway endpoint (required for the `http` provider).
    #[serde(default)]
    pub gateway_url: Option<String>,
    /// SMS gateway API key.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Sender id shown to recipients.
    #[serde(default)]
    pub sender_id: Option<String>,
    /// Upper bound for a single send, in milliseconds.
    pub timeout_ms: u64,
}

impl NotificationConfig {
    /// Send timeout.
    #[must_use]
    pub const fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

/// Lifecycle timings.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// Minimum time between two reminders for one grievance, in seconds.
    pub reminder_cooldown_secs: u64,
    /// Time a resolved grievance waits for feedback before closing, in seconds.
    pub feedback_window_secs: u64,
    /// Per-category SLA thresholds.
    #[serde(default)]
    pub sla: Vec<SlaThreshold>,
}

impl WorkflowConfig {
    /// Reminder cooldown.
    #[must_use]
    pub fn reminder_cooldown(&self) -> Duration {
        Duration::seconds(self.reminder_cooldown_secs as i64)
    }

    /// Feedback window.
    #[must_use]
    pub fn feedback_window(&self) -> Duration {
        Duration::seconds(self.feedback_window_secs as i64)
    }

    /// SLA threshold for a category, if one is configured.
    #[must_use]
    pub fn sla_threshold(&self, category: &str) -> Option<Duration> {
        self.sla
            .iter()
            .find(|t| t.category.eq_ignore_ascii_case(category))
            .map(|t| Duration::seconds(t.threshold_secs as i64))
    }
}

/// SLA threshold for one grievance category.
#[derive(Debug, Clone, Deserialize)]
pub struct SlaThreshold {
    /// Category name.
    pub category: String,
    /// Seconds a grievance may stay in one non-terminal state.
    pub threshold_secs: u64,
}

/// Departments and locations accepted by the portal.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Departments accepting grievances.
    pub departments: Vec<DepartmentConfig>,
    /// States and their districts.
    #[serde(default)]
    pub states: Vec<StateConfig>,
}

impl CatalogConfig {
    /// Find a department by name.
    #[must_use]
    pub fn department(&self, name: &str) -> Option<&DepartmentConfig> {
        self.departments
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    /// Find a state by name.
    #[must_use]
    pub fn state(&self, name: &str) -> Option<&StateConfig> {
        self.states.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

/// A department.
#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentConfig {
    /// Department name.
    pub name: String,
    /// Mobile number receiving reminders and escalations.
    pub contact: String,
    /// Grievance categories handled by the department.
    pub categories: Vec<String>,
}

impl DepartmentConfig {
    /// Whether the department handles a category.
    #[must_use]
    pub fn handles(&self, category: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }
}

/// A state and its districts.
#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    /// State name.
    pub name: String,
    /// District names.
    pub districts: Vec<String>,
}

/// Officer provisioned at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct OfficerSeed {
    /// Employee id used to log in.
    pub employee_id: String,
    /// Display name.
    pub name: String,
    /// Department the officer may act for.
    pub department: String,
    /// Argon2 PHC string.
    pub password_hash: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `GRIEVANCE_ENV`)
    /// 4. Environment variables with `GRIEVANCE__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();
        let env = std::env::var("GRIEVANCE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("GRIEVANCE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("GRIEVANCE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(source: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const EXAMPLE: &str = include_str!("../../../config/example.toml");

    #[test]
    fn test_example_config_parses() {
        let config = Config::from_toml_str(EXAMPLE).unwrap();

        assert_eq!(config.server.port, 3000);
        assert!(!config.server.trust_proxy_headers);
        assert!(config.auth.otp_max_attempts > 0);
        assert!(config.catalog.department("water").is_some());
        assert!(!config.officers.is_empty());
    }

    #[test]
    fn test_sla_threshold_lookup_is_case_insensitive() {
        let config = Config::from_toml_str(EXAMPLE).unwrap();
        let category = config.workflow.sla[0].category.to_uppercase();

        assert!(config.workflow.sla_threshold(&category).is_some());
        assert!(config.workflow.sla_threshold("no such category").is_none());
    }

    #[test]
    fn test_missing_workflow_timings_fail() {
        let source = EXAMPLE.replace("reminder_cooldown_secs", "unused_key");
        assert!(Config::from_toml_str(&source).is_err());
    }

    #[test]
    fn test_department_handles_category() {
        let dept = DepartmentConfig {
            name: "Water".to_string(),
            contact: "9000000001".to_string(),
            categories: vec!["Pipeline Leakage".to_string()],
        };

        assert!(dept.handles("pipeline leakage"));
        assert!(!dept.handles("Power Cut"));
    }
}

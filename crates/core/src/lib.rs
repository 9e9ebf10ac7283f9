//! Core business logic for grievance-rs.

pub mod services;

pub use services::*;

use grievance_common::{AppError, AppResult};
use std::future::Future;
use std::time::Duration;

/// Run a call into an external collaborator, bounded by `limit`.
///
/// Exceeding the limit is reported as [`AppError::DependencyTimeout`] naming
/// `dependency`.
pub async fn bounded<T, F>(dependency: &str, limit: Duration, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| AppError::DependencyTimeout(dependency.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let result: AppResult<()> = bounded("sms", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(AppError::DependencyTimeout(dep)) if dep == "sms"));
    }

    #[tokio::test]
    async fn test_bounded_passes_through_errors() {
        let result: AppResult<()> = bounded("sms", Duration::from_secs(1), async {
            Err(AppError::NotificationDeliveryFailed("gateway down".to_string()))
        })
        .await;

        assert!(matches!(result, Err(AppError::NotificationDeliveryFailed(_))));
    }
}

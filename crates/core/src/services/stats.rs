//! Dashboard statistics.

use std::collections::BTreeMap;

use grievance_common::AppResult;
use grievance_db::entities::GrievanceState;
use grievance_db::repositories::StatsRepository;
use sea_orm::Iterable;
use serde::Serialize;

/// Aggregated counts for the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: u64,
    /// Every state appears, with zero when unused.
    pub by_status: BTreeMap<String, i64>,
    pub by_department: BTreeMap<String, i64>,
    pub average_rating: Option<f64>,
    pub feedback_count: i64,
}

/// Service for statistics.
#[derive(Clone)]
pub struct StatsService {
    stats_repo: StatsRepository,
}

impl StatsService {
    /// Create a new stats service.
    #[must_use]
    pub const fn new(stats_repo: StatsRepository) -> Self {
        Self { stats_repo }
    }

    /// Current counts. Reads stored states as they are, without applying
    /// pending time-based transitions.
    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        let snapshot = self.stats_repo.snapshot().await?;

        let mut by_status: BTreeMap<String, i64> = GrievanceState::iter()
            .map(|s| (s.to_string(), 0))
            .collect();
        for (status, count) in &snapshot.by_status {
            by_status.insert(status.to_string(), *count);
        }

        Ok(DashboardStats {
            total: snapshot.total,
            by_status,
            by_department: snapshot.by_department.iter().cloned().collect(),
            average_rating: snapshot
                .average_rating()
                .map(|r| (r * 100.0).round() / 100.0),
            feedback_count: snapshot.rating_count,
        })
    }
}

//! Time-based lifecycle rules applied when a grievance is read.

use chrono::{DateTime, Duration, Utc};
use grievance_common::config::WorkflowConfig;
use grievance_db::entities::{GrievanceState, grievance};

/// A system transition that has become due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueAction {
    /// No officer action within the category threshold.
    Escalate { threshold: Duration },
    /// Resolved for longer than the feedback window.
    CloseUnanswered { window: Duration },
}

impl DueAction {
    /// Target state of the transition.
    #[must_use]
    pub const fn target(&self) -> GrievanceState {
        match self {
            Self::Escalate { .. } => GrievanceState::Escalated,
            Self::CloseUnanswered { .. } => GrievanceState::Closed,
        }
    }

    /// Timeline remark written with the transition.
    #[must_use]
    pub fn remarks(&self) -> String {
        match self {
            Self::Escalate { threshold } => format!(
                "Escalated automatically: no action within {}",
                describe(*threshold)
            ),
            Self::CloseUnanswered { window } => format!(
                "Closed automatically: no feedback within {}",
                describe(*window)
            ),
        }
    }
}

fn describe(d: Duration) -> String {
    if d.num_days() > 0 && d.num_seconds() % 86_400 == 0 {
        format!("{} day(s)", d.num_days())
    } else if d.num_hours() > 0 && d.num_seconds() % 3_600 == 0 {
        format!("{} hour(s)", d.num_hours())
    } else {
        format!("{} second(s)", d.num_seconds())
    }
}

/// SLA thresholds and the feedback window.
#[derive(Debug, Clone)]
pub struct SlaPolicy {
    workflow: WorkflowConfig,
}

impl SlaPolicy {
    /// Create a policy from the workflow configuration.
    #[must_use]
    pub const fn new(workflow: WorkflowConfig) -> Self {
        Self { workflow }
    }

    /// The system transition `g` is due for at `now`, if any.
    ///
    /// A threshold is measured from the last state change, so an officer
    /// acknowledging a grievance restarts the clock.
    #[must_use]
    pub fn due_action(&self, g: &grievance::Model, now: DateTime<Utc>) -> Option<DueAction> {
        let since: DateTime<Utc> = g.state_changed_at.with_timezone(&Utc);

        if g.status.is_sla_tracked() {
            let threshold = self.workflow.sla_threshold(&g.category)?;
            return (since + threshold <= now).then_some(DueAction::Escalate { threshold });
        }

        if g.status == GrievanceState::Resolved {
            let window = self.workflow.feedback_window();
            return (since + window <= now).then_some(DueAction::CloseUnanswered { window });
        }

        None
    }

    /// Whether the feedback window of a resolved grievance is still open.
    #[must_use]
    pub fn accepts_feedback(&self, g: &grievance::Model, now: DateTime<Utc>) -> bool {
        g.status == GrievanceState::Resolved
            && g.state_changed_at.with_timezone(&Utc) + self.workflow.feedback_window() > now
    }

    /// Minimum time between reminders.
    #[must_use]
    pub fn reminder_cooldown(&self) -> Duration {
        self.workflow.reminder_cooldown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grievance_common::config::SlaThreshold;

    fn policy() -> SlaPolicy {
        SlaPolicy::new(WorkflowConfig {
            reminder_cooldown_secs: 86_400,
            feedback_window_secs: 7 * 86_400,
            sla: vec![SlaThreshold {
                category: "Pipeline Leakage".to_string(),
                threshold_secs: 48 * 3_600,
            }],
        })
    }

    fn grievance(status: GrievanceState, category: &str, at: DateTime<Utc>) -> grievance::Model {
        grievance::Model {
            id: "g1".to_string(),
            ref_id: "JA10000001".to_string(),
            citizen_id: "c1".to_string(),
            department: "Water".to_string(),
            category: category.to_string(),
            subject: "Leak".to_string(),
            description: "Leak".to_string(),
            status,
            location_state: "Rajasthan".to_string(),
            district: "Jaipur".to_string(),
            version: 1,
            state_changed_at: at.into(),
            reminder_count: 0,
            last_reminded_at: None,
            created_at: at.into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_escalates_after_threshold() {
        let start = Utc::now();
        let g = grievance(GrievanceState::Acknowledged, "pipeline leakage", start);

        assert_eq!(policy().due_action(&g, start + Duration::hours(47)), None);
        let due = policy().due_action(&g, start + Duration::hours(48)).unwrap();
        assert_eq!(due.target(), GrievanceState::Escalated);
        assert!(due.remarks().contains("2 day(s)"));
    }

    #[test]
    fn test_unconfigured_category_never_escalates() {
        let start = Utc::now();
        let g = grievance(GrievanceState::Submitted, "Stray Animals", start);

        assert_eq!(policy().due_action(&g, start + Duration::days(365)), None);
    }

    #[test]
    fn test_escalated_and_closed_are_left_alone() {
        let start = Utc::now();
        let later = start + Duration::days(30);

        for status in [GrievanceState::Escalated, GrievanceState::Closed] {
            let g = grievance(status, "Pipeline Leakage", start);
            assert_eq!(policy().due_action(&g, later), None);
        }
    }

    #[test]
    fn test_feedback_window() {
        let start = Utc::now();
        let g = grievance(GrievanceState::Resolved, "Pipeline Leakage", start);

        assert!(policy().accepts_feedback(&g, start + Duration::days(6)));
        assert_eq!(policy().due_action(&g, start + Duration::days(6)), None);

        assert!(!policy().accepts_feedback(&g, start + Duration::days(7)));
        assert_eq!(
            policy().due_action(&g, start + Duration::days(7)).map(|a| a.target()),
            Some(GrievanceState::Closed)
        );
    }
}

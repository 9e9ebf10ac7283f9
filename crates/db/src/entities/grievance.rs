//! Grievance entity.

use std::fmt;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a grievance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum GrievanceState {
    #[sea_orm(string_value = "submitted")]
    Submitted,
    #[sea_orm(string_value = "acknowledged")]
    Acknowledged,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "escalated")]
    Escalated,
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl GrievanceState {
    /// Returns the states reachable from this state.
    #[must_use]
    pub const fn valid_transitions(&self) -> &'static [Self] {
        match self {
            Self::Submitted => &[Self::Acknowledged, Self::Escalated],
            Self::Acknowledged => &[Self::InProgress, Self::Escalated],
            Self::InProgress => &[Self::Resolved, Self::Escalated],
            Self::Resolved => &[Self::Closed],
            Self::Escalated => &[Self::InProgress, Self::Closed],
            Self::Closed => &[],
        }
    }

    /// Returns `true` if moving to `target` is allowed from this state.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        self.valid_transitions().contains(&target)
    }

    /// Returns `true` for `Closed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns `true` if an officer still owes work on the grievance.
    ///
    /// Only these states are subject to SLA escalation.
    #[must_use]
    pub const fn is_sla_tracked(&self) -> bool {
        matches!(self, Self::Submitted | Self::Acknowledged | Self::InProgress)
    }

    /// Returns `true` once the department has finished with the grievance.
    ///
    /// Reminders are not accepted in these states.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }

    /// Returns the state name used in API payloads and timeline actions.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::Acknowledged => "Acknowledged",
            Self::InProgress => "InProgress",
            Self::Resolved => "Resolved",
            Self::Escalated => "Escalated",
            Self::Closed => "Closed",
        }
    }
}

impl fmt::Display for GrievanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grievance")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Public reference id (e.g. `JA1760601234567`)
    #[sea_orm(unique)]
    pub ref_id: String,

    /// Owning citizen
    #[sea_orm(indexed)]
    pub citizen_id: String,

    /// Department with write access
    #[sea_orm(indexed)]
    pub department: String,

    pub category: String,

    pub subject: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Lifecycle state
    pub status: GrievanceState,

    /// Location: state name
    pub location_state: String,

    /// Location: district name
    pub district: String,

    /// Incremented by every transition; the next timeline sequence
    pub version: i32,

    /// Time of the last transition (creation time until the first one)
    pub state_changed_at: DateTimeWithTimeZone,

    #[sea_orm(default_value = 0)]
    pub reminder_count: i32,

    #[sea_orm(nullable)]
    pub last_reminded_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::citizen::Entity",
        from = "Column::CitizenId",
        to = "super::citizen::Column::Id"
    )]
    Citizen,

    #[sea_orm(has_many = "super::timeline_entry::Entity")]
    TimelineEntry,

    #[sea_orm(has_one = "super::feedback::Entity")]
    Feedback,

    #[sea_orm(has_many = "super::reminder::Entity")]
    Reminder,
}

impl Related<super::citizen::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Citizen.def()
    }
}

impl Related<super::timeline_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TimelineEntry.def()
    }
}

impl Related<super::feedback::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Feedback.def()
    }
}

impl Related<super::reminder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reminder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn test_happy_path_is_allowed() {
        let path = [
            GrievanceState::Submitted,
            GrievanceState::Acknowledged,
            GrievanceState::InProgress,
            GrievanceState::Resolved,
            GrievanceState::Closed,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_skipping_states_is_rejected() {
        assert!(!GrievanceState::Submitted.can_transition_to(GrievanceState::Resolved));
        assert!(!GrievanceState::Submitted.can_transition_to(GrievanceState::InProgress));
        assert!(!GrievanceState::Acknowledged.can_transition_to(GrievanceState::Resolved));
        assert!(!GrievanceState::Resolved.can_transition_to(GrievanceState::InProgress));
    }

    #[test]
    fn test_escalation_edges() {
        assert!(GrievanceState::Submitted.can_transition_to(GrievanceState::Escalated));
        assert!(GrievanceState::Acknowledged.can_transition_to(GrievanceState::Escalated));
        assert!(GrievanceState::InProgress.can_transition_to(GrievanceState::Escalated));
        assert!(!GrievanceState::Resolved.can_transition_to(GrievanceState::Escalated));
        assert!(GrievanceState::Escalated.can_transition_to(GrievanceState::InProgress));
        assert!(GrievanceState::Escalated.can_transition_to(GrievanceState::Closed));
    }

    #[test]
    fn test_closed_is_terminal() {
        assert!(GrievanceState::Closed.is_terminal());
        assert!(GrievanceState::Closed.valid_transitions().is_empty());
        for state in GrievanceState::iter() {
            assert!(!state.can_transition_to(state), "{state} loops onto itself");
        }
    }

    #[test]
    fn test_sla_tracked_states() {
        let tracked: Vec<_> = GrievanceState::iter()
            .filter(GrievanceState::is_sla_tracked)
            .collect();
        assert_eq!(
            tracked,
            vec![
                GrievanceState::Submitted,
                GrievanceState::Acknowledged,
                GrievanceState::InProgress
            ]
        );
    }

    #[test]
    fn test_serde_names_match_api() {
        let json = serde_json::to_string(&GrievanceState::InProgress).unwrap_or_default();
        assert_eq!(json, "\"InProgress\"");
    }
}

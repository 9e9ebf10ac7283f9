//! Grievance lifecycle engine.

use chrono::{DateTime, Utc};
use grievance_common::{AppError, AppResult, IdGenerator, RefIdGenerator, SharedClock};
use grievance_db::entities::{GrievanceState, grievance, timeline_entry};
use grievance_db::repositories::{CitizenRepository, GrievanceRepository, TimelineRepository};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::bounded;
use crate::services::catalog::CatalogService;
use crate::services::identity::is_valid_mobile;
use crate::services::notification::SharedNotificationSender;
use crate::services::sla::{DueAction, SlaPolicy};

/// Attempts at finding an unused reference id before giving up.
pub const MAX_REF_ID_ATTEMPTS: u32 = 5;

/// Who is moving a grievance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// An officer acting for their department.
    Officer {
        officer_id: String,
        department: String,
    },
    /// Time-based rules.
    System,
}

impl Actor {
    /// Check that the actor may act on `g`.
    pub fn authorize(&self, g: &grievance::Model) -> AppResult<()> {
        match self {
            Self::System => Ok(()),
            Self::Officer { department, .. } if department == &g.department => Ok(()),
            Self::Officer { department, .. } => Err(AppError::Unauthorized(format!(
                "{department} officers cannot act on {} grievances",
                g.department
            ))),
        }
    }

    fn officer_id(&self) -> Option<String> {
        match self {
            Self::Officer { officer_id, .. } => Some(officer_id.clone()),
            Self::System => None,
        }
    }
}

/// Input for submitting a grievance.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitGrievanceInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub state: String,
    #[validate(length(min = 1, max = 64))]
    pub district: String,
    #[validate(length(min = 1, max = 64))]
    pub department: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(length(min = 5, max = 200))]
    pub subject: String,
    #[validate(length(min = 10, max = 5000))]
    pub description: String,
}

/// Response for a grievance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrievanceResponse {
    pub ref_id: String,
    pub department: String,
    pub category: String,
    pub subject: String,
    pub description: String,
    pub status: GrievanceState,
    pub state: String,
    pub district: String,
    pub reminder_count: i32,
    pub last_reminded_at: Option<String>,
    pub state_changed_at: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<grievance::Model> for GrievanceResponse {
    fn from(g: grievance::Model) -> Self {
        Self {
            ref_id: g.ref_id,
            department: g.department,
            category: g.category,
            subject: g.subject,
            description: g.description,
            status: g.status,
            state: g.location_state,
            district: g.district,
            reminder_count: g.reminder_count,
            last_reminded_at: g.last_reminded_at.map(|t| t.to_rfc3339()),
            state_changed_at: g.state_changed_at.to_rfc3339(),
            created_at: g.created_at.to_rfc3339(),
            updated_at: g.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Response for a timeline entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntryResponse {
    pub sequence: i32,
    pub action: String,
    pub status: GrievanceState,
    pub remarks: Option<String>,
    pub officer_id: Option<String>,
    pub created_at: String,
}

impl From<timeline_entry::Model> for TimelineEntryResponse {
    fn from(e: timeline_entry::Model) -> Self {
        Self {
            sequence: e.sequence,
            action: e.action,
            status: e.status,
            remarks: e.remarks,
            officer_id: e.officer_id,
            created_at: e.created_at.to_rfc3339(),
        }
    }
}

/// A grievance with its full timeline.
#[derive(Debug, Clone)]
pub struct GrievanceDetail {
    pub grievance: grievance::Model,
    pub timeline: Vec<timeline_entry::Model>,
}

/// The grievance state machine and its read paths.
#[derive(Clone)]
pub struct GrievanceService {
    grievance_repo: GrievanceRepository,
    timeline_repo: TimelineRepository,
    citizen_repo: CitizenRepository,
    catalog: CatalogService,
    sla: SlaPolicy,
    notifier: SharedNotificationSender,
    notify_timeout: Duration,
    clock: SharedClock,
    id_gen: IdGenerator,
    ref_ids: RefIdGenerator,
}

impl GrievanceService {
    /// Create a new grievance service.
    #[must_use]
    pub fn new(
        grievance_repo: GrievanceRepository,
        timeline_repo: TimelineRepository,
        citizen_repo: CitizenRepository,
        catalog: CatalogService,
        sla: SlaPolicy,
        notifier: SharedNotificationSender,
        notify_timeout: Duration,
        clock: SharedClock,
    ) -> Self {
        Self {
            grievance_repo,
            timeline_repo,
            citizen_repo,
            catalog,
            sla,
            notifier,
            notify_timeout,
            clock,
            id_gen: IdGenerator::new(),
            ref_ids: RefIdGenerator::new(),
        }
    }

    /// Submit a grievance for the citizen verified as `mobile`.
    ///
    /// The citizen is registered on first submission. The grievance starts in
    /// `Submitted` with a single timeline entry.
    pub async fn submit(
        &self,
        mobile: &str,
        input: SubmitGrievanceInput,
    ) -> AppResult<grievance::Model> {
        input.validate()?;
        if !is_valid_mobile(mobile) {
            return Err(AppError::Validation(
                "Mobile number must be 10 digits".to_string(),
            ));
        }

        let department = self.catalog.validate_submission(
            &input.department,
            &input.category,
            &input.state,
            &input.district,
        )?;

        let now = self.clock.now();
        let citizen = self
            .citizen_repo
            .find_or_create(
                self.id_gen.generate(),
                mobile,
                input.name.clone(),
                input.email.clone(),
                now,
            )
            .await?;

        for attempt in 1..=MAX_REF_ID_ATTEMPTS {
            let id = self.id_gen.generate();
            let ref_id = self.ref_ids.generate(now);

            let model = grievance::ActiveModel {
                id: Set(id.clone()),
                ref_id: Set(ref_id.clone()),
                citizen_id: Set(citizen.id.clone()),
                department: Set(department.clone()),
                category: Set(input.category.clone()),
                subject: Set(input.subject.clone()),
                description: Set(input.description.clone()),
                status: Set(GrievanceState::Submitted),
                location_state: Set(input.state.clone()),
                district: Set(input.district.clone()),
                version: Set(1),
                state_changed_at: Set(now.into()),
                reminder_count: Set(0),
                last_reminded_at: Set(None),
                created_at: Set(now.into()),
                updated_at: Set(None),
            };

            let entry = timeline_entry::ActiveModel {
                id: Set(self.id_gen.generate()),
                grievance_id: Set(id),
                sequence: Set(1),
                action: Set(GrievanceState::Submitted.to_string()),
                status: Set(GrievanceState::Submitted),
                remarks: Set(Some("Grievance registered".to_string())),
                officer_id: Set(None),
                created_at: Set(now.into()),
            };

            match self.grievance_repo.create_with_entry(model, entry).await {
                Ok(created) => {
                    tracing::info!(
                        ref_id = %created.ref_id,
                        department = %created.department,
                        "Grievance submitted"
                    );
                    return Ok(created);
                }
                Err(AppError::Conflict(_)) => {
                    tracing::warn!(attempt, ref_id = %ref_id, "Reference id taken, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::IdGenerationExhausted)
    }

    /// Move a grievance to `to` on behalf of `actor`.
    pub async fn transition(
        &self,
        ref_id: &str,
        to: GrievanceState,
        actor: &Actor,
        remarks: Option<String>,
    ) -> AppResult<grievance::Model> {
        let current = self.grievance_repo.get_by_ref_id(ref_id).await?;
        self.apply(&current, to, actor, remarks).await
    }

    async fn apply(
        &self,
        current: &grievance::Model,
        to: GrievanceState,
        actor: &Actor,
        remarks: Option<String>,
    ) -> AppResult<grievance::Model> {
        actor.authorize(current)?;

        // Resolved grievances close on feedback or once the feedback window lapses
        let officer_closing_resolved = matches!(actor, Actor::Officer { .. })
            && current.status == GrievanceState::Resolved
            && to == GrievanceState::Closed;

        if officer_closing_resolved || !current.status.can_transition_to(to) {
            return Err(AppError::InvalidTransition {
                from: current.status.to_string(),
                to: to.to_string(),
            });
        }

        let at = self.transition_time(current);
        let entry = timeline_entry::ActiveModel {
            id: Set(self.id_gen.generate()),
            action: Set(to.to_string()),
            remarks: Set(remarks),
            officer_id: Set(actor.officer_id()),
            ..Default::default()
        };

        let updated = self
            .grievance_repo
            .apply_transition(current, to, at, entry)
            .await?;

        tracing::info!(
            ref_id = %updated.ref_id,
            from = %current.status,
            to = %to,
            actor = ?actor,
            "Grievance transitioned"
        );
        Ok(updated)
    }

    /// Timeline times never go backwards, even if the clock does.
    fn transition_time(&self, current: &grievance::Model) -> DateTime<Utc> {
        self.clock
            .now()
            .max(current.state_changed_at.with_timezone(&Utc))
    }

    /// Apply any time-based transition that has become due.
    ///
    /// Losing a race against another writer is not an error here: the stored
    /// grievance is returned instead.
    pub async fn evaluate(&self, g: grievance::Model) -> AppResult<grievance::Model> {
        let Some(action) = self.sla.due_action(&g, self.clock.now()) else {
            return Ok(g);
        };

        match self
            .apply(&g, action.target(), &Actor::System, Some(action.remarks()))
            .await
        {
            Ok(updated) => {
                if matches!(action, DueAction::Escalate { .. }) {
                    self.notify_escalation(&updated).await;
                }
                Ok(updated)
            }
            Err(AppError::ConcurrentModification) => self
                .grievance_repo
                .find_by_id(&g.id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Grievance {}", g.ref_id))),
            Err(e) => Err(e),
        }
    }

    async fn notify_escalation(&self, g: &grievance::Model) {
        let Some(contact) = self.catalog.contact_for(&g.department) else {
            tracing::warn!(department = %g.department, "No contact configured for escalation");
            return;
        };

        let message = format!(
            "Grievance {} ({}) has been escalated: no action within the service level.",
            g.ref_id, g.category
        );
        if let Err(e) = bounded(
            "sms gateway",
            self.notify_timeout,
            self.notifier.send_sms(contact, &message),
        )
        .await
        {
            tracing::warn!(ref_id = %g.ref_id, error = %e, "Failed to notify escalation");
        }
    }

    /// Get a grievance and its ordered timeline.
    pub async fn track(&self, ref_id: &str) -> AppResult<GrievanceDetail> {
        let current = self.grievance_repo.get_by_ref_id(ref_id).await?;
        let grievance = self.evaluate(current).await?;
        let timeline = self.timeline_repo.find_by_grievance(&grievance.id).await?;

        Ok(GrievanceDetail {
            grievance,
            timeline,
        })
    }

    /// Get the grievances of the citizen registered under `mobile`, newest
    /// first. An unknown mobile has no grievances.
    pub async fn my_grievances(&self, mobile: &str) -> AppResult<Vec<grievance::Model>> {
        let Some(citizen) = self.citizen_repo.find_by_mobile(mobile).await? else {
            return Ok(Vec::new());
        };

        let grievances = self.grievance_repo.find_by_citizen(&citizen.id).await?;
        self.evaluate_all(grievances).await
    }

    /// Get a department's grievances, newest first.
    pub async fn department_grievances(
        &self,
        department: &str,
        status: Option<GrievanceState>,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<grievance::Model>> {
        let grievances = self
            .grievance_repo
            .find_by_department(department, status, limit, until_id)
            .await?;
        self.evaluate_all(grievances).await
    }

    async fn evaluate_all(
        &self,
        grievances: Vec<grievance::Model>,
    ) -> AppResult<Vec<grievance::Model>> {
        let mut evaluated = Vec::with_capacity(grievances.len());
        for g in grievances {
            evaluated.push(self.evaluate(g).await?);
        }
        Ok(evaluated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grievance_db::entities::grievance;

    fn water(status: GrievanceState) -> grievance::Model {
        let now = Utc::now();
        grievance::Model {
            id: "g1".to_string(),
            ref_id: "JA10000001".to_string(),
            citizen_id: "c1".to_string(),
            department: "Water".to_string(),
            category: "Pipeline Leakage".to_string(),
            subject: "Leak".to_string(),
            description: "Leak".to_string(),
            status,
            location_state: "Rajasthan".to_string(),
            district: "Jaipur".to_string(),
            version: 1,
            state_changed_at: now.into(),
            reminder_count: 0,
            last_reminded_at: None,
            created_at: now.into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_officer_authorization_is_department_equality() {
        let g = water(GrievanceState::Submitted);
        let water_officer = Actor::Officer {
            officer_id: "o1".to_string(),
            department: "Water".to_string(),
        };
        let power_officer = Actor::Officer {
            officer_id: "o2".to_string(),
            department: "Electricity".to_string(),
        };

        assert!(water_officer.authorize(&g).is_ok());
        assert!(matches!(
            power_officer.authorize(&g),
            Err(AppError::Unauthorized(_))
        ));
        assert!(Actor::System.authorize(&g).is_ok());
    }

    #[test]
    fn test_response_uses_api_names() {
        let json = serde_json::to_value(GrievanceResponse::from(water(
            GrievanceState::InProgress,
        )))
        .unwrap_or_default();

        assert_eq!(json["refId"], "JA10000001");
        assert_eq!(json["status"], "InProgress");
        assert_eq!(json["state"], "Rajasthan");
        assert!(json.get("citizenId").is_none());
    }
}

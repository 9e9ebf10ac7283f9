//! Citizen reminders to the responsible department.

use chrono::Utc;
use grievance_common::{AppError, AppResult, IdGenerator, SharedClock};
use grievance_db::entities::reminder;
use grievance_db::repositories::{CitizenRepository, GrievanceRepository, ReminderRepository};
use sea_orm::Set;
use std::time::Duration;

use crate::bounded;
use crate::services::catalog::CatalogService;
use crate::services::notification::SharedNotificationSender;
use crate::services::sla::SlaPolicy;

/// Service for sending reminders.
#[derive(Clone)]
pub struct ReminderService {
    grievance_repo: GrievanceRepository,
    citizen_repo: CitizenRepository,
    reminder_repo: ReminderRepository,
    catalog: CatalogService,
    sla: SlaPolicy,
    notifier: SharedNotificationSender,
    notify_timeout: Duration,
    clock: SharedClock,
    id_gen: IdGenerator,
}

impl ReminderService {
    /// Create a new reminder service.
    #[must_use]
    pub fn new(
        grievance_repo: GrievanceRepository,
        citizen_repo: CitizenRepository,
        reminder_repo: ReminderRepository,
        catalog: CatalogService,
        sla: SlaPolicy,
        notifier: SharedNotificationSender,
        notify_timeout: Duration,
        clock: SharedClock,
    ) -> Self {
        Self {
            grievance_repo,
            citizen_repo,
            reminder_repo,
            catalog,
            sla,
            notifier,
            notify_timeout,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Send a reminder about `ref_id` on behalf of the citizen `mobile`.
    ///
    /// The reminder is recorded before it is handed to the sender and stays
    /// recorded if sending fails.
    pub async fn send_reminder(&self, ref_id: &str, mobile: &str) -> AppResult<()> {
        let not_found = || AppError::NotFound(format!("Grievance {ref_id}"));

        let g = self
            .grievance_repo
            .find_by_ref_id(ref_id)
            .await?
            .ok_or_else(not_found)?;
        let owner = self.citizen_repo.find_by_mobile(mobile).await?;
        if owner.map(|c| c.id) != Some(g.citizen_id.clone()) {
            return Err(not_found());
        }

        if g.status.is_settled() {
            return Err(AppError::NotEligible(format!(
                "Grievance is already {}",
                g.status
            )));
        }

        let now = self.clock.now();
        if let Some(last) = g.last_reminded_at {
            let next_allowed = last.with_timezone(&Utc) + self.sla.reminder_cooldown();
            if now < next_allowed {
                return Err(AppError::NotEligible(format!(
                    "Next reminder allowed after {}",
                    next_allowed.to_rfc3339()
                )));
            }
        }

        let model = reminder::ActiveModel {
            id: Set(self.id_gen.generate()),
            grievance_id: Set(g.id.clone()),
            mobile: Set(mobile.to_string()),
            sent_at: Set(now.into()),
        };
        let updated = self.reminder_repo.record(&g, model, now).await?;

        tracing::info!(
            ref_id = %updated.ref_id,
            count = updated.reminder_count,
            "Reminder recorded"
        );

        let contact = self.catalog.contact_for(&g.department).ok_or_else(|| {
            AppError::NotificationDeliveryFailed(format!(
                "No contact configured for {}",
                g.department
            ))
        })?;
        let message = format!(
            "Reminder #{}: grievance {} ({}) filed on {} is still {}.",
            updated.reminder_count,
            g.ref_id,
            g.category,
            g.created_at.format("%d %b %Y"),
            g.status
        );

        bounded(
            "sms gateway",
            self.notify_timeout,
            self.notifier.send_sms(contact, &message),
        )
        .await
        .inspect_err(|e| {
            tracing::warn!(ref_id = %g.ref_id, error = %e, "Reminder recorded but not delivered");
        })
    }

    /// Number of reminders sent for a grievance.
    pub async fn reminder_count(&self, ref_id: &str) -> AppResult<usize> {
        let g = self.grievance_repo.get_by_ref_id(ref_id).await?;
        Ok(self.reminder_repo.find_by_grievance(&g.id).await?.len())
    }
}

//! Business logic services.

#![allow(missing_docs)]

pub mod catalog;
pub mod feedback;
pub mod grievance;
pub mod identity;
pub mod notification;
pub mod officer;
pub mod reminder;
pub mod sla;
pub mod stats;

pub use catalog::{CatalogService, DepartmentSummary};
pub use feedback::{FeedbackResponse, FeedbackService, SubmitFeedbackInput};
pub use grievance::{
    Actor, GrievanceDetail, GrievanceResponse, GrievanceService, MAX_REF_ID_ATTEMPTS,
    SubmitGrievanceInput, TimelineEntryResponse,
};
pub use identity::{
    Identity, IdentityVerifier, OtpIdentityVerifier, SharedIdentityVerifier, is_valid_mobile,
};
pub use notification::{
    HttpSmsSender, LogNotificationSender, MemoryNotificationSender, NotificationSender,
    SentMessage, SharedNotificationSender,
};
pub use officer::{OfficerLoginInput, OfficerResponse, OfficerService, hash_password};
pub use reminder::ReminderService;
pub use sla::{DueAction, SlaPolicy};
pub use stats::{DashboardStats, StatsService};

//! Database entities.

#![allow(missing_docs)]

pub mod citizen;
pub mod feedback;
pub mod grievance;
pub mod officer;
pub mod reminder;
pub mod timeline_entry;

pub use citizen::Entity as Citizen;
pub use feedback::Entity as Feedback;
pub use grievance::{Entity as Grievance, GrievanceState};
pub use officer::Entity as Officer;
pub use reminder::Entity as Reminder;
pub use timeline_entry::Entity as TimelineEntry;

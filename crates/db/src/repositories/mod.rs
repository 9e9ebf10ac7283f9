//! Database repositories.

mod citizen;
mod feedback;
mod grievance;
mod officer;
mod reminder;
mod stats;
mod timeline;

pub use citizen::CitizenRepository;
pub use feedback::FeedbackRepository;
pub use grievance::GrievanceRepository;
pub use officer::OfficerRepository;
pub use reminder::ReminderRepository;
pub use stats::{StatsRepository, StatsSnapshot};
pub use timeline::TimelineRepository;

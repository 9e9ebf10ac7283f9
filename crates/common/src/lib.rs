//! Common utilities and shared types for grievance-rs.
//!
//! This crate provides foundational components used across all grievance-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error taxonomy via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID keys via [`IdGenerator`], reference ids via [`RefIdGenerator`]
//! - **Clock**: Injectable time source via [`Clock`]
//! - **Tokens**: JWT signing and verification via [`TokenSigner`]
//!
//! # Example
//!
//! ```no_run
//! use grievance_common::{AppResult, Config, RefIdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let ref_ids = RefIdGenerator::new();
//!     let ref_id = ref_ids.generate(chrono::Utc::now());
//!     println!("{} listening on {}", ref_id, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod id;
pub mod token;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::{IdGenerator, REF_ID_PREFIX, RefIdGenerator};
pub use token::{Claims, Role, TokenSigner};

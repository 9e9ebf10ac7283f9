//! ID generation utilities.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ulid::Ulid;

/// Prefix of every grievance reference id.
pub const REF_ID_PREFIX: &str = "JA";

/// ID generator for internal entity keys.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are:
    /// - Lexicographically sortable
    /// - Monotonically increasing within the same millisecond
    /// - Shorter than UUIDs when represented as strings
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }
}

/// Generator for human-readable grievance reference ids.
///
/// A reference id is [`REF_ID_PREFIX`] followed by the creation time in
/// milliseconds. Ids issued by one generator are strictly increasing: when two
/// grievances are created in the same millisecond the later one is bumped to
/// the next free value. Cloned generators share their state.
///
/// Uniqueness across processes is left to the store's unique index; callers
/// retry with a fresh id on collision.
#[derive(Debug, Clone, Default)]
pub struct RefIdGenerator {
    last: Arc<AtomicU64>,
}

impl RefIdGenerator {
    /// Create a new reference id generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a reference id for a grievance created at `now`.
    #[must_use]
    pub fn generate(&self, now: DateTime<Utc>) -> String {
        let candidate = now.timestamp_millis().max(0) as u64;
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = candidate.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return format!("{REF_ID_PREFIX}{next:08}"),
                Err(current) => last = current,
            }
        }
    }

    /// Whether a string has the shape of a reference id.
    #[must_use]
    pub fn is_valid(ref_id: &str) -> bool {
        ref_id.strip_prefix(REF_ID_PREFIX).is_some_and(|digits| {
            digits.len() >= 8 && digits.bytes().all(|b| b.is_ascii_digit())
        })
    }
}

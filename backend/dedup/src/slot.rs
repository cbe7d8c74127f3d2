//! Two-phase storage for deadlines that must be computed exactly once.
//!
//! Recomputing a deadline from "now" on every tick would postpone it
//! forever. Instead the first observation stores the computed instant under
//! `appeal_deadline:{course_id}`; later ticks read the stored value back
//! and, once it is past due, transition + notify + delete the key. The
//! tri-state below replaces the original ad hoc key-presence checks.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset};
use paceline_core::{CourseId, PacelineError};
use tracing::warn;

use crate::kv::KvStore;

/// What a tick observes for a course's stored deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineSlot {
    /// Nothing stored yet; the caller computes and stores now.
    NotComputed,
    /// A deadline was stored earlier and must be reused, never recomputed.
    Stored(DateTime<FixedOffset>),
}

/// TTL long enough to outlive any legitimate appeal window; the slot is
/// deleted explicitly on consumption well before this.
const SLOT_TTL_DAYS: i64 = 7;

#[derive(Clone)]
pub struct DeadlineSlots {
    kv: Arc<dyn KvStore>,
}

impl DeadlineSlots {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    fn key(course_id: CourseId) -> String {
        format!("appeal_deadline:{course_id}")
    }

    pub async fn observe(&self, course_id: CourseId) -> Result<DeadlineSlot, PacelineError> {
        match self.kv.get(&Self::key(course_id)).await? {
            None => Ok(DeadlineSlot::NotComputed),
            Some(raw) => match DateTime::parse_from_rfc3339(&raw) {
                Ok(at) => Ok(DeadlineSlot::Stored(at)),
                Err(e) => {
                    // An unreadable slot is treated as absent so the course
                    // cannot get stuck; the deadline restarts from now.
                    warn!(course_id = %course_id, error = %e, "Dropping unreadable deadline slot");
                    self.kv.del(&Self::key(course_id)).await?;
                    Ok(DeadlineSlot::NotComputed)
                }
            },
        }
    }

    pub async fn store(
        &self,
        course_id: CourseId,
        at: DateTime<FixedOffset>,
    ) -> Result<(), PacelineError> {
        self.kv
            .set_ex(&Self::key(course_id), &at.to_rfc3339(), Duration::days(SLOT_TTL_DAYS))
            .await
    }

    /// Third state of the slot: consumed. Deletes the key after the stored
    /// deadline has been acted on (or invalidated by a status change).
    pub async fn consume(&self, course_id: CourseId) -> Result<(), PacelineError> {
        self.kv.del(&Self::key(course_id)).await
    }
}

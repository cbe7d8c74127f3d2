//! Per-(course, calendar day, kind) "already acted" markers.
//!
//! The contract every scheduler task follows: check `was_sent` before any
//! externally visible effect, and call `mark_sent` immediately after a
//! successful transition and before attempting notifications. A failed
//! notification must never re-trigger a transition, and a failed transition
//! must never suppress a future retry.

use std::sync::Arc;

use chrono::Duration;
use paceline_core::{Clock, CourseId, PacelineError};

use crate::kv::KvStore;

/// Which notification/transition category already fired for a course today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    PreIntake,
    LateStrike,
    NoVideo,
    ReviewDeadline,
    ReshootDeadline,
    AppealDeadline,
    AppealButton,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreIntake => "pre_intake",
            Self::LateStrike => "late_strike",
            Self::NoVideo => "no_video",
            Self::ReviewDeadline => "review_deadline",
            Self::ReshootDeadline => "reshoot_deadline",
            Self::AppealDeadline => "appeal_deadline",
            Self::AppealButton => "appeal_button",
        }
    }
}

/// Markers expire after a day; the calendar date in the key makes a marker
/// from yesterday irrelevant even before it expires.
const MARKER_TTL_HOURS: i64 = 24;

#[derive(Clone)]
pub struct DedupLedger {
    kv: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl DedupLedger {
    pub fn new(kv: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self { kv, clock }
    }

    fn key(&self, course_id: CourseId, kind: ReminderKind) -> String {
        let date = self.clock.now().date_naive().format("%Y-%m-%d");
        format!("sent:{course_id}:{date}:{}", kind.as_str())
    }

    pub async fn was_sent(
        &self,
        course_id: CourseId,
        kind: ReminderKind,
    ) -> Result<bool, PacelineError> {
        self.kv.exists(&self.key(course_id, kind)).await
    }

    pub async fn mark_sent(
        &self,
        course_id: CourseId,
        kind: ReminderKind,
    ) -> Result<(), PacelineError> {
        self.kv
            .set_ex(&self.key(course_id, kind), "1", Duration::hours(MARKER_TTL_HOURS))
            .await
    }
}

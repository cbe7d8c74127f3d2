//! Repository contracts for courses and intake logs.
//!
//! Every transition is a single conditional update against the backing
//! store (`WHERE id = ? AND status = ?`), never read-then-write in
//! application code. A `false` return means the guard did not match:
//! a lost race, which callers treat as an expected outcome, not a fault.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};

use paceline_core::{
    Course, CourseId, IntakeLog, LogId, LogStatus, PacelineError, RemovalReason,
};

/// Fields needed to enroll a new course in Setup.
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub id: CourseId,
    pub participant_id: i64,
    pub invite_token: String,
    pub cycle_day: u32,
    pub intake_time: NaiveTime,
    pub start_date: NaiveDate,
    pub total_days: u32,
    pub topic_id: Option<i64>,
    pub registration_message_id: Option<i64>,
}

/// Typed, guarded operations over course rows.
#[async_trait]
pub trait CourseStore: Send + Sync {
    // -- reads ------------------------------------------------------------

    async fn get(&self, id: CourseId) -> Result<Option<Course>, PacelineError>;

    async fn find_by_invite(&self, token: &str) -> Result<Option<Course>, PacelineError>;

    /// Active courses whose intake time falls inside the given time-of-day
    /// band (inclusive). A band with `start > end` matches nothing.
    async fn active_in_intake_band(
        &self,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Vec<Course>, PacelineError>;

    /// Courses currently awaiting an appeal decision.
    async fn appeal_courses(&self) -> Result<Vec<Course>, PacelineError>;

    /// Refused courses still holding an unused appeal option
    /// (appealable reason, quota below `max_appeals`).
    async fn refused_with_appeal_option(
        &self,
        max_appeals: u32,
    ) -> Result<Vec<Course>, PacelineError>;

    /// Ended courses (Completed, Expired, Refused) last touched at or before
    /// `cutoff` that still hold a chat-topic reference.
    async fn ended_with_topic(
        &self,
        cutoff: DateTime<FixedOffset>,
    ) -> Result<Vec<Course>, PacelineError>;

    /// Unactivated courses whose start date has rolled past `date`.
    async fn setup_before(&self, date: NaiveDate) -> Result<Vec<Course>, PacelineError>;

    // -- enrollment -------------------------------------------------------

    async fn insert_course(&self, course: &NewCourse) -> Result<(), PacelineError>;

    /// Consumes the invite; guarded by `invite_used = false`.
    async fn mark_invite_used(&self, id: CourseId) -> Result<bool, PacelineError>;

    // -- guarded transitions ----------------------------------------------

    /// Setup→Active. Stamps cycle metadata, intake time, start date, day 1.
    async fn activate(
        &self,
        id: CourseId,
        cycle_day: u32,
        intake_time: NaiveTime,
        start_date: NaiveDate,
    ) -> Result<bool, PacelineError>;

    /// Setup→Expired (date rollover on an unactivated course).
    async fn expire_if_setup(&self, id: CourseId) -> Result<bool, PacelineError>;

    /// Refused→Appeal. The caller pre-validates removal reason and quota;
    /// the store only guards the current status.
    async fn start_appeal(&self, id: CourseId) -> Result<bool, PacelineError>;

    /// Appeal→Active.
    async fn accept_appeal(
        &self,
        id: CourseId,
        new_appeal_count: u32,
    ) -> Result<bool, PacelineError>;

    /// Appeal→Refused with `AppealDeclined`. Terminal.
    async fn decline_appeal(
        &self,
        id: CourseId,
        new_appeal_count: u32,
    ) -> Result<bool, PacelineError>;

    /// Active→Refused. The operation every automatic-removal task calls.
    async fn refuse_if_active(
        &self,
        id: CourseId,
        reason: RemovalReason,
    ) -> Result<bool, PacelineError>;

    /// Appeal→Refused with `AppealExpired`. Used only by appeal-deadline expiry.
    async fn refuse_if_appeal(
        &self,
        id: CourseId,
        new_appeal_count: u32,
    ) -> Result<bool, PacelineError>;

    /// Grants extra days exactly once; guarded by `extended = false`.
    async fn extend(&self, id: CourseId, new_total_days: u32) -> Result<bool, PacelineError>;

    /// Active→Completed.
    async fn complete_course_active(&self, id: CourseId) -> Result<bool, PacelineError>;

    // -- guarded non-transition updates -----------------------------------

    /// Records a late strike for `on` and returns the new count, or None if
    /// the course is no longer Active or already struck for that date.
    async fn add_strike(
        &self,
        id: CourseId,
        on: NaiveDate,
    ) -> Result<Option<u32>, PacelineError>;

    /// Monotonic bump of `current_day`; never rewinds.
    async fn advance_day(&self, id: CourseId, day: u32) -> Result<bool, PacelineError>;

    /// Attaches appeal evidence; guarded by status Appeal.
    async fn set_appeal_evidence(
        &self,
        id: CourseId,
        video_ref: Option<&str>,
        text: Option<&str>,
    ) -> Result<bool, PacelineError>;

    /// Drops the stored chat-topic reference unconditionally.
    async fn clear_topic(&self, id: CourseId) -> Result<(), PacelineError>;
}

/// Operations over daily proof records.
#[async_trait]
pub trait IntakeLogStore: Send + Sync {
    async fn insert_log(&self, log: &IntakeLog) -> Result<(), PacelineError>;

    async fn get_log(&self, id: LogId) -> Result<Option<IntakeLog>, PacelineError>;

    async fn has_log_for_day(&self, course_id: CourseId, day: u32)
        -> Result<bool, PacelineError>;

    /// Stamps the moment a supervisor opened the record; guarded by
    /// pending_review with no review started yet.
    async fn begin_review(
        &self,
        id: LogId,
        at: DateTime<FixedOffset>,
    ) -> Result<bool, PacelineError>;

    /// Closes a pending record as Approved or Missed.
    async fn close_log(&self, id: LogId, status: LogStatus) -> Result<bool, PacelineError>;

    /// Grants a reshoot window; guarded by pending_review.
    async fn set_reshoot_deadline(
        &self,
        id: LogId,
        deadline: DateTime<FixedOffset>,
    ) -> Result<bool, PacelineError>;

    /// Pending records under supervisor review (no reshoot granted),
    /// paired with their still-Active course.
    async fn logs_in_review(&self) -> Result<Vec<(IntakeLog, Course)>, PacelineError>;

    /// Pending records holding a reshoot deadline, paired with their
    /// still-Active course.
    async fn logs_awaiting_reshoot(&self) -> Result<Vec<(IntakeLog, Course)>, PacelineError>;
}

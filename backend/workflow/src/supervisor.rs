//! Supervisor actions: manual removal and completion, the intake-review
//! lifecycle, and the one-shot extension. All of these race scheduler ticks
//! on the same rows; each mutation is a guarded store call.

use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, FixedOffset};
use tracing::{info, warn};

use paceline_core::{
    Clock, Course, CourseId, IntakeLog, LogId, LogStatus, PacelineError, RemovalReason,
};
use paceline_notify::NotificationRetrier;
use paceline_store::{CourseStore, IntakeLogStore};

pub struct SupervisorActions {
    store: Arc<dyn CourseStore>,
    logs: Arc<dyn IntakeLogStore>,
    notifier: Arc<NotificationRetrier>,
    clock: Arc<dyn Clock>,
    group_chat_id: i64,
}

impl SupervisorActions {
    pub fn new(
        store: Arc<dyn CourseStore>,
        logs: Arc<dyn IntakeLogStore>,
        notifier: Arc<NotificationRetrier>,
        clock: Arc<dyn Clock>,
        group_chat_id: i64,
    ) -> Self {
        Self { store, logs, notifier, clock, group_chat_id }
    }

    async fn load(&self, id: CourseId) -> Result<Course, PacelineError> {
        self.store.get(id).await?.ok_or(PacelineError::CourseNotFound(id))
    }

    async fn load_log(&self, id: LogId) -> Result<IntakeLog, PacelineError> {
        self.logs
            .get_log(id)
            .await?
            .ok_or_else(|| PacelineError::Other(anyhow!("intake log {id} not found")))
    }

    async fn tell(&self, course: &Course, text: &str) {
        if let Err(e) = self.notifier.send_message(course.participant_id, text).await {
            warn!(course_id = %course.id, error = %e, "Participant notification lost");
        }
        if let Some(topic_id) = course.topic_id {
            if let Err(e) = self.notifier.send_in_topic(self.group_chat_id, topic_id, text).await {
                warn!(course_id = %course.id, error = %e, "Audit notification lost");
            }
        }
    }

    async fn freeze_topic(&self, course: &Course) {
        let Some(topic_id) = course.topic_id else { return };
        if let Err(e) = self.notifier.close_topic(self.group_chat_id, topic_id).await {
            warn!(course_id = %course.id, error = %e, "Audit topic not closed");
        }
    }

    /// Active→Refused(ManagerReject). Not appealable, so no offer is made.
    pub async fn reject(&self, id: CourseId) -> Result<bool, PacelineError> {
        let course = self.load(id).await?;
        if !self.store.refuse_if_active(id, RemovalReason::ManagerReject).await? {
            return Ok(false);
        }
        info!(course_id = %id, "Course rejected by supervisor");
        self.tell(&course, "You have been removed from the program by a supervisor.").await;
        self.freeze_topic(&course).await;
        Ok(true)
    }

    /// Active→Completed ahead of the natural end.
    pub async fn complete(&self, id: CourseId) -> Result<bool, PacelineError> {
        let course = self.load(id).await?;
        if !self.store.complete_course_active(id).await? {
            return Ok(false);
        }
        info!(course_id = %id, "Course completed by supervisor");
        self.tell(&course, "Congratulations — you have completed the program.").await;
        self.freeze_topic(&course).await;
        Ok(true)
    }

    /// Stamps the review start; the review-deadline task counts from here.
    pub async fn begin_review(&self, log_id: LogId) -> Result<bool, PacelineError> {
        self.logs.begin_review(log_id, self.clock.now()).await
    }

    /// Approves a day's proof. Approving the final day completes the course.
    pub async fn approve_log(&self, log_id: LogId) -> Result<bool, PacelineError> {
        let log = self.load_log(log_id).await?;
        let course = self.load(log.course_id).await?;
        if !self.logs.close_log(log_id, LogStatus::Approved).await? {
            return Ok(false);
        }
        info!(course_id = %course.id, day = log.day, "Intake log approved");

        if log.day >= course.total_days && self.store.complete_course_active(course.id).await? {
            info!(course_id = %course.id, "Final day approved, course completed");
            self.tell(&course, "Final check-in approved — you have completed the program.")
                .await;
            self.freeze_topic(&course).await;
        } else {
            self.tell(&course, &format!("Day {} check-in approved.", log.day)).await;
        }
        Ok(true)
    }

    /// Grants a second chance with an explicit deadline instead of closing
    /// the record.
    pub async fn request_reshoot(
        &self,
        log_id: LogId,
        deadline: DateTime<FixedOffset>,
    ) -> Result<bool, PacelineError> {
        let log = self.load_log(log_id).await?;
        let course = self.load(log.course_id).await?;
        if !self.logs.set_reshoot_deadline(log_id, deadline).await? {
            return Ok(false);
        }
        info!(course_id = %course.id, day = log.day, %deadline, "Reshoot requested");
        self.tell(
            &course,
            &format!(
                "Day {}: your check-in was not accepted. Submit a new one by {}.",
                log.day,
                deadline.format("%H:%M on %d.%m")
            ),
        )
        .await;
        Ok(true)
    }

    /// Adds days to the program, once per course.
    pub async fn extend(&self, id: CourseId, extra_days: u32) -> Result<bool, PacelineError> {
        let course = self.load(id).await?;
        let new_total = course.total_days + extra_days;
        if !self.store.extend(id, new_total).await? {
            return Ok(false);
        }
        info!(course_id = %id, new_total, "Course extended");
        self.tell(&course, &format!("Your program has been extended to {new_total} days."))
            .await;
        Ok(true)
    }
}

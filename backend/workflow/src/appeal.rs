//! The appeal lifecycle: open, accept, decline.
//!
//! Opening an appeal rotates the stored deadline: the button-window slot
//! written at removal time is consumed and replaced with a fresh
//! decision-window deadline, so the supervisor clock starts at the moment
//! the participant appealed, not at removal.

use std::sync::Arc;

use tracing::{info, warn};

use paceline_core::{Clock, Course, CourseId, CourseStatus, PacelineError};
use paceline_dedup::DeadlineSlots;
use paceline_notify::NotificationRetrier;
use paceline_scheduler::deadline::appeal_deadline;
use paceline_store::CourseStore;

pub struct AppealWorkflow {
    store: Arc<dyn CourseStore>,
    slots: DeadlineSlots,
    notifier: Arc<NotificationRetrier>,
    clock: Arc<dyn Clock>,
    group_chat_id: i64,
    max_appeals: u32,
}

impl AppealWorkflow {
    pub fn new(
        store: Arc<dyn CourseStore>,
        slots: DeadlineSlots,
        notifier: Arc<NotificationRetrier>,
        clock: Arc<dyn Clock>,
        group_chat_id: i64,
        max_appeals: u32,
    ) -> Self {
        Self { store, slots, notifier, clock, group_chat_id, max_appeals }
    }

    async fn load(&self, id: CourseId) -> Result<Course, PacelineError> {
        self.store.get(id).await?.ok_or(PacelineError::CourseNotFound(id))
    }

    /// Opens an appeal for a removed course. Quota and appealability are
    /// validated up front; the Refused→Appeal edge itself is guarded in the
    /// store, so a concurrent expiry or second button press loses cleanly
    /// with `Ok(false)`.
    pub async fn start_appeal(
        &self,
        id: CourseId,
        video_ref: Option<&str>,
        text: Option<&str>,
    ) -> Result<bool, PacelineError> {
        let course = self.load(id).await?;
        if course.appeal_count >= self.max_appeals {
            return Err(PacelineError::AppealQuotaExhausted {
                used: course.appeal_count,
                max: self.max_appeals,
            });
        }
        match course.removal_reason {
            Some(reason) if reason.is_appealable() => {}
            Some(reason) => return Err(PacelineError::NotAppealable(reason)),
            None => return Ok(false),
        }

        if !self.store.start_appeal(id).await? {
            return Ok(false);
        }
        self.store.set_appeal_evidence(id, video_ref, text).await?;

        // Rotate the slot: drop the button window, start the decision window.
        self.slots.consume(id).await?;
        let deadline = appeal_deadline(self.clock.now(), course.intake_time);
        self.slots.store(id, deadline).await?;
        info!(course_id = %id, %deadline, "Appeal opened");

        if let Some(topic_id) = course.topic_id {
            // The thread was frozen at removal; the appeal reopens it.
            if let Err(e) = self.notifier.reopen_topic(self.group_chat_id, topic_id).await {
                warn!(course_id = %id, error = %e, "Audit topic not reopened");
            }
            let notice = format!(
                "Appeal opened (attempt {} of {}). Decision due by {}.",
                course.appeal_count + 1,
                self.max_appeals,
                deadline.format("%H:%M on %d.%m")
            );
            if let Err(e) = self
                .notifier
                .send_in_topic(self.group_chat_id, topic_id, &notice)
                .await
            {
                warn!(course_id = %id, error = %e, "Appeal notice to audit topic lost");
            }
            if let Some(video) = video_ref {
                if let Err(e) = self
                    .notifier
                    .send_video(self.group_chat_id, video, text.unwrap_or(""))
                    .await
                {
                    warn!(course_id = %id, error = %e, "Appeal evidence forward lost");
                }
            }
        }
        let confirmation = format!(
            "Your appeal has been submitted. A decision is due by {}.",
            deadline.format("%H:%M on %d.%m")
        );
        if let Err(e) = self.notifier.send_message(course.participant_id, &confirmation).await {
            warn!(course_id = %id, error = %e, "Appeal confirmation lost");
        }
        Ok(true)
    }

    /// Appeal→Active; the attempt is charged against the quota even when it
    /// succeeds.
    pub async fn accept(&self, id: CourseId) -> Result<bool, PacelineError> {
        let course = self.load(id).await?;
        if course.status != CourseStatus::Appeal {
            return Err(PacelineError::NotUnderAppeal(id));
        }
        if !self.store.accept_appeal(id, course.appeal_count + 1).await? {
            return Ok(false);
        }
        self.slots.consume(id).await?;
        info!(course_id = %id, "Appeal accepted");
        if let Err(e) = self
            .notifier
            .send_message(course.participant_id, "Your appeal was accepted. The course resumes today.")
            .await
        {
            warn!(course_id = %id, error = %e, "Appeal verdict lost");
        }
        Ok(true)
    }

    /// Appeal→Refused(AppealDeclined). Terminal; no further appeal even if
    /// quota nominally remains.
    pub async fn decline(&self, id: CourseId) -> Result<bool, PacelineError> {
        let course = self.load(id).await?;
        if course.status != CourseStatus::Appeal {
            return Err(PacelineError::NotUnderAppeal(id));
        }
        if !self.store.decline_appeal(id, course.appeal_count + 1).await? {
            return Ok(false);
        }
        self.slots.consume(id).await?;
        info!(course_id = %id, "Appeal declined");
        if let Err(e) = self
            .notifier
            .send_message(
                course.participant_id,
                "Your appeal was declined. The removal is final.",
            )
            .await
        {
            warn!(course_id = %id, error = %e, "Appeal verdict lost");
        }
        if let Some(topic_id) = course.topic_id {
            if let Err(e) = self.notifier.close_topic(self.group_chat_id, topic_id).await {
                warn!(course_id = %id, error = %e, "Audit topic not closed");
            }
        }
        Ok(true)
    }
}

//! Shared dependencies and fan-out helpers for scheduler tasks.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tracing::warn;

use paceline_core::{Clock, Course};
use paceline_dedup::{DeadlineSlots, DedupLedger};
use paceline_notify::{MessageRef, NotificationRetrier};
use paceline_store::{CourseStore, IntakeLogStore};

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Interval between ticks; also sizes the intake-window bands.
    pub tick_interval: StdDuration,
    /// Strikes at which a course is removed.
    pub max_strikes: u32,
    /// Appeal quota per course.
    pub max_appeals: u32,
    /// Forum supergroup holding one audit topic per course.
    pub group_chat_id: i64,
    /// Optional announcement channel for removals.
    pub broadcast_chat_id: Option<i64>,
    /// How long a transient reminder message lives before deletion.
    pub reminder_ttl: StdDuration,
    /// Ended courses keep their topic this long before cleanup.
    pub cleanup_after_hours: i64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            tick_interval: StdDuration::from_secs(240),
            max_strikes: 3,
            max_appeals: paceline_core::MAX_APPEALS,
            group_chat_id: 0,
            broadcast_chat_id: None,
            reminder_ttl: StdDuration::from_secs(2 * 3600),
            cleanup_after_hours: 24,
        }
    }
}

/// Everything a task needs for one tick. Built once at startup and shared.
pub struct TickContext {
    pub store: Arc<dyn CourseStore>,
    pub logs: Arc<dyn IntakeLogStore>,
    pub ledger: DedupLedger,
    pub slots: DeadlineSlots,
    pub notifier: Arc<NotificationRetrier>,
    pub clock: Arc<dyn Clock>,
    pub cfg: ScheduleConfig,
}

impl TickContext {
    /// Band width for window queries, matched to the tick interval.
    pub fn band_width(&self) -> Duration {
        Duration::from_std(self.cfg.tick_interval).unwrap_or_else(|_| Duration::minutes(4))
    }

    /// Each notification channel is independently guarded: a delivery
    /// failure is logged and swallowed so one channel never blocks another,
    /// and never unwinds a committed transition.
    pub async fn notify_participant(&self, course: &Course, text: &str) -> Option<MessageRef> {
        match self.notifier.send_message(course.participant_id, text).await {
            Ok(msg) => Some(msg),
            Err(e) => {
                warn!(course_id = %course.id, error = %e, "Participant notification lost");
                None
            }
        }
    }

    pub async fn notify_participant_with_button(
        &self,
        course: &Course,
        text: &str,
        label: &str,
        callback: &str,
    ) -> Option<MessageRef> {
        match self
            .notifier
            .send_with_button(course.participant_id, text, label, callback)
            .await
        {
            Ok(msg) => Some(msg),
            Err(e) => {
                warn!(course_id = %course.id, error = %e, "Participant notification lost");
                None
            }
        }
    }

    pub async fn notify_audit(&self, course: &Course, text: &str) {
        let Some(topic_id) = course.topic_id else { return };
        if let Err(e) = self
            .notifier
            .send_in_topic(self.cfg.group_chat_id, topic_id, text)
            .await
        {
            warn!(course_id = %course.id, error = %e, "Audit notification lost");
        }
    }

    pub async fn notify_broadcast(&self, text: &str) {
        let Some(chat_id) = self.cfg.broadcast_chat_id else { return };
        if let Err(e) = self.notifier.send_message(chat_id, text).await {
            warn!(error = %e, "Broadcast notification lost");
        }
    }

    /// Freezes the audit thread of a removed course. Best effort: a topic
    /// already closed or deleted by hand is not worth failing over.
    pub async fn close_audit_topic(&self, course: &Course) {
        let Some(topic_id) = course.topic_id else { return };
        if let Err(e) = self.notifier.close_topic(self.cfg.group_chat_id, topic_id).await {
            warn!(course_id = %course.id, error = %e, "Audit topic not closed");
        }
    }

    /// Whether a removal notice for this course should carry an appeal offer.
    pub fn offers_appeal(&self, course: &Course) -> bool {
        course.appeal_count < self.cfg.max_appeals
    }

    /// Removal notice fan-out for the strike-max and no-proof paths. When
    /// quota remains, the notice carries an appeal button and the appeal
    /// window deadline is stored before anything is sent, so a lost
    /// notification can never lose the window itself.
    pub async fn announce_removal_with_offer(
        &self,
        course: &Course,
        summary: &str,
    ) -> anyhow::Result<()> {
        if self.offers_appeal(course) {
            let deadline =
                crate::deadline::appeal_deadline(self.clock.now(), course.intake_time);
            self.slots.store(course.id, deadline).await?;
            let text = format!(
                "{summary} You can appeal this decision until {}.",
                deadline.format("%H:%M on %d.%m")
            );
            self.notify_participant_with_button(
                course,
                &text,
                "Appeal",
                &format!("appeal:{}", course.id),
            )
            .await;
        } else {
            self.notify_participant(course, summary).await;
        }
        self.notify_audit(course, summary).await;
        self.notify_broadcast(summary).await;
        self.close_audit_topic(course).await;
        Ok(())
    }
}

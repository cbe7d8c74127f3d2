//! Pre-intake reminder: ten minutes before a course's intake time, nudge
//! the participant. Notification only, no transition. The reminder is
//! transient and deletes itself via the delay queue.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;
use tracing::{debug, warn};

use paceline_core::Course;
use paceline_dedup::ReminderKind;

use crate::context::TickContext;
use crate::deadline::intake_band;
use crate::delay::DelayQueue;
use crate::task::PeriodicTask;

const REMINDER_LEAD_MIN: i64 = 10;

pub struct PreIntakeTask {
    delay: Arc<DelayQueue>,
}

impl PreIntakeTask {
    pub fn new(delay: Arc<DelayQueue>) -> Self {
        Self { delay }
    }

    async fn handle(&self, ctx: &TickContext, course: &Course) -> Result<()> {
        let now = ctx.clock.now();
        let Some(day) = course.day_on(now.date_naive()) else {
            return Ok(());
        };
        if day > course.total_days {
            return Ok(());
        }
        if ctx.ledger.was_sent(course.id, ReminderKind::PreIntake).await? {
            return Ok(());
        }
        // Proof already in for today: nothing to remind about.
        if ctx.logs.has_log_for_day(course.id, day).await? {
            return Ok(());
        }

        // First touch of the day also bumps the persisted day counter.
        ctx.store.advance_day(course.id, day).await?;

        ctx.ledger.mark_sent(course.id, ReminderKind::PreIntake).await?;
        let text = format!(
            "Day {day} check-in is due at {} — ten minutes to go.",
            course.intake_time.format("%H:%M")
        );
        if let Some(message_id) = ctx.notify_participant(course, &text).await {
            let chat_id = course.participant_id;
            let notifier = ctx.notifier.clone();
            self.delay
                .run_after(ctx.cfg.reminder_ttl, async move {
                    if let Err(e) = notifier.delete_message(chat_id, message_id).await {
                        debug!(chat_id, message_id, error = %e, "Stale reminder not deleted");
                    }
                })
                .await;
        }
        Ok(())
    }
}

#[async_trait]
impl PeriodicTask for PreIntakeTask {
    fn name(&self) -> &'static str {
        "pre_intake_reminder"
    }

    async fn tick(&self, ctx: &TickContext) -> Result<()> {
        let now = ctx.clock.now();
        let (start, end) =
            intake_band(now, Duration::minutes(REMINDER_LEAD_MIN), ctx.band_width());
        for course in ctx.store.active_in_intake_band(start, end).await? {
            if let Err(e) = self.handle(ctx, &course).await {
                warn!(course_id = %course.id, error = %e, "Reminder candidate failed, continuing");
            }
        }
        Ok(())
    }
}

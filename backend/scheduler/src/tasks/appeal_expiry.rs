//! Appeal-decision expiry: a course sitting in Appeal past its stored
//! deadline is refused with `AppealExpired` and the attempt is charged
//! against the quota.
//!
//! The deadline lives in the slot store. The first tick that finds no slot
//! computes and stores one; every later tick reuses the stored instant, so
//! the window cannot creep forward tick by tick.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use paceline_core::Course;
use paceline_dedup::{DeadlineSlot, ReminderKind};

use crate::context::TickContext;
use crate::deadline::appeal_deadline;
use crate::task::PeriodicTask;

pub struct AppealExpiryTask;

impl AppealExpiryTask {
    async fn handle(&self, ctx: &TickContext, course: &Course) -> Result<()> {
        let now = ctx.clock.now();
        let deadline = match ctx.slots.observe(course.id).await? {
            DeadlineSlot::NotComputed => {
                // Slot lost or never written (e.g. process restart between
                // transition and store). Start a fresh window from here.
                let at = appeal_deadline(now, course.intake_time);
                ctx.slots.store(course.id, at).await?;
                return Ok(());
            }
            DeadlineSlot::Stored(at) => at,
        };
        if now < deadline {
            return Ok(());
        }
        if ctx.ledger.was_sent(course.id, ReminderKind::AppealDeadline).await? {
            return Ok(());
        }

        let removed = ctx
            .store
            .refuse_if_appeal(course.id, course.appeal_count + 1)
            .await?;
        ctx.slots.consume(course.id).await?;
        ctx.ledger.mark_sent(course.id, ReminderKind::AppealDeadline).await?;
        if removed {
            info!(course_id = %course.id, "Appeal window expired without a decision");
            let text = "The appeal window has closed without a decision. \
                        The removal is now final.";
            ctx.notify_participant(course, text).await;
            ctx.notify_audit(course, text).await;
            ctx.close_audit_topic(course).await;
        }
        Ok(())
    }
}

#[async_trait]
impl PeriodicTask for AppealExpiryTask {
    fn name(&self) -> &'static str {
        "appeal_deadline_expiry"
    }

    async fn tick(&self, ctx: &TickContext) -> Result<()> {
        for course in ctx.store.appeal_courses().await? {
            if let Err(e) = self.handle(ctx, &course).await {
                warn!(course_id = %course.id, error = %e, "Appeal expiry candidate failed, continuing");
            }
        }
        Ok(())
    }
}

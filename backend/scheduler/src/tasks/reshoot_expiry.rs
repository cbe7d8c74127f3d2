//! Reshoot-deadline expiry: a supervisor granted a reshoot window and the
//! replacement proof never arrived. The record is closed as Missed and the
//! course removed. Like review expiry, no appeal is offered.

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use paceline_core::{Course, IntakeLog, LogStatus, RemovalReason};
use paceline_dedup::ReminderKind;

use crate::context::TickContext;
use crate::task::PeriodicTask;

pub struct ReshootExpiryTask;

impl ReshootExpiryTask {
    async fn handle(&self, ctx: &TickContext, log: &IntakeLog, course: &Course) -> Result<()> {
        let Some(deadline) = log.reshoot_deadline else {
            return Ok(());
        };
        if ctx.clock.now() < deadline {
            return Ok(());
        }
        if ctx.ledger.was_sent(course.id, ReminderKind::ReshootDeadline).await? {
            return Ok(());
        }

        let removed = ctx
            .store
            .refuse_if_active(course.id, RemovalReason::ReshootExpired)
            .await?;
        ctx.logs.close_log(log.id, LogStatus::Missed).await?;
        ctx.ledger.mark_sent(course.id, ReminderKind::ReshootDeadline).await?;
        if removed {
            let text = format!(
                "Day {}: the reshoot window closed without a new check-in. \
                 You have been removed from the program.",
                log.day
            );
            ctx.notify_participant(course, &text).await;
            ctx.notify_audit(course, &text).await;
            ctx.notify_broadcast(&text).await;
            ctx.close_audit_topic(course).await;
        }
        Ok(())
    }
}

#[async_trait]
impl PeriodicTask for ReshootExpiryTask {
    fn name(&self) -> &'static str {
        "reshoot_deadline_expiry"
    }

    async fn tick(&self, ctx: &TickContext) -> Result<()> {
        for (log, course) in ctx.logs.logs_awaiting_reshoot().await? {
            if let Err(e) = self.handle(ctx, &log, &course).await {
                warn!(course_id = %course.id, log_id = %log.id, error = %e,
                    "Reshoot expiry candidate failed, continuing");
            }
        }
        Ok(())
    }
}

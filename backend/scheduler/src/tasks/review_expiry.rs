//! Review-deadline expiry: a supervisor opened a proof record but never
//! closed it before two hours ahead of the next intake. The record is
//! closed as Missed and the course removed. No appeal is offered for
//! review-side removals.

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use paceline_core::{Course, IntakeLog, LogStatus, RemovalReason};
use paceline_dedup::ReminderKind;

use crate::context::TickContext;
use crate::deadline::review_deadline;
use crate::task::PeriodicTask;

pub struct ReviewExpiryTask;

impl ReviewExpiryTask {
    async fn handle(&self, ctx: &TickContext, log: &IntakeLog, course: &Course) -> Result<()> {
        let Some(started) = log.review_started_at else {
            return Ok(());
        };
        let deadline = review_deadline(started, course.intake_time);
        if ctx.clock.now() < deadline {
            return Ok(());
        }
        if ctx.ledger.was_sent(course.id, ReminderKind::ReviewDeadline).await? {
            return Ok(());
        }

        let removed = ctx
            .store
            .refuse_if_active(course.id, RemovalReason::ReviewDeadline)
            .await?;
        ctx.logs.close_log(log.id, LogStatus::Missed).await?;
        ctx.ledger.mark_sent(course.id, ReminderKind::ReviewDeadline).await?;
        if removed {
            let text = format!(
                "Day {}: the review of your check-in was not completed in time. \
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
impl PeriodicTask for ReviewExpiryTask {
    fn name(&self) -> &'static str {
        "review_deadline_expiry"
    }

    async fn tick(&self, ctx: &TickContext) -> Result<()> {
        for (log, course) in ctx.logs.logs_in_review().await? {
            if let Err(e) = self.handle(ctx, &log, &course).await {
                warn!(course_id = %course.id, log_id = %log.id, error = %e,
                    "Review expiry candidate failed, continuing");
            }
        }
        Ok(())
    }
}

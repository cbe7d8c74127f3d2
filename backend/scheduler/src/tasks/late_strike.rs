//! Late strike: thirty minutes past intake with no proof logged, record a
//! strike. At the configured maximum the course escalates straight to
//! Refused(MaxStrikes) with an appeal offer if quota remains; below it the
//! participant gets a warning only.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;
use tracing::warn;

use paceline_core::{Course, RemovalReason};
use paceline_dedup::ReminderKind;

use crate::context::TickContext;
use crate::deadline::intake_band;
use crate::task::PeriodicTask;

const STRIKE_DELAY_MIN: i64 = 30;

pub struct LateStrikeTask;

impl LateStrikeTask {
    async fn handle(&self, ctx: &TickContext, course: &Course) -> Result<()> {
        let now = ctx.clock.now();
        let today = now.date_naive();
        let Some(day) = course.day_on(today) else {
            return Ok(());
        };
        if ctx.ledger.was_sent(course.id, ReminderKind::LateStrike).await? {
            return Ok(());
        }
        // Proof arrived between the query and now: condition resolved itself.
        if ctx.logs.has_log_for_day(course.id, day).await? {
            return Ok(());
        }

        match ctx.store.add_strike(course.id, today).await? {
            None => {
                // Race lost (status changed, or struck today by another
                // process). Stop re-evaluating a stale condition.
                ctx.ledger.mark_sent(course.id, ReminderKind::LateStrike).await?;
            }
            Some(strikes) if strikes >= ctx.cfg.max_strikes => {
                let removed = ctx
                    .store
                    .refuse_if_active(course.id, RemovalReason::MaxStrikes)
                    .await?;
                ctx.ledger.mark_sent(course.id, ReminderKind::LateStrike).await?;
                if removed {
                    let summary = format!(
                        "Day {day}: no check-in again — strike {strikes} of {max}. \
                         You have been removed from the program.",
                        max = ctx.cfg.max_strikes
                    );
                    ctx.announce_removal_with_offer(course, &summary).await?;
                }
            }
            Some(strikes) => {
                ctx.ledger.mark_sent(course.id, ReminderKind::LateStrike).await?;
                let text = format!(
                    "Day {day}: your check-in is late. Strike {strikes} of {max} recorded.",
                    max = ctx.cfg.max_strikes
                );
                ctx.notify_participant(course, &text).await;
                ctx.notify_audit(course, &text).await;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PeriodicTask for LateStrikeTask {
    fn name(&self) -> &'static str {
        "late_strike"
    }

    async fn tick(&self, ctx: &TickContext) -> Result<()> {
        let now = ctx.clock.now();
        let (start, end) =
            intake_band(now, Duration::minutes(-STRIKE_DELAY_MIN), ctx.band_width());
        for course in ctx.store.active_in_intake_band(start, end).await? {
            if let Err(e) = self.handle(ctx, &course).await {
                warn!(course_id = %course.id, error = %e, "Strike candidate failed, continuing");
            }
        }
        Ok(())
    }
}

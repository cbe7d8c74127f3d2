//! No-proof auto-removal: two hours past intake with nothing logged, the
//! course is removed outright (Refused(NoVideo)), with an appeal offer if
//! quota remains.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;
use tracing::warn;

use paceline_core::{Course, RemovalReason};
use paceline_dedup::ReminderKind;

use crate::context::TickContext;
use crate::deadline::intake_band;
use crate::task::PeriodicTask;

const REMOVAL_DELAY_MIN: i64 = 120;

pub struct NoVideoTask;

impl NoVideoTask {
    async fn handle(&self, ctx: &TickContext, course: &Course) -> Result<()> {
        let now = ctx.clock.now();
        let Some(day) = course.day_on(now.date_naive()) else {
            return Ok(());
        };
        if ctx.ledger.was_sent(course.id, ReminderKind::NoVideo).await? {
            return Ok(());
        }
        if ctx.logs.has_log_for_day(course.id, day).await? {
            return Ok(());
        }

        let removed = ctx
            .store
            .refuse_if_active(course.id, RemovalReason::NoVideo)
            .await?;
        // Mark either way: a lost race is final for today too.
        ctx.ledger.mark_sent(course.id, ReminderKind::NoVideo).await?;
        if removed {
            let summary = format!(
                "Day {day}: no proof was submitted within two hours of intake. \
                 You have been removed from the program."
            );
            ctx.announce_removal_with_offer(course, &summary).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PeriodicTask for NoVideoTask {
    fn name(&self) -> &'static str {
        "no_video_removal"
    }

    async fn tick(&self, ctx: &TickContext) -> Result<()> {
        let now = ctx.clock.now();
        let (start, end) =
            intake_band(now, Duration::minutes(-REMOVAL_DELAY_MIN), ctx.band_width());
        for course in ctx.store.active_in_intake_band(start, end).await? {
            if let Err(e) = self.handle(ctx, &course).await {
                warn!(course_id = %course.id, error = %e, "Removal candidate failed, continuing");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paceline_core::CourseStatus;

    use crate::testutil::Harness;

    #[tokio::test]
    async fn removes_and_offers_appeal() {
        // intake 10:00, now 12:01.
        let h = Harness::at(2024, 5, 10, 12, 1).await;
        let id = h.enroll_active("t1", 10, 0).await;

        NoVideoTask.tick(&h.ctx).await.unwrap();

        let course = h.course(id).await;
        assert_eq!(course.status, CourseStatus::Refused);
        assert_eq!(course.removal_reason, Some(RemovalReason::NoVideo));
        let sent = h.chat.sent_to(course.participant_id);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, "send_with_button");
    }

    #[tokio::test]
    async fn idempotent_within_the_dedup_window() {
        let h = Harness::at(2024, 5, 10, 12, 1).await;
        let id = h.enroll_active("t1", 10, 0).await;

        NoVideoTask.tick(&h.ctx).await.unwrap();
        NoVideoTask.tick(&h.ctx).await.unwrap();

        let course = h.course(id).await;
        assert_eq!(h.chat.sent_to(course.participant_id).len(), 1);
    }

    #[tokio::test]
    async fn submitted_proof_skips_removal_silently() {
        let h = Harness::at(2024, 5, 10, 12, 1).await;
        let id = h.enroll_active("t1", 10, 0).await;
        h.insert_pending_log(id, 1).await;

        NoVideoTask.tick(&h.ctx).await.unwrap();

        assert_eq!(h.course(id).await.status, CourseStatus::Active);
        assert!(h.chat.all_sent().is_empty());
    }

    #[tokio::test]
    async fn lost_race_marks_without_notifying() {
        let h = Harness::at(2024, 5, 10, 12, 1).await;
        let id = h.enroll_active("t1", 10, 0).await;
        // A supervisor already refused the course between query and guard.
        h.ctx.store.refuse_if_active(id, RemovalReason::ManagerReject).await.unwrap();
        h.chat.clear();

        NoVideoTask.tick(&h.ctx).await.unwrap();

        let course = h.course(id).await;
        assert_eq!(course.removal_reason, Some(RemovalReason::ManagerReject));
        assert!(h.chat.all_sent().is_empty());
    }
}

//! Appeal-offer expiry: a removed course was offered an appeal button and
//! the participant never pressed it. Once the stored window passes, tell
//! them the option has lapsed. Notification only; Refused is already
//! terminal and stays untouched.
//!
//! A missing slot is left alone. The course stays in the candidate set
//! after the notice goes out, so re-seeding a window here would lapse
//! again next day and repeat the notice forever.

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use paceline_core::Course;
use paceline_dedup::{DeadlineSlot, ReminderKind};

use crate::context::TickContext;
use crate::task::PeriodicTask;

pub struct AppealButtonTask;

impl AppealButtonTask {
    async fn handle(&self, ctx: &TickContext, course: &Course) -> Result<()> {
        let now = ctx.clock.now();
        // No slot means either no window was ever stored or a past lapse
        // already consumed it; neither warrants another notice.
        let DeadlineSlot::Stored(deadline) = ctx.slots.observe(course.id).await? else {
            return Ok(());
        };
        if now < deadline {
            return Ok(());
        }
        if ctx.ledger.was_sent(course.id, ReminderKind::AppealButton).await? {
            return Ok(());
        }

        ctx.slots.consume(course.id).await?;
        ctx.ledger.mark_sent(course.id, ReminderKind::AppealButton).await?;
        let text = "The window to appeal your removal has closed. \
                    The decision is now final.";
        ctx.notify_participant(course, text).await;
        ctx.notify_audit(course, text).await;
        Ok(())
    }
}

#[async_trait]
impl PeriodicTask for AppealButtonTask {
    fn name(&self) -> &'static str {
        "appeal_offer_expiry"
    }

    async fn tick(&self, ctx: &TickContext) -> Result<()> {
        let candidates = ctx
            .store
            .refused_with_appeal_option(ctx.cfg.max_appeals)
            .await?;
        for course in candidates {
            if let Err(e) = self.handle(ctx, &course).await {
                warn!(course_id = %course.id, error = %e, "Offer expiry candidate failed, continuing");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use paceline_core::{Clock, CourseStatus, RemovalReason};

    use crate::testutil::Harness;

    #[tokio::test]
    async fn lapsed_offer_notifies_without_transition() {
        let h = Harness::at(2024, 5, 10, 12, 0).await;
        let id = h.enroll_active("t1", 10, 0).await;
        h.ctx.store.refuse_if_active(id, RemovalReason::NoVideo).await.unwrap();
        let deadline = h.clock.now() + Duration::hours(2);
        h.ctx.slots.store(id, deadline).await.unwrap();

        h.clock.advance(Duration::hours(3));
        AppealButtonTask.tick(&h.ctx).await.unwrap();

        let course = h.course(id).await;
        assert_eq!(course.status, CourseStatus::Refused);
        assert_eq!(course.appeal_count, 0);
        assert_eq!(h.chat.sent_to(course.participant_id).len(), 1);
        assert_eq!(h.ctx.slots.observe(id).await.unwrap(), DeadlineSlot::NotComputed);
    }

    #[tokio::test]
    async fn open_window_stays_quiet() {
        let h = Harness::at(2024, 5, 10, 12, 0).await;
        let id = h.enroll_active("t1", 10, 0).await;
        h.ctx.store.refuse_if_active(id, RemovalReason::MaxStrikes).await.unwrap();
        h.ctx
            .slots
            .store(id, h.clock.now() + Duration::hours(2))
            .await
            .unwrap();

        AppealButtonTask.tick(&h.ctx).await.unwrap();

        assert!(h.chat.all_sent().is_empty());
        assert!(matches!(
            h.ctx.slots.observe(id).await.unwrap(),
            DeadlineSlot::Stored(_)
        ));
    }

    #[tokio::test]
    async fn missing_slot_stays_quiet() {
        let h = Harness::at(2024, 5, 10, 12, 0).await;
        let id = h.enroll_active("t1", 10, 0).await;
        h.ctx.store.refuse_if_active(id, RemovalReason::NoVideo).await.unwrap();

        AppealButtonTask.tick(&h.ctx).await.unwrap();

        assert_eq!(h.ctx.slots.observe(id).await.unwrap(), DeadlineSlot::NotComputed);
        assert!(h.chat.all_sent().is_empty());
    }

    #[tokio::test]
    async fn lapsed_offer_is_announced_only_once_across_days() {
        let h = Harness::at(2024, 5, 10, 12, 0).await;
        let id = h.enroll_active("t1", 10, 0).await;
        h.ctx.store.refuse_if_active(id, RemovalReason::NoVideo).await.unwrap();
        h.ctx.slots.store(id, h.clock.now() + Duration::hours(2)).await.unwrap();

        h.clock.advance(Duration::hours(3));
        AppealButtonTask.tick(&h.ctx).await.unwrap();

        // The course stays Refused and in the candidate set; later days
        // (past the dedup TTL) must not re-seed a window and nag again.
        for _ in 0..3 {
            h.clock.advance(Duration::hours(24));
            AppealButtonTask.tick(&h.ctx).await.unwrap();
        }

        let course = h.course(id).await;
        assert_eq!(course.status, CourseStatus::Refused);
        assert_eq!(h.chat.sent_to(course.participant_id).len(), 1);
        assert_eq!(h.ctx.slots.observe(id).await.unwrap(), DeadlineSlot::NotComputed);
    }

    #[tokio::test]
    async fn unappealable_removal_is_not_a_candidate() {
        let h = Harness::at(2024, 5, 10, 12, 0).await;
        let id = h.enroll_active("t1", 10, 0).await;
        h.ctx
            .store
            .refuse_if_active(id, RemovalReason::ManagerReject)
            .await
            .unwrap();

        AppealButtonTask.tick(&h.ctx).await.unwrap();

        assert!(h.chat.all_sent().is_empty());
        assert_eq!(h.ctx.slots.observe(id).await.unwrap(), DeadlineSlot::NotComputed);
    }
}

//! Topic cleanup: ended courses keep their audit topic for a grace period,
//! then the topic is deleted and the stored reference dropped. Deliberately
//! not dedup-gated; clearing the reference removes the course from the
//! candidate set, and a failed delete only means one retry next tick.
//!
//! The same pass expires enrollments whose invite was never redeemed before
//! the start date rolled over.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;
use tracing::{debug, info, warn};

use crate::context::TickContext;
use crate::task::PeriodicTask;

pub struct TopicCleanupTask;

#[async_trait]
impl PeriodicTask for TopicCleanupTask {
    fn name(&self) -> &'static str {
        "topic_cleanup"
    }

    async fn tick(&self, ctx: &TickContext) -> Result<()> {
        let cutoff = ctx.clock.now() - Duration::hours(ctx.cfg.cleanup_after_hours);
        for course in ctx.store.ended_with_topic(cutoff).await? {
            let Some(topic_id) = course.topic_id else { continue };
            // Best effort: a topic already deleted by hand still needs the
            // reference cleared so the course leaves the candidate set.
            match ctx
                .notifier
                .delete_topic(ctx.cfg.group_chat_id, topic_id)
                .await
            {
                Ok(()) => debug!(course_id = %course.id, topic_id, "Audit topic deleted"),
                Err(e) => {
                    warn!(course_id = %course.id, topic_id, error = %e, "Topic delete failed, clearing anyway")
                }
            }
            ctx.store.clear_topic(course.id).await?;
        }

        let today = ctx.clock.now().date_naive();
        for course in ctx.store.setup_before(today).await? {
            if ctx.store.expire_if_setup(course.id).await? {
                info!(course_id = %course.id, "Unredeemed enrollment expired");
            }
        }
        Ok(())
    }
}

//! Invite redemption. A course is enrolled in Setup with a one-shot token;
//! redeeming it either activates the course or, when the start date has
//! already rolled past, expires it on the spot.

use std::sync::Arc;

use tracing::{info, warn};

use paceline_core::{Clock, Course, CourseStatus, PacelineError};
use paceline_notify::NotificationRetrier;
use paceline_store::CourseStore;

#[derive(Debug)]
pub enum ActivationOutcome {
    /// Setup→Active succeeded; the refreshed course is returned.
    Activated(Course),
    /// Token not known to any course.
    UnknownToken,
    /// Token already consumed, or the course left Setup some other way.
    AlreadyUsed,
    /// The start date rolled past before redemption; Setup→Expired applied.
    Expired,
}

pub struct ActivationFlow {
    store: Arc<dyn CourseStore>,
    notifier: Arc<NotificationRetrier>,
    clock: Arc<dyn Clock>,
    group_chat_id: i64,
}

impl ActivationFlow {
    pub fn new(
        store: Arc<dyn CourseStore>,
        notifier: Arc<NotificationRetrier>,
        clock: Arc<dyn Clock>,
        group_chat_id: i64,
    ) -> Self {
        Self { store, notifier, clock, group_chat_id }
    }

    pub async fn redeem(&self, token: &str) -> Result<ActivationOutcome, PacelineError> {
        let Some(course) = self.store.find_by_invite(token).await? else {
            return Ok(ActivationOutcome::UnknownToken);
        };
        if course.invite_used || course.status != CourseStatus::Setup {
            return Ok(ActivationOutcome::AlreadyUsed);
        }

        let today = self.clock.now().date_naive();
        if course.start_date < today {
            // Stale invite: the program day it pointed at is gone.
            self.store.expire_if_setup(course.id).await?;
            info!(course_id = %course.id, "Unredeemed course expired at activation");
            if let Err(e) = self
                .notifier
                .send_message(
                    course.participant_id,
                    "This invite has expired; the start date has passed. Ask for a new enrollment.",
                )
                .await
            {
                warn!(course_id = %course.id, error = %e, "Expiry notice lost");
            }
            return Ok(ActivationOutcome::Expired);
        }

        // Two guarded steps: a concurrent redemption loses one of them.
        if !self.store.mark_invite_used(course.id).await? {
            return Ok(ActivationOutcome::AlreadyUsed);
        }
        if !self
            .store
            .activate(course.id, course.cycle_day, course.intake_time, course.start_date)
            .await?
        {
            return Ok(ActivationOutcome::AlreadyUsed);
        }
        info!(course_id = %course.id, participant_id = course.participant_id, "Course activated");

        // The registration notice that carried the invite is now stale.
        if let Some(message_id) = course.registration_message_id {
            if let Err(e) = self.notifier.delete_message(self.group_chat_id, message_id).await {
                warn!(course_id = %course.id, error = %e, "Registration notice not deleted");
            }
        }
        if let Some(topic_id) = course.topic_id {
            let name = format!(
                "{} — from {}",
                course.participant_id,
                course.start_date.format("%d.%m")
            );
            if let Err(e) = self
                .notifier
                .edit_topic_name(self.group_chat_id, topic_id, &name)
                .await
            {
                warn!(course_id = %course.id, error = %e, "Audit topic not renamed");
            }
            let notice = format!(
                "Participant joined. Day 1 is {}, intake at {}.",
                course.start_date.format("%d.%m"),
                course.intake_time.format("%H:%M")
            );
            if let Err(e) = self
                .notifier
                .send_in_topic(self.group_chat_id, topic_id, &notice)
                .await
            {
                warn!(course_id = %course.id, error = %e, "Activation notice lost");
            }
        }
        let welcome = format!(
            "You are in. Day 1 starts {} — first check-in is due at {}.",
            course.start_date.format("%d.%m"),
            course.intake_time.format("%H:%M")
        );
        if let Err(e) = self.notifier.send_message(course.participant_id, &welcome).await {
            warn!(course_id = %course.id, error = %e, "Welcome message lost");
        }

        let refreshed = self
            .store
            .get(course.id)
            .await?
            .ok_or(PacelineError::CourseNotFound(course.id))?;
        Ok(ActivationOutcome::Activated(refreshed))
    }
}

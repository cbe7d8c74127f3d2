//! Fixture wiring the three flows over an in-memory store and a chat
//! client that accepts everything.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use uuid::Uuid;

use paceline_core::{
    Clock, Course, CourseId, FixedClock, IntakeLog, LogId, LogStatus, RemovalReason, MAX_APPEALS,
};
use paceline_dedup::{DeadlineSlots, MemoryKv};
use paceline_notify::{ChatClient, ChatError, MessageRef, NotificationRetrier, RetryPolicy};
use paceline_store::{CourseStore, IntakeLogStore, NewCourse, SqliteCourseStore};

use crate::activation::ActivationFlow;
use crate::appeal::AppealWorkflow;
use crate::supervisor::SupervisorActions;

const GROUP_CHAT_ID: i64 = -1001;

/// Accepts every outbound call; workflow tests assert on store state.
struct SilentChat {
    next_id: AtomicI64,
}

impl SilentChat {
    fn ok(&self) -> Result<MessageRef, ChatError> {
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl ChatClient for SilentChat {
    async fn send_message(&self, _: i64, _: &str) -> Result<MessageRef, ChatError> {
        self.ok()
    }
    async fn send_in_topic(&self, _: i64, _: i64, _: &str) -> Result<MessageRef, ChatError> {
        self.ok()
    }
    async fn send_with_button(
        &self,
        _: i64,
        _: &str,
        _: &str,
        _: &str,
    ) -> Result<MessageRef, ChatError> {
        self.ok()
    }
    async fn send_video(&self, _: i64, _: &str, _: &str) -> Result<MessageRef, ChatError> {
        self.ok()
    }
    async fn delete_message(&self, _: i64, _: MessageRef) -> Result<(), ChatError> {
        Ok(())
    }
    async fn edit_topic_name(&self, _: i64, _: i64, _: &str) -> Result<(), ChatError> {
        Ok(())
    }
    async fn close_topic(&self, _: i64, _: i64) -> Result<(), ChatError> {
        Ok(())
    }
    async fn reopen_topic(&self, _: i64, _: i64) -> Result<(), ChatError> {
        Ok(())
    }
    async fn delete_topic(&self, _: i64, _: i64) -> Result<(), ChatError> {
        Ok(())
    }
}

pub struct Wf {
    pub appeals: AppealWorkflow,
    pub activation: ActivationFlow,
    pub supervisor: SupervisorActions,
    pub slots: DeadlineSlots,
    pub clock: Arc<FixedClock>,
    store: Arc<SqliteCourseStore>,
    participants: AtomicI64,
}

impl Wf {
    pub async fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Self {
        let zone = FixedOffset::east_opt(3 * 3600).unwrap();
        let clock = Arc::new(FixedClock::at(
            zone.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap(),
        ));
        let store = Arc::new(SqliteCourseStore::open_in_memory(clock.clone()).unwrap());
        let kv = Arc::new(MemoryKv::new(clock.clone()));
        let slots = DeadlineSlots::new(kv);
        let notifier = Arc::new(NotificationRetrier::new(
            Arc::new(SilentChat { next_id: AtomicI64::new(1) }),
            RetryPolicy {
                max_retries: 1,
                base_delay: StdDuration::from_millis(1),
                rate_limit_pad: StdDuration::from_millis(1),
            },
        ));
        let course_store: Arc<dyn CourseStore> = store.clone();
        let log_store: Arc<dyn IntakeLogStore> = store.clone();
        Self {
            appeals: AppealWorkflow::new(
                course_store.clone(),
                slots.clone(),
                notifier.clone(),
                clock.clone(),
                GROUP_CHAT_ID,
                MAX_APPEALS,
            ),
            activation: ActivationFlow::new(
                course_store.clone(),
                notifier.clone(),
                clock.clone(),
                GROUP_CHAT_ID,
            ),
            supervisor: SupervisorActions::new(
                course_store,
                log_store,
                notifier,
                clock.clone(),
                GROUP_CHAT_ID,
            ),
            slots,
            clock,
            store,
            participants: AtomicI64::new(500),
        }
    }

    pub async fn setup_course(
        &self,
        token: &str,
        y: i32,
        mo: u32,
        d: u32,
        hour: u32,
        min: u32,
    ) -> CourseId {
        let course = NewCourse {
            id: Uuid::new_v4(),
            participant_id: self.participants.fetch_add(1, Ordering::SeqCst),
            invite_token: token.to_string(),
            cycle_day: 1,
            intake_time: NaiveTime::from_hms_opt(hour, min, 0).unwrap(),
            start_date: NaiveDate::from_ymd_opt(y, mo, d).unwrap(),
            total_days: 30,
            topic_id: Some(7000),
            registration_message_id: None,
        };
        self.store.insert_course(&course).await.unwrap();
        course.id
    }

    pub async fn active_course(&self, hour: u32, min: u32) -> CourseId {
        let today = self.clock.now().date_naive();
        let token = format!("tok-{}", Uuid::new_v4());
        let id = self
            .setup_course(&token, today.year(), today.month(), today.day(), hour, min)
            .await;
        assert!(self.store.mark_invite_used(id).await.unwrap());
        let intake = NaiveTime::from_hms_opt(hour, min, 0).unwrap();
        assert!(self.store.activate(id, 1, intake, today).await.unwrap());
        id
    }

    pub async fn refused_course(&self, reason: RemovalReason, hour: u32, min: u32) -> CourseId {
        let id = self.active_course(hour, min).await;
        assert!(self.store.refuse_if_active(id, reason).await.unwrap());
        id
    }

    /// Burns appeal attempts by cycling refuse → appeal → accept, ending
    /// Refused(MaxStrikes) with the requested count on the books.
    pub async fn force_appeal_count(&self, id: CourseId, count: u32) {
        for n in 1..=count {
            assert!(self.store.start_appeal(id).await.unwrap());
            assert!(self.store.accept_appeal(id, n).await.unwrap());
            assert!(self.store.refuse_if_active(id, RemovalReason::MaxStrikes).await.unwrap());
        }
    }

    pub async fn pending_log(&self, course_id: CourseId, day: u32) -> LogId {
        let log = IntakeLog {
            id: Uuid::new_v4(),
            course_id,
            day,
            status: LogStatus::PendingReview,
            review_started_at: None,
            reshoot_deadline: None,
            created_at: self.clock.now(),
        };
        self.store.insert_log(&log).await.unwrap();
        log.id
    }

    pub async fn course(&self, id: CourseId) -> Course {
        self.store.get(id).await.unwrap().unwrap()
    }

    pub async fn log(&self, id: LogId) -> IntakeLog {
        self.store.get_log(id).await.unwrap().unwrap()
    }
}

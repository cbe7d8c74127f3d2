//! Shared fixture for task tests: an in-memory store on a fixed clock, a
//! recording chat client, and a fully wired `TickContext`.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone};
use uuid::Uuid;

use paceline_core::{
    Clock, Course, CourseId, FixedClock, IntakeLog, LogId, LogStatus, RemovalReason,
};
use paceline_dedup::{DeadlineSlots, DedupLedger, MemoryKv};
use paceline_notify::{ChatClient, ChatError, MessageRef, NotificationRetrier, RetryPolicy};
use paceline_store::{NewCourse, SqliteCourseStore};

use crate::context::{ScheduleConfig, TickContext};
use crate::delay::DelayQueue;

fn zone() -> FixedOffset {
    FixedOffset::east_opt(3 * 3600).unwrap()
}

#[derive(Debug, Clone)]
pub struct SentItem {
    pub method: &'static str,
    pub chat_id: i64,
    pub text: String,
}

/// Records every outbound call; can be flipped into a failing mode that
/// rejects everything permanently (no retries, no deliveries recorded).
#[derive(Default)]
pub struct RecordingChat {
    sent: Mutex<Vec<SentItem>>,
    next_id: AtomicI64,
    failing: AtomicBool,
}

impl RecordingChat {
    pub fn new() -> Self {
        Self { sent: Mutex::new(Vec::new()), next_id: AtomicI64::new(1), failing: AtomicBool::new(false) }
    }

    pub fn fail_everything(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    pub fn all_sent(&self) -> Vec<SentItem> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<SentItem> {
        self.all_sent().into_iter().filter(|s| s.chat_id == chat_id).collect()
    }

    fn record(&self, method: &'static str, chat_id: i64, text: &str) -> Result<MessageRef, ChatError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ChatError::Rejected("recording chat set to fail".into()));
        }
        self.sent.lock().unwrap().push(SentItem { method, chat_id, text: text.to_string() });
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl ChatClient for RecordingChat {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<MessageRef, ChatError> {
        self.record("send_message", chat_id, text)
    }

    async fn send_in_topic(
        &self,
        chat_id: i64,
        _topic_id: i64,
        text: &str,
    ) -> Result<MessageRef, ChatError> {
        self.record("send_in_topic", chat_id, text)
    }

    async fn send_with_button(
        &self,
        chat_id: i64,
        text: &str,
        _label: &str,
        _callback: &str,
    ) -> Result<MessageRef, ChatError> {
        self.record("send_with_button", chat_id, text)
    }

    async fn send_video(
        &self,
        chat_id: i64,
        _file_ref: &str,
        caption: &str,
    ) -> Result<MessageRef, ChatError> {
        self.record("send_video", chat_id, caption)
    }

    async fn delete_message(&self, chat_id: i64, _message_id: MessageRef) -> Result<(), ChatError> {
        self.record("delete_message", chat_id, "").map(|_| ())
    }

    async fn edit_topic_name(&self, chat_id: i64, _topic_id: i64, name: &str) -> Result<(), ChatError> {
        self.record("edit_topic_name", chat_id, name).map(|_| ())
    }

    async fn close_topic(&self, chat_id: i64, _topic_id: i64) -> Result<(), ChatError> {
        self.record("close_topic", chat_id, "").map(|_| ())
    }

    async fn reopen_topic(&self, chat_id: i64, _topic_id: i64) -> Result<(), ChatError> {
        self.record("reopen_topic", chat_id, "").map(|_| ())
    }

    async fn delete_topic(&self, chat_id: i64, _topic_id: i64) -> Result<(), ChatError> {
        self.record("delete_topic", chat_id, "").map(|_| ())
    }
}

/// The supergroup id used by every harness; participant ids never collide
/// with it.
const GROUP_CHAT_ID: i64 = -1001;

pub struct Harness {
    pub ctx: Arc<TickContext>,
    pub clock: Arc<FixedClock>,
    pub chat: Arc<RecordingChat>,
    pub delay: Arc<DelayQueue>,
    participants: AtomicI64,
    topics: AtomicI64,
}

impl Harness {
    pub async fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Self {
        let clock = Arc::new(FixedClock::at(
            zone().with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap(),
        ));
        let store = Arc::new(SqliteCourseStore::open_in_memory(clock.clone()).unwrap());
        let kv = Arc::new(MemoryKv::new(clock.clone()));
        let chat = Arc::new(RecordingChat::new());
        let policy = RetryPolicy {
            max_retries: 1,
            base_delay: StdDuration::from_millis(1),
            rate_limit_pad: StdDuration::from_millis(1),
        };
        let ctx = Arc::new(TickContext {
            store: store.clone(),
            logs: store,
            ledger: DedupLedger::new(kv.clone(), clock.clone()),
            slots: DeadlineSlots::new(kv),
            notifier: Arc::new(NotificationRetrier::new(chat.clone(), policy)),
            clock: clock.clone(),
            cfg: ScheduleConfig {
                group_chat_id: GROUP_CHAT_ID,
                ..ScheduleConfig::default()
            },
        });
        Self {
            ctx,
            clock,
            chat,
            delay: Arc::new(DelayQueue::new()),
            participants: AtomicI64::new(500),
            topics: AtomicI64::new(7000),
        }
    }

    /// Enrolls and activates a course starting today with the given intake
    /// time, audit topic attached.
    pub async fn enroll_active(&self, token: &str, hour: u32, min: u32) -> CourseId {
        let today = self.clock.now().date_naive();
        self.enroll_active_from(today, token, hour, min).await
    }

    /// Same, but with an explicit (possibly past) start date.
    pub async fn enroll_active_on(
        &self,
        y: i32,
        mo: u32,
        d: u32,
        token: &str,
        hour: u32,
        min: u32,
    ) -> CourseId {
        let start = NaiveDate::from_ymd_opt(y, mo, d).unwrap();
        self.enroll_active_from(start, token, hour, min).await
    }

    /// Enrolls without redeeming the invite; the course stays in Setup.
    pub async fn enroll_setup_on(&self, y: i32, mo: u32, d: u32, token: &str) -> CourseId {
        let start = NaiveDate::from_ymd_opt(y, mo, d).unwrap();
        let course = NewCourse {
            id: Uuid::new_v4(),
            participant_id: self.participants.fetch_add(1, Ordering::SeqCst),
            invite_token: token.to_string(),
            cycle_day: 1,
            intake_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            start_date: start,
            total_days: 30,
            topic_id: Some(self.topics.fetch_add(1, Ordering::SeqCst)),
            registration_message_id: None,
        };
        self.ctx.store.insert_course(&course).await.unwrap();
        course.id
    }

    async fn enroll_active_from(
        &self,
        start: NaiveDate,
        token: &str,
        hour: u32,
        min: u32,
    ) -> CourseId {
        let intake = NaiveTime::from_hms_opt(hour, min, 0).unwrap();
        let course = NewCourse {
            id: Uuid::new_v4(),
            participant_id: self.participants.fetch_add(1, Ordering::SeqCst),
            invite_token: token.to_string(),
            cycle_day: 1,
            intake_time: intake,
            start_date: start,
            total_days: 30,
            topic_id: Some(self.topics.fetch_add(1, Ordering::SeqCst)),
            registration_message_id: None,
        };
        self.ctx.store.insert_course(&course).await.unwrap();
        assert!(self.ctx.store.mark_invite_used(course.id).await.unwrap());
        assert!(self.ctx.store.activate(course.id, 1, intake, start).await.unwrap());
        course.id
    }

    pub async fn course(&self, id: CourseId) -> Course {
        self.ctx.store.get(id).await.unwrap().unwrap()
    }

    pub async fn participant_id(&self, id: &CourseId) -> i64 {
        self.course(*id).await.participant_id
    }

    pub async fn insert_pending_log(&self, course_id: CourseId, day: u32) -> LogId {
        let log = IntakeLog {
            id: Uuid::new_v4(),
            course_id,
            day,
            status: LogStatus::PendingReview,
            review_started_at: None,
            reshoot_deadline: None,
            created_at: self.clock.now(),
        };
        self.ctx.logs.insert_log(&log).await.unwrap();
        log.id
    }

    pub async fn log(&self, id: LogId) -> IntakeLog {
        self.ctx.logs.get_log(id).await.unwrap().unwrap()
    }

    pub async fn begin_review_at(&self, log_id: LogId, y: i32, mo: u32, d: u32, h: u32, mi: u32) {
        let at = zone().with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap();
        assert!(self.ctx.logs.begin_review(log_id, at).await.unwrap());
    }

    pub async fn grant_reshoot_until(&self, log_id: LogId, y: i32, mo: u32, d: u32, h: u32, mi: u32) {
        let until = zone().with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap();
        assert!(self.ctx.logs.set_reshoot_deadline(log_id, until).await.unwrap());
    }

    /// Records one strike per date; the course must be Active.
    pub async fn preload_strikes(&self, id: CourseId, dates: &[(i32, u32, u32)]) {
        for &(y, mo, d) in dates {
            let on = NaiveDate::from_ymd_opt(y, mo, d).unwrap();
            assert!(self.ctx.store.add_strike(id, on).await.unwrap().is_some());
        }
    }

    /// Drives the course through a full refuse/appeal/accept cycle to leave
    /// it Active with the given appeal count.
    pub async fn set_appeal_count(&self, id: CourseId, count: u32) {
        assert!(self.ctx.store.refuse_if_active(id, RemovalReason::NoVideo).await.unwrap());
        assert!(self.ctx.store.start_appeal(id).await.unwrap());
        assert!(self.ctx.store.accept_appeal(id, count).await.unwrap());
    }

    /// Refuses for a missed proof and opens an appeal, leaving the course
    /// in Appeal with no stored deadline slot.
    pub async fn move_to_appeal(&self, id: CourseId) {
        assert!(self.ctx.store.refuse_if_active(id, RemovalReason::NoVideo).await.unwrap());
        assert!(self.ctx.store.start_appeal(id).await.unwrap());
    }
}

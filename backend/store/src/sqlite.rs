//! Durable SQLite-backed course/log store.
//!
//! All guarded transitions execute as one conditional UPDATE so that
//! concurrent callers (interactive handlers and scheduler ticks, possibly
//! in different processes sharing the database) can never double-apply an
//! effect. The connection lives behind a tokio mutex; statements are short.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rusqlite::{params, OptionalExtension};
use tracing::debug;

use paceline_core::{
    Clock, Course, CourseId, CourseStatus, IntakeLog, LogId, LogStatus, PacelineError,
    RemovalReason,
};

use crate::store::{CourseStore, IntakeLogStore, NewCourse};

const COURSE_COLS: &str = "id, participant_id, status, invite_token, invite_used, cycle_day, \
     intake_time, start_date, current_day, total_days, late_count, late_dates, appeal_count, \
     appeal_video_ref, appeal_text, removal_reason, extended, topic_id, \
     registration_message_id, created_at, updated_at";

const LOG_COLS: &str =
    "id, course_id, day, status, review_started_at, reshoot_deadline, created_at";

pub struct SqliteCourseStore {
    conn: tokio::sync::Mutex<rusqlite::Connection>,
    clock: Arc<dyn Clock>,
}

impl SqliteCourseStore {
    pub fn open(path: &str, clock: Arc<dyn Clock>) -> Result<Self, PacelineError> {
        let conn = rusqlite::Connection::open(path).map_err(db_err)?;
        Self::migrate(&conn)?;
        Ok(Self { conn: tokio::sync::Mutex::new(conn), clock })
    }

    /// In-memory database, used by tests and local dry runs.
    pub fn open_in_memory(clock: Arc<dyn Clock>) -> Result<Self, PacelineError> {
        let conn = rusqlite::Connection::open_in_memory().map_err(db_err)?;
        Self::migrate(&conn)?;
        Ok(Self { conn: tokio::sync::Mutex::new(conn), clock })
    }

    fn migrate(conn: &rusqlite::Connection) -> Result<(), PacelineError> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            CREATE TABLE IF NOT EXISTS courses (
                id                      TEXT PRIMARY KEY,
                participant_id          INTEGER NOT NULL,
                status                  TEXT NOT NULL DEFAULT 'setup',
                invite_token            TEXT NOT NULL UNIQUE,
                invite_used             INTEGER NOT NULL DEFAULT 0,
                cycle_day               INTEGER NOT NULL DEFAULT 0,
                intake_time             TEXT NOT NULL,
                start_date              TEXT NOT NULL,
                current_day             INTEGER NOT NULL DEFAULT 0,
                total_days              INTEGER NOT NULL,
                late_count              INTEGER NOT NULL DEFAULT 0,
                late_dates              TEXT NOT NULL DEFAULT '[]',
                appeal_count            INTEGER NOT NULL DEFAULT 0,
                appeal_video_ref        TEXT,
                appeal_text             TEXT,
                removal_reason          TEXT,
                extended                INTEGER NOT NULL DEFAULT 0,
                topic_id                INTEGER,
                registration_message_id INTEGER,
                created_at              TEXT NOT NULL,
                updated_at              TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_courses_status_intake
                ON courses(status, intake_time);
            CREATE TABLE IF NOT EXISTS intake_logs (
                id                TEXT PRIMARY KEY,
                course_id         TEXT NOT NULL REFERENCES courses(id),
                day               INTEGER NOT NULL,
                status            TEXT NOT NULL DEFAULT 'pending_review',
                review_started_at TEXT,
                reshoot_deadline  TEXT,
                created_at        TEXT NOT NULL,
                UNIQUE (course_id, day)
            );
            "#,
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn now_str(&self) -> String {
        self.clock.now().to_rfc3339()
    }
}

#[async_trait]
impl CourseStore for SqliteCourseStore {
    async fn get(&self, id: CourseId) -> Result<Option<Course>, PacelineError> {
        let conn = self.conn.lock().await;
        conn.query_row(
            &format!("SELECT {COURSE_COLS} FROM courses WHERE id = ?1"),
            params![id.to_string()],
            course_from_row,
        )
        .optional()
        .map_err(db_err)
    }

    async fn find_by_invite(&self, token: &str) -> Result<Option<Course>, PacelineError> {
        let conn = self.conn.lock().await;
        conn.query_row(
            &format!("SELECT {COURSE_COLS} FROM courses WHERE invite_token = ?1"),
            params![token],
            course_from_row,
        )
        .optional()
        .map_err(db_err)
    }

    async fn active_in_intake_band(
        &self,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Vec<Course>, PacelineError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {COURSE_COLS} FROM courses \
                 WHERE status = 'active' AND intake_time >= ?1 AND intake_time <= ?2"
            ))
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![fmt_time(start), fmt_time(end)], course_from_row)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    async fn appeal_courses(&self) -> Result<Vec<Course>, PacelineError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!("SELECT {COURSE_COLS} FROM courses WHERE status = 'appeal'"))
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], course_from_row)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    async fn refused_with_appeal_option(
        &self,
        max_appeals: u32,
    ) -> Result<Vec<Course>, PacelineError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {COURSE_COLS} FROM courses \
                 WHERE status = 'refused' AND appeal_count < ?1 \
                   AND removal_reason IN ('no_video', 'max_strikes')"
            ))
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![max_appeals], course_from_row)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    async fn ended_with_topic(
        &self,
        cutoff: DateTime<FixedOffset>,
    ) -> Result<Vec<Course>, PacelineError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {COURSE_COLS} FROM courses \
                 WHERE status IN ('completed', 'expired', 'refused') \
                   AND topic_id IS NOT NULL AND updated_at <= ?1"
            ))
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![cutoff.to_rfc3339()], course_from_row)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    async fn setup_before(&self, date: NaiveDate) -> Result<Vec<Course>, PacelineError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {COURSE_COLS} FROM courses \
                 WHERE status = 'setup' AND start_date < ?1"
            ))
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![fmt_date(date)], course_from_row)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    async fn insert_course(&self, course: &NewCourse) -> Result<(), PacelineError> {
        let now = self.now_str();
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO courses \
             (id, participant_id, status, invite_token, cycle_day, intake_time, start_date, \
              total_days, topic_id, registration_message_id, created_at, updated_at) \
             VALUES (?1, ?2, 'setup', ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                course.id.to_string(),
                course.participant_id,
                course.invite_token,
                course.cycle_day,
                fmt_time(course.intake_time),
                fmt_date(course.start_date),
                course.total_days,
                course.topic_id,
                course.registration_message_id,
                now,
            ],
        )
        .map_err(db_err)?;
        debug!(course_id = %course.id, "Course enrolled");
        Ok(())
    }

    async fn mark_invite_used(&self, id: CourseId) -> Result<bool, PacelineError> {
        let now = self.now_str();
        let conn = self.conn.lock().await;
        let n = conn
            .execute(
                "UPDATE courses SET invite_used = 1, updated_at = ?2 \
                 WHERE id = ?1 AND invite_used = 0",
                params![id.to_string(), now],
            )
            .map_err(db_err)?;
        Ok(n == 1)
    }

    async fn activate(
        &self,
        id: CourseId,
        cycle_day: u32,
        intake_time: NaiveTime,
        start_date: NaiveDate,
    ) -> Result<bool, PacelineError> {
        let now = self.now_str();
        let conn = self.conn.lock().await;
        let n = conn
            .execute(
                "UPDATE courses SET status = 'active', cycle_day = ?2, intake_time = ?3, \
                 start_date = ?4, current_day = 1, updated_at = ?5 \
                 WHERE id = ?1 AND status = 'setup'",
                params![id.to_string(), cycle_day, fmt_time(intake_time), fmt_date(start_date), now],
            )
            .map_err(db_err)?;
        Ok(n == 1)
    }

    async fn expire_if_setup(&self, id: CourseId) -> Result<bool, PacelineError> {
        let now = self.now_str();
        let conn = self.conn.lock().await;
        let n = conn
            .execute(
                "UPDATE courses SET status = 'expired', updated_at = ?2 \
                 WHERE id = ?1 AND status = 'setup'",
                params![id.to_string(), now],
            )
            .map_err(db_err)?;
        Ok(n == 1)
    }

    async fn start_appeal(&self, id: CourseId) -> Result<bool, PacelineError> {
        let now = self.now_str();
        let conn = self.conn.lock().await;
        let n = conn
            .execute(
                "UPDATE courses SET status = 'appeal', updated_at = ?2 \
                 WHERE id = ?1 AND status = 'refused'",
                params![id.to_string(), now],
            )
            .map_err(db_err)?;
        Ok(n == 1)
    }

    async fn accept_appeal(
        &self,
        id: CourseId,
        new_appeal_count: u32,
    ) -> Result<bool, PacelineError> {
        let now = self.now_str();
        let conn = self.conn.lock().await;
        let n = conn
            .execute(
                "UPDATE courses SET status = 'active', appeal_count = ?2, \
                 removal_reason = NULL, updated_at = ?3 \
                 WHERE id = ?1 AND status = 'appeal'",
                params![id.to_string(), new_appeal_count, now],
            )
            .map_err(db_err)?;
        Ok(n == 1)
    }

    async fn decline_appeal(
        &self,
        id: CourseId,
        new_appeal_count: u32,
    ) -> Result<bool, PacelineError> {
        let now = self.now_str();
        let conn = self.conn.lock().await;
        let n = conn
            .execute(
                "UPDATE courses SET status = 'refused', appeal_count = ?2, \
                 removal_reason = 'appeal_declined', updated_at = ?3 \
                 WHERE id = ?1 AND status = 'appeal'",
                params![id.to_string(), new_appeal_count, now],
            )
            .map_err(db_err)?;
        Ok(n == 1)
    }

    async fn refuse_if_active(
        &self,
        id: CourseId,
        reason: RemovalReason,
    ) -> Result<bool, PacelineError> {
        let now = self.now_str();
        let conn = self.conn.lock().await;
        let n = conn
            .execute(
                "UPDATE courses SET status = 'refused', removal_reason = ?2, updated_at = ?3 \
                 WHERE id = ?1 AND status = 'active'",
                params![id.to_string(), reason.as_str(), now],
            )
            .map_err(db_err)?;
        Ok(n == 1)
    }

    async fn refuse_if_appeal(
        &self,
        id: CourseId,
        new_appeal_count: u32,
    ) -> Result<bool, PacelineError> {
        let now = self.now_str();
        let conn = self.conn.lock().await;
        let n = conn
            .execute(
                "UPDATE courses SET status = 'refused', appeal_count = ?2, \
                 removal_reason = 'appeal_expired', updated_at = ?3 \
                 WHERE id = ?1 AND status = 'appeal'",
                params![id.to_string(), new_appeal_count, now],
            )
            .map_err(db_err)?;
        Ok(n == 1)
    }

    async fn extend(&self, id: CourseId, new_total_days: u32) -> Result<bool, PacelineError> {
        let now = self.now_str();
        let conn = self.conn.lock().await;
        let n = conn
            .execute(
                "UPDATE courses SET total_days = ?2, extended = 1, updated_at = ?3 \
                 WHERE id = ?1 AND extended = 0",
                params![id.to_string(), new_total_days, now],
            )
            .map_err(db_err)?;
        Ok(n == 1)
    }

    async fn complete_course_active(&self, id: CourseId) -> Result<bool, PacelineError> {
        let now = self.now_str();
        let conn = self.conn.lock().await;
        let n = conn
            .execute(
                "UPDATE courses SET status = 'completed', updated_at = ?2 \
                 WHERE id = ?1 AND status = 'active'",
                params![id.to_string(), now],
            )
            .map_err(db_err)?;
        Ok(n == 1)
    }

    async fn add_strike(
        &self,
        id: CourseId,
        on: NaiveDate,
    ) -> Result<Option<u32>, PacelineError> {
        let now = self.now_str();
        let date = fmt_date(on);
        let conn = self.conn.lock().await;
        // Guarding on instr() keeps the strike once-per-date even across
        // processes that share the database but not the dedup ledger.
        conn.query_row(
            "UPDATE courses SET late_count = late_count + 1, \
             late_dates = json_insert(late_dates, '$[#]', ?2), updated_at = ?3 \
             WHERE id = ?1 AND status = 'active' AND instr(late_dates, ?2) = 0 \
             RETURNING late_count",
            params![id.to_string(), date, now],
            |row| row.get::<_, u32>(0),
        )
        .optional()
        .map_err(db_err)
    }

    async fn advance_day(&self, id: CourseId, day: u32) -> Result<bool, PacelineError> {
        let now = self.now_str();
        let conn = self.conn.lock().await;
        let n = conn
            .execute(
                "UPDATE courses SET current_day = ?2, updated_at = ?3 \
                 WHERE id = ?1 AND status = 'active' AND current_day < ?2",
                params![id.to_string(), day, now],
            )
            .map_err(db_err)?;
        Ok(n == 1)
    }

    async fn set_appeal_evidence(
        &self,
        id: CourseId,
        video_ref: Option<&str>,
        text: Option<&str>,
    ) -> Result<bool, PacelineError> {
        let now = self.now_str();
        let conn = self.conn.lock().await;
        let n = conn
            .execute(
                "UPDATE courses SET appeal_video_ref = ?2, appeal_text = ?3, updated_at = ?4 \
                 WHERE id = ?1 AND status = 'appeal'",
                params![id.to_string(), video_ref, text, now],
            )
            .map_err(db_err)?;
        Ok(n == 1)
    }

    async fn clear_topic(&self, id: CourseId) -> Result<(), PacelineError> {
        let now = self.now_str();
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE courses SET topic_id = NULL, updated_at = ?2 WHERE id = ?1",
            params![id.to_string(), now],
        )
        .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl IntakeLogStore for SqliteCourseStore {
    async fn insert_log(&self, log: &IntakeLog) -> Result<(), PacelineError> {
        let conn = self.conn.lock().await;
        conn.execute(
            &format!("INSERT INTO intake_logs ({LOG_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                log.id.to_string(),
                log.course_id.to_string(),
                log.day,
                log.status.as_str(),
                log.review_started_at.map(|t| t.to_rfc3339()),
                log.reshoot_deadline.map(|t| t.to_rfc3339()),
                log.created_at.to_rfc3339(),
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_log(&self, id: LogId) -> Result<Option<IntakeLog>, PacelineError> {
        let conn = self.conn.lock().await;
        conn.query_row(
            &format!("SELECT {LOG_COLS} FROM intake_logs WHERE id = ?1"),
            params![id.to_string()],
            log_from_row,
        )
        .optional()
        .map_err(db_err)
    }

    async fn has_log_for_day(
        &self,
        course_id: CourseId,
        day: u32,
    ) -> Result<bool, PacelineError> {
        let conn = self.conn.lock().await;
        let n: u32 = conn
            .query_row(
                "SELECT COUNT(*) FROM intake_logs WHERE course_id = ?1 AND day = ?2",
                params![course_id.to_string(), day],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        Ok(n > 0)
    }

    async fn begin_review(
        &self,
        id: LogId,
        at: DateTime<FixedOffset>,
    ) -> Result<bool, PacelineError> {
        let conn = self.conn.lock().await;
        let n = conn
            .execute(
                "UPDATE intake_logs SET review_started_at = ?2 \
                 WHERE id = ?1 AND status = 'pending_review' AND review_started_at IS NULL",
                params![id.to_string(), at.to_rfc3339()],
            )
            .map_err(db_err)?;
        Ok(n == 1)
    }

    async fn close_log(&self, id: LogId, status: LogStatus) -> Result<bool, PacelineError> {
        let conn = self.conn.lock().await;
        let n = conn
            .execute(
                "UPDATE intake_logs SET status = ?2 \
                 WHERE id = ?1 AND status = 'pending_review'",
                params![id.to_string(), status.as_str()],
            )
            .map_err(db_err)?;
        Ok(n == 1)
    }

    async fn set_reshoot_deadline(
        &self,
        id: LogId,
        deadline: DateTime<FixedOffset>,
    ) -> Result<bool, PacelineError> {
        let conn = self.conn.lock().await;
        let n = conn
            .execute(
                "UPDATE intake_logs SET reshoot_deadline = ?2 \
                 WHERE id = ?1 AND status = 'pending_review'",
                params![id.to_string(), deadline.to_rfc3339()],
            )
            .map_err(db_err)?;
        Ok(n == 1)
    }

    async fn logs_in_review(&self) -> Result<Vec<(IntakeLog, Course)>, PacelineError> {
        self.logs_with_course(
            "l.status = 'pending_review' AND l.review_started_at IS NOT NULL \
             AND l.reshoot_deadline IS NULL",
        )
        .await
    }

    async fn logs_awaiting_reshoot(&self) -> Result<Vec<(IntakeLog, Course)>, PacelineError> {
        self.logs_with_course("l.status = 'pending_review' AND l.reshoot_deadline IS NOT NULL")
            .await
    }
}

impl SqliteCourseStore {
    async fn logs_with_course(
        &self,
        predicate: &str,
    ) -> Result<Vec<(IntakeLog, Course)>, PacelineError> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "SELECT l.id, l.course_id, l.day, l.status, l.review_started_at, \
                    l.reshoot_deadline, l.created_at, \
                    {} \
             FROM intake_logs l JOIN courses c ON c.id = l.course_id \
             WHERE {predicate} AND c.status = 'active'",
            COURSE_COLS
                .split(", ")
                .map(|col| format!("c.{col}"))
                .collect::<Vec<_>>()
                .join(", "),
        );
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                let log = log_from_row(row)?;
                let course = course_from_row_at(row, 7)?;
                Ok((log, course))
            })
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(rows)
    }
}

// -- row mapping -----------------------------------------------------------

fn db_err(e: rusqlite::Error) -> PacelineError {
    PacelineError::StoreUnavailable(e.to_string())
}

fn parse_failure(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, msg.into())
}

fn fmt_time(t: NaiveTime) -> String {
    t.format("%H:%M:%S").to_string()
}

fn fmt_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn parse_time(idx: usize, s: &str) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .map_err(|e| parse_failure(idx, format!("bad time {s:?}: {e}")))
}

fn parse_date(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| parse_failure(idx, format!("bad date {s:?}: {e}")))
}

fn parse_ts(idx: usize, s: &str) -> rusqlite::Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| parse_failure(idx, format!("bad timestamp {s:?}: {e}")))
}

fn parse_uuid(idx: usize, s: &str) -> rusqlite::Result<uuid::Uuid> {
    uuid::Uuid::parse_str(s).map_err(|e| parse_failure(idx, format!("bad uuid {s:?}: {e}")))
}

fn course_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Course> {
    course_from_row_at(row, 0)
}

fn course_from_row_at(row: &rusqlite::Row<'_>, base: usize) -> rusqlite::Result<Course> {
    let status_str: String = row.get(base + 2)?;
    let status = CourseStatus::parse(&status_str)
        .ok_or_else(|| parse_failure(base + 2, format!("bad status {status_str:?}")))?;
    let removal_str: Option<String> = row.get(base + 15)?;
    let removal_reason = match removal_str {
        Some(s) => Some(
            RemovalReason::parse(&s)
                .ok_or_else(|| parse_failure(base + 15, format!("bad removal reason {s:?}")))?,
        ),
        None => None,
    };
    let late_dates_json: String = row.get(base + 11)?;
    let late_strings: Vec<String> = serde_json::from_str(&late_dates_json)
        .map_err(|e| parse_failure(base + 11, format!("bad late_dates: {e}")))?;
    let late_dates = late_strings
        .iter()
        .map(|s| parse_date(base + 11, s))
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Course {
        id: parse_uuid(base, &row.get::<_, String>(base)?)?,
        participant_id: row.get(base + 1)?,
        status,
        invite_token: row.get(base + 3)?,
        invite_used: row.get::<_, i64>(base + 4)? != 0,
        cycle_day: row.get(base + 5)?,
        intake_time: parse_time(base + 6, &row.get::<_, String>(base + 6)?)?,
        start_date: parse_date(base + 7, &row.get::<_, String>(base + 7)?)?,
        current_day: row.get(base + 8)?,
        total_days: row.get(base + 9)?,
        late_count: row.get(base + 10)?,
        late_dates,
        appeal_count: row.get(base + 12)?,
        appeal_video_ref: row.get(base + 13)?,
        appeal_text: row.get(base + 14)?,
        removal_reason,
        extended: row.get::<_, i64>(base + 16)? != 0,
        topic_id: row.get(base + 17)?,
        registration_message_id: row.get(base + 18)?,
        created_at: parse_ts(base + 19, &row.get::<_, String>(base + 19)?)?,
        updated_at: parse_ts(base + 20, &row.get::<_, String>(base + 20)?)?,
    })
}

fn log_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<IntakeLog> {
    let status_str: String = row.get(3)?;
    let status = LogStatus::parse(&status_str)
        .ok_or_else(|| parse_failure(3, format!("bad log status {status_str:?}")))?;
    let review_started_at = match row.get::<_, Option<String>>(4)? {
        Some(s) => Some(parse_ts(4, &s)?),
        None => None,
    };
    let reshoot_deadline = match row.get::<_, Option<String>>(5)? {
        Some(s) => Some(parse_ts(5, &s)?),
        None => None,
    };
    Ok(IntakeLog {
        id: parse_uuid(0, &row.get::<_, String>(0)?)?,
        course_id: parse_uuid(1, &row.get::<_, String>(1)?)?,
        day: row.get(2)?,
        status,
        review_started_at,
        reshoot_deadline,
        created_at: parse_ts(6, &row.get::<_, String>(6)?)?,
    })
}

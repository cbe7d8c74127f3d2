use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CourseId = Uuid;
pub type LogId = Uuid;

/// Hard quota of appeals per course. Starting a third appeal is always rejected.
pub const MAX_APPEALS: u32 = 2;

/// Lifecycle status of a course.
///
/// Transitions only ever follow the enumerated edges:
/// Setup→Active, Setup→Expired, Active→Refused, Active→Completed,
/// Refused→Appeal, Appeal→Active, Appeal→Refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Setup,
    Active,
    Appeal,
    Refused,
    Completed,
    Expired,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Active => "active",
            Self::Appeal => "appeal",
            Self::Refused => "refused",
            Self::Completed => "completed",
            Self::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "setup" => Some(Self::Setup),
            "active" => Some(Self::Active),
            "appeal" => Some(Self::Appeal),
            "refused" => Some(Self::Refused),
            "completed" => Some(Self::Completed),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    /// True once a course can no longer leave its status through any edge.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Expired)
    }
}

/// Why a course was moved to Refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    NoVideo,
    MaxStrikes,
    ManagerReject,
    ReviewDeadline,
    ReshootExpired,
    AppealDeclined,
    AppealExpired,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoVideo => "no_video",
            Self::MaxStrikes => "max_strikes",
            Self::ManagerReject => "manager_reject",
            Self::ReviewDeadline => "review_deadline",
            Self::ReshootExpired => "reshoot_expired",
            Self::AppealDeclined => "appeal_declined",
            Self::AppealExpired => "appeal_expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "no_video" => Some(Self::NoVideo),
            "max_strikes" => Some(Self::MaxStrikes),
            "manager_reject" => Some(Self::ManagerReject),
            "review_deadline" => Some(Self::ReviewDeadline),
            "reshoot_expired" => Some(Self::ReshootExpired),
            "appeal_declined" => Some(Self::AppealDeclined),
            "appeal_expired" => Some(Self::AppealExpired),
            _ => None,
        }
    }

    /// Only removals the participant is considered at fault for can be
    /// appealed. Review/reshoot expiries and manual rejection cannot.
    pub fn is_appealable(&self) -> bool {
        matches!(self, Self::NoVideo | Self::MaxStrikes)
    }
}

/// One participant's run through the program. Independent lifecycle per
/// enrollment; mutated only through the guarded store operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    /// Chat-platform user id of the enrolled participant.
    pub participant_id: i64,
    pub status: CourseStatus,
    pub invite_token: String,
    pub invite_used: bool,
    /// Day of the program cycle the participant joined on.
    pub cycle_day: u32,
    /// Time of day the daily proof is due, in the program's fixed zone.
    pub intake_time: NaiveTime,
    pub start_date: NaiveDate,
    pub current_day: u32,
    pub total_days: u32,
    pub late_count: u32,
    /// Dates a late strike was recorded, in order.
    pub late_dates: Vec<NaiveDate>,
    pub appeal_count: u32,
    pub appeal_video_ref: Option<String>,
    pub appeal_text: Option<String>,
    pub removal_reason: Option<RemovalReason>,
    pub extended: bool,
    /// Forum topic holding this course's audit thread, if still open.
    pub topic_id: Option<i64>,
    pub registration_message_id: Option<i64>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl Course {
    /// Program day number on `date` (day 1 = start_date). None before start.
    pub fn day_on(&self, date: NaiveDate) -> Option<u32> {
        let delta = (date - self.start_date).num_days();
        if delta < 0 {
            None
        } else {
            Some(delta as u32 + 1)
        }
    }

    /// Whether the participant still has appeal quota left.
    pub fn can_appeal(&self) -> bool {
        self.appeal_count < MAX_APPEALS
            && self.removal_reason.map(|r| r.is_appealable()).unwrap_or(false)
    }
}

/// Review status of a single day's submitted proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    PendingReview,
    Approved,
    Missed,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::Missed => "missed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending_review" => Some(Self::PendingReview),
            "approved" => Some(Self::Approved),
            "missed" => Some(Self::Missed),
            _ => None,
        }
    }
}

/// One day's proof-of-action record for a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeLog {
    pub id: LogId,
    pub course_id: CourseId,
    pub day: u32,
    pub status: LogStatus,
    /// Set when a supervisor opened the record for review.
    pub review_started_at: Option<DateTime<FixedOffset>>,
    /// Second-chance deadline, stored verbatim when a reshoot is requested.
    pub reshoot_deadline: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn course_at(start: NaiveDate) -> Course {
        let zone = FixedOffset::east_opt(3 * 3600).unwrap();
        let now = zone.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        Course {
            id: Uuid::new_v4(),
            participant_id: 42,
            status: CourseStatus::Active,
            invite_token: "tok".into(),
            invite_used: true,
            cycle_day: 1,
            intake_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            start_date: start,
            current_day: 1,
            total_days: 14,
            late_count: 0,
            late_dates: Vec::new(),
            appeal_count: 0,
            appeal_video_ref: None,
            appeal_text: None,
            removal_reason: None,
            extended: false,
            topic_id: None,
            registration_message_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn day_on_counts_from_one() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let course = course_at(start);
        assert_eq!(course.day_on(start), Some(1));
        assert_eq!(course.day_on(start + chrono::Duration::days(6)), Some(7));
        assert_eq!(course.day_on(start - chrono::Duration::days(1)), None);
    }

    #[test]
    fn appeal_requires_quota_and_appealable_reason() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut course = course_at(start);
        course.status = CourseStatus::Refused;
        course.removal_reason = Some(RemovalReason::NoVideo);
        assert!(course.can_appeal());

        course.appeal_count = MAX_APPEALS;
        assert!(!course.can_appeal());

        course.appeal_count = 0;
        course.removal_reason = Some(RemovalReason::ReviewDeadline);
        assert!(!course.can_appeal());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            CourseStatus::Setup,
            CourseStatus::Active,
            CourseStatus::Appeal,
            CourseStatus::Refused,
            CourseStatus::Completed,
            CourseStatus::Expired,
        ] {
            assert_eq!(CourseStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(CourseStatus::parse("bogus"), None);
    }
}

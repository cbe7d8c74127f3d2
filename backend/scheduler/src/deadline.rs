//! Deadline arithmetic: pure functions from (now, course/log fields) to
//! instants and time-of-day bands. No I/O here.

use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveTime, TimeZone};

/// Combine a date and a time of day in the program's fixed zone.
fn at_time(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<FixedOffset> {
    match offset.from_local_datetime(&date.and_time(time)) {
        LocalResult::Single(dt) => dt,
        // Fixed offsets have no gaps or folds; this arm is unreachable.
        _ => offset.from_utc_datetime(&date.and_time(time)),
    }
}

/// Supervisors get until two hours before the next day's intake to finish a
/// review they started.
pub fn review_deadline(
    review_started_at: DateTime<FixedOffset>,
    intake_time: NaiveTime,
) -> DateTime<FixedOffset> {
    let next_day = review_started_at.date_naive() + Duration::days(1);
    at_time(next_day, intake_time, *review_started_at.offset()) - Duration::hours(2)
}

/// The appeal window closes at the next occurrence of the course's intake
/// time strictly after `now`. Computed once and persisted via the deadline
/// slot; recomputing it per tick would postpone it forever.
pub fn appeal_deadline(
    now: DateTime<FixedOffset>,
    intake_time: NaiveTime,
) -> DateTime<FixedOffset> {
    let date = if now.time() < intake_time {
        now.date_naive()
    } else {
        now.date_naive() + Duration::days(1)
    };
    at_time(date, intake_time, *now.offset())
}

/// Time-of-day band centered at `now + delta`, `width` wide, sized to
/// absorb scheduler tick jitter.
///
/// Known limitation: a band crossing midnight is not normalized; its start
/// compares greater than its end and the window query matches nothing for
/// that tick (a gap of roughly one tick interval around midnight).
pub fn intake_band(
    now: DateTime<FixedOffset>,
    delta: Duration,
    width: Duration,
) -> (NaiveTime, NaiveTime) {
    let center = now + delta;
    let start = center - width / 2;
    let end = center + width / 2;
    (start.time(), end.time())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn review_deadline_is_next_intake_minus_two_hours() {
        let started = zone().with_ymd_and_hms(2024, 5, 10, 14, 30, 0).unwrap();
        let deadline = review_deadline(started, t(10, 0));
        assert_eq!(deadline, zone().with_ymd_and_hms(2024, 5, 11, 8, 0, 0).unwrap());
    }

    #[test]
    fn appeal_deadline_today_when_intake_still_ahead() {
        let now = zone().with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap();
        let deadline = appeal_deadline(now, t(10, 0));
        assert_eq!(deadline, zone().with_ymd_and_hms(2024, 5, 10, 10, 0, 0).unwrap());
    }

    #[test]
    fn appeal_deadline_rolls_to_tomorrow_after_intake() {
        let now = zone().with_ymd_and_hms(2024, 5, 10, 10, 0, 0).unwrap();
        let deadline = appeal_deadline(now, t(10, 0));
        assert_eq!(deadline, zone().with_ymd_and_hms(2024, 5, 11, 10, 0, 0).unwrap());
    }

    #[test]
    fn band_for_the_thirty_minute_check() {
        // now = 10:31, checking courses whose intake was ~30 minutes ago.
        let now = zone().with_ymd_and_hms(2024, 5, 10, 10, 31, 0).unwrap();
        let (start, end) = intake_band(now, Duration::minutes(-30), Duration::minutes(4));
        assert_eq!(start, t(9, 59));
        assert_eq!(end, t(10, 3));
    }

    #[test]
    fn band_crossing_midnight_is_inverted_not_normalized() {
        let now = zone().with_ymd_and_hms(2024, 5, 10, 0, 1, 0).unwrap();
        let (start, end) = intake_band(now, Duration::zero(), Duration::minutes(4));
        // The band straddles midnight; it stays inverted (start > end) and
        // the window query matches nothing for this tick.
        assert_eq!(start, NaiveTime::from_hms_opt(23, 59, 0).unwrap());
        assert_eq!(end, NaiveTime::from_hms_opt(0, 3, 0).unwrap());
        assert!(start > end);
    }
}

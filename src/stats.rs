//! Leave accounting engine: working-day counting and per-teacher aggregation.
//!
//! Everything here is a pure function over an in-memory record list; the sync
//! layer is responsible for getting the records into memory in the first place.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::leave_record::{LeaveRecord, LeaveStatus, LeaveType};

/// Inclusive window over record start dates.
#[derive(Debug, Clone, Copy)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveStats {
    #[schema(example = 1)]
    pub sick: u32,
    #[schema(example = 0)]
    pub personal: u32,
    #[schema(example = 0)]
    pub off_campus: u32,
    #[schema(example = 0)]
    pub late: u32,
    #[schema(example = 1)]
    pub total_requests: u32,
    #[schema(example = 2)]
    pub total_leave_days: i64,
    /// The filtered records themselves, for report detail rendering.
    pub raw: Vec<LeaveRecord>,
}

/// Counts days in the inclusive range `[start, end]` whose weekday is not
/// Saturday or Sunday. Date-only arithmetic: exactly `end - start + 1`
/// iterations, no clock or timezone involved, so DST shifts cannot skew the
/// count. An empty range (`start > end`) yields 0.
pub fn count_working_days(start: NaiveDate, end: NaiveDate) -> u32 {
    let mut days = 0;
    let mut day = start;
    while day <= end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days += 1;
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    days
}

/// Calendar days a record spans, inclusive of both endpoints. Absolute
/// difference, so a swapped start/end still yields a positive span; callers
/// should never pass one, but a bad record must not produce a negative total.
fn span_days(record: &LeaveRecord) -> i64 {
    (record.end_date - record.start_date).num_days().abs() + 1
}

/// Aggregates the approved leave of one teacher, optionally windowed by
/// `range` on each record's start date (boundaries inclusive: a record
/// starting exactly on `range.end` is counted).
///
/// Off-campus and late records are tallied but contribute zero leave days;
/// they consume hours, not days.
pub fn calculate_stats(
    teacher_id: &str,
    records: &[LeaveRecord],
    range: Option<&DateRange>,
) -> LeaveStats {
    let raw: Vec<LeaveRecord> = records
        .iter()
        .filter(|r| r.teacher_id == teacher_id && r.status == LeaveStatus::Approved)
        .filter(|r| match range {
            Some(window) => r.start_date >= window.start && r.start_date <= window.end,
            None => true,
        })
        .cloned()
        .collect();

    let mut stats = LeaveStats {
        sick: 0,
        personal: 0,
        off_campus: 0,
        late: 0,
        total_requests: raw.len() as u32,
        total_leave_days: 0,
        raw: Vec::new(),
    };

    for record in &raw {
        match record.leave_type {
            LeaveType::Sick => stats.sick += 1,
            LeaveType::Personal => stats.personal += 1,
            LeaveType::OffCampus => stats.off_campus += 1,
            LeaveType::Late => stats.late += 1,
        }
        if record.consumes_days() {
            stats.total_leave_days += span_days(record);
        }
    }

    stats.raw = raw;
    stats
}

/// Working days minus recorded leave days. Deliberately NOT clamped at zero:
/// a report window shorter than the leave it covers goes negative, and that
/// is surfaced to the viewer rather than hidden.
pub fn present_days(working_days: u32, stats: &LeaveStats) -> i64 {
    i64::from(working_days) - stats.total_leave_days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn record(
        teacher_id: &str,
        leave_type: LeaveType,
        status: LeaveStatus,
        start: &str,
        end: &str,
    ) -> LeaveRecord {
        LeaveRecord {
            id: format!("{teacher_id}-{start}"),
            teacher_id: teacher_id.to_string(),
            teacher_name: "Test Teacher".to_string(),
            leave_type,
            start_date: date(start),
            end_date: date(end),
            start_time: None,
            end_time: None,
            reason: "test".to_string(),
            status,
            teacher_signature: None,
            director_signature: None,
            approved_date: None,
            created_at: "2024-06-01T08:00:00Z".parse::<DateTime<Utc>>().unwrap(),
        }
    }

    #[test]
    fn single_day_is_one_on_weekdays_zero_on_weekends() {
        // 2024-06-03 is a Monday.
        for offset in 0..5 {
            let d = date("2024-06-03") + chrono::Days::new(offset);
            assert_eq!(count_working_days(d, d), 1, "{d} should be a working day");
        }
        assert_eq!(count_working_days(date("2024-06-08"), date("2024-06-08")), 0);
        assert_eq!(count_working_days(date("2024-06-09"), date("2024-06-09")), 0);
    }

    #[test]
    fn working_days_over_one_week() {
        let mon = date("2024-06-03");
        assert_eq!(count_working_days(mon, date("2024-06-07")), 5); // Mon..Fri
        assert_eq!(count_working_days(mon, date("2024-06-09")), 5); // Mon..Sun
        assert_eq!(count_working_days(date("2024-06-08"), date("2024-06-09")), 0); // Sat..Sun
    }

    #[test]
    fn empty_range_counts_zero() {
        assert_eq!(count_working_days(date("2024-06-07"), date("2024-06-03")), 0);
    }

    #[test]
    fn same_day_record_contributes_one_leave_day() {
        let records = vec![record(
            "t1",
            LeaveType::Personal,
            LeaveStatus::Approved,
            "2024-06-03",
            "2024-06-03",
        )];
        let stats = calculate_stats("t1", &records, None);
        assert_eq!(stats.total_leave_days, 1);
    }

    #[test]
    fn two_day_sick_record_scenario() {
        let records = vec![record(
            "t1",
            LeaveType::Sick,
            LeaveStatus::Approved,
            "2024-06-03",
            "2024-06-04",
        )];
        let stats = calculate_stats("t1", &records, None);
        assert_eq!(stats.sick, 1);
        assert_eq!(stats.personal, 0);
        assert_eq!(stats.off_campus, 0);
        assert_eq!(stats.late, 0);
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.total_leave_days, 2);
    }

    #[test]
    fn pending_and_rejected_records_are_excluded() {
        let records = vec![
            record("t1", LeaveType::Sick, LeaveStatus::Pending, "2024-06-03", "2024-06-04"),
            record("t1", LeaveType::Personal, LeaveStatus::Rejected, "2024-06-05", "2024-06-05"),
        ];
        let stats = calculate_stats("t1", &records, None);
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.total_leave_days, 0);
        assert!(stats.raw.is_empty());
    }

    #[test]
    fn other_teachers_are_excluded() {
        let records = vec![record(
            "t2",
            LeaveType::Sick,
            LeaveStatus::Approved,
            "2024-06-03",
            "2024-06-04",
        )];
        let stats = calculate_stats("t1", &records, None);
        assert_eq!(stats.total_requests, 0);
    }

    #[test]
    fn date_range_boundaries_are_inclusive() {
        let records = vec![
            record("t1", LeaveType::Sick, LeaveStatus::Approved, "2024-06-01", "2024-06-01"),
            record("t1", LeaveType::Sick, LeaveStatus::Approved, "2024-06-30", "2024-06-30"),
            record("t1", LeaveType::Sick, LeaveStatus::Approved, "2024-07-01", "2024-07-01"),
        ];
        let range = DateRange {
            start: date("2024-06-01"),
            end: date("2024-06-30"),
        };
        let stats = calculate_stats("t1", &records, Some(&range));
        // Both boundary records included, July record excluded.
        assert_eq!(stats.total_requests, 2);
    }

    #[test]
    fn hour_based_types_contribute_zero_days() {
        let records = vec![
            record("t1", LeaveType::OffCampus, LeaveStatus::Approved, "2024-06-03", "2024-06-03"),
            record("t1", LeaveType::Late, LeaveStatus::Approved, "2024-06-04", "2024-06-04"),
        ];
        let stats = calculate_stats("t1", &records, None);
        assert_eq!(stats.off_campus, 1);
        assert_eq!(stats.late, 1);
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.total_leave_days, 0);
    }

    #[test]
    fn present_days_may_go_negative() {
        let records = vec![record(
            "t1",
            LeaveType::Sick,
            LeaveStatus::Approved,
            "2024-06-03",
            "2024-06-09", // spans a weekend: 7 leave days
        )];
        let stats = calculate_stats("t1", &records, None);
        assert_eq!(stats.total_leave_days, 7);
        // Report window of the same week has only 5 working days.
        assert_eq!(present_days(5, &stats), -2);
    }
}

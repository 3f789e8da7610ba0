use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{HrError, HrResult};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, CheckMethod};
use crate::model::location::CompanyLocation;
use crate::model::worker::Worker;
use crate::service::calendar::{MonthSpan, WorkCalendar};
use crate::service::penalty::PenaltyPolicy;

/// Fields written by a check-in.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInPlan {
    pub date: NaiveDate,
    pub check_in_time: NaiveTime,
    pub method: CheckMethod,
    pub location_id: Option<u64>,
    pub late_minutes: u32,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutPlan {
    pub check_out_time: NaiveTime,
    pub method: CheckMethod,
    pub work_hours: Decimal,
}

/// Derived fields of a manually entered record.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTimes {
    pub status: AttendanceStatus,
    pub late_minutes: u32,
    pub work_hours: Option<Decimal>,
}

pub fn late_minutes(check_in: NaiveTime, work_start: Option<NaiveTime>) -> u32 {
    match work_start {
        Some(start) if check_in > start => (check_in - start).num_minutes().max(0) as u32,
        _ => 0,
    }
}

/// Hours between check-in and check-out, to the nearest tenth.
pub fn work_hours(check_in: NaiveTime, check_out: NaiveTime) -> HrResult<Decimal> {
    if check_out < check_in {
        return Err(HrError::validation("check-out time cannot be before check-in time"));
    }
    let seconds = (check_out - check_in).num_seconds();
    let hours = Decimal::from(seconds) / Decimal::from(3600);
    Ok(hours.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
}

pub fn plan_check_in(
    existing: Option<&AttendanceRecord>,
    now: NaiveDateTime,
    method: CheckMethod,
    location: Option<&CompanyLocation>,
    policy: &PenaltyPolicy,
) -> HrResult<CheckInPlan> {
    if existing.is_some_and(|r| r.check_in_time.is_some()) {
        return Err(HrError::conflict("Already checked in today"));
    }

    let check_in_time = now.time();
    let late = late_minutes(check_in_time, location.and_then(|l| l.work_start_time));
    let status = if policy.is_late(late) {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    };

    Ok(CheckInPlan {
        date: now.date(),
        check_in_time,
        method,
        location_id: location.map(|l| l.id),
        late_minutes: late,
        status,
    })
}

pub fn plan_check_out(
    existing: Option<&AttendanceRecord>,
    now: NaiveDateTime,
    method: CheckMethod,
) -> HrResult<CheckOutPlan> {
    let (record, check_in) = match existing {
        Some(r) => match r.check_in_time {
            Some(t) => (r, t),
            None => return Err(HrError::not_found("No active check-in found for today")),
        },
        None => return Err(HrError::not_found("No active check-in found for today")),
    };
    if record.check_out_time.is_some() {
        return Err(HrError::conflict("Already checked out today"));
    }

    // A device clock slightly behind the check-in gives zero hours, not an error.
    let check_out_time = now.time().max(check_in);
    Ok(CheckOutPlan {
        check_out_time,
        method,
        work_hours: work_hours(check_in, check_out_time)?,
    })
}

/// Validates a manual entry and derives lateness and hours from its times.
/// Worked days take their status from the lateness rules.
pub fn derive_manual(
    status: AttendanceStatus,
    check_in: Option<NaiveTime>,
    check_out: Option<NaiveTime>,
    work_start: Option<NaiveTime>,
    policy: &PenaltyPolicy,
) -> HrResult<DerivedTimes> {
    match status {
        AttendanceStatus::Present | AttendanceStatus::Late => {
            let Some(check_in) = check_in else {
                if check_out.is_some() {
                    return Err(HrError::validation("check_out_time requires check_in_time"));
                }
                return Ok(DerivedTimes { status, late_minutes: 0, work_hours: None });
            };
            let late = late_minutes(check_in, work_start);
            let status = if policy.is_late(late) {
                AttendanceStatus::Late
            } else {
                AttendanceStatus::Present
            };
            let hours = check_out.map(|out| work_hours(check_in, out)).transpose()?;
            Ok(DerivedTimes { status, late_minutes: late, work_hours: hours })
        }
        AttendanceStatus::Absent | AttendanceStatus::Leave | AttendanceStatus::Holiday => {
            if check_in.is_some() || check_out.is_some() {
                return Err(HrError::validation(format!(
                    "a {status} day cannot carry check-in or check-out times"
                )));
            }
            Ok(DerivedTimes { status, late_minutes: 0, work_hours: None })
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct AttendanceSummary {
    pub worker_id: u64,
    pub worker_name: String,
    pub present_days: u32,
    /// Recorded absences plus implicit ones.
    pub absent_days: u32,
    pub implicit_absent_days: u32,
    pub late_days: u32,
    pub leave_days: u32,
    pub holiday_days: u32,
    #[schema(example = "172.5")]
    pub total_work_hours: Decimal,
    /// Monthly paid leave entitlement.
    pub paid_leave_allowance: u32,
    pub paid_leave_days: u32,
    pub unpaid_leave_days: u32,
    /// Late minutes of each late day, in date order.
    #[serde(skip)]
    pub late_minutes_by_day: Vec<u32>,
}

impl AttendanceSummary {
    pub fn work_days(&self) -> u32 {
        self.present_days + self.late_days
    }

    pub fn unpaid_absent_days(&self) -> u32 {
        self.absent_days + self.unpaid_leave_days
    }
}

/// Month summary for one worker. `records` may contain other workers and
/// other months; only the matching rows are counted.
pub fn summarize_worker(
    worker: &Worker,
    records: &[AttendanceRecord],
    span: &MonthSpan,
    calendar: &WorkCalendar,
    paid_leave_allowance: u32,
) -> AttendanceSummary {
    let mut own: Vec<&AttendanceRecord> = records
        .iter()
        .filter(|r| r.worker_id == worker.id && span.contains(r.date))
        .collect();
    own.sort_by_key(|r| r.date);

    let mut summary = AttendanceSummary {
        worker_id: worker.id,
        worker_name: worker.name.clone(),
        paid_leave_allowance,
        ..Default::default()
    };

    for record in &own {
        match record.status {
            AttendanceStatus::Present => summary.present_days += 1,
            AttendanceStatus::Late => {
                summary.late_days += 1;
                summary.late_minutes_by_day.push(record.late_minutes);
            }
            AttendanceStatus::Absent => summary.absent_days += 1,
            AttendanceStatus::Leave => summary.leave_days += 1,
            AttendanceStatus::Holiday => summary.holiday_days += 1,
        }
        if let Some(hours) = record.work_hours {
            summary.total_work_hours += hours;
        }
    }

    let recorded: HashSet<NaiveDate> = own.iter().map(|r| r.date).collect();
    summary.implicit_absent_days = calendar.implicit_absences(worker, span, &recorded).len() as u32;
    summary.absent_days += summary.implicit_absent_days;
    summary.holiday_days += calendar.unrecorded_holidays(span, &recorded);

    summary.paid_leave_days = summary.leave_days.min(paid_leave_allowance);
    summary.unpaid_leave_days = summary.leave_days - summary.paid_leave_days;
    summary
}

pub fn summarize_month(
    workers: &[Worker],
    records: &[AttendanceRecord],
    span: &MonthSpan,
    calendar: &WorkCalendar,
    paid_leave_allowance: u32,
) -> Vec<AttendanceSummary> {
    workers
        .iter()
        .map(|w| summarize_worker(w, records, span, calendar, paid_leave_allowance))
        .collect()
}

#[cfg(test)]
pub(crate) fn record(
    id: u64,
    worker_id: u64,
    date: NaiveDate,
    status: AttendanceStatus,
    late_minutes: u32,
    work_hours: Option<Decimal>,
) -> AttendanceRecord {
    AttendanceRecord {
        id,
        worker_id,
        date,
        status,
        check_in_time: None,
        check_out_time: None,
        check_in_method: None,
        check_out_method: None,
        location_id: None,
        work_hours,
        late_minutes,
        notes: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::calendar::test_worker;
    use crate::service::geo::test_location;
    use crate::service::penalty::tier;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        date(d).and_hms_opt(h, m, 0).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn lateness_is_measured_from_work_start() {
        assert_eq!(late_minutes(time(8, 25), Some(time(8, 0))), 25);
        assert_eq!(late_minutes(time(7, 50), Some(time(8, 0))), 0);
        assert_eq!(late_minutes(time(9, 0), None), 0);
    }

    #[test]
    fn work_hours_round_to_tenth() {
        assert_eq!(work_hours(time(8, 0), time(16, 20)).unwrap(), dec!(8.3));
        assert_eq!(work_hours(time(8, 0), time(8, 3)).unwrap(), dec!(0.1));
        assert!(work_hours(time(9, 0), time(8, 0)).is_err());
    }

    #[test]
    fn check_in_sets_late_status_from_policy() {
        let site = test_location(1, 0.0, 0.0, 100.0);
        let policy = PenaltyPolicy::from_rules(&[tier(1, 15, None, dec!(0.5))]);

        let on_time = plan_check_in(None, at(5, 8, 10), CheckMethod::Gps, Some(&site), &policy).unwrap();
        assert_eq!(on_time.status, AttendanceStatus::Present);
        assert_eq!(on_time.late_minutes, 10);
        assert_eq!(on_time.location_id, Some(1));

        let late = plan_check_in(None, at(5, 8, 40), CheckMethod::Gps, Some(&site), &policy).unwrap();
        assert_eq!(late.status, AttendanceStatus::Late);
        assert_eq!(late.late_minutes, 40);
    }

    #[test]
    fn second_check_in_conflicts() {
        let mut existing = record(1, 1, date(5), AttendanceStatus::Present, 0, None);
        existing.check_in_time = Some(time(8, 0));
        let err = plan_check_in(Some(&existing), at(5, 9, 0), CheckMethod::Manual, None, &PenaltyPolicy::default())
            .unwrap_err();
        assert!(matches!(err, HrError::Conflict(_)));
    }

    #[test]
    fn pre_entered_row_without_check_in_can_be_filled() {
        let existing = record(1, 1, date(5), AttendanceStatus::Absent, 0, None);
        let plan = plan_check_in(Some(&existing), at(5, 7, 55), CheckMethod::Gps, None, &PenaltyPolicy::default())
            .unwrap();
        assert_eq!(plan.status, AttendanceStatus::Present);
    }

    #[test]
    fn check_out_rules() {
        let err = plan_check_out(None, at(5, 17, 0), CheckMethod::Gps).unwrap_err();
        assert!(matches!(err, HrError::NotFound(_)));

        let mut open = record(1, 1, date(5), AttendanceStatus::Present, 0, None);
        open.check_in_time = Some(time(8, 0));
        let plan = plan_check_out(Some(&open), at(5, 16, 30), CheckMethod::Gps).unwrap();
        assert_eq!(plan.work_hours, dec!(8.5));

        open.check_out_time = Some(time(16, 30));
        let err = plan_check_out(Some(&open), at(5, 17, 0), CheckMethod::Gps).unwrap_err();
        assert!(matches!(err, HrError::Conflict(_)));
    }

    #[test]
    fn manual_entries_derive_fields() {
        let policy = PenaltyPolicy::default();
        let derived = derive_manual(
            AttendanceStatus::Present,
            Some(time(8, 30)),
            Some(time(17, 0)),
            Some(time(8, 0)),
            &policy,
        )
        .unwrap();
        assert_eq!(derived.status, AttendanceStatus::Late);
        assert_eq!(derived.late_minutes, 30);
        assert_eq!(derived.work_hours, Some(dec!(8.5)));

        assert!(derive_manual(AttendanceStatus::Leave, Some(time(8, 0)), None, None, &policy).is_err());
        assert!(derive_manual(AttendanceStatus::Present, None, Some(time(8, 0)), None, &policy).is_err());
    }

    #[test]
    fn summary_counts_statuses_implicit_absences_and_leave_cap() {
        let worker = test_worker(1, dec!(3000));
        let records = vec![
            record(1, 1, date(5), AttendanceStatus::Present, 0, Some(dec!(8))),
            record(2, 1, date(6), AttendanceStatus::Late, 20, Some(dec!(7.5))),
            record(3, 1, date(7), AttendanceStatus::Leave, 0, None),
            record(4, 1, date(8), AttendanceStatus::Leave, 0, None),
            record(5, 1, date(9), AttendanceStatus::Leave, 0, None),
            record(6, 1, date(10), AttendanceStatus::Absent, 0, None),
            // another worker and another month are ignored
            record(7, 2, date(5), AttendanceStatus::Absent, 0, None),
            record(8, 1, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(), AttendanceStatus::Absent, 0, None),
        ];
        // today = Jan 12: days 1..=11 are past; 1-4 and 11 have no rows
        let calendar = WorkCalendar::new(date(12), &[], &[]);
        let span = MonthSpan::new(1, 2026).unwrap();

        let s = summarize_worker(&worker, &records, &span, &calendar, 2);
        assert_eq!(s.present_days, 1);
        assert_eq!(s.late_days, 1);
        assert_eq!(s.work_days(), 2);
        assert_eq!(s.implicit_absent_days, 5);
        assert_eq!(s.absent_days, 6);
        assert_eq!(s.leave_days, 3);
        assert_eq!(s.paid_leave_days, 2);
        assert_eq!(s.unpaid_leave_days, 1);
        assert_eq!(s.unpaid_absent_days(), 7);
        assert_eq!(s.total_work_hours, dec!(15.5));
        assert_eq!(s.late_minutes_by_day, vec![20]);
    }
}

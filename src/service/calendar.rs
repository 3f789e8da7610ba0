use std::collections::HashSet;

use chrono::{Datelike, Months, NaiveDate, Weekday};

use crate::error::{HrError, HrResult};
use crate::model::holiday::PublicHoliday;
use crate::model::worker::Worker;

/// A calendar month, the unit of attendance summaries and payroll periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthSpan {
    pub month: u32,
    pub year: i32,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
}

impl MonthSpan {
    pub fn new(month: u32, year: i32) -> HrResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(HrError::validation("month must be between 1 and 12"));
        }
        let first_day = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| HrError::validation(format!("invalid year {year}")))?;
        let last_day = first_day
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .ok_or_else(|| HrError::validation(format!("invalid year {year}")))?;
        Ok(Self { month, year, first_day, last_day })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day && date <= self.last_day
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.first_day.iter_days().take_while(|d| *d <= self.last_day)
    }
}

pub fn next_month(month: u32, year: i32) -> (u32, i32) {
    if month >= 12 { (1, year.saturating_add(1)) } else { (month + 1, year) }
}

/// What makes a day without an attendance row an absence.
#[derive(Debug, Clone)]
pub struct WorkCalendar {
    pub today: NaiveDate,
    holidays: HashSet<NaiveDate>,
    rest_days: Vec<Weekday>,
}

impl WorkCalendar {
    pub fn new(today: NaiveDate, holidays: &[PublicHoliday], rest_days: &[Weekday]) -> Self {
        Self {
            today,
            holidays: holidays.iter().filter(|h| h.is_active).map(|h| h.date).collect(),
            rest_days: rest_days.to_vec(),
        }
    }

    pub fn is_public_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    pub fn is_rest_day(&self, date: NaiveDate) -> bool {
        self.rest_days.contains(&date.weekday())
    }

    /// Days of `span` the worker was expected to attend but has no row for:
    /// strictly before today, on or after hire date, not a holiday or rest day.
    pub fn implicit_absences(
        &self,
        worker: &Worker,
        span: &MonthSpan,
        recorded: &HashSet<NaiveDate>,
    ) -> Vec<NaiveDate> {
        span.days()
            .filter(|d| *d < self.today)
            .filter(|d| worker.hire_date.is_none_or(|hired| *d >= hired))
            .filter(|d| !recorded.contains(d))
            .filter(|d| !self.is_public_holiday(*d) && !self.is_rest_day(*d))
            .collect()
    }

    /// Unrecorded public holidays in the worked part of the month.
    pub fn unrecorded_holidays(&self, span: &MonthSpan, recorded: &HashSet<NaiveDate>) -> u32 {
        span.days()
            .filter(|d| *d < self.today && self.is_public_holiday(*d) && !recorded.contains(d))
            .count() as u32
    }
}

#[cfg(test)]
pub(crate) fn test_worker(id: u64, base_salary: rust_decimal::Decimal) -> Worker {
    Worker {
        id,
        name: format!("Worker {id}"),
        phone: None,
        base_salary,
        hire_date: None,
        is_active: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_bounds() {
        let feb = MonthSpan::new(2, 2028).unwrap();
        assert_eq!(feb.last_day, date(2028, 2, 29));
        assert_eq!(feb.days().count(), 29);
        assert!(MonthSpan::new(13, 2026).is_err());
        assert!(MonthSpan::new(0, 2026).is_err());
    }

    #[test]
    fn next_month_wraps_year() {
        assert_eq!(next_month(12, 2025), (1, 2026));
        assert_eq!(next_month(5, 2026), (6, 2026));
    }

    #[test]
    fn implicit_absences_skip_today_holidays_rest_days_and_pre_hire() {
        let holiday = PublicHoliday {
            id: 1,
            name: "Founding Day".into(),
            date: date(2026, 2, 22),
            is_active: true,
        };
        // 2026-02-20 is a Friday
        let calendar = WorkCalendar::new(date(2026, 2, 25), &[holiday], &[Weekday::Fri]);
        let mut worker = test_worker(1, dec!(3000));
        worker.hire_date = Some(date(2026, 2, 18));

        let span = MonthSpan::new(2, 2026).unwrap();
        let recorded: HashSet<_> = [date(2026, 2, 18), date(2026, 2, 19)].into_iter().collect();

        let absences = calendar.implicit_absences(&worker, &span, &recorded);
        assert_eq!(
            absences,
            vec![date(2026, 2, 21), date(2026, 2, 23), date(2026, 2, 24)]
        );
        assert_eq!(calendar.unrecorded_holidays(&span, &recorded), 1);
    }

    #[test]
    fn future_months_have_no_implicit_absences() {
        let calendar = WorkCalendar::new(date(2026, 1, 10), &[], &[]);
        let span = MonthSpan::new(3, 2026).unwrap();
        let absences = calendar.implicit_absences(&test_worker(1, dec!(1)), &span, &HashSet::new());
        assert!(absences.is_empty());
    }
}

//! Monthly payroll: calculation, approval and partial disbursement.
//!
//! ```text
//! (none|draft) --calculate--> calculated --approve--> approved
//!                  ^   |                                 |
//!                  +---+ recalculate          disburse (partial)
//!                                                        v
//!                              paid <--disburse-- partially_paid
//! ```
//!
//! Calculation is a pure function of the period's inputs, so recalculating
//! with unchanged data yields identical items, and approval re-runs it to
//! detect inputs that moved after the last calculation.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::PayrollConfig;
use crate::error::{HrError, HrResult};
use crate::model::advance::{AdvanceInstallment, AdvanceStatus, InstallmentStatus, SalaryAdvance};
use crate::model::adjustment::HrAdjustment;
use crate::model::attendance::AttendanceRecord;
use crate::model::payroll::{PayrollItem, PayrollPeriod, PayrollStatus};
use crate::model::vault::Vault;
use crate::model::worker::Worker;
use crate::service::adjustment::totals_for;
use crate::service::attendance::summarize_worker;
use crate::service::calendar::{MonthSpan, WorkCalendar};
use crate::service::money::{require_positive, round2};
use crate::service::penalty::PenaltyPolicy;

/// Everything a calculation reads. Slices may hold more rows than the
/// period needs; each step filters by worker and month.
#[derive(Debug, Clone, Copy)]
pub struct PayrollInputs<'a> {
    pub span: MonthSpan,
    pub calendar: &'a WorkCalendar,
    pub workers: &'a [Worker],
    pub attendance: &'a [AttendanceRecord],
    pub penalty: &'a PenaltyPolicy,
    pub adjustments: &'a [HrAdjustment],
    pub advances: &'a [SalaryAdvance],
    pub installments: &'a [AdvanceInstallment],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedItem {
    pub worker_id: u64,
    pub base_salary: Decimal,
    pub work_days: u32,
    pub absent_days: u32,
    pub leave_days: u32,
    pub paid_leave_allowance: u32,
    pub unpaid_absent_days: u32,
    pub lateness_deduction_days: Decimal,
    pub absence_deduction: Decimal,
    pub calculated_bonus: Decimal,
    pub manual_incentives: Decimal,
    pub advance_deduction: Decimal,
    pub net_salary: Decimal,
}

impl ComputedItem {
    pub fn matches(&self, stored: &PayrollItem) -> bool {
        self.worker_id == stored.worker_id
            && self.base_salary == stored.base_salary
            && self.work_days == stored.work_days
            && self.absent_days == stored.absent_days
            && self.leave_days == stored.leave_days
            && self.paid_leave_allowance == stored.paid_leave_allowance
            && self.unpaid_absent_days == stored.unpaid_absent_days
            && self.lateness_deduction_days == stored.lateness_deduction_days
            && self.absence_deduction == stored.absence_deduction
            && self.calculated_bonus == stored.calculated_bonus
            && self.manual_incentives == stored.manual_incentives
            && self.advance_deduction == stored.advance_deduction
            && self.net_salary == stored.net_salary
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PayrollTotals {
    pub total_salaries: Decimal,
    pub total_absence_deductions: Decimal,
    pub total_advances: Decimal,
    pub total_incentives: Decimal,
    pub net_total: Decimal,
}

impl PayrollTotals {
    pub fn from_items(items: &[ComputedItem]) -> Self {
        items.iter().fold(Self::default(), |mut t, item| {
            t.total_salaries += item.base_salary;
            t.total_absence_deductions += item.absence_deduction;
            t.total_advances += item.advance_deduction;
            t.total_incentives += item.calculated_bonus + item.manual_incentives;
            t.net_total += item.net_salary;
            t
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayrollRun {
    pub items: Vec<ComputedItem>,
    pub totals: PayrollTotals,
}

impl PayrollRun {
    /// True when `stored` no longer reflects what the inputs produce.
    pub fn differs_from(&self, stored: &[PayrollItem]) -> bool {
        self.items.len() != stored.len()
            || self
                .items
                .iter()
                .any(|item| !stored.iter().any(|s| item.matches(s)))
    }
}

/// Pending installments of active advances falling due in `span` or earlier.
/// Overdue ones (advance approved late, worker left out of a run) are
/// collected by the next approved period.
pub fn due_installments<'a>(
    span: &MonthSpan,
    advances: &'a [SalaryAdvance],
    installments: &'a [AdvanceInstallment],
) -> Vec<(&'a SalaryAdvance, &'a AdvanceInstallment)> {
    installments
        .iter()
        .filter(|i| i.status == InstallmentStatus::Pending && (i.year, i.month) <= (span.year, span.month))
        .filter_map(|i| {
            advances
                .iter()
                .find(|a| a.id == i.advance_id && a.status == AdvanceStatus::Active)
                .map(|a| (a, i))
        })
        .collect()
}

pub fn compute_item(worker: &Worker, inputs: &PayrollInputs<'_>, settings: &PayrollConfig) -> ComputedItem {
    let summary = summarize_worker(
        worker,
        inputs.attendance,
        &inputs.span,
        inputs.calendar,
        settings.paid_leave_days_per_month,
    );
    let lateness = inputs.penalty.evaluate(summary.late_minutes_by_day.iter().copied());

    let base_salary = worker.base_salary;
    let daily_rate = base_salary / settings.days_per_month;
    let unpaid_absent_days = summary.unpaid_absent_days();
    let deductible_days = Decimal::from(unpaid_absent_days) + lateness.deduction_days;
    let absence_deduction = round2(deductible_days * daily_rate).min(base_salary);

    let perfect = summary.work_days() > 0
        && unpaid_absent_days == 0
        && summary.late_days == 0;
    let calculated_bonus = if perfect {
        round2(settings.perfect_attendance_bonus)
    } else {
        Decimal::ZERO
    };

    let manual_incentives = totals_for(worker.id, &inputs.span, inputs.adjustments).net();

    let advance_deduction: Decimal = due_installments(&inputs.span, inputs.advances, inputs.installments)
        .into_iter()
        .filter(|(advance, _)| advance.worker_id == worker.id)
        .map(|(_, installment)| installment.amount)
        .sum();

    let net_salary = base_salary - absence_deduction + calculated_bonus + manual_incentives - advance_deduction;

    ComputedItem {
        worker_id: worker.id,
        base_salary,
        work_days: summary.work_days(),
        absent_days: summary.absent_days,
        leave_days: summary.leave_days,
        paid_leave_allowance: summary.paid_leave_days,
        unpaid_absent_days,
        lateness_deduction_days: lateness.deduction_days,
        absence_deduction,
        calculated_bonus,
        manual_incentives,
        advance_deduction,
        net_salary,
    }
}

/// Items for every active worker, ordered by worker id.
pub fn compute_payroll(inputs: &PayrollInputs<'_>, settings: &PayrollConfig) -> HrResult<PayrollRun> {
    if settings.days_per_month <= Decimal::ZERO {
        return Err(HrError::validation("days per month must be positive"));
    }

    let mut workers: Vec<&Worker> = inputs.workers.iter().filter(|w| w.is_active).collect();
    workers.sort_by_key(|w| w.id);

    let items: Vec<ComputedItem> = workers
        .into_iter()
        .map(|w| compute_item(w, inputs, settings))
        .collect();
    let totals = PayrollTotals::from_items(&items);
    Ok(PayrollRun { items, totals })
}

/// Calculation is only allowed before approval.
pub fn ensure_recalculable(existing: Option<&PayrollPeriod>) -> HrResult<()> {
    match existing {
        Some(period) if !period.status.is_open() => Err(HrError::conflict(format!(
            "Cannot recompute an approved period ({}/{} is {})",
            period.month, period.year, period.status
        ))),
        _ => Ok(()),
    }
}

/// Attendance and adjustments dated inside an approved (or later) period
/// are read-only. `period` is the period covering the date, if any.
pub fn ensure_editable(period: Option<&PayrollPeriod>) -> HrResult<()> {
    match period {
        Some(p) if !p.status.is_open() => Err(HrError::forbidden(format!(
            "Payroll for {}/{} is {}; its records can no longer change",
            p.month, p.year, p.status
        ))),
        _ => Ok(()),
    }
}

/// Fresh draft for a month that has never been calculated.
pub fn draft_period(span: &MonthSpan) -> PayrollPeriod {
    PayrollPeriod {
        id: 0,
        month: span.month,
        year: span.year,
        status: PayrollStatus::Draft,
        total_salaries: Decimal::ZERO,
        total_absence_deductions: Decimal::ZERO,
        total_advances: Decimal::ZERO,
        total_incentives: Decimal::ZERO,
        net_total: Decimal::ZERO,
        total_disbursed: Decimal::ZERO,
        calculated_at: None,
        approved_at: None,
        approved_by: None,
    }
}

/// State changes produced by approving a period, to be written in the same
/// transaction as the period itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settlement {
    pub advances: Vec<SalaryAdvance>,
    pub installments: Vec<AdvanceInstallment>,
    pub processed_adjustment_ids: Vec<u64>,
}

impl PayrollPeriod {
    pub fn apply_run(&mut self, run: &PayrollRun, now: NaiveDateTime) -> HrResult<()> {
        ensure_recalculable(Some(self))?;
        let t = &run.totals;
        self.total_salaries = t.total_salaries;
        self.total_absence_deductions = t.total_absence_deductions;
        self.total_advances = t.total_advances;
        self.total_incentives = t.total_incentives;
        self.net_total = t.net_total;
        self.total_disbursed = Decimal::ZERO;
        self.status = PayrollStatus::Calculated;
        self.calculated_at = Some(now);
        Ok(())
    }

    /// Approves a calculated period. `stored` are the persisted items and
    /// `inputs` the current data; if they disagree the period is stale and
    /// must be recalculated first.
    pub fn approve(
        &mut self,
        stored: &[PayrollItem],
        inputs: &PayrollInputs<'_>,
        settings: &PayrollConfig,
        approver_id: u64,
        now: NaiveDateTime,
    ) -> HrResult<Settlement> {
        match self.status {
            PayrollStatus::Calculated => {}
            PayrollStatus::Draft => {
                return Err(HrError::conflict("Payroll must be calculated before approval"));
            }
            PayrollStatus::Approved | PayrollStatus::PartiallyPaid | PayrollStatus::Paid => {
                return Err(HrError::conflict(format!("Payroll period is already {}", self.status)));
            }
        }
        if self.net_total < Decimal::ZERO {
            return Err(HrError::validation("Cannot approve a period with a negative net total"));
        }

        let run = compute_payroll(inputs, settings)?;
        if run.differs_from(stored) || run.totals.net_total != self.net_total {
            return Err(HrError::conflict(
                "Attendance, adjustments or advances changed since calculation; recalculate first",
            ));
        }

        let included: HashSet<u64> = run.items.iter().map(|i| i.worker_id).collect();
        let mut settlement = Settlement::default();

        for (advance, installment) in due_installments(&inputs.span, inputs.advances, inputs.installments) {
            if !included.contains(&advance.worker_id) {
                continue;
            }
            let idx = match settlement.advances.iter().position(|a| a.id == advance.id) {
                Some(idx) => idx,
                None => {
                    settlement.advances.push(advance.clone());
                    settlement.advances.len() - 1
                }
            };
            let mut installment = installment.clone();
            settlement.advances[idx].deduct(&mut installment)?;
            settlement.installments.push(installment);
        }

        settlement.processed_adjustment_ids = inputs
            .adjustments
            .iter()
            .filter(|a| !a.is_processed && included.contains(&a.worker_id) && inputs.span.contains(a.date))
            .map(|a| a.id)
            .collect();

        self.status = if self.net_total.is_zero() {
            PayrollStatus::Paid
        } else {
            PayrollStatus::Approved
        };
        self.approved_at = Some(now);
        self.approved_by = Some(approver_id);
        Ok(settlement)
    }

    /// Pays `amount` of the outstanding net total out of `vault`.
    pub fn disburse(&mut self, vault: &mut Vault, amount: Decimal) -> HrResult<()> {
        match self.status {
            PayrollStatus::Approved | PayrollStatus::PartiallyPaid => {}
            PayrollStatus::Paid => {
                return Err(HrError::validation("Payroll period is already fully paid"));
            }
            PayrollStatus::Draft | PayrollStatus::Calculated => {
                return Err(HrError::conflict("Payroll must be approved before disbursement"));
            }
        }
        require_positive(amount, "amount")?;
        let outstanding = self.outstanding();
        if amount > outstanding {
            return Err(HrError::validation(format!(
                "Amount {amount} exceeds the outstanding {outstanding}"
            )));
        }

        vault.debit(amount)?;

        self.total_disbursed += amount;
        self.status = if self.total_disbursed == self.net_total {
            PayrollStatus::Paid
        } else {
            PayrollStatus::PartiallyPaid
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::adjustment::AdjustmentType;
    use crate::model::attendance::AttendanceStatus;
    use crate::model::vault::test_vault;
    use crate::service::adjustment::adjustment;
    use crate::service::advance::{installment_input, pending_advance, persisted};
    use crate::service::attendance::record;
    use crate::service::calendar::test_worker;
    use crate::service::penalty::{grace, tier};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn now() -> NaiveDateTime {
        date(2, 2).and_hms_opt(9, 0, 0).unwrap()
    }

    fn settings() -> PayrollConfig {
        PayrollConfig {
            days_per_month: dec!(30),
            paid_leave_days_per_month: 1,
            perfect_attendance_bonus: dec!(100),
            rest_days: vec![],
        }
    }

    /// January fully recorded as present unless overridden.
    fn full_month(worker_id: u64, overrides: &[(u32, AttendanceStatus, u32)]) -> Vec<AttendanceRecord> {
        (1..=31)
            .map(|d| {
                let (status, late) = overrides
                    .iter()
                    .find(|(day, _, _)| *day == d)
                    .map(|(_, s, l)| (*s, *l))
                    .unwrap_or((AttendanceStatus::Present, 0));
                record(worker_id * 1000 + d as u64, worker_id, date(1, d), status, late, Some(dec!(8)))
            })
            .collect()
    }

    struct Fixture {
        calendar: WorkCalendar,
        workers: Vec<Worker>,
        attendance: Vec<AttendanceRecord>,
        penalty: PenaltyPolicy,
        adjustments: Vec<HrAdjustment>,
        advances: Vec<SalaryAdvance>,
        installments: Vec<AdvanceInstallment>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                calendar: WorkCalendar::new(date(2, 2), &[], &[]),
                workers: vec![test_worker(1, dec!(3000)), test_worker(2, dec!(4500))],
                attendance: [full_month(1, &[]), full_month(2, &[])].concat(),
                penalty: PenaltyPolicy::from_rules(&[tier(1, 15, None, dec!(0.5)), grace(2, 1)]),
                adjustments: vec![],
                advances: vec![],
                installments: vec![],
            }
        }

        fn inputs(&self) -> PayrollInputs<'_> {
            PayrollInputs {
                span: MonthSpan::new(1, 2026).unwrap(),
                calendar: &self.calendar,
                workers: &self.workers,
                attendance: &self.attendance,
                penalty: &self.penalty,
                adjustments: &self.adjustments,
                advances: &self.advances,
                installments: &self.installments,
            }
        }

        /// Active 1200/3 advance for worker 1 starting January, funded by a 5000 vault.
        fn with_advance(mut self) -> Self {
            let mut advance = pending_advance(7, 1, &installment_input(dec!(1200), 3, 1, 2026));
            let mut vault = test_vault(1, dec!(5000));
            let schedule = advance.approve(&mut vault, 9, now()).unwrap();
            self.installments = persisted(7, &schedule);
            self.advances = vec![advance];
            self
        }
    }

    fn stored(period_id: u64, run: &PayrollRun) -> Vec<PayrollItem> {
        run.items
            .iter()
            .enumerate()
            .map(|(n, i)| PayrollItem {
                id: n as u64 + 1,
                period_id,
                worker_id: i.worker_id,
                base_salary: i.base_salary,
                work_days: i.work_days,
                absent_days: i.absent_days,
                leave_days: i.leave_days,
                paid_leave_allowance: i.paid_leave_allowance,
                unpaid_absent_days: i.unpaid_absent_days,
                lateness_deduction_days: i.lateness_deduction_days,
                absence_deduction: i.absence_deduction,
                calculated_bonus: i.calculated_bonus,
                manual_incentives: i.manual_incentives,
                advance_deduction: i.advance_deduction,
                net_salary: i.net_salary,
            })
            .collect()
    }

    fn approved_period(net_total: Decimal) -> PayrollPeriod {
        let mut period = draft_period(&MonthSpan::new(1, 2026).unwrap());
        period.id = 1;
        period.net_total = net_total;
        period.status = PayrollStatus::Approved;
        period
    }

    #[test]
    fn perfect_month_earns_bonus() {
        let fx = Fixture::new();
        let run = compute_payroll(&fx.inputs(), &settings()).unwrap();
        let item = &run.items[0];
        assert_eq!(item.work_days, 31);
        assert_eq!(item.absence_deduction, Decimal::ZERO);
        assert_eq!(item.calculated_bonus, dec!(100));
        assert_eq!(item.net_salary, dec!(3100));
    }

    #[test]
    fn deductions_follow_absence_leave_and_lateness() {
        let mut fx = Fixture::new();
        fx.attendance = [
            full_month(
                1,
                &[
                    (3, AttendanceStatus::Absent, 0),
                    (4, AttendanceStatus::Leave, 0),
                    (5, AttendanceStatus::Leave, 0),
                    (6, AttendanceStatus::Late, 20), // forgiven by grace
                    (7, AttendanceStatus::Late, 40), // 0.5 day
                ],
            ),
            full_month(2, &[]),
        ]
        .concat();
        // Jan 31 has no row: implicit absence
        fx.attendance.retain(|r| !(r.worker_id == 1 && r.date == date(1, 31)));
        fx.adjustments = vec![
            adjustment(1, 1, AdjustmentType::Bonus, dec!(250), date(1, 10)),
            adjustment(2, 1, AdjustmentType::Penalty, dec!(40), date(1, 11)),
            adjustment(3, 1, AdjustmentType::Deduction, dec!(10), date(1, 12)),
        ];

        let run = compute_payroll(&fx.inputs(), &settings()).unwrap();
        let item = run.items.iter().find(|i| i.worker_id == 1).unwrap();

        assert_eq!(item.absent_days, 2);
        assert_eq!(item.leave_days, 2);
        assert_eq!(item.paid_leave_allowance, 1);
        assert_eq!(item.unpaid_absent_days, 3);
        assert_eq!(item.work_days, 27);
        assert_eq!(item.lateness_deduction_days, dec!(0.5));
        // (3 + 0.5) * 3000 / 30
        assert_eq!(item.absence_deduction, dec!(350.00));
        assert_eq!(item.calculated_bonus, Decimal::ZERO);
        assert_eq!(item.manual_incentives, dec!(200));
        assert_eq!(item.net_salary, dec!(2850));
        assert_eq!(
            item.net_salary,
            item.base_salary - item.absence_deduction + item.calculated_bonus + item.manual_incentives
                - item.advance_deduction
        );
    }

    #[test]
    fn absence_deduction_rounds_to_cents_and_never_exceeds_salary() {
        let mut fx = Fixture::new();
        fx.workers = vec![test_worker(1, dec!(1000))];
        fx.attendance = full_month(1, &[(2, AttendanceStatus::Absent, 0)]);
        let run = compute_payroll(&fx.inputs(), &settings()).unwrap();
        // 1000 / 30 = 33.333...
        assert_eq!(run.items[0].absence_deduction, dec!(33.33));

        fx.attendance.clear();
        let run = compute_payroll(&fx.inputs(), &settings()).unwrap();
        assert_eq!(run.items[0].absent_days, 31);
        assert_eq!(run.items[0].absence_deduction, dec!(1000));
        assert_eq!(run.items[0].net_salary, Decimal::ZERO);
    }

    #[test]
    fn totals_are_sums_of_items() {
        let fx = Fixture::new().with_advance();
        let run = compute_payroll(&fx.inputs(), &settings()).unwrap();
        let t = &run.totals;
        assert_eq!(t.total_salaries, dec!(7500));
        assert_eq!(t.total_advances, dec!(400));
        assert_eq!(t.total_incentives, dec!(200));
        assert_eq!(
            t.net_total,
            t.total_salaries - t.total_absence_deductions - t.total_advances + t.total_incentives
        );
    }

    #[test]
    fn inactive_workers_are_excluded() {
        let mut fx = Fixture::new();
        fx.workers[1].is_active = false;
        let run = compute_payroll(&fx.inputs(), &settings()).unwrap();
        assert_eq!(run.items.len(), 1);
    }

    #[test]
    fn recalculation_is_deterministic() {
        let fx = Fixture::new().with_advance();
        let first = compute_payroll(&fx.inputs(), &settings()).unwrap();
        let second = compute_payroll(&fx.inputs(), &settings()).unwrap();
        assert_eq!(first, second);
        assert!(!second.differs_from(&stored(1, &first)));
    }

    #[test]
    fn approved_periods_cannot_be_recomputed() {
        let fx = Fixture::new();
        let run = compute_payroll(&fx.inputs(), &settings()).unwrap();

        let mut period = approved_period(dec!(10000));
        let before = period.clone();
        assert!(matches!(ensure_recalculable(Some(&period)), Err(HrError::Conflict(_))));
        assert!(matches!(period.apply_run(&run, now()), Err(HrError::Conflict(_))));
        assert_eq!(period, before);

        let mut calculated = draft_period(&MonthSpan::new(1, 2026).unwrap());
        calculated.status = PayrollStatus::Calculated;
        assert!(ensure_recalculable(Some(&calculated)).is_ok());
        assert!(ensure_recalculable(None).is_ok());
    }

    #[test]
    fn records_of_approved_months_are_read_only() {
        let approved = approved_period(dec!(1));
        for status in [PayrollStatus::Approved, PayrollStatus::PartiallyPaid, PayrollStatus::Paid] {
            let mut closed = approved.clone();
            closed.status = status;
            assert!(matches!(ensure_editable(Some(&closed)), Err(HrError::Forbidden(_))));
        }

        let mut open = approved.clone();
        open.status = PayrollStatus::Calculated;
        assert!(ensure_editable(Some(&open)).is_ok());
        assert!(ensure_editable(None).is_ok());
    }

    #[test]
    fn approval_deducts_installments_and_processes_adjustments() {
        let mut fx = Fixture::new().with_advance();
        fx.adjustments = vec![
            adjustment(1, 1, AdjustmentType::Bonus, dec!(50), date(1, 20)),
            adjustment(2, 1, AdjustmentType::Bonus, dec!(50), date(2, 1)),
        ];
        let run = compute_payroll(&fx.inputs(), &settings()).unwrap();
        let mut period = draft_period(&run_span());
        period.id = 1;
        period.apply_run(&run, now()).unwrap();
        assert_eq!(period.status, PayrollStatus::Calculated);

        let settlement = period
            .approve(&stored(1, &run), &fx.inputs(), &settings(), 9, now())
            .unwrap();

        assert_eq!(period.status, PayrollStatus::Approved);
        assert_eq!(period.approved_by, Some(9));
        assert_eq!(settlement.advances.len(), 1);
        assert_eq!(settlement.advances[0].remaining_amount, dec!(800));
        assert_eq!(settlement.advances[0].status, AdvanceStatus::Active);
        assert_eq!(settlement.installments.len(), 1);
        assert_eq!(settlement.installments[0].status, InstallmentStatus::Deducted);
        assert_eq!((settlement.installments[0].month, settlement.installments[0].year), (1, 2026));
        assert_eq!(settlement.processed_adjustment_ids, vec![1]);

        // second approval is refused
        assert!(matches!(
            period.approve(&stored(1, &run), &fx.inputs(), &settings(), 9, now()),
            Err(HrError::Conflict(_))
        ));
    }

    #[test]
    fn overdue_installments_are_collected_by_the_next_approved_period() {
        // January closed before the advance was approved; only February and March run
        let fx = Fixture::new().with_advance();
        let mut advances = fx.advances.clone();
        let mut installments = fx.installments.clone();

        for (month, expected) in [(2, dec!(800)), (3, dec!(400))] {
            let inputs = PayrollInputs {
                span: MonthSpan::new(month, 2026).unwrap(),
                advances: &advances,
                installments: &installments,
                ..fx.inputs()
            };
            let run = compute_payroll(&inputs, &settings()).unwrap();
            assert_eq!(run.items[0].advance_deduction, expected);

            let mut period = draft_period(&inputs.span);
            period.id = month as u64;
            period.apply_run(&run, now()).unwrap();
            let settlement = period
                .approve(&stored(period.id, &run), &inputs, &settings(), 9, now())
                .unwrap();

            for updated in settlement.advances {
                if let Some(a) = advances.iter_mut().find(|a| a.id == updated.id) {
                    *a = updated;
                }
            }
            for updated in settlement.installments {
                if let Some(i) = installments.iter_mut().find(|i| i.id == updated.id) {
                    *i = updated;
                }
            }
        }

        assert_eq!(advances[0].status, AdvanceStatus::Completed);
        assert_eq!(advances[0].remaining_amount, Decimal::ZERO);
        assert!(installments.iter().all(|i| i.status == InstallmentStatus::Deducted));
    }

    #[test]
    fn installments_of_an_excluded_worker_roll_over() {
        let mut fx = Fixture::new().with_advance();
        fx.workers[0].is_active = false;
        let run = compute_payroll(&fx.inputs(), &settings()).unwrap();
        let mut period = draft_period(&run_span());
        period.apply_run(&run, now()).unwrap();
        let settlement = period
            .approve(&stored(1, &run), &fx.inputs(), &settings(), 9, now())
            .unwrap();
        assert!(settlement.installments.is_empty());

        let february = MonthSpan::new(2, 2026).unwrap();
        let due: Vec<_> = due_installments(&february, &fx.advances, &fx.installments)
            .into_iter()
            .map(|(_, i)| (i.month, i.year))
            .collect();
        assert_eq!(due, vec![(1, 2026), (2, 2026)]);
    }

    fn run_span() -> MonthSpan {
        MonthSpan::new(1, 2026).unwrap()
    }

    #[test]
    fn approval_detects_stale_calculation() {
        let mut fx = Fixture::new();
        let run = compute_payroll(&fx.inputs(), &settings()).unwrap();
        let mut period = draft_period(&run_span());
        period.apply_run(&run, now()).unwrap();

        fx.adjustments = vec![adjustment(1, 2, AdjustmentType::Penalty, dec!(30), date(1, 15))];
        let err = period
            .approve(&stored(1, &run), &fx.inputs(), &settings(), 9, now())
            .unwrap_err();
        assert!(matches!(err, HrError::Conflict(_)));
        assert_eq!(period.status, PayrollStatus::Calculated);
    }

    #[test]
    fn draft_cannot_be_approved() {
        let fx = Fixture::new();
        let mut period = draft_period(&run_span());
        let err = period.approve(&[], &fx.inputs(), &settings(), 9, now()).unwrap_err();
        assert!(matches!(err, HrError::Conflict(_)));
    }

    #[test]
    fn partial_disbursement_across_vaults() {
        let mut period = approved_period(dec!(10000));
        let mut vault_a = test_vault(1, dec!(7000));
        let mut vault_b = test_vault(2, dec!(4000));

        period.disburse(&mut vault_a, dec!(6000)).unwrap();
        assert_eq!(period.status, PayrollStatus::PartiallyPaid);
        assert_eq!(period.total_disbursed, dec!(6000));
        assert_eq!(vault_a.balance, dec!(1000));

        period.disburse(&mut vault_b, dec!(4000)).unwrap();
        assert_eq!(period.status, PayrollStatus::Paid);
        assert_eq!(period.total_disbursed, dec!(10000));

        let err = period.disburse(&mut vault_a, dec!(1)).unwrap_err();
        assert!(matches!(err, HrError::Validation(_)));
        assert_eq!(vault_a.balance, dec!(1000));
    }

    #[test]
    fn over_disbursement_is_a_validation_error() {
        let mut period = approved_period(dec!(10000));
        let mut vault = test_vault(1, dec!(50000));
        period.disburse(&mut vault, dec!(6000)).unwrap();

        let err = period.disburse(&mut vault, dec!(4000.01)).unwrap_err();
        assert!(matches!(err, HrError::Validation(_)));
        assert_eq!(period.total_disbursed, dec!(6000));
        assert_eq!(vault.balance, dec!(44000));
    }

    #[test]
    fn disbursement_needs_funds_and_approval() {
        let mut period = approved_period(dec!(10000));
        let mut poor = test_vault(1, dec!(100));
        let err = period.disburse(&mut poor, dec!(500)).unwrap_err();
        assert!(matches!(err, HrError::InsufficientFunds { .. }));
        assert_eq!(period.status, PayrollStatus::Approved);
        assert_eq!(period.total_disbursed, Decimal::ZERO);

        let mut calculated = approved_period(dec!(10000));
        calculated.status = PayrollStatus::Calculated;
        let mut rich = test_vault(2, dec!(99999));
        assert!(matches!(calculated.disburse(&mut rich, dec!(1)), Err(HrError::Conflict(_))));
    }

    #[test]
    fn zero_net_period_is_paid_on_approval() {
        let mut fx = Fixture::new();
        fx.workers.clear();
        let run = compute_payroll(&fx.inputs(), &settings()).unwrap();
        let mut period = draft_period(&run_span());
        period.apply_run(&run, now()).unwrap();
        period.approve(&[], &fx.inputs(), &settings(), 9, now()).unwrap();
        assert_eq!(period.status, PayrollStatus::Paid);
    }
}

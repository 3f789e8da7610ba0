//! Salary advance lifecycle.
//!
//! ```text
//! pending --approve(vault)--> active --last installment deducted--> completed
//!    |                          |
//!    +--------cancel------------+--> cancelled (active: remaining refunded)
//! ```

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{HrError, HrResult};
use crate::model::advance::{AdvanceInstallment, AdvanceStatus, AdvanceType, InstallmentStatus, SalaryAdvance};
use crate::model::payroll::PayrollPeriod;
use crate::model::vault::Vault;
use crate::service::calendar::{MonthSpan, next_month};
use crate::service::money::{require_positive, round2, truncate2};

pub const MAX_INSTALLMENTS: u32 = 60;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewAdvance {
    #[schema(example = 12)]
    pub worker_id: u64,

    pub advance_type: AdvanceType,

    #[schema(example = "1200.00")]
    pub total_amount: Decimal,

    /// Ignored for immediate advances.
    #[schema(example = 3)]
    pub installments_count: Option<u32>,

    #[schema(example = 1)]
    pub start_month: u32,

    #[schema(example = 2026)]
    pub start_year: i32,

    pub reason: Option<String>,
}

/// Amortization terms fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceTerms {
    pub installments_count: u32,
    pub installment_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledInstallment {
    pub month: u32,
    pub year: i32,
    pub amount: Decimal,
}

pub fn advance_terms(input: &NewAdvance) -> HrResult<AdvanceTerms> {
    require_positive(input.total_amount, "total_amount")?;
    if !(1..=12).contains(&input.start_month) {
        return Err(HrError::validation("start_month must be between 1 and 12"));
    }
    MonthSpan::new(input.start_month, input.start_year)?;

    let installments_count = match input.advance_type {
        AdvanceType::Immediate => 1,
        AdvanceType::Installment => match input.installments_count {
            Some(n) if (1..=MAX_INSTALLMENTS).contains(&n) => n,
            _ => {
                return Err(HrError::validation(format!(
                    "installments_count must be between 1 and {MAX_INSTALLMENTS}"
                )));
            }
        },
    };

    let (mut month, mut year) = (input.start_month, input.start_year);
    for _ in 1..installments_count {
        (month, year) = next_month(month, year);
    }
    MonthSpan::new(month, year)?;

    Ok(AdvanceTerms {
        installments_count,
        installment_amount: round2(input.total_amount / Decimal::from(installments_count)),
    })
}

/// Monthly schedule starting at `(start_month, start_year)`. Every installment
/// is the truncated share; the last one absorbs the residual so the sum is
/// exactly `total`.
pub fn installment_schedule(total: Decimal, count: u32, start_month: u32, start_year: i32) -> Vec<ScheduledInstallment> {
    let count = count.max(1);
    let share = truncate2(total / Decimal::from(count));

    let mut schedule = Vec::with_capacity(count as usize);
    let (mut month, mut year) = (start_month, start_year);
    for n in 1..=count {
        let amount = if n == count {
            total - share * Decimal::from(count - 1)
        } else {
            share
        };
        schedule.push(ScheduledInstallment { month, year, amount });
        (month, year) = next_month(month, year);
    }
    schedule
}

impl SalaryAdvance {
    /// The first installment must fall in a month whose payroll is still
    /// open. `start_period` is the period of `(start_month, start_year)`.
    pub fn ensure_start_open(&self, start_period: Option<&PayrollPeriod>) -> HrResult<()> {
        match start_period {
            Some(p) if !p.status.is_open() => Err(HrError::conflict(format!(
                "Payroll for {}/{} is already {}; advance {} needs a later start month",
                p.month, p.year, p.status, self.id
            ))),
            _ => Ok(()),
        }
    }

    /// Debits the funding vault and activates the advance. Returns the
    /// installment schedule to persist alongside.
    pub fn approve(
        &mut self,
        vault: &mut Vault,
        approver_id: u64,
        now: NaiveDateTime,
    ) -> HrResult<Vec<ScheduledInstallment>> {
        match self.status {
            AdvanceStatus::Pending => {}
            AdvanceStatus::Active | AdvanceStatus::Completed | AdvanceStatus::Cancelled => {
                return Err(HrError::conflict(format!(
                    "Advance {} is {} and cannot be approved",
                    self.id, self.status
                )));
            }
        }

        vault.debit(self.total_amount)?;

        self.status = AdvanceStatus::Active;
        self.vault_id = Some(vault.id);
        self.approved_by = Some(approver_id);
        self.approved_at = Some(now);
        self.remaining_amount = self.total_amount;

        Ok(installment_schedule(
            self.total_amount,
            self.installments_count,
            self.start_month,
            self.start_year,
        ))
    }

    /// Payroll deduction of one due installment.
    pub fn deduct(&mut self, installment: &mut AdvanceInstallment) -> HrResult<Decimal> {
        if installment.advance_id != self.id {
            return Err(HrError::validation(format!(
                "Installment {} does not belong to advance {}",
                installment.id, self.id
            )));
        }
        if self.status != AdvanceStatus::Active {
            return Err(HrError::conflict(format!(
                "Advance {} is {}; installments can only be deducted while active",
                self.id, self.status
            )));
        }
        match installment.status {
            InstallmentStatus::Pending => {}
            InstallmentStatus::Deducted | InstallmentStatus::Skipped => {
                return Err(HrError::conflict(format!(
                    "Installment {} is already {}",
                    installment.id, installment.status
                )));
            }
        }
        if installment.amount > self.remaining_amount {
            return Err(HrError::conflict(format!(
                "Installment {} exceeds the remaining balance of advance {}",
                installment.id, self.id
            )));
        }

        installment.status = InstallmentStatus::Deducted;
        self.remaining_amount -= installment.amount;
        if self.remaining_amount.is_zero() {
            self.status = AdvanceStatus::Completed;
        }
        Ok(installment.amount)
    }

    /// Cancels the advance. An active advance refunds its remaining amount to
    /// the vault that funded it and skips its pending installments; the refund
    /// is returned (zero for pending advances or a fully repaid balance).
    pub fn cancel(
        &mut self,
        installments: &mut [AdvanceInstallment],
        funding_vault: Option<&mut Vault>,
        now: NaiveDateTime,
    ) -> HrResult<Decimal> {
        let refund = match self.status {
            AdvanceStatus::Pending => Decimal::ZERO,
            AdvanceStatus::Active => self.remaining_amount,
            AdvanceStatus::Completed | AdvanceStatus::Cancelled => {
                return Err(HrError::conflict(format!(
                    "Advance {} is {} and cannot be cancelled",
                    self.id, self.status
                )));
            }
        };

        if refund > Decimal::ZERO {
            let vault = funding_vault.ok_or_else(|| {
                HrError::validation(format!("Advance {} has no funding vault to refund", self.id))
            })?;
            if Some(vault.id) != self.vault_id {
                return Err(HrError::validation(format!(
                    "Refund must go to vault {:?}, the vault that funded advance {}",
                    self.vault_id, self.id
                )));
            }
            vault.credit(refund)?;
        }

        for installment in installments
            .iter_mut()
            .filter(|i| i.advance_id == self.id && i.status == InstallmentStatus::Pending)
        {
            installment.status = InstallmentStatus::Skipped;
        }

        self.status = AdvanceStatus::Cancelled;
        self.cancelled_at = Some(now);
        Ok(refund)
    }
}

#[cfg(test)]
pub(crate) fn pending_advance(id: u64, worker_id: u64, input: &NewAdvance) -> SalaryAdvance {
    let terms = advance_terms(input).unwrap();
    SalaryAdvance {
        id,
        worker_id,
        advance_type: input.advance_type,
        total_amount: input.total_amount,
        installments_count: terms.installments_count,
        installment_amount: terms.installment_amount,
        remaining_amount: input.total_amount,
        start_month: input.start_month,
        start_year: input.start_year,
        status: AdvanceStatus::Pending,
        reason: input.reason.clone(),
        created_by: 1,
        approved_by: None,
        vault_id: None,
        approved_at: None,
        cancelled_at: None,
    }
}

#[cfg(test)]
pub(crate) fn persisted(advance_id: u64, schedule: &[ScheduledInstallment]) -> Vec<AdvanceInstallment> {
    schedule
        .iter()
        .enumerate()
        .map(|(i, s)| AdvanceInstallment {
            id: advance_id * 100 + i as u64 + 1,
            advance_id,
            month: s.month,
            year: s.year,
            amount: s.amount,
            status: InstallmentStatus::Pending,
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn installment_input(total: Decimal, count: u32, start_month: u32, start_year: i32) -> NewAdvance {
    NewAdvance {
        worker_id: 12,
        advance_type: AdvanceType::Installment,
        total_amount: total,
        installments_count: Some(count),
        start_month,
        start_year,
        reason: Some("family expenses".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::payroll::PayrollStatus;
    use crate::model::vault::test_vault;
    use crate::service::payroll::draft_period;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 12, 20).unwrap().and_hms_opt(10, 0, 0).unwrap()
    }

    #[test]
    fn terms_for_even_split() {
        let terms = advance_terms(&installment_input(dec!(1200), 3, 1, 2026)).unwrap();
        assert_eq!(terms.installments_count, 3);
        assert_eq!(terms.installment_amount, dec!(400.00));
    }

    #[test]
    fn immediate_advance_is_one_installment() {
        let mut input = installment_input(dec!(750), 6, 4, 2026);
        input.advance_type = AdvanceType::Immediate;
        let terms = advance_terms(&input).unwrap();
        assert_eq!(terms.installments_count, 1);
        assert_eq!(terms.installment_amount, dec!(750));
    }

    #[test]
    fn invalid_terms_are_rejected() {
        assert!(advance_terms(&installment_input(dec!(0), 3, 1, 2026)).is_err());
        assert!(advance_terms(&installment_input(dec!(100), 0, 1, 2026)).is_err());
        assert!(advance_terms(&installment_input(dec!(100), 2, 13, 2026)).is_err());
    }

    #[test]
    fn start_year_must_be_a_real_calendar_year() {
        let err = advance_terms(&installment_input(dec!(100), 2, 12, i32::MAX)).unwrap_err();
        assert!(matches!(err, HrError::Validation(_)));
        assert!(matches!(
            advance_terms(&installment_input(dec!(100), 1, 1, i32::MIN)),
            Err(HrError::Validation(_))
        ));
    }

    #[test]
    fn start_month_of_a_closed_payroll_is_refused() {
        let advance = pending_advance(1, 12, &installment_input(dec!(1200), 3, 1, 2026));
        let mut period = draft_period(&MonthSpan::new(1, 2026).unwrap());

        assert!(advance.ensure_start_open(None).is_ok());
        assert!(advance.ensure_start_open(Some(&period)).is_ok());
        period.status = PayrollStatus::Calculated;
        assert!(advance.ensure_start_open(Some(&period)).is_ok());

        for status in [PayrollStatus::Approved, PayrollStatus::PartiallyPaid, PayrollStatus::Paid] {
            period.status = status;
            assert!(matches!(advance.ensure_start_open(Some(&period)), Err(HrError::Conflict(_))));
        }
    }

    #[test]
    fn schedule_final_installment_absorbs_residual() {
        let schedule = installment_schedule(dec!(200), 3, 11, 2025);
        let amounts: Vec<_> = schedule.iter().map(|s| s.amount).collect();
        assert_eq!(amounts, vec![dec!(66.66), dec!(66.66), dec!(66.68)]);
        assert_eq!(amounts.iter().copied().sum::<Decimal>(), dec!(200));

        let months: Vec<_> = schedule.iter().map(|s| (s.month, s.year)).collect();
        assert_eq!(months, vec![(11, 2025), (12, 2025), (1, 2026)]);
    }

    #[test]
    fn tiny_totals_never_schedule_negative_amounts() {
        let schedule = installment_schedule(dec!(0.05), 10, 1, 2026);
        assert!(schedule.iter().all(|s| s.amount >= Decimal::ZERO));
        assert_eq!(schedule.iter().map(|s| s.amount).sum::<Decimal>(), dec!(0.05));
    }

    #[test]
    fn lifecycle_create_approve_deduct() {
        let mut advance = pending_advance(1, 12, &installment_input(dec!(1200), 3, 1, 2026));
        let mut vault = test_vault(5, dec!(5000));

        let schedule = advance.approve(&mut vault, 99, now()).unwrap();
        assert_eq!(vault.balance, dec!(3800));
        assert_eq!(advance.status, AdvanceStatus::Active);
        assert_eq!(advance.vault_id, Some(5));
        assert_eq!(schedule.len(), 3);
        assert_eq!(
            schedule.iter().map(|s| (s.month, s.year)).collect::<Vec<_>>(),
            vec![(1, 2026), (2, 2026), (3, 2026)]
        );

        let mut installments = persisted(1, &schedule);
        assert_eq!(advance.deduct(&mut installments[0]).unwrap(), dec!(400));
        assert_eq!(advance.remaining_amount, dec!(800));
        assert_eq!(advance.status, AdvanceStatus::Active);

        advance.deduct(&mut installments[1]).unwrap();
        advance.deduct(&mut installments[2]).unwrap();
        assert_eq!(advance.remaining_amount, Decimal::ZERO);
        assert_eq!(advance.status, AdvanceStatus::Completed);
    }

    #[test]
    fn approval_without_funds_changes_nothing() {
        let mut advance = pending_advance(1, 12, &installment_input(dec!(1200), 3, 1, 2026));
        let mut vault = test_vault(5, dec!(1000));

        let err = advance.approve(&mut vault, 99, now()).unwrap_err();
        assert!(matches!(err, HrError::InsufficientFunds { .. }));
        assert_eq!(vault.balance, dec!(1000));
        assert_eq!(advance.status, AdvanceStatus::Pending);
        assert!(advance.vault_id.is_none());
    }

    #[test]
    fn approval_is_one_way() {
        let mut advance = pending_advance(1, 12, &installment_input(dec!(100), 1, 1, 2026));
        let mut vault = test_vault(5, dec!(1000));
        advance.approve(&mut vault, 99, now()).unwrap();
        assert!(matches!(advance.approve(&mut vault, 99, now()), Err(HrError::Conflict(_))));
        assert_eq!(vault.balance, dec!(900));
    }

    #[test]
    fn deducting_twice_conflicts() {
        let mut advance = pending_advance(1, 12, &installment_input(dec!(1200), 3, 1, 2026));
        let mut vault = test_vault(5, dec!(5000));
        let mut installments = persisted(1, &advance.approve(&mut vault, 99, now()).unwrap());

        advance.deduct(&mut installments[0]).unwrap();
        assert!(matches!(advance.deduct(&mut installments[0]), Err(HrError::Conflict(_))));
        assert_eq!(advance.remaining_amount, dec!(800));
    }

    #[test]
    fn cancelling_active_advance_refunds_remaining() {
        let mut advance = pending_advance(1, 12, &installment_input(dec!(1200), 3, 1, 2026));
        let mut vault = test_vault(5, dec!(5000));
        let mut installments = persisted(1, &advance.approve(&mut vault, 99, now()).unwrap());
        advance.deduct(&mut installments[0]).unwrap();
        assert_eq!(advance.remaining_amount, dec!(800));

        let refund = advance.cancel(&mut installments, Some(&mut vault), now()).unwrap();
        assert_eq!(refund, dec!(800));
        assert_eq!(vault.balance, dec!(4600));
        assert_eq!(advance.status, AdvanceStatus::Cancelled);
        assert_eq!(installments[0].status, InstallmentStatus::Deducted);
        assert!(installments[1..].iter().all(|i| i.status == InstallmentStatus::Skipped));
    }

    #[test]
    fn cancelling_pending_advance_moves_no_cash() {
        let mut advance = pending_advance(1, 12, &installment_input(dec!(1200), 3, 1, 2026));
        let refund = advance.cancel(&mut [], None, now()).unwrap();
        assert_eq!(refund, Decimal::ZERO);
        assert_eq!(advance.status, AdvanceStatus::Cancelled);
        assert!(matches!(advance.cancel(&mut [], None, now()), Err(HrError::Conflict(_))));
    }

    #[test]
    fn refund_goes_only_to_funding_vault() {
        let mut advance = pending_advance(1, 12, &installment_input(dec!(300), 3, 1, 2026));
        let mut funding = test_vault(5, dec!(1000));
        advance.approve(&mut funding, 99, now()).unwrap();

        let mut other = test_vault(6, dec!(0));
        let err = advance.cancel(&mut [], Some(&mut other), now()).unwrap_err();
        assert!(matches!(err, HrError::Validation(_)));
        assert_eq!(other.balance, Decimal::ZERO);
        assert_eq!(advance.status, AdvanceStatus::Active);
    }
}

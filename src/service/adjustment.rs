use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{HrError, HrResult};
use crate::model::adjustment::{AdjustmentType, HrAdjustment};
use crate::service::calendar::MonthSpan;
use crate::service::money::require_positive;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewAdjustment {
    #[schema(example = 12)]
    pub worker_id: u64,

    pub adjustment_type: AdjustmentType,

    #[schema(example = "150.00")]
    pub amount: Decimal,

    pub reason: Option<String>,

    #[schema(example = "2026-01-14", value_type = String, format = "date")]
    pub date: NaiveDate,
}

pub fn validate_new(input: &NewAdjustment) -> HrResult<()> {
    require_positive(input.amount, "amount")?;
    if input.reason.as_deref().is_some_and(|r| r.len() > 500) {
        return Err(HrError::validation("reason is limited to 500 characters"));
    }
    Ok(())
}

/// Processed entries are history and may not be edited or removed.
pub fn ensure_unprocessed(adjustment: &HrAdjustment) -> HrResult<()> {
    if adjustment.is_processed {
        return Err(HrError::conflict(format!(
            "Adjustment {} was settled by payroll and can no longer change",
            adjustment.id
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdjustmentTotals {
    pub bonuses: Decimal,
    pub deductions: Decimal,
    pub penalties: Decimal,
}

impl AdjustmentTotals {
    /// What the entries add to (or take from) net salary.
    pub fn net(&self) -> Decimal {
        self.bonuses - self.deductions - self.penalties
    }
}

/// Unprocessed entries of `worker_id` dated inside `span`.
pub fn totals_for(worker_id: u64, span: &MonthSpan, adjustments: &[HrAdjustment]) -> AdjustmentTotals {
    adjustments
        .iter()
        .filter(|a| a.worker_id == worker_id && !a.is_processed && span.contains(a.date))
        .fold(AdjustmentTotals::default(), |mut totals, a| {
            match a.adjustment_type {
                AdjustmentType::Bonus => totals.bonuses += a.amount,
                AdjustmentType::Deduction => totals.deductions += a.amount,
                AdjustmentType::Penalty => totals.penalties += a.amount,
            }
            totals
        })
}

#[cfg(test)]
pub(crate) fn adjustment(
    id: u64,
    worker_id: u64,
    adjustment_type: AdjustmentType,
    amount: Decimal,
    date: NaiveDate,
) -> HrAdjustment {
    HrAdjustment {
        id,
        worker_id,
        adjustment_type,
        amount,
        reason: None,
        date,
        is_processed: false,
        period_id: None,
        created_by: 1,
    }
}

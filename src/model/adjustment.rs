use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdjustmentType {
    Bonus,
    Deduction,
    Penalty,
}

sql_text_enum!(AdjustmentType);

/// Ad-hoc payroll entry. Frozen once `is_processed` is set by payroll approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct HrAdjustment {
    pub id: u64,
    pub worker_id: u64,
    pub adjustment_type: AdjustmentType,

    #[schema(example = "150.00")]
    pub amount: Decimal,

    pub reason: Option<String>,

    #[schema(example = "2026-01-14", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub is_processed: bool,

    /// Payroll period that consumed this entry.
    pub period_id: Option<u64>,

    pub created_by: u64,
}

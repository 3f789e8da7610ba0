use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PayrollStatus {
    Draft,
    Calculated,
    Approved,
    PartiallyPaid,
    Paid,
}

sql_text_enum!(PayrollStatus);

impl PayrollStatus {
    /// Items may still be replaced by a new calculation.
    pub fn is_open(self) -> bool {
        match self {
            PayrollStatus::Draft | PayrollStatus::Calculated => true,
            PayrollStatus::Approved | PayrollStatus::PartiallyPaid | PayrollStatus::Paid => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PayrollPeriod {
    pub id: u64,

    #[schema(example = 1)]
    pub month: u32,

    #[schema(example = 2026)]
    pub year: i32,

    pub status: PayrollStatus,
    pub total_salaries: Decimal,
    pub total_absence_deductions: Decimal,
    pub total_advances: Decimal,
    pub total_incentives: Decimal,
    pub net_total: Decimal,
    pub total_disbursed: Decimal,

    #[schema(value_type = Option<String>, format = DateTime)]
    pub calculated_at: Option<NaiveDateTime>,

    #[schema(value_type = Option<String>, format = DateTime)]
    pub approved_at: Option<NaiveDateTime>,

    pub approved_by: Option<u64>,
}

impl PayrollPeriod {
    /// Amount still owed to workers for this period.
    pub fn outstanding(&self) -> Decimal {
        self.net_total - self.total_disbursed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PayrollItem {
    pub id: u64,
    pub period_id: u64,
    pub worker_id: u64,
    pub base_salary: Decimal,
    pub work_days: u32,
    pub absent_days: u32,
    pub leave_days: u32,
    /// Paid leave days consumed against the monthly entitlement.
    pub paid_leave_allowance: u32,
    pub unpaid_absent_days: u32,
    pub lateness_deduction_days: Decimal,
    pub absence_deduction: Decimal,
    pub calculated_bonus: Decimal,
    pub manual_incentives: Decimal,
    pub advance_deduction: Decimal,
    pub net_salary: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PayrollDisbursement {
    pub id: u64,
    pub period_id: u64,
    pub vault_id: u64,
    pub amount: Decimal,
    pub created_by: u64,

    #[schema(value_type = String, format = DateTime)]
    pub created_at: NaiveDateTime,
}

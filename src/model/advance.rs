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
pub enum AdvanceType {
    /// Repaid in full from the next payroll.
    Immediate,
    Installment,
}

sql_text_enum!(AdvanceType);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdvanceStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

sql_text_enum!(AdvanceStatus);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    Deducted,
    Skipped,
}

sql_text_enum!(InstallmentStatus);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct SalaryAdvance {
    pub id: u64,
    pub worker_id: u64,
    pub advance_type: AdvanceType,

    #[schema(example = "1200.00")]
    pub total_amount: Decimal,

    #[schema(example = 3)]
    pub installments_count: u32,

    #[schema(example = "400.00")]
    pub installment_amount: Decimal,

    #[schema(example = "800.00")]
    pub remaining_amount: Decimal,

    #[schema(example = 1)]
    pub start_month: u32,

    #[schema(example = 2026)]
    pub start_year: i32,

    pub status: AdvanceStatus,
    pub reason: Option<String>,
    pub created_by: u64,
    pub approved_by: Option<u64>,

    /// Vault that funded the advance; refunds go back here.
    pub vault_id: Option<u64>,

    #[schema(value_type = Option<String>, format = DateTime)]
    pub approved_at: Option<NaiveDateTime>,

    #[schema(value_type = Option<String>, format = DateTime)]
    pub cancelled_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AdvanceInstallment {
    pub id: u64,
    pub advance_id: u64,
    pub month: u32,
    pub year: i32,
    pub amount: Decimal,
    pub status: InstallmentStatus,
}

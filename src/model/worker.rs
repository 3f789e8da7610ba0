use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Cleaning staff member as kept by the workers module; payroll only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Worker {
    pub id: u64,

    #[schema(example = "Ahmed Ali")]
    pub name: String,

    pub phone: Option<String>,

    #[schema(example = "3000.00")]
    pub base_salary: Decimal,

    #[schema(example = "2025-03-01", value_type = Option<String>, format = "date")]
    pub hire_date: Option<NaiveDate>,

    pub is_active: bool,
}

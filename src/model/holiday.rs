use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PublicHoliday {
    pub id: u64,

    #[schema(example = "National Day")]
    pub name: String,

    #[schema(example = "2026-09-23", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub is_active: bool,
}

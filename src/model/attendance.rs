use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Leave,
    Holiday,
}

sql_text_enum!(AttendanceStatus);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckMethod {
    /// Device coordinates checked against company locations.
    Gps,
    /// Entered by a supervisor or HR on the worker's behalf.
    Manual,
}

sql_text_enum!(CheckMethod);

/// One worker, one calendar day. `(worker_id, date)` is unique in the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 12)]
    pub worker_id: u64,

    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub status: AttendanceStatus,

    #[schema(example = "08:12:00", value_type = Option<String>)]
    pub check_in_time: Option<NaiveTime>,

    #[schema(example = "16:40:00", value_type = Option<String>)]
    pub check_out_time: Option<NaiveTime>,

    pub check_in_method: Option<CheckMethod>,

    pub check_out_method: Option<CheckMethod>,

    /// Company location matched at check-in.
    pub location_id: Option<u64>,

    #[schema(example = "8.5")]
    pub work_hours: Option<Decimal>,

    #[schema(example = 12)]
    pub late_minutes: u32,

    pub notes: Option<String>,
}

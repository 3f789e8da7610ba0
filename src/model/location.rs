use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Head office",
        "name_ar": "المكتب الرئيسي",
        "latitude": 24.7136,
        "longitude": 46.6753,
        "radius_meters": 100.0,
        "work_start_time": "08:00:00",
        "is_active": true
    })
)]
pub struct CompanyLocation {
    pub id: u64,
    pub name: String,
    pub name_ar: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,

    #[schema(example = "08:00:00", value_type = Option<String>)]
    pub work_start_time: Option<NaiveTime>,

    pub is_active: bool,
}

/// Coordinates as acquired by the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPosition {
    #[schema(example = 24.7136)]
    pub latitude: f64,

    #[schema(example = 46.6753)]
    pub longitude: f64,

    /// Reported accuracy radius in meters.
    #[schema(example = 25.0)]
    pub accuracy: Option<f64>,
}

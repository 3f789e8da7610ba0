use actix_web::HttpResponse;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlConnection;
use utoipa::{IntoParams, ToSchema};

use crate::error::{HrError, HrResult};
use crate::repo;
use crate::service::payroll::ensure_editable;

pub mod adjustment;
pub mod advance;
pub mod attendance;
pub mod holiday;
pub mod location;
pub mod payroll;
pub mod penalty_rule;
pub mod vault;

/// Success envelope; failures are rendered by `HrError`.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse {
        success: true,
        data: Some(data),
        message: None,
    })
}

pub fn ok_with<T: Serialize>(data: T, message: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse {
        success: true,
        data: Some(data),
        message: Some(message.into()),
    })
}

pub fn created<T: Serialize>(data: T, message: impl Into<String>) -> HttpResponse {
    HttpResponse::Created().json(ApiResponse {
        success: true,
        data: Some(data),
        message: Some(message.into()),
    })
}

pub fn done(message: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::<()> {
        success: true,
        data: None,
        message: Some(message.into()),
    })
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 20)]
    pub per_page: Option<u32>,
}

impl PageQuery {
    /// `(page, per_page, offset)` with page ≥ 1 and per_page in 1..=100.
    pub fn bounds(&self) -> (u32, u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        (page, per_page, page.saturating_sub(1).saturating_mul(per_page))
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ActiveQuery {
    /// Include deactivated rows.
    #[serde(default)]
    pub include_inactive: bool,
}

/// Company-local wall clock; attendance dates and times use it.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Forbids writes dated inside an approved payroll month.
pub async fn ensure_date_editable(conn: &mut MySqlConnection, date: NaiveDate) -> HrResult<()> {
    let period = repo::payroll::share_month(&mut *conn, date.month(), date.year()).await?;
    ensure_editable(period.as_ref())
}

/// Turns a duplicate-key failure into a `Conflict` carrying `message`.
pub fn conflict_on_duplicate(err: sqlx::Error, message: &str) -> HrError {
    let err = HrError::from(err);
    if err.is_unique_violation() {
        HrError::conflict(message)
    } else {
        err
    }
}

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

use crate::api::{ActiveQuery, conflict_on_duplicate, created, done, ok};
use crate::auth::auth::AuthUser;
use crate::error::HrError;
use crate::model::holiday::PublicHoliday;
use crate::repo;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateHoliday {
    #[schema(example = "National Day")]
    pub name: String,

    #[schema(example = "2026-09-23", value_type = String, format = "date")]
    pub date: NaiveDate,
}

#[utoipa::path(
    get,
    path = "/api/holidays",
    params(ActiveQuery),
    responses((status = 200, description = "Public holidays by date", body = [PublicHoliday])),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ActiveQuery>,
) -> Result<HttpResponse, HrError> {
    let holidays = repo::holiday::list(pool.get_ref(), !query.include_inactive).await?;
    Ok(ok(holidays))
}

#[utoipa::path(
    post,
    path = "/api/holidays",
    request_body = CreateHoliday,
    responses(
        (status = 201, description = "Holiday created", body = PublicHoliday),
        (status = 400, description = "Name is required"),
        (status = 409, description = "A holiday already exists on that date")
    ),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn create_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateHoliday>,
) -> Result<HttpResponse, HrError> {
    auth.require_hr_or_admin()?;
    let input = payload.into_inner();
    let name = input.name.trim();
    if name.is_empty() {
        return Err(HrError::validation("name is required"));
    }

    let id = repo::holiday::insert(pool.get_ref(), name, input.date)
        .await
        .map_err(|e| conflict_on_duplicate(e, "A holiday already exists on that date"))?;
    info!(holiday_id = id, date = %input.date, user_id = auth.user_id, "Public holiday created");

    let holiday = PublicHoliday {
        id,
        name: name.to_string(),
        date: input.date,
        is_active: true,
    };
    Ok(created(holiday, "Holiday created"))
}

#[utoipa::path(
    delete,
    path = "/api/holidays/{id}",
    params(("id", description = "Holiday ID")),
    responses(
        (status = 200, description = "Holiday deactivated"),
        (status = 404, description = "Holiday not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn deactivate_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, HrError> {
    auth.require_hr_or_admin()?;
    let holiday_id = path.into_inner();

    if repo::holiday::deactivate(pool.get_ref(), holiday_id).await? == 0 {
        return Err(HrError::not_found("Holiday not found"));
    }
    info!(holiday_id, user_id = auth.user_id, "Public holiday deactivated");
    Ok(done("Holiday deactivated"))
}

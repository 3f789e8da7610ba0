use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use sqlx::{MySqlConnection, MySqlPool};
use tracing::{error, info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::api::{PageQuery, Page, conflict_on_duplicate, created, done, ensure_date_editable, now, ok};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::{HrError, HrResult};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, CheckMethod};
use crate::model::location::{CompanyLocation, GeoPosition};
use crate::repo;
use crate::repo::attendance::AttendanceFilter;
use crate::service::attendance::{
    AttendanceSummary, derive_manual, plan_check_in, plan_check_out, summarize_month,
};
use crate::service::calendar::{MonthSpan, WorkCalendar};
use crate::service::geo::{nearest_active, validate_position, validate_proximity};
use crate::service::penalty::PenaltyPolicy;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckRequest {
    /// Defaults to `gps` when a position is sent, otherwise `manual`.
    pub method: Option<CheckMethod>,
    pub position: Option<GeoPosition>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAttendance {
    #[schema(example = 12)]
    pub worker_id: u64,

    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub status: AttendanceStatus,

    #[schema(example = "08:10:00", value_type = Option<String>)]
    pub check_in_time: Option<NaiveTime>,

    #[schema(example = "16:30:00", value_type = Option<String>)]
    pub check_out_time: Option<NaiveTime>,

    pub location_id: Option<u64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAttendance {
    pub status: Option<AttendanceStatus>,
    #[schema(value_type = Option<String>)]
    pub check_in_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub check_out_time: Option<NaiveTime>,
    pub location_id: Option<u64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    pub worker_id: Option<u64>,
    #[param(value_type = Option<String>, format = "date")]
    #[schema(value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = "date")]
    #[schema(value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct MonthQuery {
    #[schema(example = 1)]
    pub month: u32,
    #[schema(example = 2026)]
    pub year: i32,
}

/// Active locations; a failed lookup yields none so attendance is never blocked.
async fn active_locations(pool: &MySqlPool) -> Vec<CompanyLocation> {
    match repo::location::list(pool, true).await {
        Ok(locations) => locations,
        Err(e) => {
            error!(error = %e, "Failed to load company locations; skipping proximity check");
            Vec::new()
        }
    }
}

/// Geofence gate shared by check-in and check-out. Returns the matched
/// location: the nearest one for a position, otherwise the first active one.
fn match_location(
    position: Option<&GeoPosition>,
    locations: &[CompanyLocation],
    worker_id: u64,
) -> HrResult<Option<CompanyLocation>> {
    let Some(position) = position else {
        return Ok(locations.iter().find(|l| l.is_active).cloned());
    };
    validate_position(position)?;

    let check = validate_proximity(position, locations);
    if !check.is_within_range {
        warn!(worker_id, distance = ?check.distance_meters, "Check rejected outside geofence");
        return Err(HrError::forbidden(check.message));
    }
    Ok(nearest_active(position, locations).map(|(l, _)| l.clone()))
}

fn check_method(req: &CheckRequest) -> CheckMethod {
    req.method.unwrap_or(if req.position.is_some() {
        CheckMethod::Gps
    } else {
        CheckMethod::Manual
    })
}

async fn penalty_policy(conn: &mut MySqlConnection) -> HrResult<PenaltyPolicy> {
    let rules = repo::penalty_rule::list(&mut *conn, true).await?;
    Ok(PenaltyPolicy::from_rules(&rules))
}

#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = CheckRequest,
    responses(
        (status = 200, description = "Checked in successfully", body = AttendanceRecord),
        (status = 403, description = "Outside the geofence, or no worker profile"),
        (status = 409, description = "Already checked in today")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CheckRequest>,
) -> Result<HttpResponse, HrError> {
    let worker_id = auth.require_worker()?;
    let request = payload.into_inner();
    let method = check_method(&request);

    let locations = active_locations(pool.get_ref()).await;
    let location = match_location(request.position.as_ref(), &locations, worker_id)?;

    let now = now();
    let mut tx = pool.begin().await?;
    ensure_date_editable(&mut tx, now.date()).await?;
    let policy = penalty_policy(&mut tx).await?;

    let existing = repo::attendance::lock_day(&mut *tx, worker_id, now.date()).await?;
    let plan = plan_check_in(existing.as_ref(), now, method, location.as_ref(), &policy)?;

    let mut record = existing.unwrap_or(AttendanceRecord {
        id: 0,
        worker_id,
        date: plan.date,
        status: plan.status,
        check_in_time: None,
        check_out_time: None,
        check_in_method: None,
        check_out_method: None,
        location_id: None,
        work_hours: None,
        late_minutes: 0,
        notes: None,
    });
    record.status = plan.status;
    record.check_in_time = Some(plan.check_in_time);
    record.check_in_method = Some(plan.method);
    record.location_id = plan.location_id;
    record.late_minutes = plan.late_minutes;

    if record.id == 0 {
        record.id = repo::attendance::insert(&mut *tx, &record)
            .await
            .map_err(|e| conflict_on_duplicate(e, "Already checked in today"))?;
    } else {
        repo::attendance::update(&mut *tx, &record).await?;
    }
    tx.commit().await?;

    info!(
        worker_id,
        status = %record.status,
        late_minutes = record.late_minutes,
        location_id = ?record.location_id,
        "Checked in"
    );
    Ok(ok(record))
}

#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body = CheckRequest,
    responses(
        (status = 200, description = "Checked out successfully", body = AttendanceRecord),
        (status = 404, description = "No active check-in found for today"),
        (status = 409, description = "Already checked out today")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CheckRequest>,
) -> Result<HttpResponse, HrError> {
    let worker_id = auth.require_worker()?;
    let request = payload.into_inner();
    let method = check_method(&request);

    if request.position.is_some() {
        let locations = active_locations(pool.get_ref()).await;
        match_location(request.position.as_ref(), &locations, worker_id)?;
    }

    let now = now();
    let mut tx = pool.begin().await?;
    let existing = repo::attendance::lock_day(&mut *tx, worker_id, now.date()).await?;
    let plan = plan_check_out(existing.as_ref(), now, method)?;

    let Some(mut record) = existing else {
        return Err(HrError::not_found("No active check-in found for today"));
    };
    record.check_out_time = Some(plan.check_out_time);
    record.check_out_method = Some(plan.method);
    record.work_hours = Some(plan.work_hours);
    repo::attendance::update(&mut *tx, &record).await?;
    tx.commit().await?;

    info!(worker_id, work_hours = %plan.work_hours, "Checked out");
    Ok(ok(record))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Attendance records, newest first")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse, HrError> {
    let worker_id = if auth.is_staff() {
        query.worker_id
    } else {
        Some(auth.require_worker()?)
    };
    let filter = AttendanceFilter {
        worker_id,
        from: query.from,
        to: query.to,
    };
    let (page, per_page, offset) = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .bounds();

    let total = repo::attendance::count(pool.get_ref(), filter).await?;
    let items = repo::attendance::list(pool.get_ref(), filter, per_page, offset).await?;

    Ok(ok(Page { items, page, per_page, total }))
}

/// Builds a manually entered row, deriving status, lateness and hours.
async fn manual_record(
    conn: &mut MySqlConnection,
    base: AttendanceRecord,
) -> HrResult<AttendanceRecord> {
    let location = match base.location_id {
        Some(id) => Some(
            repo::location::find(&mut *conn, id)
                .await?
                .ok_or_else(|| HrError::validation(format!("Location {id} does not exist")))?,
        ),
        None => repo::location::list(&mut *conn, true).await?.into_iter().next(),
    };
    let policy = penalty_policy(conn).await?;

    let derived = derive_manual(
        base.status,
        base.check_in_time,
        base.check_out_time,
        location.as_ref().and_then(|l| l.work_start_time),
        &policy,
    )?;

    Ok(AttendanceRecord {
        status: derived.status,
        late_minutes: derived.late_minutes,
        work_hours: derived.work_hours,
        check_in_method: base.check_in_time.map(|_| base.check_in_method.unwrap_or(CheckMethod::Manual)),
        check_out_method: base.check_out_time.map(|_| base.check_out_method.unwrap_or(CheckMethod::Manual)),
        location_id: base.location_id.or(location.map(|l| l.id)).filter(|_| base.check_in_time.is_some()),
        ..base
    })
}

#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = CreateAttendance,
    responses(
        (status = 201, description = "Attendance recorded", body = AttendanceRecord),
        (status = 403, description = "HR/Admin only, or the month's payroll is approved"),
        (status = 409, description = "Worker already has a record for that date")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn create_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAttendance>,
) -> Result<HttpResponse, HrError> {
    auth.require_hr_or_admin()?;
    let input = payload.into_inner();

    let mut tx = pool.begin().await?;
    ensure_date_editable(&mut tx, input.date).await?;
    if repo::worker::find(&mut *tx, input.worker_id).await?.is_none() {
        return Err(HrError::not_found(format!("Worker {} not found", input.worker_id)));
    }

    let base = AttendanceRecord {
        id: 0,
        worker_id: input.worker_id,
        date: input.date,
        status: input.status,
        check_in_time: input.check_in_time,
        check_out_time: input.check_out_time,
        check_in_method: None,
        check_out_method: None,
        location_id: input.location_id,
        work_hours: None,
        late_minutes: 0,
        notes: input.notes,
    };
    let mut record = manual_record(&mut tx, base).await?;
    record.id = repo::attendance::insert(&mut *tx, &record)
        .await
        .map_err(|e| conflict_on_duplicate(e, "Worker already has an attendance record for this date"))?;
    tx.commit().await?;

    info!(
        attendance_id = record.id,
        worker_id = record.worker_id,
        date = %record.date,
        user_id = auth.user_id,
        "Attendance entered manually"
    );
    Ok(created(record, "Attendance recorded"))
}

#[utoipa::path(
    put,
    path = "/api/attendance/{id}",
    request_body = UpdateAttendance,
    params(("id", description = "Attendance record ID")),
    responses(
        (status = 200, description = "Attendance updated", body = AttendanceRecord),
        (status = 403, description = "HR/Admin only, or the month's payroll is approved"),
        (status = 404, description = "Record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn update_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateAttendance>,
) -> Result<HttpResponse, HrError> {
    auth.require_hr_or_admin()?;
    let attendance_id = path.into_inner();
    let patch = body.into_inner();

    let mut tx = pool.begin().await?;
    let current = repo::attendance::lock(&mut *tx, attendance_id)
        .await?
        .ok_or_else(|| HrError::not_found("Attendance record not found"))?;
    ensure_date_editable(&mut tx, current.date).await?;

    let status = patch.status.unwrap_or(current.status);
    // Times only carry over while the day stays a worked day.
    let keep_times = matches!(status, AttendanceStatus::Present | AttendanceStatus::Late);
    let base = AttendanceRecord {
        status,
        check_in_time: patch.check_in_time.or(current.check_in_time.filter(|_| keep_times)),
        check_out_time: patch.check_out_time.or(current.check_out_time.filter(|_| keep_times)),
        location_id: patch.location_id.or(current.location_id),
        notes: patch.notes.or(current.notes.clone()),
        ..current
    };
    let record = manual_record(&mut tx, base).await?;
    repo::attendance::update(&mut *tx, &record).await?;
    tx.commit().await?;

    info!(attendance_id, user_id = auth.user_id, status = %record.status, "Attendance updated");
    Ok(ok(record))
}

#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    params(("id", description = "Attendance record ID")),
    responses(
        (status = 200, description = "Attendance deleted"),
        (status = 403, description = "HR/Admin only, or the month's payroll is approved"),
        (status = 404, description = "Record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, HrError> {
    auth.require_hr_or_admin()?;
    let attendance_id = path.into_inner();

    let mut tx = pool.begin().await?;
    let record = repo::attendance::lock(&mut *tx, attendance_id)
        .await?
        .ok_or_else(|| HrError::not_found("Attendance record not found"))?;
    ensure_date_editable(&mut tx, record.date).await?;
    repo::attendance::delete(&mut *tx, attendance_id).await?;
    tx.commit().await?;

    info!(attendance_id, worker_id = record.worker_id, user_id = auth.user_id, "Attendance deleted");
    Ok(done("Attendance deleted"))
}

#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    params(MonthQuery),
    responses(
        (status = 200, description = "Per-worker month summary", body = [AttendanceSummary]),
        (status = 400, description = "Invalid month")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn attendance_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, HrError> {
    auth.require_hr_or_admin()?;
    let span = MonthSpan::new(query.month, query.year)?;

    let workers = repo::worker::list_active(pool.get_ref()).await?;
    let records = repo::attendance::list_between(pool.get_ref(), span.first_day, span.last_day).await?;
    let holidays = repo::holiday::list_between(pool.get_ref(), span.first_day, span.last_day).await?;
    let calendar = WorkCalendar::new(now().date(), &holidays, &config.payroll.rest_days);

    let summaries = summarize_month(
        &workers,
        &records,
        &span,
        &calendar,
        config.payroll.paid_leave_days_per_month,
    );
    Ok(ok(summaries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::geo::test_location;

    fn at(lat: f64, lng: f64) -> GeoPosition {
        GeoPosition { latitude: lat, longitude: lng, accuracy: Some(10.0) }
    }

    #[test]
    fn gps_position_matches_nearest_site() {
        let sites = vec![test_location(1, 24.70, 46.70, 100.0), test_location(2, 24.80, 46.80, 100.0)];
        let matched = match_location(Some(&at(24.80, 46.80)), &sites, 1).unwrap();
        assert_eq!(matched.map(|l| l.id), Some(2));
    }

    #[test]
    fn position_outside_every_site_is_forbidden() {
        let sites = vec![test_location(1, 24.70, 46.70, 100.0)];
        let err = match_location(Some(&at(21.5, 39.2)), &sites, 1).unwrap_err();
        assert!(matches!(err, HrError::Forbidden(_)));
    }

    #[test]
    fn no_sites_configured_fails_open() {
        let matched = match_location(Some(&at(21.5, 39.2)), &[], 1).unwrap();
        assert!(matched.is_none());
    }

    #[test]
    fn without_position_the_first_active_site_applies() {
        let mut closed = test_location(1, 24.70, 46.70, 100.0);
        closed.is_active = false;
        let sites = vec![closed, test_location(2, 24.80, 46.80, 100.0)];
        let matched = match_location(None, &sites, 1).unwrap();
        assert_eq!(matched.map(|l| l.id), Some(2));
    }

    #[test]
    fn method_defaults_follow_position() {
        let gps = CheckRequest { method: None, position: Some(at(1.0, 1.0)) };
        assert_eq!(check_method(&gps), CheckMethod::Gps);
        let manual = CheckRequest { method: None, position: None };
        assert_eq!(check_method(&manual), CheckMethod::Manual);
    }
}

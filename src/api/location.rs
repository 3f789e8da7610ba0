use actix_web::{HttpResponse, web};
use chrono::NaiveTime;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::api::{ActiveQuery, created, done, ok};
use crate::auth::auth::AuthUser;
use crate::error::{HrError, HrResult};
use crate::model::location::{CompanyLocation, GeoPosition};
use crate::repo;
use crate::service::geo::{ProximityCheck, validate_position, validate_proximity};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLocation {
    #[schema(example = "Head office")]
    pub name: String,

    pub name_ar: Option<String>,

    #[schema(example = 24.7136)]
    pub latitude: f64,

    #[schema(example = 46.6753)]
    pub longitude: f64,

    /// Defaults to 100 m.
    #[schema(example = 100.0)]
    pub radius_meters: Option<f64>,

    #[schema(example = "08:00:00", value_type = Option<String>)]
    pub work_start_time: Option<NaiveTime>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLocation {
    pub name: Option<String>,
    pub name_ar: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_meters: Option<f64>,
    #[schema(value_type = Option<String>)]
    pub work_start_time: Option<NaiveTime>,
    pub is_active: Option<bool>,
}

fn validate_site(location: &CompanyLocation) -> HrResult<()> {
    if location.name.trim().is_empty() {
        return Err(HrError::validation("name is required"));
    }
    validate_position(&GeoPosition {
        latitude: location.latitude,
        longitude: location.longitude,
        accuracy: None,
    })?;
    if !location.radius_meters.is_finite() || location.radius_meters < 0.0 {
        return Err(HrError::validation("radius_meters must be zero or positive"));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/locations",
    params(ActiveQuery),
    responses(
        (status = 200, description = "Company locations", body = [CompanyLocation]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Locations"
)]
pub async fn list_locations(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ActiveQuery>,
) -> Result<HttpResponse, HrError> {
    let locations = repo::location::list(pool.get_ref(), !query.include_inactive).await?;
    Ok(ok(locations))
}

#[utoipa::path(
    post,
    path = "/api/locations",
    request_body = CreateLocation,
    responses(
        (status = 201, description = "Location created", body = CompanyLocation),
        (status = 400, description = "Invalid coordinates or radius"),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Locations"
)]
pub async fn create_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLocation>,
) -> Result<HttpResponse, HrError> {
    auth.require_hr_or_admin()?;

    let input = payload.into_inner();
    let mut location = CompanyLocation {
        id: 0,
        name: input.name,
        name_ar: input.name_ar,
        latitude: input.latitude,
        longitude: input.longitude,
        radius_meters: input.radius_meters.unwrap_or(100.0),
        work_start_time: input.work_start_time,
        is_active: true,
    };
    validate_site(&location)?;

    location.id = repo::location::insert(pool.get_ref(), &location).await?;
    info!(location_id = location.id, user_id = auth.user_id, "Company location created");

    Ok(created(location, "Location created successfully"))
}

#[utoipa::path(
    put,
    path = "/api/locations/{id}",
    request_body = UpdateLocation,
    params(("id", description = "Location ID")),
    responses(
        (status = 200, description = "Location updated", body = CompanyLocation),
        (status = 404, description = "Location not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Locations"
)]
pub async fn update_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateLocation>,
) -> Result<HttpResponse, HrError> {
    auth.require_hr_or_admin()?;
    let location_id = path.into_inner();

    let current = repo::location::find(pool.get_ref(), location_id)
        .await?
        .ok_or_else(|| HrError::not_found("Location not found"))?;

    let patch = body.into_inner();
    let location = CompanyLocation {
        id: current.id,
        name: patch.name.unwrap_or(current.name),
        name_ar: patch.name_ar.or(current.name_ar),
        latitude: patch.latitude.unwrap_or(current.latitude),
        longitude: patch.longitude.unwrap_or(current.longitude),
        radius_meters: patch.radius_meters.unwrap_or(current.radius_meters),
        work_start_time: patch.work_start_time.or(current.work_start_time),
        is_active: patch.is_active.unwrap_or(current.is_active),
    };
    validate_site(&location)?;

    repo::location::update(pool.get_ref(), &location).await?;
    Ok(ok(location))
}

#[utoipa::path(
    delete,
    path = "/api/locations/{id}",
    params(("id", description = "Location ID")),
    responses(
        (status = 200, description = "Location deleted, or deactivated when attendance refers to it"),
        (status = 404, description = "Location not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Locations"
)]
pub async fn delete_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, HrError> {
    auth.require_hr_or_admin()?;
    let location_id = path.into_inner();

    let mut tx = pool.begin().await?;
    if repo::location::find(&mut *tx, location_id).await?.is_none() {
        return Err(HrError::not_found("Location not found"));
    }

    let message = if repo::location::is_referenced(&mut *tx, location_id).await? {
        repo::location::deactivate(&mut *tx, location_id).await?;
        "Location is referenced by attendance and was deactivated"
    } else {
        repo::location::delete(&mut *tx, location_id).await?;
        "Location deleted"
    };
    tx.commit().await?;

    info!(location_id, user_id = auth.user_id, outcome = message, "Company location removed");
    Ok(done(message))
}

/// Proximity of a device position to the nearest active location. A failed
/// location lookup never blocks attendance: the check passes and the error is logged.
#[utoipa::path(
    post,
    path = "/api/locations/validate",
    request_body = GeoPosition,
    responses(
        (status = 200, description = "Proximity result", body = ProximityCheck),
        (status = 400, description = "Invalid coordinates")
    ),
    security(("bearer_auth" = [])),
    tag = "Locations"
)]
pub async fn validate_location(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<GeoPosition>,
) -> Result<HttpResponse, HrError> {
    let position = payload.into_inner();
    validate_position(&position)?;
    Ok(ok(proximity(pool.get_ref(), &position).await))
}

async fn proximity(pool: &MySqlPool, position: &GeoPosition) -> ProximityCheck {
    match repo::location::list(pool, true).await {
        Ok(locations) => validate_proximity(position, &locations),
        Err(e) => {
            error!(error = %e, "Failed to load company locations; skipping proximity check");
            ProximityCheck::fail_open("Location check unavailable; attendance allowed")
        }
    }
}

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::api::{created, done, ensure_date_editable, ok};
use crate::auth::auth::AuthUser;
use crate::error::{HrError, HrResult};
use crate::model::adjustment::HrAdjustment;
use crate::repo;
use crate::repo::adjustment::AdjustmentFilter;
use crate::service::adjustment::{NewAdjustment, ensure_unprocessed, validate_new};
use crate::service::calendar::MonthSpan;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AdjustmentQuery {
    pub worker_id: Option<u64>,
    /// Restricts to one month; needs `year`.
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub processed: Option<bool>,
}

impl AdjustmentQuery {
    fn filter(&self) -> HrResult<AdjustmentFilter> {
        let (from, to) = match (self.month, self.year) {
            (Some(month), Some(year)) => {
                let span = MonthSpan::new(month, year)?;
                (Some(span.first_day), Some(span.last_day))
            }
            (None, None) => (None, None),
            _ => return Err(HrError::validation("month and year must be given together")),
        };
        Ok(AdjustmentFilter {
            worker_id: self.worker_id,
            from,
            to,
            processed: self.processed,
        })
    }
}

#[utoipa::path(
    post,
    path = "/api/adjustments",
    request_body = NewAdjustment,
    responses(
        (status = 201, description = "Adjustment recorded", body = HrAdjustment),
        (status = 400, description = "Amount must be positive"),
        (status = 403, description = "Date falls in an approved payroll month"),
        (status = 404, description = "Worker not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Adjustments"
)]
pub async fn create_adjustment(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<NewAdjustment>,
) -> Result<HttpResponse, HrError> {
    auth.require_hr_or_admin()?;
    let input = payload.into_inner();
    validate_new(&input)?;

    let mut tx = pool.begin().await?;
    ensure_date_editable(&mut tx, input.date).await?;
    if repo::worker::find(&mut *tx, input.worker_id).await?.is_none() {
        return Err(HrError::not_found(format!("Worker {} not found", input.worker_id)));
    }

    let mut adjustment = HrAdjustment {
        id: 0,
        worker_id: input.worker_id,
        adjustment_type: input.adjustment_type,
        amount: input.amount,
        reason: input.reason,
        date: input.date,
        is_processed: false,
        period_id: None,
        created_by: auth.user_id,
    };
    adjustment.id = repo::adjustment::insert(&mut *tx, &adjustment).await?;
    tx.commit().await?;

    info!(
        adjustment_id = adjustment.id,
        worker_id = adjustment.worker_id,
        kind = %adjustment.adjustment_type,
        amount = %adjustment.amount,
        "HR adjustment recorded"
    );
    Ok(created(adjustment, "Adjustment created"))
}

#[utoipa::path(
    get,
    path = "/api/adjustments",
    params(AdjustmentQuery),
    responses(
        (status = 200, description = "Adjustments, newest first", body = [HrAdjustment]),
        (status = 400, description = "Invalid month filter")
    ),
    security(("bearer_auth" = [])),
    tag = "Adjustments"
)]
pub async fn list_adjustments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AdjustmentQuery>,
) -> Result<HttpResponse, HrError> {
    let mut filter = query.filter()?;
    if !auth.is_staff() {
        filter.worker_id = Some(auth.require_worker()?);
    }
    let adjustments = repo::adjustment::list(pool.get_ref(), filter).await?;
    Ok(ok(adjustments))
}

#[utoipa::path(
    delete,
    path = "/api/adjustments/{id}",
    params(("id", description = "Adjustment ID")),
    responses(
        (status = 200, description = "Adjustment deleted"),
        (status = 404, description = "Adjustment not found"),
        (status = 409, description = "Adjustment already processed by payroll")
    ),
    security(("bearer_auth" = [])),
    tag = "Adjustments"
)]
pub async fn delete_adjustment(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, HrError> {
    auth.require_hr_or_admin()?;
    let adjustment_id = path.into_inner();

    let mut tx = pool.begin().await?;
    let adjustment = repo::adjustment::lock(&mut *tx, adjustment_id)
        .await?
        .ok_or_else(|| HrError::not_found("Adjustment not found"))?;
    ensure_unprocessed(&adjustment)?;
    ensure_date_editable(&mut tx, adjustment.date).await?;

    repo::adjustment::delete(&mut *tx, adjustment_id).await?;
    tx.commit().await?;

    info!(adjustment_id, worker_id = adjustment.worker_id, user_id = auth.user_id, "HR adjustment deleted");
    Ok(done("Adjustment deleted"))
}

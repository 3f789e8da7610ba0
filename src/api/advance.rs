use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::api::{created, now, ok, ok_with};
use crate::auth::auth::AuthUser;
use crate::error::HrError;
use crate::model::advance::{AdvanceInstallment, AdvanceStatus, SalaryAdvance};
use crate::repo;
use crate::service::advance::{NewAdvance, advance_terms};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AdvanceQuery {
    pub worker_id: Option<u64>,
    pub status: Option<AdvanceStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveAdvance {
    /// Vault the advance is paid out of.
    #[schema(example = 1)]
    pub vault_id: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdvanceDetail {
    pub advance: SalaryAdvance,
    pub installments: Vec<AdvanceInstallment>,
}

#[utoipa::path(
    post,
    path = "/api/advances",
    request_body = NewAdvance,
    responses(
        (status = 201, description = "Advance requested", body = SalaryAdvance),
        (status = 400, description = "Invalid amount, month or installment count"),
        (status = 404, description = "Worker not found"),
        (status = 409, description = "Payroll of the start month is already approved")
    ),
    security(("bearer_auth" = [])),
    tag = "Advances"
)]
pub async fn create_advance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<NewAdvance>,
) -> Result<HttpResponse, HrError> {
    auth.require_hr_or_admin()?;
    let input = payload.into_inner();
    let terms = advance_terms(&input)?;

    if repo::worker::find(pool.get_ref(), input.worker_id).await?.is_none() {
        return Err(HrError::not_found(format!("Worker {} not found", input.worker_id)));
    }

    let mut advance = SalaryAdvance {
        id: 0,
        worker_id: input.worker_id,
        advance_type: input.advance_type,
        total_amount: input.total_amount,
        installments_count: terms.installments_count,
        installment_amount: terms.installment_amount,
        remaining_amount: input.total_amount,
        start_month: input.start_month,
        start_year: input.start_year,
        status: AdvanceStatus::Pending,
        reason: input.reason,
        created_by: auth.user_id,
        approved_by: None,
        vault_id: None,
        approved_at: None,
        cancelled_at: None,
    };
    let start_period = repo::payroll::share_month(pool.get_ref(), advance.start_month, advance.start_year).await?;
    advance.ensure_start_open(start_period.as_ref())?;

    advance.id = repo::advance::insert(pool.get_ref(), &advance).await?;

    info!(
        advance_id = advance.id,
        worker_id = advance.worker_id,
        total = %advance.total_amount,
        installments = advance.installments_count,
        "Salary advance requested"
    );
    Ok(created(advance, "Advance created"))
}

#[utoipa::path(
    get,
    path = "/api/advances",
    params(AdvanceQuery),
    responses((status = 200, description = "Advances, newest first", body = [SalaryAdvance])),
    security(("bearer_auth" = [])),
    tag = "Advances"
)]
pub async fn list_advances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AdvanceQuery>,
) -> Result<HttpResponse, HrError> {
    let worker_id = if auth.is_staff() {
        query.worker_id
    } else {
        Some(auth.require_worker()?)
    };
    let advances = repo::advance::list(pool.get_ref(), worker_id, query.status).await?;
    Ok(ok(advances))
}

#[utoipa::path(
    get,
    path = "/api/advances/{id}",
    params(("id", description = "Advance ID")),
    responses(
        (status = 200, description = "Advance with its installment schedule", body = AdvanceDetail),
        (status = 404, description = "Advance not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Advances"
)]
pub async fn get_advance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, HrError> {
    let advance_id = path.into_inner();
    let advance = repo::advance::find(pool.get_ref(), advance_id)
        .await?
        .ok_or_else(|| HrError::not_found("Advance not found"))?;
    if !auth.is_staff() && auth.worker_id != Some(advance.worker_id) {
        return Err(HrError::not_found("Advance not found"));
    }

    let installments = repo::advance::installments(pool.get_ref(), advance_id).await?;
    Ok(ok(AdvanceDetail { advance, installments }))
}

#[utoipa::path(
    post,
    path = "/api/advances/{id}/approve",
    request_body = ApproveAdvance,
    params(("id", description = "Advance ID")),
    responses(
        (status = 200, description = "Advance approved and paid out", body = AdvanceDetail),
        (status = 404, description = "Advance or vault not found"),
        (status = 409, description = "Advance is not pending, or its start month is already approved"),
        (status = 422, description = "Insufficient funds in vault")
    ),
    security(("bearer_auth" = [])),
    tag = "Advances"
)]
pub async fn approve_advance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ApproveAdvance>,
) -> Result<HttpResponse, HrError> {
    auth.require_finance()?;
    let advance_id = path.into_inner();

    let mut tx = pool.begin().await?;
    // lock order matches payroll approval: period, then advance
    let requested = repo::advance::find(&mut *tx, advance_id)
        .await?
        .ok_or_else(|| HrError::not_found("Advance not found"))?;
    let start_period = repo::payroll::share_month(&mut *tx, requested.start_month, requested.start_year).await?;

    let mut advance = repo::advance::lock(&mut *tx, advance_id)
        .await?
        .ok_or_else(|| HrError::not_found("Advance not found"))?;
    advance.ensure_start_open(start_period.as_ref())?;
    let mut vault = repo::vault::lock(&mut *tx, payload.vault_id)
        .await?
        .ok_or_else(|| HrError::not_found(format!("Vault {} not found", payload.vault_id)))?;

    let schedule = advance.approve(&mut vault, auth.user_id, now())?;

    repo::vault::save_balance(&mut *tx, vault.id, vault.balance).await?;
    repo::advance::save_state(&mut *tx, &advance).await?;
    repo::advance::insert_schedule(&mut tx, advance.id, &schedule).await?;
    let installments = repo::advance::installments(&mut *tx, advance.id).await?;
    tx.commit().await?;

    info!(
        advance_id,
        vault_id = vault.id,
        amount = %advance.total_amount,
        vault_balance = %vault.balance,
        user_id = auth.user_id,
        "Salary advance approved"
    );
    Ok(ok(AdvanceDetail { advance, installments }))
}

#[utoipa::path(
    post,
    path = "/api/advances/{id}/cancel",
    params(("id", description = "Advance ID")),
    responses(
        (status = 200, description = "Advance cancelled; the remaining balance is refunded to its vault", body = AdvanceDetail),
        (status = 404, description = "Advance not found"),
        (status = 409, description = "Advance is completed or already cancelled")
    ),
    security(("bearer_auth" = [])),
    tag = "Advances"
)]
pub async fn cancel_advance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, HrError> {
    auth.require_finance()?;
    let advance_id = path.into_inner();

    let mut tx = pool.begin().await?;
    let mut advance = repo::advance::lock(&mut *tx, advance_id)
        .await?
        .ok_or_else(|| HrError::not_found("Advance not found"))?;
    let mut installments = repo::advance::installments(&mut *tx, advance_id).await?;

    let mut vault = match (advance.status, advance.vault_id) {
        (AdvanceStatus::Active, Some(vault_id)) => repo::vault::lock(&mut *tx, vault_id).await?,
        _ => None,
    };

    let refund = advance.cancel(&mut installments, vault.as_mut(), now())?;

    if let Some(vault) = vault.as_ref().filter(|_| !refund.is_zero()) {
        repo::vault::save_balance(&mut *tx, vault.id, vault.balance).await?;
    }
    repo::advance::save_state(&mut *tx, &advance).await?;
    repo::advance::save_installments(&mut tx, &installments).await?;
    tx.commit().await?;

    info!(advance_id, refund = %refund, vault_id = ?advance.vault_id, user_id = auth.user_id, "Salary advance cancelled");
    Ok(ok_with(
        AdvanceDetail { advance, installments },
        format!("Advance cancelled; {refund} refunded"),
    ))
}

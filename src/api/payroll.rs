use actix_web::{HttpResponse, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{MySqlConnection, MySqlPool};
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::api::attendance::MonthQuery;
use crate::api::{conflict_on_duplicate, now, ok, ok_with};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::{HrError, HrResult};
use crate::model::adjustment::HrAdjustment;
use crate::model::advance::{AdvanceInstallment, SalaryAdvance};
use crate::model::attendance::AttendanceRecord;
use crate::model::holiday::PublicHoliday;
use crate::model::payroll::{PayrollDisbursement, PayrollItem, PayrollPeriod};
use crate::model::penalty_rule::PenaltyRule;
use crate::model::worker::Worker;
use crate::repo;
use crate::service::calendar::{MonthSpan, WorkCalendar};
use crate::service::payroll::{PayrollInputs, compute_payroll, draft_period, ensure_recalculable};
use crate::service::penalty::PenaltyPolicy;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PeriodQuery {
    #[schema(example = 2026)]
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DisburseRequest {
    #[schema(example = 1)]
    pub vault_id: u64,

    #[schema(example = "6000.00")]
    pub amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PeriodDetail {
    pub period: PayrollPeriod,
    pub items: Vec<PayrollItem>,
    pub disbursements: Vec<PayrollDisbursement>,
}

/// Rows a calculation of one month reads.
#[derive(Debug, Default)]
struct PayrollData {
    workers: Vec<Worker>,
    attendance: Vec<AttendanceRecord>,
    holidays: Vec<PublicHoliday>,
    rules: Vec<PenaltyRule>,
    adjustments: Vec<HrAdjustment>,
    advances: Vec<SalaryAdvance>,
    installments: Vec<AdvanceInstallment>,
}

impl PayrollData {
    /// With `lock_advances` the active advances stay locked until commit.
    async fn load(conn: &mut MySqlConnection, span: &MonthSpan, lock_advances: bool) -> HrResult<Self> {
        let workers = repo::worker::list_active(&mut *conn).await?;
        let attendance = repo::attendance::list_between(&mut *conn, span.first_day, span.last_day).await?;
        let holidays = repo::holiday::list_between(&mut *conn, span.first_day, span.last_day).await?;
        let rules = repo::penalty_rule::list(&mut *conn, true).await?;
        let adjustments =
            repo::adjustment::unprocessed_between(&mut *conn, span.first_day, span.last_day).await?;
        let advances = if lock_advances {
            repo::advance::lock_active(&mut *conn).await?
        } else {
            repo::advance::list_active(&mut *conn).await?
        };
        let installments = repo::advance::due_installments(&mut *conn, span.month, span.year).await?;

        Ok(Self {
            workers,
            attendance,
            holidays,
            rules,
            adjustments,
            advances,
            installments,
        })
    }

    fn inputs<'a>(
        &'a self,
        span: MonthSpan,
        calendar: &'a WorkCalendar,
        penalty: &'a PenaltyPolicy,
    ) -> PayrollInputs<'a> {
        PayrollInputs {
            span,
            calendar,
            workers: &self.workers,
            attendance: &self.attendance,
            penalty,
            adjustments: &self.adjustments,
            advances: &self.advances,
            installments: &self.installments,
        }
    }
}

async fn period_detail(pool: &MySqlPool, period: PayrollPeriod) -> HrResult<PeriodDetail> {
    let items = repo::payroll::items(pool, period.id).await?;
    let disbursements = repo::payroll::disbursements(pool, period.id).await?;
    Ok(PeriodDetail { period, items, disbursements })
}

#[utoipa::path(
    post,
    path = "/api/payroll/calculate",
    request_body = MonthQuery,
    responses(
        (status = 200, description = "Period calculated; items replaced", body = PeriodDetail),
        (status = 400, description = "Invalid month"),
        (status = 409, description = "Period already approved")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn calculate_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<MonthQuery>,
) -> Result<HttpResponse, HrError> {
    auth.require_hr_or_admin()?;
    let span = MonthSpan::new(payload.month, payload.year)?;

    let mut tx = pool.begin().await?;
    let existing = repo::payroll::lock_month(&mut *tx, span.month, span.year).await?;
    if let Err(e) = ensure_recalculable(existing.as_ref()) {
        warn!(month = span.month, year = span.year, "Recalculation of a closed payroll period refused");
        return Err(e);
    }

    let mut period = match existing {
        Some(period) => period,
        None => {
            let mut period = draft_period(&span);
            period.id = repo::payroll::insert_period(&mut *tx, &period)
                .await
                .map_err(|e| conflict_on_duplicate(e, "Payroll for this month is being calculated"))?;
            period
        }
    };

    let data = PayrollData::load(&mut tx, &span, false).await?;
    let calendar = WorkCalendar::new(now().date(), &data.holidays, &config.payroll.rest_days);
    let policy = PenaltyPolicy::from_rules(&data.rules);
    let run = compute_payroll(&data.inputs(span, &calendar, &policy), &config.payroll)?;

    period.apply_run(&run, now())?;
    repo::payroll::replace_items(&mut tx, period.id, &run.items).await?;
    repo::payroll::save_period(&mut *tx, &period).await?;
    tx.commit().await?;

    info!(
        period_id = period.id,
        month = span.month,
        year = span.year,
        workers = run.items.len(),
        net_total = %period.net_total,
        user_id = auth.user_id,
        "Payroll calculated"
    );
    Ok(ok(period_detail(pool.get_ref(), period).await?))
}

#[utoipa::path(
    post,
    path = "/api/payroll/{id}/approve",
    params(("id", description = "Payroll period ID")),
    responses(
        (status = 200, description = "Period approved; installments deducted and adjustments settled", body = PayrollPeriod),
        (status = 400, description = "Negative net total"),
        (status = 404, description = "Period not found"),
        (status = 409, description = "Period not calculated, already approved, or stale")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn approve_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<HttpResponse, HrError> {
    auth.require_admin()?;
    let period_id = path.into_inner();

    let mut tx = pool.begin().await?;
    let mut period = repo::payroll::lock_period(&mut *tx, period_id)
        .await?
        .ok_or_else(|| HrError::not_found("Payroll period not found"))?;
    let span = MonthSpan::new(period.month, period.year)?;

    let data = PayrollData::load(&mut tx, &span, true).await?;
    let stored = repo::payroll::items(&mut *tx, period_id).await?;
    let calendar = WorkCalendar::new(now().date(), &data.holidays, &config.payroll.rest_days);
    let policy = PenaltyPolicy::from_rules(&data.rules);
    let inputs = data.inputs(span, &calendar, &policy);

    let settlement = match period.approve(&stored, &inputs, &config.payroll, auth.user_id, now()) {
        Ok(settlement) => settlement,
        Err(e) => {
            warn!(period_id, status = %period.status, error = %e, "Payroll approval refused");
            return Err(e);
        }
    };

    for advance in &settlement.advances {
        repo::advance::save_state(&mut *tx, advance).await?;
    }
    repo::advance::save_installments(&mut tx, &settlement.installments).await?;
    repo::adjustment::mark_processed(&mut tx, &settlement.processed_adjustment_ids, period_id).await?;
    repo::payroll::save_period(&mut *tx, &period).await?;
    tx.commit().await?;

    info!(
        period_id,
        status = %period.status,
        installments = settlement.installments.len(),
        adjustments = settlement.processed_adjustment_ids.len(),
        approver = %auth.username,
        "Payroll approved"
    );
    Ok(ok(period))
}

#[utoipa::path(
    post,
    path = "/api/payroll/{id}/disburse",
    request_body = DisburseRequest,
    params(("id", description = "Payroll period ID")),
    responses(
        (status = 200, description = "Disbursement recorded", body = PayrollPeriod),
        (status = 400, description = "Amount not positive, exceeds the outstanding total, or period already paid"),
        (status = 404, description = "Period or vault not found"),
        (status = 409, description = "Period not approved"),
        (status = 422, description = "Insufficient funds in vault")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn disburse_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<DisburseRequest>,
) -> Result<HttpResponse, HrError> {
    auth.require_finance()?;
    let period_id = path.into_inner();
    let request = payload.into_inner();

    let mut tx = pool.begin().await?;
    let mut period = repo::payroll::lock_period(&mut *tx, period_id)
        .await?
        .ok_or_else(|| HrError::not_found("Payroll period not found"))?;
    let mut vault = repo::vault::lock(&mut *tx, request.vault_id)
        .await?
        .ok_or_else(|| HrError::not_found(format!("Vault {} not found", request.vault_id)))?;

    if let Err(e) = period.disburse(&mut vault, request.amount) {
        warn!(
            period_id,
            vault_id = vault.id,
            amount = %request.amount,
            outstanding = %period.outstanding(),
            error = %e,
            "Payroll disbursement refused"
        );
        return Err(e);
    }

    let disbursement = PayrollDisbursement {
        id: 0,
        period_id,
        vault_id: vault.id,
        amount: request.amount,
        created_by: auth.user_id,
        created_at: now(),
    };
    repo::vault::save_balance(&mut *tx, vault.id, vault.balance).await?;
    repo::payroll::insert_disbursement(&mut *tx, &disbursement).await?;
    repo::payroll::save_period(&mut *tx, &period).await?;
    tx.commit().await?;

    info!(
        period_id,
        vault_id = vault.id,
        amount = %request.amount,
        total_disbursed = %period.total_disbursed,
        status = %period.status,
        user_id = auth.user_id,
        "Payroll disbursed"
    );
    let outstanding = period.outstanding();
    Ok(ok_with(period, format!("Outstanding {outstanding}")))
}

#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PeriodQuery),
    responses((status = 200, description = "Payroll periods, newest first", body = [PayrollPeriod])),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_periods(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PeriodQuery>,
) -> Result<HttpResponse, HrError> {
    if !auth.is_staff() {
        return Err(HrError::forbidden("Staff only"));
    }
    let periods = repo::payroll::list_periods(pool.get_ref(), query.year).await?;
    Ok(ok(periods))
}

#[utoipa::path(
    get,
    path = "/api/payroll/{id}",
    params(("id", description = "Payroll period ID")),
    responses(
        (status = 200, description = "Period with items and disbursements", body = PeriodDetail),
        (status = 404, description = "Period not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_period(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, HrError> {
    if !auth.is_staff() {
        return Err(HrError::forbidden("Staff only"));
    }
    let period = repo::payroll::find_period(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| HrError::not_found("Payroll period not found"))?;
    Ok(ok(period_detail(pool.get_ref(), period).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PayrollConfig;
    use crate::service::calendar::test_worker;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn loaded_rows_feed_a_calculation() {
        let data = PayrollData {
            workers: vec![test_worker(1, dec!(3000))],
            ..PayrollData::default()
        };
        let span = MonthSpan::new(1, 2026).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let calendar = WorkCalendar::new(today, &data.holidays, &[]);
        let policy = PenaltyPolicy::from_rules(&data.rules);

        let run = compute_payroll(&data.inputs(span, &calendar, &policy), &PayrollConfig::default()).unwrap();
        assert_eq!(run.items.len(), 1);
        assert_eq!(run.items[0].worker_id, 1);
        assert_eq!(run.totals.total_salaries, dec!(3000));
    }

    #[test]
    fn disburse_request_reads_decimal_strings() {
        let req: DisburseRequest = serde_json::from_str(r#"{"vault_id":2,"amount":"6000.00"}"#).unwrap();
        assert_eq!(req.vault_id, 2);
        assert_eq!(req.amount, dec!(6000));
    }
}

use actix_web::{HttpResponse, web};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

use crate::api::{ActiveQuery, created, done, ok};
use crate::auth::auth::AuthUser;
use crate::error::{HrError, HrResult};
use crate::model::penalty_rule::{PenaltyRule, PenaltyRuleType};
use crate::repo;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePenaltyRule {
    #[schema(example = "Late 15-30 minutes")]
    pub name: String,
    pub name_ar: Option<String>,
    pub rule_type: PenaltyRuleType,

    #[serde(default)]
    #[schema(example = 15)]
    pub min_minutes: u32,

    #[schema(example = 30)]
    pub max_minutes: Option<u32>,

    #[serde(default)]
    #[schema(example = "0.25")]
    pub deduction_days: Decimal,

    #[serde(default)]
    pub grace_count: u32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePenaltyRule {
    pub name: Option<String>,
    pub name_ar: Option<String>,
    pub min_minutes: Option<u32>,
    pub max_minutes: Option<u32>,
    pub deduction_days: Option<Decimal>,
    pub grace_count: Option<u32>,
    pub is_active: Option<bool>,
}

fn validate_rule(rule: &PenaltyRule) -> HrResult<()> {
    if rule.name.trim().is_empty() {
        return Err(HrError::validation("name is required"));
    }
    if rule.max_minutes.is_some_and(|max| max < rule.min_minutes) {
        return Err(HrError::validation("max_minutes must not be below min_minutes"));
    }
    if rule.deduction_days < Decimal::ZERO {
        return Err(HrError::validation("deduction_days must be zero or positive"));
    }
    match rule.rule_type {
        PenaltyRuleType::Tier => Ok(()),
        PenaltyRuleType::GracePeriod if rule.grace_count >= 1 => Ok(()),
        PenaltyRuleType::GracePeriod => Err(HrError::validation("grace rules need grace_count of at least 1")),
    }
}

#[utoipa::path(
    get,
    path = "/api/penalty-rules",
    params(ActiveQuery),
    responses((status = 200, description = "Penalty rules", body = [PenaltyRule])),
    security(("bearer_auth" = [])),
    tag = "Penalty rules"
)]
pub async fn list_rules(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ActiveQuery>,
) -> Result<HttpResponse, HrError> {
    let rules = repo::penalty_rule::list(pool.get_ref(), !query.include_inactive).await?;
    Ok(ok(rules))
}

#[utoipa::path(
    post,
    path = "/api/penalty-rules",
    request_body = CreatePenaltyRule,
    responses(
        (status = 201, description = "Rule created", body = PenaltyRule),
        (status = 400, description = "Invalid minute range, deduction or grace count")
    ),
    security(("bearer_auth" = [])),
    tag = "Penalty rules"
)]
pub async fn create_rule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePenaltyRule>,
) -> Result<HttpResponse, HrError> {
    auth.require_hr_or_admin()?;
    let input = payload.into_inner();
    let mut rule = PenaltyRule {
        id: 0,
        name: input.name,
        name_ar: input.name_ar,
        rule_type: input.rule_type,
        min_minutes: input.min_minutes,
        max_minutes: input.max_minutes,
        deduction_days: input.deduction_days,
        grace_count: input.grace_count,
        is_active: true,
    };
    validate_rule(&rule)?;

    rule.id = repo::penalty_rule::insert(pool.get_ref(), &rule).await?;
    info!(rule_id = rule.id, rule_type = %rule.rule_type, user_id = auth.user_id, "Penalty rule created");
    Ok(created(rule, "Penalty rule created"))
}

#[utoipa::path(
    put,
    path = "/api/penalty-rules/{id}",
    request_body = UpdatePenaltyRule,
    params(("id", description = "Rule ID")),
    responses(
        (status = 200, description = "Rule updated", body = PenaltyRule),
        (status = 400, description = "Invalid minute range, deduction or grace count"),
        (status = 404, description = "Rule not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Penalty rules"
)]
pub async fn update_rule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdatePenaltyRule>,
) -> Result<HttpResponse, HrError> {
    auth.require_hr_or_admin()?;
    let current = repo::penalty_rule::find(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| HrError::not_found("Penalty rule not found"))?;

    let patch = payload.into_inner();
    let rule = PenaltyRule {
        name: patch.name.unwrap_or(current.name),
        name_ar: patch.name_ar.or(current.name_ar),
        min_minutes: patch.min_minutes.unwrap_or(current.min_minutes),
        max_minutes: patch.max_minutes.or(current.max_minutes),
        deduction_days: patch.deduction_days.unwrap_or(current.deduction_days),
        grace_count: patch.grace_count.unwrap_or(current.grace_count),
        is_active: patch.is_active.unwrap_or(current.is_active),
        ..current
    };
    validate_rule(&rule)?;

    repo::penalty_rule::update(pool.get_ref(), &rule).await?;
    info!(rule_id = rule.id, user_id = auth.user_id, "Penalty rule updated");
    Ok(ok(rule))
}

#[utoipa::path(
    delete,
    path = "/api/penalty-rules/{id}",
    params(("id", description = "Rule ID")),
    responses(
        (status = 200, description = "Rule deactivated"),
        (status = 404, description = "Rule not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Penalty rules"
)]
pub async fn deactivate_rule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, HrError> {
    auth.require_hr_or_admin()?;
    let mut rule = repo::penalty_rule::find(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| HrError::not_found("Penalty rule not found"))?;

    rule.is_active = false;
    repo::penalty_rule::update(pool.get_ref(), &rule).await?;
    info!(rule_id = rule.id, user_id = auth.user_id, "Penalty rule deactivated");
    Ok(done("Penalty rule deactivated"))
}

use sqlx::{Executor, MySql};

use crate::model::penalty_rule::PenaltyRule;

pub async fn list<'e, E>(db: E, active_only: bool) -> Result<Vec<PenaltyRule>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query_as::<_, PenaltyRule>(
        r#"
        SELECT id, name, name_ar, rule_type, min_minutes, max_minutes, deduction_days,
               grace_count, is_active
        FROM penalty_rules
        WHERE (? = FALSE OR is_active = TRUE)
        ORDER BY rule_type, min_minutes, id
        "#,
    )
    .bind(active_only)
    .fetch_all(db)
    .await
}

pub async fn find<'e, E>(db: E, id: u64) -> Result<Option<PenaltyRule>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query_as::<_, PenaltyRule>(
        r#"
        SELECT id, name, name_ar, rule_type, min_minutes, max_minutes, deduction_days,
               grace_count, is_active
        FROM penalty_rules
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn insert<'e, E>(db: E, rule: &PenaltyRule) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO penalty_rules
            (name, name_ar, rule_type, min_minutes, max_minutes, deduction_days, grace_count, is_active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&rule.name)
    .bind(&rule.name_ar)
    .bind(rule.rule_type)
    .bind(rule.min_minutes)
    .bind(rule.max_minutes)
    .bind(rule.deduction_days)
    .bind(rule.grace_count)
    .bind(rule.is_active)
    .execute(db)
    .await?;

    Ok(result.last_insert_id())
}

pub async fn update<'e, E>(db: E, rule: &PenaltyRule) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query(
        r#"
        UPDATE penalty_rules
        SET name = ?, name_ar = ?, rule_type = ?, min_minutes = ?, max_minutes = ?,
            deduction_days = ?, grace_count = ?, is_active = ?
        WHERE id = ?
        "#,
    )
    .bind(&rule.name)
    .bind(&rule.name_ar)
    .bind(rule.rule_type)
    .bind(rule.min_minutes)
    .bind(rule.max_minutes)
    .bind(rule.deduction_days)
    .bind(rule.grace_count)
    .bind(rule.is_active)
    .bind(rule.id)
    .execute(db)
    .await?;

    Ok(result.rows_affected())
}

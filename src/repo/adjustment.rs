use chrono::NaiveDate;
use sqlx::{Executor, MySql, MySqlConnection, QueryBuilder};

use crate::model::adjustment::HrAdjustment;

const SELECT: &str = r#"
    SELECT id, worker_id, adjustment_type, amount, reason, date, is_processed, period_id, created_by
    FROM hr_adjustments
"#;

#[derive(Debug, Default, Clone, Copy)]
pub struct AdjustmentFilter {
    pub worker_id: Option<u64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub processed: Option<bool>,
}

pub async fn lock<'e, E>(db: E, id: u64) -> Result<Option<HrAdjustment>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("{SELECT} WHERE id = ? FOR UPDATE");
    sqlx::query_as::<_, HrAdjustment>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list<'e, E>(db: E, filter: AdjustmentFilter) -> Result<Vec<HrAdjustment>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!(
        "{SELECT}
        WHERE (? IS NULL OR worker_id = ?)
          AND (? IS NULL OR date >= ?)
          AND (? IS NULL OR date <= ?)
          AND (? IS NULL OR is_processed = ?)
        ORDER BY date DESC, id DESC"
    );
    sqlx::query_as::<_, HrAdjustment>(&sql)
        .bind(filter.worker_id)
        .bind(filter.worker_id)
        .bind(filter.from)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.to)
        .bind(filter.processed)
        .bind(filter.processed)
        .fetch_all(db)
        .await
}

/// Unprocessed entries dated within `[from, to]`.
pub async fn unprocessed_between<'e, E>(
    db: E,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<HrAdjustment>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("{SELECT} WHERE is_processed = FALSE AND date BETWEEN ? AND ? ORDER BY id");
    sqlx::query_as::<_, HrAdjustment>(&sql)
        .bind(from)
        .bind(to)
        .fetch_all(db)
        .await
}

pub async fn insert<'e, E>(db: E, adjustment: &HrAdjustment) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO hr_adjustments
            (worker_id, adjustment_type, amount, reason, date, is_processed, created_by)
        VALUES (?, ?, ?, ?, ?, FALSE, ?)
        "#,
    )
    .bind(adjustment.worker_id)
    .bind(adjustment.adjustment_type)
    .bind(adjustment.amount)
    .bind(&adjustment.reason)
    .bind(adjustment.date)
    .bind(adjustment.created_by)
    .execute(db)
    .await?;

    Ok(result.last_insert_id())
}

pub async fn delete<'e, E>(db: E, id: u64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query("DELETE FROM hr_adjustments WHERE id = ? AND is_processed = FALSE")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn mark_processed(
    conn: &mut MySqlConnection,
    ids: &[u64],
    period_id: u64,
) -> Result<u64, sqlx::Error> {
    if ids.is_empty() {
        return Ok(0);
    }

    let mut qb: QueryBuilder<MySql> =
        QueryBuilder::new("UPDATE hr_adjustments SET is_processed = TRUE, period_id = ");
    qb.push_bind(period_id);
    qb.push(" WHERE is_processed = FALSE AND id IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let result = qb.build().execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

use sqlx::{Executor, MySql, MySqlConnection, QueryBuilder};

use crate::model::advance::{AdvanceInstallment, AdvanceStatus, SalaryAdvance};
use crate::service::advance::ScheduledInstallment;

const SELECT: &str = r#"
    SELECT id, worker_id, advance_type, total_amount, installments_count, installment_amount,
           remaining_amount, start_month, start_year, status, reason, created_by, approved_by,
           vault_id, approved_at, cancelled_at
    FROM salary_advances
"#;

pub async fn find<'e, E>(db: E, id: u64) -> Result<Option<SalaryAdvance>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("{SELECT} WHERE id = ?");
    sqlx::query_as::<_, SalaryAdvance>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn lock<'e, E>(db: E, id: u64) -> Result<Option<SalaryAdvance>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("{SELECT} WHERE id = ? FOR UPDATE");
    sqlx::query_as::<_, SalaryAdvance>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list<'e, E>(
    db: E,
    worker_id: Option<u64>,
    status: Option<AdvanceStatus>,
) -> Result<Vec<SalaryAdvance>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!(
        "{SELECT}
        WHERE (? IS NULL OR worker_id = ?)
          AND (? IS NULL OR status = ?)
        ORDER BY id DESC"
    );
    sqlx::query_as::<_, SalaryAdvance>(&sql)
        .bind(worker_id)
        .bind(worker_id)
        .bind(status)
        .bind(status)
        .fetch_all(db)
        .await
}

/// Active advances, locked: payroll approval deducts from them.
pub async fn lock_active<'e, E>(db: E) -> Result<Vec<SalaryAdvance>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("{SELECT} WHERE status = 'active' ORDER BY id FOR UPDATE");
    sqlx::query_as::<_, SalaryAdvance>(&sql).fetch_all(db).await
}

pub async fn list_active<'e, E>(db: E) -> Result<Vec<SalaryAdvance>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("{SELECT} WHERE status = 'active' ORDER BY id");
    sqlx::query_as::<_, SalaryAdvance>(&sql).fetch_all(db).await
}

pub async fn insert<'e, E>(db: E, advance: &SalaryAdvance) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO salary_advances
            (worker_id, advance_type, total_amount, installments_count, installment_amount,
             remaining_amount, start_month, start_year, status, reason, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(advance.worker_id)
    .bind(advance.advance_type)
    .bind(advance.total_amount)
    .bind(advance.installments_count)
    .bind(advance.installment_amount)
    .bind(advance.remaining_amount)
    .bind(advance.start_month)
    .bind(advance.start_year)
    .bind(advance.status)
    .bind(&advance.reason)
    .bind(advance.created_by)
    .execute(db)
    .await?;

    Ok(result.last_insert_id())
}

/// Writes back the lifecycle fields changed by approve, deduct and cancel.
pub async fn save_state<'e, E>(db: E, advance: &SalaryAdvance) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query(
        r#"
        UPDATE salary_advances
        SET status = ?, remaining_amount = ?, approved_by = ?, vault_id = ?,
            approved_at = ?, cancelled_at = ?
        WHERE id = ?
        "#,
    )
    .bind(advance.status)
    .bind(advance.remaining_amount)
    .bind(advance.approved_by)
    .bind(advance.vault_id)
    .bind(advance.approved_at)
    .bind(advance.cancelled_at)
    .bind(advance.id)
    .execute(db)
    .await?;

    Ok(result.rows_affected())
}

pub async fn installments<'e, E>(db: E, advance_id: u64) -> Result<Vec<AdvanceInstallment>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query_as::<_, AdvanceInstallment>(
        r#"
        SELECT id, advance_id, month, year, amount, status
        FROM advance_installments
        WHERE advance_id = ?
        ORDER BY year, month
        "#,
    )
    .bind(advance_id)
    .fetch_all(db)
    .await
}

/// Pending installments due in or before `(month, year)` whose advance is active.
pub async fn due_installments<'e, E>(
    db: E,
    month: u32,
    year: i32,
) -> Result<Vec<AdvanceInstallment>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query_as::<_, AdvanceInstallment>(
        r#"
        SELECT i.id, i.advance_id, i.month, i.year, i.amount, i.status
        FROM advance_installments i
        JOIN salary_advances a ON a.id = i.advance_id
        WHERE (i.year < ? OR (i.year = ? AND i.month <= ?))
          AND i.status = 'pending' AND a.status = 'active'
        ORDER BY i.advance_id, i.year, i.month
        "#,
    )
    .bind(year)
    .bind(year)
    .bind(month)
    .fetch_all(db)
    .await
}

pub async fn insert_schedule(
    conn: &mut MySqlConnection,
    advance_id: u64,
    schedule: &[ScheduledInstallment],
) -> Result<(), sqlx::Error> {
    if schedule.is_empty() {
        return Ok(());
    }

    let mut qb: QueryBuilder<MySql> =
        QueryBuilder::new("INSERT INTO advance_installments (advance_id, month, year, amount, status) ");
    qb.push_values(schedule, |mut row, s| {
        row.push_bind(advance_id)
            .push_bind(s.month)
            .push_bind(s.year)
            .push_bind(s.amount)
            .push("'pending'");
    });
    qb.build().execute(&mut *conn).await?;
    Ok(())
}

pub async fn save_installments(
    conn: &mut MySqlConnection,
    installments: &[AdvanceInstallment],
) -> Result<(), sqlx::Error> {
    for installment in installments {
        sqlx::query("UPDATE advance_installments SET status = ? WHERE id = ?")
            .bind(installment.status)
            .bind(installment.id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

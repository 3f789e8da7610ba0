use sqlx::{Executor, MySql, MySqlConnection, QueryBuilder};

use crate::model::payroll::{PayrollDisbursement, PayrollItem, PayrollPeriod};
use crate::service::payroll::ComputedItem;

const SELECT_PERIOD: &str = r#"
    SELECT id, month, year, status, total_salaries, total_absence_deductions, total_advances,
           total_incentives, net_total, total_disbursed, calculated_at, approved_at, approved_by
    FROM payroll_periods
"#;

pub async fn find_period<'e, E>(db: E, id: u64) -> Result<Option<PayrollPeriod>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("{SELECT_PERIOD} WHERE id = ?");
    sqlx::query_as::<_, PayrollPeriod>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Locks the period row; disbursements and approval serialise on it.
pub async fn lock_period<'e, E>(db: E, id: u64) -> Result<Option<PayrollPeriod>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("{SELECT_PERIOD} WHERE id = ? FOR UPDATE");
    sqlx::query_as::<_, PayrollPeriod>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn lock_month<'e, E>(db: E, month: u32, year: i32) -> Result<Option<PayrollPeriod>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("{SELECT_PERIOD} WHERE month = ? AND year = ? FOR UPDATE");
    sqlx::query_as::<_, PayrollPeriod>(&sql)
        .bind(month)
        .bind(year)
        .fetch_optional(db)
        .await
}

/// The period covering `(month, year)`, if any, read under a shared lock so
/// approval waits for the calling transaction and vice versa.
pub async fn share_month<'e, E>(db: E, month: u32, year: i32) -> Result<Option<PayrollPeriod>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("{SELECT_PERIOD} WHERE month = ? AND year = ? LOCK IN SHARE MODE");
    sqlx::query_as::<_, PayrollPeriod>(&sql)
        .bind(month)
        .bind(year)
        .fetch_optional(db)
        .await
}

pub async fn list_periods<'e, E>(db: E, year: Option<i32>) -> Result<Vec<PayrollPeriod>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("{SELECT_PERIOD} WHERE (? IS NULL OR year = ?) ORDER BY year DESC, month DESC");
    sqlx::query_as::<_, PayrollPeriod>(&sql)
        .bind(year)
        .bind(year)
        .fetch_all(db)
        .await
}

pub async fn insert_period<'e, E>(db: E, period: &PayrollPeriod) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query("INSERT INTO payroll_periods (month, year, status) VALUES (?, ?, ?)")
        .bind(period.month)
        .bind(period.year)
        .bind(period.status)
        .execute(db)
        .await?;
    Ok(result.last_insert_id())
}

pub async fn save_period<'e, E>(db: E, period: &PayrollPeriod) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query(
        r#"
        UPDATE payroll_periods
        SET status = ?, total_salaries = ?, total_absence_deductions = ?, total_advances = ?,
            total_incentives = ?, net_total = ?, total_disbursed = ?, calculated_at = ?,
            approved_at = ?, approved_by = ?
        WHERE id = ?
        "#,
    )
    .bind(period.status)
    .bind(period.total_salaries)
    .bind(period.total_absence_deductions)
    .bind(period.total_advances)
    .bind(period.total_incentives)
    .bind(period.net_total)
    .bind(period.total_disbursed)
    .bind(period.calculated_at)
    .bind(period.approved_at)
    .bind(period.approved_by)
    .bind(period.id)
    .execute(db)
    .await?;

    Ok(result.rows_affected())
}

pub async fn items<'e, E>(db: E, period_id: u64) -> Result<Vec<PayrollItem>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query_as::<_, PayrollItem>(
        r#"
        SELECT id, period_id, worker_id, base_salary, work_days, absent_days, leave_days,
               paid_leave_allowance, unpaid_absent_days, lateness_deduction_days,
               absence_deduction, calculated_bonus, manual_incentives, advance_deduction, net_salary
        FROM payroll_items
        WHERE period_id = ?
        ORDER BY worker_id
        "#,
    )
    .bind(period_id)
    .fetch_all(db)
    .await
}

/// Drops the period's items and writes `computed` in their place.
pub async fn replace_items(
    conn: &mut MySqlConnection,
    period_id: u64,
    computed: &[ComputedItem],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM payroll_items WHERE period_id = ?")
        .bind(period_id)
        .execute(&mut *conn)
        .await?;

    if computed.is_empty() {
        return Ok(());
    }

    let mut qb: QueryBuilder<MySql> = QueryBuilder::new(
        "INSERT INTO payroll_items (period_id, worker_id, base_salary, work_days, absent_days, \
         leave_days, paid_leave_allowance, unpaid_absent_days, lateness_deduction_days, \
         absence_deduction, calculated_bonus, manual_incentives, advance_deduction, net_salary) ",
    );
    qb.push_values(computed, |mut row, item| {
        row.push_bind(period_id)
            .push_bind(item.worker_id)
            .push_bind(item.base_salary)
            .push_bind(item.work_days)
            .push_bind(item.absent_days)
            .push_bind(item.leave_days)
            .push_bind(item.paid_leave_allowance)
            .push_bind(item.unpaid_absent_days)
            .push_bind(item.lateness_deduction_days)
            .push_bind(item.absence_deduction)
            .push_bind(item.calculated_bonus)
            .push_bind(item.manual_incentives)
            .push_bind(item.advance_deduction)
            .push_bind(item.net_salary);
    });
    qb.build().execute(&mut *conn).await?;
    Ok(())
}

pub async fn disbursements<'e, E>(db: E, period_id: u64) -> Result<Vec<PayrollDisbursement>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query_as::<_, PayrollDisbursement>(
        r#"
        SELECT id, period_id, vault_id, amount, created_by, created_at
        FROM payroll_disbursements
        WHERE period_id = ?
        ORDER BY id
        "#,
    )
    .bind(period_id)
    .fetch_all(db)
    .await
}

pub async fn insert_disbursement<'e, E>(db: E, disbursement: &PayrollDisbursement) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO payroll_disbursements (period_id, vault_id, amount, created_by, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(disbursement.period_id)
    .bind(disbursement.vault_id)
    .bind(disbursement.amount)
    .bind(disbursement.created_by)
    .bind(disbursement.created_at)
    .execute(db)
    .await?;

    Ok(result.last_insert_id())
}

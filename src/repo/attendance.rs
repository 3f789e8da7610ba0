use chrono::NaiveDate;
use sqlx::{Executor, MySql};

use crate::model::attendance::AttendanceRecord;

const SELECT: &str = r#"
    SELECT id, worker_id, date, status, check_in_time, check_out_time, check_in_method,
           check_out_method, location_id, work_hours, late_minutes, notes
    FROM attendance_records
"#;

/// Filters for listing; `None` means unfiltered.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttendanceFilter {
    pub worker_id: Option<u64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Locks the row for the rest of the transaction.
pub async fn lock<'e, E>(db: E, id: u64) -> Result<Option<AttendanceRecord>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("{SELECT} WHERE id = ? FOR UPDATE");
    sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

/// The worker's row for `date`, locked for the rest of the transaction.
pub async fn lock_day<'e, E>(
    db: E,
    worker_id: u64,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("{SELECT} WHERE worker_id = ? AND date = ? FOR UPDATE");
    sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(worker_id)
        .bind(date)
        .fetch_optional(db)
        .await
}

pub async fn list<'e, E>(
    db: E,
    filter: AttendanceFilter,
    limit: u32,
    offset: u32,
) -> Result<Vec<AttendanceRecord>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!(
        "{SELECT}
        WHERE (? IS NULL OR worker_id = ?)
          AND (? IS NULL OR date >= ?)
          AND (? IS NULL OR date <= ?)
        ORDER BY date DESC, worker_id
        LIMIT ? OFFSET ?"
    );
    sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(filter.worker_id)
        .bind(filter.worker_id)
        .bind(filter.from)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.to)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
}

pub async fn count<'e, E>(db: E, filter: AttendanceFilter) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM attendance_records
        WHERE (? IS NULL OR worker_id = ?)
          AND (? IS NULL OR date >= ?)
          AND (? IS NULL OR date <= ?)
        "#,
    )
    .bind(filter.worker_id)
    .bind(filter.worker_id)
    .bind(filter.from)
    .bind(filter.from)
    .bind(filter.to)
    .bind(filter.to)
    .fetch_one(db)
    .await
}

/// Every row dated within `[from, to]`, all workers.
pub async fn list_between<'e, E>(
    db: E,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<AttendanceRecord>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("{SELECT} WHERE date BETWEEN ? AND ? ORDER BY worker_id, date");
    sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(from)
        .bind(to)
        .fetch_all(db)
        .await
}

pub async fn insert<'e, E>(db: E, record: &AttendanceRecord) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO attendance_records
            (worker_id, date, status, check_in_time, check_out_time, check_in_method,
             check_out_method, location_id, work_hours, late_minutes, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.worker_id)
    .bind(record.date)
    .bind(record.status)
    .bind(record.check_in_time)
    .bind(record.check_out_time)
    .bind(record.check_in_method)
    .bind(record.check_out_method)
    .bind(record.location_id)
    .bind(record.work_hours)
    .bind(record.late_minutes)
    .bind(&record.notes)
    .execute(db)
    .await?;

    Ok(result.last_insert_id())
}

pub async fn update<'e, E>(db: E, record: &AttendanceRecord) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query(
        r#"
        UPDATE attendance_records
        SET worker_id = ?, date = ?, status = ?, check_in_time = ?, check_out_time = ?,
            check_in_method = ?, check_out_method = ?, location_id = ?, work_hours = ?,
            late_minutes = ?, notes = ?
        WHERE id = ?
        "#,
    )
    .bind(record.worker_id)
    .bind(record.date)
    .bind(record.status)
    .bind(record.check_in_time)
    .bind(record.check_out_time)
    .bind(record.check_in_method)
    .bind(record.check_out_method)
    .bind(record.location_id)
    .bind(record.work_hours)
    .bind(record.late_minutes)
    .bind(&record.notes)
    .bind(record.id)
    .execute(db)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete<'e, E>(db: E, id: u64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query("DELETE FROM attendance_records WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

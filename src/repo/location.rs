use sqlx::{Executor, MySql};

use crate::model::location::CompanyLocation;

pub async fn list<'e, E>(db: E, active_only: bool) -> Result<Vec<CompanyLocation>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query_as::<_, CompanyLocation>(
        r#"
        SELECT id, name, name_ar, latitude, longitude, radius_meters, work_start_time, is_active
        FROM company_locations
        WHERE (? = FALSE OR is_active = TRUE)
        ORDER BY id
        "#,
    )
    .bind(active_only)
    .fetch_all(db)
    .await
}

pub async fn find<'e, E>(db: E, id: u64) -> Result<Option<CompanyLocation>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query_as::<_, CompanyLocation>(
        r#"
        SELECT id, name, name_ar, latitude, longitude, radius_meters, work_start_time, is_active
        FROM company_locations
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Inserts `location` (its `id` is ignored) and returns the new id.
pub async fn insert<'e, E>(db: E, location: &CompanyLocation) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO company_locations
            (name, name_ar, latitude, longitude, radius_meters, work_start_time, is_active)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&location.name)
    .bind(&location.name_ar)
    .bind(location.latitude)
    .bind(location.longitude)
    .bind(location.radius_meters)
    .bind(location.work_start_time)
    .bind(location.is_active)
    .execute(db)
    .await?;

    Ok(result.last_insert_id())
}

pub async fn update<'e, E>(db: E, location: &CompanyLocation) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query(
        r#"
        UPDATE company_locations
        SET name = ?, name_ar = ?, latitude = ?, longitude = ?, radius_meters = ?,
            work_start_time = ?, is_active = ?
        WHERE id = ?
        "#,
    )
    .bind(&location.name)
    .bind(&location.name_ar)
    .bind(location.latitude)
    .bind(location.longitude)
    .bind(location.radius_meters)
    .bind(location.work_start_time)
    .bind(location.is_active)
    .bind(location.id)
    .execute(db)
    .await?;

    Ok(result.rows_affected())
}

pub async fn is_referenced<'e, E>(db: E, id: u64) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attendance_records WHERE location_id = ?",
    )
    .bind(id)
    .fetch_one(db)
    .await?;
    Ok(count > 0)
}

pub async fn deactivate<'e, E>(db: E, id: u64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query("UPDATE company_locations SET is_active = FALSE WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete<'e, E>(db: E, id: u64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query("DELETE FROM company_locations WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

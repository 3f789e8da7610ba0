use chrono::NaiveDate;
use sqlx::{Executor, MySql};

use crate::model::holiday::PublicHoliday;

pub async fn list<'e, E>(db: E, active_only: bool) -> Result<Vec<PublicHoliday>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query_as::<_, PublicHoliday>(
        r#"
        SELECT id, name, date, is_active
        FROM public_holidays
        WHERE (? = FALSE OR is_active = TRUE)
        ORDER BY date
        "#,
    )
    .bind(active_only)
    .fetch_all(db)
    .await
}

pub async fn list_between<'e, E>(
    db: E,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<PublicHoliday>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query_as::<_, PublicHoliday>(
        r#"
        SELECT id, name, date, is_active
        FROM public_holidays
        WHERE date BETWEEN ? AND ? AND is_active = TRUE
        ORDER BY date
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(db)
    .await
}

pub async fn insert<'e, E>(db: E, name: &str, date: NaiveDate) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query("INSERT INTO public_holidays (name, date, is_active) VALUES (?, ?, TRUE)")
        .bind(name)
        .bind(date)
        .execute(db)
        .await?;
    Ok(result.last_insert_id())
}

pub async fn deactivate<'e, E>(db: E, id: u64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query("UPDATE public_holidays SET is_active = FALSE WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

use sqlx::{Executor, MySql};

use crate::model::worker::Worker;

pub async fn find<'e, E>(db: E, id: u64) -> Result<Option<Worker>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query_as::<_, Worker>(
        r#"
        SELECT id, name, phone, base_salary, hire_date, is_active
        FROM workers
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn list_active<'e, E>(db: E) -> Result<Vec<Worker>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query_as::<_, Worker>(
        r#"
        SELECT id, name, phone, base_salary, hire_date, is_active
        FROM workers
        WHERE is_active = TRUE
        ORDER BY id
        "#,
    )
    .fetch_all(db)
    .await
}

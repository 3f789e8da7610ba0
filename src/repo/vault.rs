use rust_decimal::Decimal;
use sqlx::{Executor, MySql};

use crate::model::vault::Vault;

pub async fn list<'e, E>(db: E, active_only: bool) -> Result<Vec<Vault>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query_as::<_, Vault>(
        r#"
        SELECT id, name, balance, is_active
        FROM vaults
        WHERE (? = FALSE OR is_active = TRUE)
        ORDER BY id
        "#,
    )
    .bind(active_only)
    .fetch_all(db)
    .await
}

/// Reads the vault and holds its row lock until the transaction ends. Every
/// balance change must go through this first.
pub async fn lock<'e, E>(db: E, id: u64) -> Result<Option<Vault>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query_as::<_, Vault>(
        r#"
        SELECT id, name, balance, is_active
        FROM vaults
        WHERE id = ?
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn save_balance<'e, E>(db: E, id: u64, balance: Decimal) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query("UPDATE vaults SET balance = ? WHERE id = ?")
        .bind(balance)
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

use actix_web::{HttpResponse, web};
use sqlx::MySqlPool;

use crate::api::{ActiveQuery, ok};
use crate::auth::auth::AuthUser;
use crate::error::HrError;
use crate::model::vault::Vault;
use crate::repo;

#[utoipa::path(
    get,
    path = "/api/vaults",
    params(ActiveQuery),
    responses(
        (status = 200, description = "Vaults with current balances", body = [Vault]),
        (status = 403, description = "Admin/Accountant only")
    ),
    security(("bearer_auth" = [])),
    tag = "Vaults"
)]
pub async fn list_vaults(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ActiveQuery>,
) -> Result<HttpResponse, HrError> {
    auth.require_finance()?;
    let vaults = repo::vault::list(pool.get_ref(), !query.include_inactive).await?;
    Ok(ok(vaults))
}

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

pub type HrResult<T> = Result<T, HrError>;

/// Every failure a core operation can report. Rendered at the HTTP boundary
/// as `{ "success": false, "error": <code>, "message": <text> }`.
#[derive(Debug, Display)]
pub enum HrError {
    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "{}", _0)]
    Conflict(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "insufficient funds in vault {}: balance {}, requested {}", vault_id, balance, requested)]
    InsufficientFunds {
        vault_id: u64,
        balance: rust_decimal::Decimal,
        requested: rust_decimal::Decimal,
    },

    #[display(fmt = "{}", _0)]
    Forbidden(String),

    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
}

impl std::error::Error for HrError {}

impl From<sqlx::Error> for HrError {
    fn from(err: sqlx::Error) -> Self {
        HrError::Database(err)
    }
}

impl HrError {
    pub fn validation(msg: impl Into<String>) -> Self {
        HrError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        HrError::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        HrError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        HrError::Forbidden(msg.into())
    }

    /// Machine readable discriminator for the envelope.
    pub fn code(&self) -> &'static str {
        match self {
            HrError::Validation(_) => "validation_error",
            HrError::Conflict(_) => "conflict",
            HrError::NotFound(_) => "not_found",
            HrError::InsufficientFunds { .. } => "insufficient_funds",
            HrError::Forbidden(_) => "forbidden",
            HrError::Database(_) => "internal_error",
        }
    }

    /// Duplicate key on insert (MySQL 1062, SQLSTATE 23000).
    pub fn is_unique_violation(&self) -> bool {
        match self {
            HrError::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

impl ResponseError for HrError {
    fn status_code(&self) -> StatusCode {
        match self {
            HrError::Validation(_) => StatusCode::BAD_REQUEST,
            HrError::Conflict(_) => StatusCode::CONFLICT,
            HrError::NotFound(_) => StatusCode::NOT_FOUND,
            HrError::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            HrError::Forbidden(_) => StatusCode::FORBIDDEN,
            HrError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            HrError::Database(e) => {
                tracing::error!(error = %e, "Database operation failed");
                "Something went wrong, Contact with system admin".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": self.code(),
            "message": message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use rust_decimal_macros::dec;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(HrError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(HrError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(HrError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(HrError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        let funds = HrError::InsufficientFunds {
            vault_id: 1,
            balance: dec!(10),
            requested: dec!(20),
        };
        assert_eq!(funds.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            HrError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn error_envelope_carries_code_and_message() {
        let resp = HrError::conflict("Already checked in today").error_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "conflict");
        assert_eq!(value["message"], "Already checked in today");
    }

    #[actix_web::test]
    async fn database_errors_hide_details() {
        let resp = HrError::Database(sqlx::Error::PoolTimedOut).error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "internal_error");
        assert!(!value["message"].as_str().unwrap().contains("pool"));
    }
}

use serde::{Deserialize, Serialize};

/// Access token claims as issued by the identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,

    /// Present only if this user is linked to a worker record
    #[serde(default)]
    pub worker_id: Option<u64>,
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct DbUser {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    /// Escrow copy for administrative display; NULL when never captured.
    pub plain_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct DbQueryLog {
    pub id: i64,
    pub username: String,
    pub cas_number: String,
    pub usage_purpose: String,
    pub queried_at: String,
    pub result_summary: String,
}

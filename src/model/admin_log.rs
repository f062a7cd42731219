use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminLog {
    pub id: u64,
    pub admin: String,
    pub action: String,
    pub occurred_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAdminLog {
    pub admin: String,
    pub action: String,
    pub occurred_at: i64,
}

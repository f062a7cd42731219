use serde::{Deserialize, Serialize};

/// The single board message. Each admin write replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub text: String,
    pub updated_by: String,
    pub updated_at: i64,
}

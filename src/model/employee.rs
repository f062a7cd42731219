use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::attendance::SessionKind;
use super::role::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "username": "dina",
        "display_name": "Dina",
        "role": "staff",
        "capabilities": ["general", "live"]
    })
)]
pub struct EmployeeProfile {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "dina")]
    pub username: String,

    /// Name carried by attendance events.
    #[schema(example = "Dina")]
    pub display_name: String,

    pub role: Role,

    #[schema(value_type = Vec<SessionKind>)]
    pub capabilities: BTreeSet<SessionKind>,
}

impl EmployeeProfile {
    pub fn can_attend(&self, kind: SessionKind) -> bool {
        self.capabilities.contains(&kind)
    }
}

/// Stored credential row. Never serialized.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub profile: EmployeeProfile,
    pub password_hash: String,
    pub last_updated: i64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewEmployee {
    #[schema(example = "dina")]
    pub username: String,
    #[schema(example = "Dina")]
    pub display_name: String,
    #[schema(example = "rahasia123")]
    pub password: String,
    pub role: Role,
    #[schema(value_type = Vec<SessionKind>)]
    pub capabilities: BTreeSet<SessionKind>,
}

/// Comma separated form used by the `employees.capabilities` column.
pub fn capabilities_to_column(capabilities: &BTreeSet<SessionKind>) -> String {
    capabilities
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Unknown entries are dropped.
pub fn capabilities_from_column(raw: &str) -> BTreeSet<SessionKind> {
    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}

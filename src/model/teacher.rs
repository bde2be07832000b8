use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Directory entity, consumed read-only by the leave subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": "t-1001",
        "name": "Maria Santos",
        "schoolId": "s-01",
        "position": "Math Teacher",
        "roles": ["teacher"]
    })
)]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub school_id: String,
    pub position: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

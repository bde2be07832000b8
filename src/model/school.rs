use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct School {
    #[schema(example = "s-01")]
    pub id: String,
    #[schema(example = "San Isidro Elementary School")]
    pub name: String,
    #[schema(example = "San Isidro, Nueva Ecija")]
    pub address: String,
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub environment: String,
}

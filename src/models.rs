use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// DashboardStats
///
/// Headline numbers on the admin dashboard. These are fixed placeholder values until the
/// dashboard is wired to the business tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub clients: u32,
    pub projects: u32,
    pub posts: u32,
}

impl DashboardStats {
    pub fn placeholder() -> Self {
        Self {
            clients: 12,
            projects: 8,
            posts: 24,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Ok,
    Unavailable,
}

/// DatabaseHealth
///
/// Response body of `GET /health/db`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DatabaseHealth {
    pub status: HealthState,
    pub backend: String,
}

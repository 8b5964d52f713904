use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::Role;

/// Request to run a batch match
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RunMatchRequest {
    #[serde(alias = "client_ids", rename = "clientIds", default)]
    pub client_ids: Vec<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Falls back to the configured default when absent
    #[validate(range(min = 1, max = 100))]
    #[serde(alias = "top_k", rename = "topK", default)]
    pub top_k: Option<u16>,
    #[serde(alias = "include_excluded", rename = "includeExcluded", default)]
    pub include_excluded: bool,
    #[serde(alias = "prospects_only", rename = "prospectsOnly", default)]
    pub prospects_only: bool,
}

/// Request to score a single client/advisor pair
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScorePairRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "client_id", rename = "clientId")]
    pub client_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "advisor_id", rename = "advisorId")]
    pub advisor_id: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Lead
}

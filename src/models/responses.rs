use serde::{Deserialize, Serialize};
use crate::core::{Contribution, DataWarning};
use crate::models::domain::{Explanation, Role};

/// Response for the single-pair scoring endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorePairResponse {
    #[serde(rename = "clientId")]
    pub client_id: String,
    #[serde(rename = "advisorId")]
    pub advisor_id: String,
    pub role: Role,
    pub score: u8,
    #[serde(rename = "rawScore")]
    pub raw_score: f64,
    #[serde(rename = "segmentMultiplier")]
    pub segment_multiplier: f64,
    #[serde(rename = "capacityPct")]
    pub capacity_pct: u8,
    pub eligible: bool,
    pub contributions: Vec<Contribution>,
    pub explanation: Explanation,
    #[serde(default)]
    pub warnings: Vec<DataWarning>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub advisors: usize,
    pub clients: usize,
    pub subtopics: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Snapshot replacement response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub advisors: usize,
    pub clients: usize,
    pub subtopics: usize,
}

// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Advisor, AdvisorSkillRecord, Client, ClientNeedRecord, ComplexityTier, Domain, ExclusionReason,
    Explanation, Horizon, MatchResult, MatchRun, Role, Segment, SnapshotData, Subtopic,
};
pub use requests::{RunMatchRequest, ScorePairRequest};
pub use responses::{ErrorResponse, HealthResponse, ScorePairResponse, SnapshotResponse};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Top-level taxonomy grouping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub id: String,
    pub name: String,
    #[serde(rename = "displayOrder", default)]
    pub display_order: i32,
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
}

/// Leaf taxonomy unit; the unit of both skill measurement and need specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtopic {
    pub id: String,
    #[serde(rename = "domainId")]
    pub domain_id: String,
    pub name: String,
    #[serde(rename = "defaultWeight", default = "default_weight")]
    pub default_weight: f64,
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool { true }
fn default_weight() -> f64 { 1.0 }

/// One assessment of an advisor in one subtopic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorSkillRecord {
    #[serde(rename = "subtopicId")]
    pub subtopic_id: String,
    #[serde(rename = "skillLevel")]
    pub skill_level: f64,
    #[serde(rename = "caseCount", default)]
    pub case_count: u32,
    #[serde(rename = "lastAssessedAt", default)]
    pub last_assessed_at: Option<DateTime<Utc>>,
}

/// Planning horizon of a client need, nearest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    Immediate,
    OneYear,
    ThreeYear,
    FiveYear,
}

/// One client need in one subtopic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientNeedRecord {
    #[serde(rename = "subtopicId")]
    pub subtopic_id: String,
    pub importance: f64,
    pub urgency: f64,
    pub horizon: Horizon,
}

/// Client segment, also used as an advisor's target segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Essentials,
    Traditional,
    PrivateClient,
    UltraHnw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityTier {
    Standard,
    Complex,
    HighlyComplex,
}

/// Role an advisor takes on for a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Lead,
    Backup,
    Support,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Lead => "lead",
            Role::Backup => "backup",
            Role::Support => "support",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advisor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "maxFamilies")]
    pub max_families: u32,
    #[serde(rename = "currentFamilies")]
    pub current_families: u32,
    #[serde(rename = "targetSegment")]
    pub target_segment: Segment,
    #[serde(rename = "yearsExperience", default)]
    pub years_experience: u16,
    #[serde(default)]
    pub skills: Vec<AdvisorSkillRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub segment: Segment,
    #[serde(rename = "complexityTier")]
    pub complexity_tier: ComplexityTier,
    #[serde(rename = "isProspect", default)]
    pub is_prospect: bool,
    #[serde(default)]
    pub needs: Vec<ClientNeedRecord>,
}

/// Raw snapshot as supplied by the data layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotData {
    #[serde(default)]
    pub domains: Vec<Domain>,
    #[serde(default)]
    pub subtopics: Vec<Subtopic>,
    #[serde(default)]
    pub advisors: Vec<Advisor>,
    #[serde(default)]
    pub clients: Vec<Client>,
}

/// Why a candidate was left out of a ranked list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    AtCapacity { role: Role, current: u32, max: u32 },
    OverCapacity { role: Role, current: u32, max: u32 },
    NoCapacity { role: Role },
    BelowFloor { score: u8, floor: u8 },
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::AtCapacity { role, current, max } => {
                write!(f, "at capacity for {} role ({}/{})", role, current, max)
            }
            ExclusionReason::OverCapacity { role, current, max } => {
                write!(f, "over capacity for {} role ({}/{})", role, current, max)
            }
            ExclusionReason::NoCapacity { role } => {
                write!(f, "no capacity configured for {} role", role)
            }
            ExclusionReason::BelowFloor { score, floor } => {
                write!(f, "score {} below floor {}", score, floor)
            }
        }
    }
}

/// Human-readable account of a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Explanation {
    Included {
        #[serde(rename = "topDrivers")]
        top_drivers: Vec<String>,
        gaps: Vec<String>,
    },
    Excluded {
        reasons: Vec<ExclusionReason>,
    },
}

impl Explanation {
    pub fn is_excluded(&self) -> bool {
        matches!(self, Explanation::Excluded { .. })
    }

    /// Disqualifying reasons as display strings; `None` for included candidates
    pub fn why_not(&self) -> Option<Vec<String>> {
        match self {
            Explanation::Included { .. } => None,
            Explanation::Excluded { reasons } => {
                Some(reasons.iter().map(ToString::to_string).collect())
            }
        }
    }
}

/// One (run, client, advisor, role) outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(rename = "matchRunId")]
    pub match_run_id: Uuid,
    #[serde(rename = "clientId")]
    pub client_id: String,
    #[serde(rename = "advisorId")]
    pub advisor_id: String,
    pub role: Role,
    pub score: u8,
    /// 1-based position in the ranked list; absent for excluded candidates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    pub explanation: Explanation,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Output of one batch invocation of the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRun {
    pub id: Uuid,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub results: Vec<MatchResult>,
    #[serde(default)]
    pub excluded: Vec<MatchResult>,
    #[serde(default)]
    pub warnings: Vec<crate::core::DataWarning>,
}

impl MatchRun {
    /// Ranked results for one client and role, in rank order
    pub fn ranked_for<'a>(
        &'a self,
        client_id: &'a str,
        role: Role,
    ) -> impl Iterator<Item = &'a MatchResult> + 'a {
        self.results
            .iter()
            .filter(move |r| r.client_id == client_id && r.role == role)
    }
}

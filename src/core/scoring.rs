use serde::{Deserialize, Serialize};

use crate::core::coverage::CoverageIndex;
use crate::core::needs::NeedProfile;
use crate::models::{Horizon, Segment};

/// Multipliers applied per planning horizon; nearer horizons weigh more
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonFactors {
    pub immediate: f64,
    pub one_year: f64,
    pub three_year: f64,
    pub five_year: f64,
}

impl Default for HorizonFactors {
    fn default() -> Self {
        Self {
            immediate: 1.5,
            one_year: 1.25,
            three_year: 1.0,
            five_year: 0.8,
        }
    }
}

impl HorizonFactors {
    #[inline]
    pub fn factor(&self, horizon: Horizon) -> f64 {
        match horizon {
            Horizon::Immediate => self.immediate,
            Horizon::OneYear => self.one_year,
            Horizon::ThreeYear => self.three_year,
            Horizon::FiveYear => self.five_year,
        }
    }
}

/// Static scoring configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringParams {
    /// Raw score given to a client with no weighted needs
    pub neutral_baseline: f64,
    /// Multiplier when the advisor targets the client's segment; never below 1.0
    pub segment_bonus: f64,
    pub skill_scale_max: f64,
    /// Importance above this is capped, keeping need weights finite
    pub importance_scale_max: f64,
    pub urgency_scale_max: f64,
    pub horizon: HorizonFactors,
    /// Coverage ratio at or above which a subtopic may be a top driver
    pub strong_threshold: f64,
    /// Coverage ratio at or below which a subtopic may be a gap
    pub weak_threshold: f64,
    /// Share of total need weight a subtopic must carry to be mentioned
    pub min_weight_share: f64,
    pub max_drivers: usize,
    pub max_gaps: usize,
    /// Candidates scoring below this are excluded from ranked lists
    pub min_score: u8,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            neutral_baseline: 50.0,
            segment_bonus: 1.1,
            skill_scale_max: 10.0,
            importance_scale_max: 5.0,
            urgency_scale_max: 5.0,
            horizon: HorizonFactors::default(),
            strong_threshold: 0.7,
            weak_threshold: 0.4,
            min_weight_share: 0.05,
            max_drivers: 3,
            max_gaps: 3,
            min_score: 0,
        }
    }
}

impl ScoringParams {
    /// Check the invariants the scoring formula depends on
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.neutral_baseline) {
            return Err(format!("neutral_baseline {} outside 0..=100", self.neutral_baseline));
        }
        if !(self.segment_bonus >= 1.0) {
            return Err(format!("segment_bonus {} must be at least 1.0", self.segment_bonus));
        }
        let scales = [self.skill_scale_max, self.importance_scale_max, self.urgency_scale_max];
        if !scales.iter().all(|s| s.is_finite() && *s > 0.0) {
            return Err("skill, importance and urgency scales must be positive".to_string());
        }
        let h = &self.horizon;
        let decreasing = h.immediate > h.one_year
            && h.one_year > h.three_year
            && h.three_year > h.five_year
            && h.five_year > 0.0;
        if !decreasing || !h.immediate.is_finite() {
            return Err(
                "horizon factors must be finite, positive and strictly decreasing".to_string(),
            );
        }
        if !(self.weak_threshold < self.strong_threshold) {
            return Err("weak_threshold must be below strong_threshold".to_string());
        }
        Ok(())
    }
}

/// Weight and coverage of one client need against one advisor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    #[serde(rename = "subtopicId")]
    pub subtopic_id: String,
    #[serde(rename = "subtopicName")]
    pub subtopic_name: String,
    pub weight: f64,
    pub coverage: f64,
}

impl Contribution {
    #[inline]
    pub fn weighted(&self) -> f64 {
        self.weight * self.coverage
    }
}

/// Score of one (client, advisor) pair with the intermediate values behind it
#[derive(Debug, Clone, PartialEq)]
pub struct PairScore {
    pub score: u8,
    /// Weighted coverage on the 0..=100 scale, before the segment bonus
    pub raw_score: f64,
    pub segment_multiplier: f64,
    pub total_weight: f64,
    /// In subtopic id order
    pub contributions: Vec<Contribution>,
}

/// `horizon_factor * (0.5 + 0.5 * u / u_max)` with `u` clamped to `0..=u_max`
///
/// Strictly increasing in urgency across the scale and in horizon nearness,
/// ranging from half the horizon factor up to the full factor.
#[inline]
pub fn urgency_factor(urgency: f64, horizon: Horizon, params: &ScoringParams) -> f64 {
    let scaled = urgency.clamp(0.0, params.urgency_scale_max) / params.urgency_scale_max;
    params.horizon.factor(horizon) * (0.5 + 0.5 * scaled)
}

#[inline]
pub fn coverage_ratio(skill_level: f64, params: &ScoringParams) -> f64 {
    (skill_level / params.skill_scale_max).clamp(0.0, 1.0)
}

#[inline]
pub fn segment_multiplier(
    client: Segment,
    advisor_target: Segment,
    params: &ScoringParams,
) -> f64 {
    if client == advisor_target {
        params.segment_bonus.max(1.0)
    } else {
        1.0
    }
}

/// Calculate the fit score (0-100) of an advisor for a client
///
/// ```text
/// weight_i   = min(importance_i, importance_scale_max)
///              * urgency_factor(urgency_i, horizon_i) * default_weight_i
/// coverage_i = min(skill_i / skill_scale_max, 1)
/// raw        = 100 * Σ weight_i * coverage_i / Σ weight_i
///              (neutral baseline if Σ weight_i = 0)
/// score      = round(min(raw * segment_multiplier, 100))
/// ```
pub fn calculate_pair_score(
    profile: &NeedProfile,
    coverage: &CoverageIndex,
    client_segment: Segment,
    advisor_segment: Segment,
    params: &ScoringParams,
) -> PairScore {
    let contributions: Vec<Contribution> = profile
        .iter()
        .map(|need| Contribution {
            subtopic_id: need.subtopic_id.clone(),
            subtopic_name: need.subtopic_name.clone(),
            weight: need.importance.min(params.importance_scale_max)
                * urgency_factor(need.urgency, need.horizon, params)
                * need.default_weight,
            coverage: coverage_ratio(coverage.level(&need.subtopic_id), params),
        })
        .collect();

    let total_weight: f64 = contributions.iter().map(|c| c.weight).sum();
    let raw_score = if total_weight > 0.0 {
        let weighted: f64 = contributions.iter().map(Contribution::weighted).sum();
        (weighted / total_weight * 100.0).clamp(0.0, 100.0)
    } else {
        params.neutral_baseline
    };

    let multiplier = segment_multiplier(client_segment, advisor_segment, params);
    let score = (raw_score * multiplier).min(100.0).max(0.0).round() as u8;

    PairScore {
        score,
        raw_score,
        segment_multiplier: multiplier,
        total_weight,
        contributions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::taxonomy::Taxonomy;
    use crate::models::{
        Advisor, AdvisorSkillRecord, Client, ClientNeedRecord, ComplexityTier, Domain, Subtopic,
    };

    fn taxonomy() -> Taxonomy {
        let subtopic = |id: &str, weight: f64| Subtopic {
            id: id.to_string(),
            domain_id: "wealth".to_string(),
            name: id.to_string(),
            default_weight: weight,
            is_active: true,
        };
        Taxonomy::build(
            vec![Domain {
                id: "wealth".to_string(),
                name: "Wealth".to_string(),
                display_order: 1,
                is_active: true,
            }],
            vec![subtopic("estate", 2.0), subtopic("tax", 1.0), subtopic("equity", 1.0)],
        )
        .unwrap()
    }

    fn client(needs: &[(&str, f64, f64, Horizon)]) -> Client {
        Client {
            id: "c1".to_string(),
            name: "Client".to_string(),
            segment: Segment::PrivateClient,
            complexity_tier: ComplexityTier::Complex,
            is_prospect: false,
            needs: needs
                .iter()
                .map(|(s, importance, urgency, horizon)| ClientNeedRecord {
                    subtopic_id: s.to_string(),
                    importance: *importance,
                    urgency: *urgency,
                    horizon: *horizon,
                })
                .collect(),
        }
    }

    fn advisor(skills: &[(&str, f64)], segment: Segment) -> Advisor {
        Advisor {
            id: "a1".to_string(),
            name: "Advisor".to_string(),
            max_families: 10,
            current_families: 2,
            target_segment: segment,
            years_experience: 8,
            skills: skills
                .iter()
                .map(|(s, level)| AdvisorSkillRecord {
                    subtopic_id: s.to_string(),
                    skill_level: *level,
                    case_count: 3,
                    last_assessed_at: None,
                })
                .collect(),
        }
    }

    fn score(client: &Client, advisor: &Advisor) -> PairScore {
        let taxonomy = taxonomy();
        let mut warnings = Vec::new();
        let profile = NeedProfile::build(client, &taxonomy, &mut warnings);
        let coverage = CoverageIndex::build(advisor, &taxonomy, &mut warnings);
        calculate_pair_score(
            &profile,
            &coverage,
            client.segment,
            advisor.target_segment,
            &ScoringParams::default(),
        )
    }

    #[test]
    fn test_urgency_factor_monotonic() {
        let params = ScoringParams::default();
        let horizons = [
            Horizon::Immediate,
            Horizon::OneYear,
            Horizon::ThreeYear,
            Horizon::FiveYear,
        ];
        for pair in horizons.windows(2) {
            assert!(urgency_factor(3.0, pair[0], &params) > urgency_factor(3.0, pair[1], &params));
        }
        for u in 0..5 {
            let low = urgency_factor(u as f64, Horizon::ThreeYear, &params);
            let high = urgency_factor((u + 1) as f64, Horizon::ThreeYear, &params);
            assert!(high > low);
        }
        assert_eq!(urgency_factor(5.0, Horizon::Immediate, &params), 1.5);
        assert_eq!(urgency_factor(0.0, Horizon::ThreeYear, &params), 0.5);
    }

    #[test]
    fn test_full_coverage_scores_100() {
        let c = client(&[("estate", 5.0, 5.0, Horizon::Immediate)]);
        let a = advisor(&[("estate", 10.0)], Segment::Essentials);
        let result = score(&c, &a);
        assert_eq!(result.score, 100);
        assert_eq!(result.segment_multiplier, 1.0);
    }

    #[test]
    fn test_weighted_average() {
        // estate weight 2x tax weight at equal importance and urgency
        let c = client(&[
            ("estate", 3.0, 3.0, Horizon::OneYear),
            ("tax", 3.0, 3.0, Horizon::OneYear),
        ]);
        let a = advisor(&[("estate", 10.0)], Segment::Essentials);
        let result = score(&c, &a);
        assert!((result.raw_score - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.score, 67);
    }

    #[test]
    fn test_skill_above_scale_is_capped() {
        let c = client(&[("tax", 4.0, 2.0, Horizon::FiveYear)]);
        let a = advisor(&[("tax", 14.0)], Segment::Essentials);
        assert_eq!(score(&c, &a).contributions[0].coverage, 1.0);
    }

    #[test]
    fn test_monotonic_in_skill_level() {
        let c = client(&[
            ("estate", 4.0, 2.0, Horizon::ThreeYear),
            ("tax", 2.0, 5.0, Horizon::Immediate),
            ("equity", 1.0, 1.0, Horizon::FiveYear),
        ]);
        let mut previous = 0;
        for level in 0..=12 {
            let a = advisor(
                &[("estate", 6.0), ("tax", level as f64), ("equity", 3.0)],
                Segment::Essentials,
            );
            let s = score(&c, &a).score;
            assert!(s >= previous, "score dropped at level {}", level);
            previous = s;
        }
    }

    #[test]
    fn test_zero_needs_neutral_baseline() {
        let c = client(&[]);
        let expert = advisor(&[("estate", 10.0), ("tax", 10.0)], Segment::Essentials);
        let novice = advisor(&[], Segment::Traditional);
        assert_eq!(score(&c, &expert).score, 50);
        assert_eq!(score(&c, &novice).score, 50);
    }

    #[test]
    fn test_zero_importance_falls_back_to_baseline() {
        let c = client(&[("tax", 0.0, 5.0, Horizon::Immediate)]);
        let a = advisor(&[], Segment::Essentials);
        let result = score(&c, &a);
        assert_eq!(result.total_weight, 0.0);
        assert_eq!(result.score, 50);
    }

    #[test]
    fn test_segment_bonus_applies_to_baseline() {
        let c = client(&[]);
        let matched = advisor(&[], Segment::PrivateClient);
        assert_eq!(score(&c, &matched).score, 55);
    }

    #[test]
    fn test_segment_match_never_decreases() {
        let c = client(&[
            ("estate", 5.0, 4.0, Horizon::OneYear),
            ("tax", 2.0, 1.0, Horizon::ThreeYear),
        ]);
        for level in [0.0, 3.0, 7.0, 10.0] {
            let matched = score(&c, &advisor(&[("estate", level)], Segment::PrivateClient));
            let mismatched = score(&c, &advisor(&[("estate", level)], Segment::UltraHnw));
            assert!(matched.score >= mismatched.score);
            assert!(matched.score <= 100);
        }
    }

    #[test]
    fn test_contributions_deterministic() {
        let c = client(&[
            ("tax", 2.0, 3.0, Horizon::OneYear),
            ("estate", 4.0, 1.0, Horizon::Immediate),
            ("equity", 3.0, 2.0, Horizon::FiveYear),
        ]);
        let a = advisor(&[("tax", 4.0), ("equity", 8.0)], Segment::Essentials);
        let first = score(&c, &a);
        for _ in 0..10 {
            assert_eq!(score(&c, &a), first);
        }
        let ids: Vec<&str> = first.contributions.iter().map(|c| c.subtopic_id.as_str()).collect();
        assert_eq!(ids, vec!["equity", "estate", "tax"]);
    }

    #[test]
    fn test_oversized_importance_is_capped() {
        let c = client(&[
            ("tax", 1e308, 5.0, Horizon::Immediate),
            ("equity", 1e308, 5.0, Horizon::Immediate),
        ]);
        let result = score(&c, &advisor(&[], Segment::Essentials));
        assert!(result.total_weight.is_finite());
        assert_eq!(result.contributions[0].weight, 7.5);
        assert_eq!(result.score, 0);

        let gaps = crate::core::explain::gaps(&result, &ScoringParams::default());
        assert_eq!(gaps, vec!["equity", "tax"]);
    }

    #[test]
    fn test_default_params_valid() {
        assert!(ScoringParams::default().validate().is_ok());

        let mut params = ScoringParams::default();
        params.horizon.one_year = 2.0;
        assert!(params.validate().is_err());

        let mut params = ScoringParams::default();
        params.segment_bonus = 0.9;
        assert!(params.validate().is_err());

        let mut params = ScoringParams::default();
        params.horizon.immediate = f64::INFINITY;
        assert!(params.validate().is_err());
    }
}

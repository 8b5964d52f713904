use crate::core::scoring::{Contribution, PairScore, ScoringParams};
use crate::models::{ExclusionReason, Explanation};

/// Contributions carrying at least the minimum share of total need weight
fn material<'a>(
    score: &'a PairScore,
    params: &'a ScoringParams,
) -> impl Iterator<Item = &'a Contribution> + 'a {
    let total = score.total_weight;
    score
        .contributions
        .iter()
        .filter(move |c| {
            total > 0.0 && c.weight > 0.0 && c.weight / total >= params.min_weight_share
        })
}

/// Well-covered subtopics, largest weighted contribution first
pub fn top_drivers(score: &PairScore, params: &ScoringParams) -> Vec<String> {
    let mut drivers: Vec<&Contribution> = material(score, params)
        .filter(|c| c.coverage >= params.strong_threshold)
        .collect();

    drivers.sort_by(|a, b| {
        b.weighted()
            .total_cmp(&a.weighted())
            .then_with(|| a.subtopic_id.cmp(&b.subtopic_id))
    });

    drivers
        .into_iter()
        .take(params.max_drivers)
        .map(|c| c.subtopic_name.clone())
        .collect()
}

/// Poorly covered subtopics, weakest coverage first
pub fn gaps(score: &PairScore, params: &ScoringParams) -> Vec<String> {
    let mut gaps: Vec<&Contribution> = material(score, params)
        .filter(|c| c.coverage <= params.weak_threshold)
        .collect();

    gaps.sort_by(|a, b| {
        a.coverage
            .total_cmp(&b.coverage)
            .then_with(|| a.subtopic_id.cmp(&b.subtopic_id))
    });

    gaps.into_iter()
        .take(params.max_gaps)
        .map(|c| c.subtopic_name.clone())
        .collect()
}

/// Build the explanation for a scored pair
///
/// Any exclusion reason makes the explanation `Excluded`; otherwise the
/// drivers and gaps are derived from the score's contributions.
pub fn explain(
    score: &PairScore,
    reasons: Vec<ExclusionReason>,
    params: &ScoringParams,
) -> Explanation {
    if reasons.is_empty() {
        Explanation::Included {
            top_drivers: top_drivers(score, params),
            gaps: gaps(score, params),
        }
    } else {
        Explanation::Excluded { reasons }
    }
}

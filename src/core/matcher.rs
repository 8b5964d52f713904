use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::core::{
    capacity::{self, CapacityDecision},
    coverage::CoverageIndex,
    error::{DataWarning, MatchError},
    explain::explain,
    needs::NeedProfile,
    scoring::{calculate_pair_score, PairScore, ScoringParams},
    taxonomy::Taxonomy,
};
use crate::models::{Advisor, Client, ExclusionReason, Explanation, MatchResult, MatchRun, Role};

/// Explicit parameters of one match run
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub roles: Vec<Role>,
    pub top_k: usize,
    /// Also emit `Excluded` results for candidates the gate or floor rejected
    pub include_excluded: bool,
}

impl RunSpec {
    pub fn new(roles: Vec<Role>, top_k: usize) -> Self {
        Self {
            roles,
            top_k,
            include_excluded: false,
        }
    }

    pub fn with_excluded(mut self) -> Self {
        self.include_excluded = true;
        self
    }

    /// Requested roles without repeats, in request order; lead when none given
    fn effective_roles(&self) -> Vec<Role> {
        let mut seen = HashSet::new();
        let roles: Vec<Role> = self.roles.iter().copied().filter(|r| seen.insert(*r)).collect();
        if roles.is_empty() {
            vec![Role::Lead]
        } else {
            roles
        }
    }
}

impl Default for RunSpec {
    fn default() -> Self {
        Self::new(vec![Role::Lead], 5)
    }
}

/// Advisor with its coverage index, built once per run
#[derive(Debug, Clone)]
struct Candidate {
    advisor: Advisor,
    coverage: CoverageIndex,
}

#[derive(Debug, Clone)]
struct CandidatePool {
    candidates: Vec<Candidate>,
}

impl CandidatePool {
    fn build(
        pool: &[Advisor],
        taxonomy: &Taxonomy,
        warnings: &mut Vec<DataWarning>,
    ) -> Result<Self, MatchError> {
        if pool.is_empty() {
            return Err(MatchError::EmptyCandidatePool);
        }

        let mut seen = HashSet::with_capacity(pool.len());
        let mut candidates = Vec::with_capacity(pool.len());
        for advisor in pool {
            if !seen.insert(advisor.id.as_str()) {
                DataWarning::DuplicateAdvisor {
                    advisor_id: advisor.id.clone(),
                }
                .record(warnings);
                continue;
            }
            candidates.push(Candidate {
                coverage: CoverageIndex::build(advisor, taxonomy, warnings),
                advisor: advisor.clone(),
            });
        }

        Ok(Self { candidates })
    }
}

/// Everything produced for one client
#[derive(Debug, Default)]
struct ClientOutcome {
    results: Vec<MatchResult>,
    excluded: Vec<MatchResult>,
    warnings: Vec<DataWarning>,
}

/// Single-pair evaluation, as used for ad hoc "why this advisor" inspection
#[derive(Debug, Clone)]
pub struct PairEvaluation {
    pub client_id: String,
    pub advisor_id: String,
    pub role: Role,
    pub pair: PairScore,
    pub capacity: CapacityDecision,
    pub capacity_pct: u8,
    pub explanation: Explanation,
    pub warnings: Vec<DataWarning>,
}

impl PairEvaluation {
    pub fn score(&self) -> u8 {
        self.pair.score
    }

    pub fn is_eligible(&self) -> bool {
        !self.explanation.is_excluded()
    }
}

/// Match run orchestrator
///
/// # Pipeline
/// 1. Coverage index per advisor (once per run)
/// 2. Need profile per client
/// 3. Pair score for every (client, advisor), shared across roles
/// 4. Per role: capacity gate and score floor, then rank and truncate
///
/// Each client is ranked independently; there is no cross-client optimisation.
#[derive(Debug, Clone)]
pub struct Matcher {
    params: ScoringParams,
}

impl Matcher {
    pub fn new(params: ScoringParams) -> Self {
        Self { params }
    }

    pub fn with_default_params() -> Self {
        Self {
            params: ScoringParams::default(),
        }
    }

    pub fn params(&self) -> &ScoringParams {
        &self.params
    }

    /// Score one client against one advisor for a role
    pub fn score_pair(
        &self,
        taxonomy: &Taxonomy,
        client: &Client,
        advisor: &Advisor,
        role: Role,
    ) -> PairEvaluation {
        let mut warnings = Vec::new();
        let profile = NeedProfile::build(client, taxonomy, &mut warnings);
        let coverage = CoverageIndex::build(advisor, taxonomy, &mut warnings);
        let pair = calculate_pair_score(
            &profile,
            &coverage,
            client.segment,
            advisor.target_segment,
            &self.params,
        );
        let decision = capacity::check(advisor, role);
        let reasons = self.exclusion_reasons(&pair, decision, advisor, role);
        let explanation = explain(&pair, reasons, &self.params);

        PairEvaluation {
            client_id: client.id.clone(),
            advisor_id: advisor.id.clone(),
            role,
            pair,
            capacity: decision,
            capacity_pct: capacity::capacity_pct(advisor),
            explanation,
            warnings,
        }
    }

    /// Run a batch match for `clients` against the advisor pool
    ///
    /// Fails with `EmptyCandidatePool` only when `pool` is empty. A pool in
    /// which every advisor is ineligible yields empty ranked lists.
    pub fn run_match(
        &self,
        taxonomy: &Taxonomy,
        clients: &[Client],
        pool: &[Advisor],
        spec: &RunSpec,
    ) -> Result<MatchRun, MatchError> {
        let mut warnings = Vec::new();
        let candidates = CandidatePool::build(pool, taxonomy, &mut warnings)?;
        let run_id = Uuid::new_v4();
        let created_at = Utc::now();

        let outcomes = clients.iter().map(|client| {
            self.rank_client(client, taxonomy, &candidates, spec, run_id, created_at)
        });

        Ok(Self::assemble(run_id, created_at, warnings, outcomes))
    }

    /// Same as [`Matcher::run_match`], with each client ranked on its own
    /// blocking task. Output order follows `clients`.
    pub async fn run_match_concurrent(
        &self,
        taxonomy: Arc<Taxonomy>,
        clients: Vec<Client>,
        pool: &[Advisor],
        spec: RunSpec,
    ) -> Result<MatchRun, MatchError> {
        let mut warnings = Vec::new();
        let candidates = Arc::new(CandidatePool::build(pool, &taxonomy, &mut warnings)?);
        let spec = Arc::new(spec);
        let run_id = Uuid::new_v4();
        let created_at = Utc::now();
        let client_count = clients.len();

        let mut tasks = JoinSet::new();
        for (position, client) in clients.into_iter().enumerate() {
            let matcher = self.clone();
            let taxonomy = Arc::clone(&taxonomy);
            let candidates = Arc::clone(&candidates);
            let spec = Arc::clone(&spec);
            tasks.spawn_blocking(move || {
                let outcome =
                    matcher.rank_client(&client, &taxonomy, &candidates, &spec, run_id, created_at);
                (position, outcome)
            });
        }

        let mut outcomes = Vec::with_capacity(client_count);
        while let Some(joined) = tasks.join_next().await {
            outcomes.push(joined.map_err(|e| MatchError::Worker(e.to_string()))?);
        }
        outcomes.sort_by_key(|(position, _)| *position);

        Ok(Self::assemble(
            run_id,
            created_at,
            warnings,
            outcomes.into_iter().map(|(_, outcome)| outcome),
        ))
    }

    fn exclusion_reasons(
        &self,
        pair: &PairScore,
        capacity: CapacityDecision,
        advisor: &Advisor,
        role: Role,
    ) -> Vec<ExclusionReason> {
        let mut reasons = Vec::new();
        if let Some(reason) = capacity.exclusion_reason(advisor, role) {
            reasons.push(reason);
        }
        if pair.score < self.params.min_score {
            reasons.push(ExclusionReason::BelowFloor {
                score: pair.score,
                floor: self.params.min_score,
            });
        }
        reasons
    }

    fn rank_client(
        &self,
        client: &Client,
        taxonomy: &Taxonomy,
        pool: &CandidatePool,
        spec: &RunSpec,
        run_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> ClientOutcome {
        let mut outcome = ClientOutcome::default();
        let profile = NeedProfile::build(client, taxonomy, &mut outcome.warnings);

        // Raw scores do not depend on the role; only eligibility does.
        let scored: Vec<(&Candidate, PairScore)> = pool
            .candidates
            .iter()
            .map(|candidate| {
                let pair = calculate_pair_score(
                    &profile,
                    &candidate.coverage,
                    client.segment,
                    candidate.advisor.target_segment,
                    &self.params,
                );
                (candidate, pair)
            })
            .collect();

        for role in spec.effective_roles() {
            let mut eligible = Vec::new();
            let mut rejected = Vec::new();
            for (candidate, pair) in &scored {
                let decision = capacity::check(&candidate.advisor, role);
                let reasons = self.exclusion_reasons(pair, decision, &candidate.advisor, role);
                if reasons.is_empty() {
                    eligible.push((*candidate, pair));
                } else {
                    rejected.push((*candidate, pair, reasons));
                }
            }

            eligible.sort_by(|(a, pa), (b, pb)| {
                pb.score
                    .cmp(&pa.score)
                    .then_with(|| a.advisor.id.cmp(&b.advisor.id))
            });
            eligible.truncate(spec.top_k);

            tracing::debug!(
                "Client {} role {}: {} ranked, {} excluded of {} candidates",
                client.id,
                role,
                eligible.len(),
                rejected.len(),
                scored.len()
            );

            for (rank, (candidate, pair)) in eligible.into_iter().enumerate() {
                outcome.results.push(MatchResult {
                    match_run_id: run_id,
                    client_id: client.id.clone(),
                    advisor_id: candidate.advisor.id.clone(),
                    role,
                    score: pair.score,
                    rank: Some(rank as u32 + 1),
                    explanation: explain(pair, Vec::new(), &self.params),
                    created_at,
                });
            }

            if spec.include_excluded {
                rejected.sort_by(|(a, pa, _), (b, pb, _)| {
                    pb.score
                        .cmp(&pa.score)
                        .then_with(|| a.advisor.id.cmp(&b.advisor.id))
                });
                for (candidate, pair, reasons) in rejected {
                    outcome.excluded.push(MatchResult {
                        match_run_id: run_id,
                        client_id: client.id.clone(),
                        advisor_id: candidate.advisor.id.clone(),
                        role,
                        score: pair.score,
                        rank: None,
                        explanation: explain(pair, reasons, &self.params),
                        created_at,
                    });
                }
            }
        }

        outcome
    }

    fn assemble(
        run_id: Uuid,
        created_at: DateTime<Utc>,
        mut warnings: Vec<DataWarning>,
        outcomes: impl Iterator<Item = ClientOutcome>,
    ) -> MatchRun {
        let mut results = Vec::new();
        let mut excluded = Vec::new();
        let mut clients = 0usize;
        for outcome in outcomes {
            clients += 1;
            results.extend(outcome.results);
            excluded.extend(outcome.excluded);
            warnings.extend(outcome.warnings);
        }

        tracing::info!(
            "Match run {} complete: {} clients, {} ranked results, {} excluded, {} warnings",
            run_id,
            clients,
            results.len(),
            excluded.len(),
            warnings.len()
        );

        MatchRun {
            id: run_id,
            created_at,
            results,
            excluded,
            warnings,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_params()
    }
}

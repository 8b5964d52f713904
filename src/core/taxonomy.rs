use std::collections::HashMap;

use crate::core::error::MatchError;
use crate::models::{Domain, Subtopic};

/// Upper bound on a subtopic's default weight
pub const MAX_DEFAULT_WEIGHT: f64 = 1e6;

/// Resolved view of one subtopic
#[derive(Debug, Clone)]
pub struct SubtopicEntry {
    pub id: String,
    pub name: String,
    pub domain_id: String,
    pub domain_name: String,
    pub default_weight: f64,
    /// False when either the subtopic or its domain is inactive
    pub active: bool,
}

/// Two-level skill taxonomy, immutable once built
///
/// Lookups by subtopic id are O(1). A new snapshot means a new `Taxonomy`;
/// there are no partial updates.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    domains: Vec<Domain>,
    subtopics: HashMap<String, SubtopicEntry>,
}

/// Where a subtopic id resolves to
#[derive(Debug, Clone, Copy)]
pub enum Lookup<'a> {
    Active(&'a SubtopicEntry),
    Inactive,
    Unknown,
}

impl Taxonomy {
    /// Build from flat domain and subtopic lists
    ///
    /// Fails with `InvalidTaxonomy` on duplicate ids, a subtopic whose domain
    /// does not exist, or a default weight outside `(0, MAX_DEFAULT_WEIGHT]`.
    pub fn build(domains: Vec<Domain>, subtopics: Vec<Subtopic>) -> Result<Self, MatchError> {
        let mut by_domain: HashMap<&str, &Domain> = HashMap::with_capacity(domains.len());
        for domain in &domains {
            if by_domain.insert(domain.id.as_str(), domain).is_some() {
                return Err(MatchError::InvalidTaxonomy(format!(
                    "duplicate domain id {}",
                    domain.id
                )));
            }
        }

        let mut entries = HashMap::with_capacity(subtopics.len());
        for subtopic in subtopics {
            let domain = by_domain.get(subtopic.domain_id.as_str()).ok_or_else(|| {
                MatchError::InvalidTaxonomy(format!(
                    "subtopic {} references missing domain {}",
                    subtopic.id, subtopic.domain_id
                ))
            })?;

            if !(subtopic.default_weight > 0.0 && subtopic.default_weight <= MAX_DEFAULT_WEIGHT) {
                return Err(MatchError::InvalidTaxonomy(format!(
                    "subtopic {} has weight {} outside (0, {}]",
                    subtopic.id, subtopic.default_weight, MAX_DEFAULT_WEIGHT
                )));
            }

            let entry = SubtopicEntry {
                id: subtopic.id.clone(),
                name: subtopic.name,
                domain_id: domain.id.clone(),
                domain_name: domain.name.clone(),
                default_weight: subtopic.default_weight,
                active: subtopic.is_active && domain.is_active,
            };

            if entries.insert(subtopic.id.clone(), entry).is_some() {
                return Err(MatchError::InvalidTaxonomy(format!(
                    "duplicate subtopic id {}",
                    subtopic.id
                )));
            }
        }

        let mut domains = domains;
        domains.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.id.cmp(&b.id))
        });

        tracing::debug!(
            "Taxonomy built: {} domains, {} subtopics",
            domains.len(),
            entries.len()
        );

        Ok(Self {
            domains,
            subtopics: entries,
        })
    }

    pub fn get(&self, subtopic_id: &str) -> Option<&SubtopicEntry> {
        self.subtopics.get(subtopic_id)
    }

    pub fn lookup(&self, subtopic_id: &str) -> Lookup<'_> {
        match self.subtopics.get(subtopic_id) {
            Some(entry) if entry.active => Lookup::Active(entry),
            Some(_) => Lookup::Inactive,
            None => Lookup::Unknown,
        }
    }

    /// Domains in display order
    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    pub fn subtopic_count(&self) -> usize {
        self.subtopics.len()
    }
}

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::core::error::DataWarning;
use crate::core::taxonomy::{Lookup, Taxonomy};
use crate::models::Advisor;

#[derive(Debug, Clone, Copy)]
struct Assessment {
    level: f64,
    assessed_at: Option<DateTime<Utc>>,
}

impl Assessment {
    /// Latest assessment wins; equal timestamps fall back to the higher level.
    /// A missing timestamp is older than any present one.
    fn supersedes(&self, other: &Assessment) -> bool {
        match self.assessed_at.cmp(&other.assessed_at) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => self.level > other.level,
        }
    }
}

/// Effective skill level per subtopic for one advisor
///
/// Subtopics without a record read as level 0.
#[derive(Debug, Clone, Default)]
pub struct CoverageIndex {
    levels: HashMap<String, Assessment>,
}

impl CoverageIndex {
    pub fn build(advisor: &Advisor, taxonomy: &Taxonomy, warnings: &mut Vec<DataWarning>) -> Self {
        let mut levels: HashMap<String, Assessment> = HashMap::with_capacity(advisor.skills.len());

        for record in &advisor.skills {
            match taxonomy.lookup(&record.subtopic_id) {
                Lookup::Active(_) => {}
                Lookup::Inactive => {
                    DataWarning::InactiveSubtopic {
                        owner: format!("advisor {}", advisor.id),
                        subtopic_id: record.subtopic_id.clone(),
                    }
                    .record(warnings);
                    continue;
                }
                Lookup::Unknown => {
                    DataWarning::UnknownSubtopic {
                        owner: format!("advisor {}", advisor.id),
                        subtopic_id: record.subtopic_id.clone(),
                    }
                    .record(warnings);
                    continue;
                }
            }

            if !record.skill_level.is_finite() || record.skill_level < 0.0 {
                DataWarning::InvalidValue {
                    owner: format!("advisor {}", advisor.id),
                    subtopic_id: record.subtopic_id.clone(),
                    field: "skill_level".to_string(),
                    value: record.skill_level.to_string(),
                }
                .record(warnings);
                continue;
            }

            let candidate = Assessment {
                level: record.skill_level,
                assessed_at: record.last_assessed_at,
            };

            levels
                .entry(record.subtopic_id.clone())
                .and_modify(|current| {
                    if candidate.supersedes(current) {
                        *current = candidate;
                    }
                })
                .or_insert(candidate);
        }

        Self { levels }
    }

    #[inline]
    pub fn level(&self, subtopic_id: &str) -> f64 {
        self.levels.get(subtopic_id).map_or(0.0, |a| a.level)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::core::error::DataWarning;
use crate::core::taxonomy::{Lookup, Taxonomy};
use crate::models::{Client, Horizon};

/// A single resolved client need
#[derive(Debug, Clone)]
pub struct Need {
    pub subtopic_id: String,
    pub subtopic_name: String,
    pub default_weight: f64,
    pub importance: f64,
    pub urgency: f64,
    pub horizon: Horizon,
}

/// Needs of one client keyed by subtopic id
///
/// Ordered by subtopic id so every pass over the profile is deterministic.
/// Subtopics the client did not ask about are simply absent.
#[derive(Debug, Clone, Default)]
pub struct NeedProfile {
    needs: BTreeMap<String, Need>,
}

impl NeedProfile {
    pub fn build(client: &Client, taxonomy: &Taxonomy, warnings: &mut Vec<DataWarning>) -> Self {
        let owner = || format!("client {}", client.id);
        let mut needs: BTreeMap<String, Need> = BTreeMap::new();

        for record in &client.needs {
            let entry = match taxonomy.lookup(&record.subtopic_id) {
                Lookup::Active(entry) => entry,
                Lookup::Inactive => {
                    DataWarning::InactiveSubtopic {
                        owner: owner(),
                        subtopic_id: record.subtopic_id.clone(),
                    }
                    .record(warnings);
                    continue;
                }
                Lookup::Unknown => {
                    DataWarning::UnknownSubtopic {
                        owner: owner(),
                        subtopic_id: record.subtopic_id.clone(),
                    }
                    .record(warnings);
                    continue;
                }
            };

            let invalid = [("importance", record.importance), ("urgency", record.urgency)]
                .into_iter()
                .find(|(_, v)| !v.is_finite() || *v < 0.0);
            if let Some((field, value)) = invalid {
                DataWarning::InvalidValue {
                    owner: owner(),
                    subtopic_id: record.subtopic_id.clone(),
                    field: field.to_string(),
                    value: value.to_string(),
                }
                .record(warnings);
                continue;
            }

            match needs.entry(record.subtopic_id.clone()) {
                Entry::Occupied(_) => {
                    DataWarning::DuplicateNeed {
                        owner: owner(),
                        subtopic_id: record.subtopic_id.clone(),
                    }
                    .record(warnings);
                }
                Entry::Vacant(slot) => {
                    slot.insert(Need {
                        subtopic_id: entry.id.clone(),
                        subtopic_name: entry.name.clone(),
                        default_weight: entry.default_weight,
                        importance: record.importance,
                        urgency: record.urgency,
                        horizon: record.horizon,
                    });
                }
            }
        }

        Self { needs }
    }

    /// Needs in subtopic id order
    pub fn iter(&self) -> impl Iterator<Item = &Need> {
        self.needs.values()
    }

    pub fn get(&self, subtopic_id: &str) -> Option<&Need> {
        self.needs.get(subtopic_id)
    }

    pub fn len(&self) -> usize {
        self.needs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.needs.is_empty()
    }
}

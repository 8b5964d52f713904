use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::core::{MatchError, Taxonomy};
use crate::models::{Advisor, Client, SnapshotData};

/// Errors that can occur while loading or replacing a snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Build(#[from] MatchError),
}

/// Immutable data the engine scores against
#[derive(Debug, Default)]
pub struct Snapshot {
    pub taxonomy: Arc<Taxonomy>,
    pub advisors: Vec<Advisor>,
    pub clients: Vec<Client>,
}

impl Snapshot {
    /// Validate the taxonomy and take ownership of the records
    pub fn build(data: SnapshotData) -> Result<Self, MatchError> {
        let taxonomy = Taxonomy::build(data.domains, data.subtopics)?;
        Ok(Self {
            taxonomy: Arc::new(taxonomy),
            advisors: data.advisors,
            clients: data.clients,
        })
    }

    pub fn client(&self, client_id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == client_id)
    }

    pub fn advisor(&self, advisor_id: &str) -> Option<&Advisor> {
        self.advisors.iter().find(|a| a.id == advisor_id)
    }

    pub fn prospects(&self) -> impl Iterator<Item = &Client> {
        self.clients.iter().filter(|c| c.is_prospect)
    }
}

/// Holder of the current snapshot
///
/// Readers get an `Arc` to a complete snapshot; a replacement swaps the
/// whole thing, so a match run never sees a mix of two snapshots.
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn empty() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Load a JSON snapshot file
    pub async fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let data: SnapshotData = serde_json::from_slice(&bytes)?;
        let snapshot = Snapshot::build(data)?;

        tracing::info!(
            "Loaded snapshot from {}: {} advisors, {} clients, {} subtopics",
            path.as_ref().display(),
            snapshot.advisors.len(),
            snapshot.clients.len(),
            snapshot.taxonomy.subtopic_count()
        );

        Ok(Self::new(snapshot))
    }

    pub async fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.current.read().await)
    }

    /// Replace the snapshot; the old one stays valid for in-flight readers
    pub async fn replace(&self, data: SnapshotData) -> Result<Arc<Snapshot>, SnapshotError> {
        let snapshot = Arc::new(Snapshot::build(data)?);
        *self.current.write().await = Arc::clone(&snapshot);
        tracing::info!(
            "Snapshot replaced: {} advisors, {} clients",
            snapshot.advisors.len(),
            snapshot.clients.len()
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Domain, Subtopic};

    fn data(weight: f64) -> SnapshotData {
        SnapshotData {
            domains: vec![Domain {
                id: "d".to_string(),
                name: "D".to_string(),
                display_order: 1,
                is_active: true,
            }],
            subtopics: vec![Subtopic {
                id: "s".to_string(),
                domain_id: "d".to_string(),
                name: "S".to_string(),
                default_weight: weight,
                is_active: true,
            }],
            advisors: vec![],
            clients: vec![],
        }
    }

    #[tokio::test]
    async fn test_replace_swaps_whole_snapshot() {
        let store = SnapshotStore::empty();
        let before = store.current().await;
        assert_eq!(before.taxonomy.subtopic_count(), 0);

        store.replace(data(1.0)).await.unwrap();

        assert_eq!(store.current().await.taxonomy.subtopic_count(), 1);
        assert_eq!(before.taxonomy.subtopic_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_replacement_keeps_current() {
        let store = SnapshotStore::empty();
        store.replace(data(1.0)).await.unwrap();

        let err = store.replace(data(0.0)).await.unwrap_err();
        assert!(matches!(err, SnapshotError::Build(MatchError::InvalidTaxonomy(_))));
        assert_eq!(store.current().await.taxonomy.subtopic_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = SnapshotStore::load_file("does/not/exist.json").await;
        assert!(matches!(result, Err(SnapshotError::Io(_))));
    }
}

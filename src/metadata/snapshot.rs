//! File-backed metadata service.
//!
//! Loads a metadata snapshot (JSON or YAML) and answers entity and action
//! requests from memory, honouring attribute filters the same way the
//! remote service does.

use crate::error::{GenerationError, Result};
use crate::metadata::service::{filter_terms, AttributeFilter, MetadataService};
use crate::metadata::types::{ActionRecord, EntityMetadata};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Serialised form of a snapshot file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetadataSnapshot {
    #[serde(default)]
    pub entities: Vec<EntityMetadata>,
    #[serde(default)]
    pub actions: Vec<ActionRecord>,
}

/// In-memory [`MetadataService`] over a snapshot
#[derive(Debug)]
pub struct SnapshotService {
    entities: IndexMap<String, EntityMetadata>,
    actions: IndexMap<String, ActionRecord>,
    requests: AtomicUsize,
    filter_sizes: Mutex<Vec<usize>>,
}

impl SnapshotService {
    pub fn new(snapshot: MetadataSnapshot) -> Self {
        Self {
            entities: snapshot
                .entities
                .into_iter()
                .map(|e| (e.logical_name.clone(), e))
                .collect(),
            actions: snapshot
                .actions
                .into_iter()
                .map(|a| (a.unique_name.clone(), a))
                .collect(),
            requests: AtomicUsize::new(0),
            filter_sizes: Mutex::new(Vec::new()),
        }
    }

    /// Load a snapshot file; `.json` files are read as JSON, anything else as YAML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| GenerationError::Snapshot {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let is_json = path.extension().map(|ext| ext == "json").unwrap_or(false);
        let snapshot: MetadataSnapshot = if is_json {
            serde_json::from_str(&contents).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&contents).map_err(|e| e.to_string())
        }
        .map_err(|reason| GenerationError::Snapshot {
            path: path.to_path_buf(),
            reason,
        })?;

        tracing::debug!(
            "Loaded snapshot {} ({} entities, {} actions)",
            path.display(),
            snapshot.entities.len(),
            snapshot.actions.len()
        );

        Ok(Self::new(snapshot))
    }

    /// Number of entity metadata requests answered so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Filter term count of every filtered request, in order
    pub fn filter_sizes(&self) -> Vec<usize> {
        self.filter_sizes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }
}

/// Service over the shared test snapshot under `tests/fixtures`
#[cfg(test)]
pub(crate) fn fixture_service() -> SnapshotService {
    let snapshot: MetadataSnapshot =
        serde_yaml::from_str(include_str!("../../tests/fixtures/crm_snapshot.yaml"))
            .expect("fixture snapshot parses");
    SnapshotService::new(snapshot)
}

impl MetadataService for SnapshotService {
    fn fetch_entity_metadata(
        &self,
        keys: &[String],
        filter: Option<&AttributeFilter>,
    ) -> Result<Vec<EntityMetadata>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(filter) = filter {
            self.filter_sizes
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(filter_terms(filter));
        }

        let mut result = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(entity) = self.entities.get(key) else {
                continue;
            };

            let mut entity = entity.clone();
            if let Some(allowed) = filter.and_then(|f| f.get(key)) {
                entity
                    .attributes
                    .retain(|a| allowed.iter().any(|name| name == &a.logical_name));
            }
            result.push(entity);
        }

        Ok(result)
    }

    fn fetch_action_definitions(&self, names: &[String]) -> Result<Vec<ActionRecord>> {
        Ok(names
            .iter()
            .filter_map(|name| self.actions.get(name).cloned())
            .collect())
    }
}

//! Shared metadata cache.
//!
//! Root entity metadata and reduced related-entity projections are cached by
//! logical name. The cache is shared between generation requests; fetches are
//! idempotent, so overlapping requests may fetch the same entity twice and
//! the last write wins.

use crate::error::{GenerationError, Result};
use crate::metadata::batcher::plan_batches;
use crate::metadata::resolver::resolve_requirements;
use crate::metadata::service::MetadataService;
use crate::metadata::types::EntityMetadata;
use crate::model::entity::build_entity;
use crate::model::naming;
use crate::model::EntityData;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Attribute of a related entity, names only
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedAttribute {
    pub logical_name: String,
    pub schema_name: String,
    pub display_name: Option<String>,
    pub code_name: String,
}

/// Reduced projection of an entity used to label and validate relationships
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedEntityData {
    pub logical_name: String,
    pub schema_name: String,
    pub display_name: Option<String>,
    pub display_collection_name: Option<String>,
    pub entity_set_name: Option<String>,
    pub primary_id_attribute: Option<String>,
    pub class_name: String,
    pub plural_code_name: String,
    pub attributes: IndexMap<String, RelatedAttribute>,
}

impl RelatedEntityData {
    pub fn from_metadata(meta: &EntityMetadata) -> Self {
        let attributes = meta
            .attributes
            .iter()
            .map(|a| {
                let code_name = naming::code_name_or(a.display_name.as_deref(), &a.schema_name);
                (
                    a.logical_name.clone(),
                    RelatedAttribute {
                        logical_name: a.logical_name.clone(),
                        schema_name: a.schema_name.clone(),
                        display_name: a.display_name.clone(),
                        code_name,
                    },
                )
            })
            .collect();

        let plural_fallback = format!("{}s", meta.schema_name);
        Self {
            logical_name: meta.logical_name.clone(),
            schema_name: meta.schema_name.clone(),
            display_name: meta.display_name.clone(),
            display_collection_name: meta.display_collection_name.clone(),
            entity_set_name: meta.entity_set_name.clone(),
            primary_id_attribute: meta.primary_id_attribute.clone(),
            class_name: naming::code_name_or(meta.display_name.as_deref(), &meta.schema_name),
            plural_code_name: naming::code_name_or(
                meta.display_collection_name.as_deref(),
                &plural_fallback,
            ),
            attributes,
        }
    }

    pub fn attribute(&self, logical_name: &str) -> Option<&RelatedAttribute> {
        self.attributes.get(logical_name)
    }

    /// Web API collection name, falling back to the plural logical name
    pub fn collection_name(&self) -> String {
        self.entity_set_name
            .clone()
            .unwrap_or_else(|| format!("{}s", self.logical_name))
    }

    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.schema_name)
    }

    /// Take `other`'s header fields and add its attributes to ours
    pub fn merge(&mut self, mut other: RelatedEntityData) {
        let mut attributes = std::mem::take(&mut self.attributes);
        attributes.extend(std::mem::take(&mut other.attributes));
        other.attributes = attributes;
        *self = other;
    }
}

/// Thread-safe entity metadata cache
pub struct MetadataCache {
    roots: RwLock<HashMap<String, Arc<EntityMetadata>>>,
    related: RwLock<HashMap<String, RelatedEntityData>>,
    filter_cap: NonZeroUsize,
}

impl MetadataCache {
    pub fn new(filter_cap: NonZeroUsize) -> Self {
        Self {
            roots: RwLock::new(HashMap::new()),
            related: RwLock::new(HashMap::new()),
            filter_cap,
        }
    }

    pub fn filter_cap(&self) -> NonZeroUsize {
        self.filter_cap
    }

    /// Build entity models for `keys`, fetching whatever is not cached yet
    ///
    /// Root metadata is fetched in one combined request. Related metadata is
    /// then resolved and fetched in cap-bounded batches before any model is
    /// built, so model construction never sees an uncached relation.
    pub fn get_entities(
        &self,
        service: &dyn MetadataService,
        keys: &[String],
    ) -> Result<Vec<EntityData>> {
        let roots = self.fetch_roots(service, keys)?;
        self.fetch_related(service, &roots)?;

        roots.iter().map(|root| build_entity(root, self)).collect()
    }

    /// Root metadata for `keys`, fetching missing entries in a single request
    pub fn fetch_roots(
        &self,
        service: &dyn MetadataService,
        keys: &[String],
    ) -> Result<Vec<Arc<EntityMetadata>>> {
        let missing: Vec<String> = {
            let roots = self.read_roots();
            keys.iter()
                .filter(|k| !roots.contains_key(*k))
                .cloned()
                .collect()
        };

        if !missing.is_empty() {
            tracing::info!("Fetching metadata for {} root entities", missing.len());
            let fetched = service.fetch_entity_metadata(&missing, None)?;
            for meta in fetched {
                self.store_related(RelatedEntityData::from_metadata(&meta), false);
                self.write_roots()
                    .insert(meta.logical_name.clone(), Arc::new(meta));
            }
        }

        let roots = self.read_roots();
        let not_found: Vec<String> = keys
            .iter()
            .filter(|k| !roots.contains_key(*k))
            .cloned()
            .collect();
        if !not_found.is_empty() {
            return Err(GenerationError::EntityNotFound { entities: not_found });
        }

        Ok(keys.iter().filter_map(|k| roots.get(k).cloned()).collect())
    }

    /// Fetch every related entity the roots need and cache the projections
    ///
    /// Batches run sequentially: a batch may extend a record written by an
    /// earlier one.
    pub fn fetch_related(
        &self,
        service: &dyn MetadataService,
        roots: &[Arc<EntityMetadata>],
    ) -> Result<()> {
        let requirements = resolve_requirements(roots.iter().map(|r| r.as_ref()), self);
        if requirements.is_empty() {
            return Ok(());
        }

        let plan = plan_batches(&requirements, self.filter_cap);
        tracing::info!(
            "Fetching {} related entities in {} batches",
            requirements.len(),
            plan.batches.len()
        );

        for (index, batch) in plan.batches.iter().enumerate() {
            tracing::debug!(
                "Batch {}: {} entities, {} filter terms",
                index + 1,
                batch.entries.len(),
                batch.filter_count()
            );

            let fetched =
                service.fetch_entity_metadata(&batch.entity_keys(), Some(&batch.entries))?;
            for meta in fetched {
                let merge = plan.merge_required.contains(&meta.logical_name)
                    || self.contains_related(&meta.logical_name);
                self.store_related(RelatedEntityData::from_metadata(&meta), merge);
            }
        }

        let not_found: Vec<String> = requirements
            .keys()
            .filter(|k| !self.contains_related(k))
            .cloned()
            .collect();
        if !not_found.is_empty() {
            return Err(GenerationError::EntityNotFound { entities: not_found });
        }

        Ok(())
    }

    /// Cached related entity, or a cache miss
    pub fn get_related_entity(&self, key: &str) -> Result<RelatedEntityData> {
        self.read_related()
            .get(key)
            .cloned()
            .ok_or_else(|| GenerationError::CacheMiss {
                entity: key.to_string(),
            })
    }

    /// Insert a related entity; with `merge`, attributes are appended to an existing record
    pub fn store_related(&self, record: RelatedEntityData, merge: bool) {
        let mut related = self.write_related();
        match related.get_mut(&record.logical_name) {
            Some(existing) if merge => {
                tracing::debug!(
                    "Merging {} attributes into cached '{}'",
                    record.attributes.len(),
                    record.logical_name
                );
                existing.merge(record);
            }
            _ => {
                related.insert(record.logical_name.clone(), record);
            }
        }
    }

    pub fn contains_related(&self, key: &str) -> bool {
        self.read_related().contains_key(key)
    }

    pub fn has_related_attribute(&self, entity: &str, attribute: &str) -> bool {
        self.read_related()
            .get(entity)
            .map(|e| e.attributes.contains_key(attribute))
            .unwrap_or(false)
    }

    pub fn root(&self, key: &str) -> Option<Arc<EntityMetadata>> {
        self.read_roots().get(key).cloned()
    }

    pub fn related_count(&self) -> usize {
        self.read_related().len()
    }

    /// Drop every cached record
    pub fn clear(&self) {
        self.write_roots().clear();
        self.write_related().clear();
    }

    fn read_roots(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<EntityMetadata>>> {
        self.roots.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_roots(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<EntityMetadata>>> {
        self.roots.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_related(&self) -> RwLockReadGuard<'_, HashMap<String, RelatedEntityData>> {
        self.related.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_related(&self) -> RwLockWriteGuard<'_, HashMap<String, RelatedEntityData>> {
        self.related.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

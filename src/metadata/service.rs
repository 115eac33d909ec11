//! Upstream metadata service contract.

use crate::error::Result;
use crate::metadata::types::{ActionRecord, EntityMetadata};
use indexmap::IndexMap;

/// Per-entity allow-list of attribute logical names
///
/// An entity mapped to an empty list is fetched with zero attributes
/// (entity header and relationships only).
pub type AttributeFilter = IndexMap<String, Vec<String>>;

/// Source of entity and action metadata
///
/// Calls are blocking. Implementations must be safe to share between
/// concurrent generation requests.
pub trait MetadataService: Send + Sync {
    /// Fetch metadata for all entities in `keys`
    ///
    /// When `filter` names an entity, only the listed attributes are
    /// returned for it. Entities missing from the service are omitted from
    /// the result rather than reported as an error.
    fn fetch_entity_metadata(
        &self,
        keys: &[String],
        filter: Option<&AttributeFilter>,
    ) -> Result<Vec<EntityMetadata>>;

    /// Fetch action definitions by unique name
    fn fetch_action_definitions(&self, names: &[String]) -> Result<Vec<ActionRecord>>;
}

/// Number of filter terms a request carries
///
/// Each attribute name is one term; an entity requested for existence only
/// costs a single entity-name term.
pub fn filter_terms(filter: &AttributeFilter) -> usize {
    filter.values().map(|attrs| attrs.len().max(1)).sum()
}

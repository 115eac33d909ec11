//! Metadata retrieval: upstream records, the service seam, request batching,
//! relationship resolution and the shared cache.

pub mod batcher;
pub mod cache;
pub mod resolver;
pub mod service;
pub mod snapshot;
pub mod types;

pub use batcher::{plan_batches, Batch, BatchPlan, RequirementMap};
pub use cache::{MetadataCache, RelatedAttribute, RelatedEntityData};
pub use resolver::resolve_requirements;
pub use service::{AttributeFilter, MetadataService};
pub use snapshot::{MetadataSnapshot, SnapshotService};
pub use types::*;

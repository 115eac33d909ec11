//! # crmgen: strongly-typed proxy generation from CRM metadata
//!
//! crmgen turns entity and custom-action metadata exposed by a CRM metadata
//! service into early-bound source proxies, currently in C# and TypeScript.
//!
//! ## Pipeline
//!
//! 1. The [`metadata::MetadataCache`] fetches the requested root entities in
//!    one request.
//! 2. The [`metadata::resolve_requirements`] pass works out which related
//!    entities and key attributes are still missing.
//! 3. The [`metadata::plan_batches`] pass splits those requirements into
//!    requests bounded by the service's filter cap; entities split across
//!    batches are merged back in the cache.
//! 4. [`model::build_entity`] dispatches every attribute on its type code and
//!    builds the intermediate [`model::EntityData`].
//! 5. [`model::deduplicate`] resolves name collisions.
//! 6. An [`codegen::Emitter`] renders source units, collected in a
//!    [`codegen::GenerationOutput`] and written to disk.
//!
//! Actions follow a shorter path: their XAML argument list is parsed by
//! [`model::build_action`] and emitted directly.
//!
//! ## Example
//!
//! ```rust,no_run
//! use crmgen::{GenerationRequest, Generator, GeneratorConfig, SnapshotService};
//! use std::sync::Arc;
//!
//! let service = Arc::new(SnapshotService::from_file("metadata.yaml")?);
//! let generator = Generator::new(service, GeneratorConfig::default())?;
//! let output = generator.generate(&GenerationRequest {
//!     entities: vec!["account".to_string()],
//!     actions: vec![],
//! })?;
//! let created = output.write_to("Proxies")?;
//! # Ok::<(), crmgen::GenerationError>(())
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod metadata;
pub mod model;
pub mod pipeline;

pub use codegen::{Dialect, Emitter, GenerationOutput, SourceUnit};
pub use config::GeneratorConfig;
pub use error::{GenerationError, Result};
pub use metadata::{MetadataCache, MetadataService, SnapshotService};
pub use pipeline::{GenerationRequest, Generator};

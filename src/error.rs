//! Error types for the generation pipeline.
//!
//! Every variant is fatal for the generation request that raised it. Action
//! argument parse failures are the one recoverable case and are kept out of
//! this enum (see [`crate::model::action::ActionParseError`]).

use std::path::PathBuf;
use thiserror::Error;

/// Error type for metadata retrieval, model construction and emission
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Requested root entities were absent from the metadata service
    #[error("Entities not found in metadata: {}", .entities.join(", "))]
    EntityNotFound { entities: Vec<String> },

    /// Requested actions were absent from the metadata service
    #[error("Actions not found in metadata: {}", .actions.join(", "))]
    ActionNotFound { actions: Vec<String> },

    /// A relationship references an attribute the related entity does not have
    #[error("Attribute '{attribute}' not found on entity '{entity}'")]
    AttributeNotFound { entity: String, attribute: String },

    /// A related entity was consulted before the resolver requested it
    #[error("Related entity '{entity}' is not in the metadata cache")]
    CacheMiss { entity: String },

    /// The metadata service failed to answer a request
    #[error("No response from metadata service: {reason}")]
    NoResponse { reason: String },

    /// Invalid generator configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Two different shared units were generated for the same file
    #[error("Conflicting shared units generated for {}", .path.display())]
    SharedUnitConflict { path: PathBuf },

    /// A metadata snapshot could not be parsed
    #[error("Failed to load snapshot {}: {reason}", .path.display())]
    Snapshot { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GenerationError>;

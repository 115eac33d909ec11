//! Intermediate model: builders from metadata, name derivation and
//! deduplication.

pub mod action;
pub mod attribute;
pub mod dedup;
pub mod entity;
pub mod naming;
pub mod types;

pub use action::{build_action, parse_arguments, ActionParseError};
pub use attribute::build_attribute;
pub use dedup::deduplicate;
pub use entity::build_entity;
pub use types::*;

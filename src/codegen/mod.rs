//! Source emission for generated entity and action proxies.
//!
//! Each dialect implements [`Emitter`] and writes its source text with
//! `writeln!` into an in-memory buffer. Units are collected into a
//! [`GenerationOutput`], which de-duplicates shared option-set units by file
//! name and writes everything to disk in one sequential pass.

pub mod csharp;
pub mod fs_utils;
pub mod typescript;
pub mod utils;

use crate::error::{GenerationError, Result};
use crate::metadata::types::AttributeTypeCode;
use crate::model::{ActionData, AttributeData, AttributeKind, EntityData, OptionSetData};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use csharp::CSharpEmitter;
pub use typescript::TypeScriptEmitter;

/// Directory holding shared option-set units
pub const OPTION_SET_DIR: &str = "OptionSets";

/// Output language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    CSharp,
    TypeScript,
}

impl Dialect {
    /// File extension of generated units
    pub fn extension(self) -> &'static str {
        match self {
            Dialect::CSharp => "cs",
            Dialect::TypeScript => "ts",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::CSharp => write!(f, "csharp"),
            Dialect::TypeScript => write!(f, "typescript"),
        }
    }
}

impl FromStr for Dialect {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csharp" | "cs" | "c#" => Ok(Dialect::CSharp),
            "typescript" | "ts" => Ok(Dialect::TypeScript),
            other => Err(GenerationError::Config(format!(
                "Unknown dialect '{}'. Expected 'csharp' or 'typescript'",
                other
            ))),
        }
    }
}

/// Emitter settings shared by every dialect
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Namespace (C#) or module banner (TypeScript) of generated code
    pub namespace: String,
    /// Emit global option sets as shared units instead of inline
    pub consolidate_option_sets: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            namespace: "Xrm.Proxies".to_string(),
            consolidate_option_sets: true,
        }
    }
}

/// A named piece of generated source, path relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub contents: String,
}

impl SourceUnit {
    pub fn new(path: impl Into<PathBuf>, contents: String) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }
}

/// Units produced for one entity: its own source plus shared option sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityUnits {
    pub entity: SourceUnit,
    pub option_sets: Vec<SourceUnit>,
}

/// One output dialect
pub trait Emitter: Send + Sync {
    fn dialect(&self) -> Dialect;

    fn emit_entity(&self, entity: &EntityData) -> Result<EntityUnits>;

    fn emit_action(&self, action: &ActionData) -> Result<SourceUnit>;
}

/// Emitter for `dialect`
pub fn emitter_for(dialect: Dialect, options: EmitOptions) -> Box<dyn Emitter> {
    match dialect {
        Dialect::CSharp => Box::new(CSharpEmitter::new(options)),
        Dialect::TypeScript => Box::new(TypeScriptEmitter::new(options)),
    }
}

/// Type name an option set is emitted under
///
/// Shared option sets keep their exposed name; everything emitted inside an
/// entity unit is prefixed with the entity class so two entities can carry
/// same-named local enums in one namespace.
pub fn enum_type_name(
    entity: &EntityData,
    option_set: &OptionSetData,
    options: &EmitOptions,
) -> String {
    if is_shared(option_set, options) {
        option_set.exposed_name.clone()
    } else {
        format!("{}_{}", entity.class_name, option_set.enum_name)
    }
}

/// Whether `option_set` goes into its own shared unit
pub fn is_shared(option_set: &OptionSetData, options: &EmitOptions) -> bool {
    option_set.is_global && options.consolidate_option_sets
}

/// Bounds a setter must check, rendered as numbers
///
/// Integers left at their natural type range need no check.
pub fn numeric_bounds(attribute: &AttributeData) -> Option<(String, String)> {
    match attribute.kind {
        AttributeKind::Numeric { min, max } => {
            let natural = match attribute.type_code {
                AttributeTypeCode::BigInt => (i64::MIN, i64::MAX),
                _ => (i32::MIN as i64, i32::MAX as i64),
            };
            ((min, max) != natural).then(|| (min.to_string(), max.to_string()))
        }
        AttributeKind::Precision { min, max, .. } | AttributeKind::MoneyValue { min, max, .. } => {
            Some((utils::format_number(min), utils::format_number(max)))
        }
        _ => None,
    }
}

/// Run `write` against an in-memory buffer and return the text
pub(crate) fn render<F>(write: F) -> Result<String>
where
    F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
{
    let mut buffer = Vec::new();
    write(&mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| GenerationError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Everything generated in one run
#[derive(Debug, Default)]
pub struct GenerationOutput {
    units: IndexMap<PathBuf, SourceUnit>,
}

impl GenerationOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity's units
    ///
    /// A shared option-set unit already produced in this run is kept once.
    /// A different option set landing on the same path is an error.
    pub fn add_entity(&mut self, units: EntityUnits) -> Result<()> {
        for unit in &units.option_sets {
            if let Some(existing) = self.units.get(&unit.path) {
                if existing.contents != unit.contents {
                    return Err(GenerationError::SharedUnitConflict {
                        path: unit.path.clone(),
                    });
                }
            }
        }

        self.add(units.entity);
        for unit in units.option_sets {
            if self.units.contains_key(&unit.path) {
                tracing::debug!("Option set unit {} already emitted", unit.path.display());
                continue;
            }
            self.units.insert(unit.path.clone(), unit);
        }
        Ok(())
    }

    /// Add a unit, replacing any earlier unit with the same path
    pub fn add(&mut self, unit: SourceUnit) {
        if self.units.contains_key(&unit.path) {
            tracing::warn!("Replacing generated unit {}", unit.path.display());
        }
        self.units.insert(unit.path.clone(), unit);
    }

    pub fn units(&self) -> impl Iterator<Item = &SourceUnit> {
        self.units.values()
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&SourceUnit> {
        self.units.get(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Write every unit below `dir`
    ///
    /// Returns true if at least one file did not exist before.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<bool> {
        let dir = dir.as_ref();
        let mut created = false;
        for unit in self.units.values() {
            created |= fs_utils::write_unit(dir, unit)?;
        }
        tracing::info!("Wrote {} units to {}", self.units.len(), dir.display());
        Ok(created)
    }
}

//! Intermediate model handed from the builders to the emitters.
//!
//! Names in this model (code names, enum names, accessor names) are the only
//! fields the deduplicator rewrites; everything else is copied from metadata.

use crate::metadata::types::{AttributeTypeCode, DateTimeBehavior};
use crate::model::naming;
use serde::Serialize;

/// Prefix shared by intersect accessors and generic "Associated" collection accessors
pub const ASSOCIATED: &str = "Associated";

/// Dialect-independent type of a generated accessor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ValueType {
    Boolean,
    DateTime,
    Integer,
    BigInt,
    Decimal,
    Double,
    /// Raw money wrapper
    Money,
    String,
    Guid,
    EntityReference,
    /// Party list: several references, possibly to different entity types
    EntityReferenceCollection,
    /// Option set value, keyed by the option set's logical name
    OptionSet { option_set: String },
}

/// One generated accessor (getter, formatted getter or setter)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessorSpec {
    pub name: String,
    pub value_type: ValueType,
    pub generate: bool,
}

impl AccessorSpec {
    pub fn new(name: impl Into<String>, value_type: ValueType, generate: bool) -> Self {
        Self {
            name: name.into(),
            value_type,
            generate,
        }
    }
}

/// One concrete target of a lookup or party-list attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupRelationData {
    pub relationship_schema_name: String,
    pub referenced_entity: String,
    pub referenced_attribute: String,
    pub referenced_collection: String,
    pub referenced_display_name: String,
    pub referencing_display_name: String,
}

/// Kind-specific part of a generated attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AttributeKind {
    Default,
    Boolean,
    Identifier,
    DateTime { behavior: DateTimeBehavior },
    Lookup { relations: Vec<LookupRelationData> },
    PartyList { relations: Vec<LookupRelationData> },
    OptionSet { option_set: String, is_global: bool },
    String { max_length: Option<u32> },
    /// Integer and big-integer attributes
    Numeric { min: i64, max: i64 },
    /// Decimal and double attributes
    Precision { min: f64, max: f64, precision: u32 },
    /// Raw money wrapper
    Money { precision: u32 },
    /// Convenience numeric accessor paired with a money wrapper
    MoneyValue { min: f64, max: f64, precision: u32 },
}

/// A generated attribute with its three accessors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeData {
    pub logical_name: String,
    pub schema_name: String,
    pub display_name: String,
    pub code_name: String,
    pub type_code: AttributeTypeCode,
    pub generate: bool,
    /// Documentation line written above the generated accessor
    pub summary: String,
    pub getter: AccessorSpec,
    pub formatted_getter: AccessorSpec,
    pub setter: AccessorSpec,
    pub kind: AttributeKind,
}

impl AttributeData {
    /// Rename the attribute and every accessor derived from its code name
    pub fn rename(&mut self, code_name: String) {
        self.getter.name = code_name.clone();
        self.setter.name = code_name.clone();
        self.formatted_getter.name = naming::formatted_name(&code_name);
        self.code_name = code_name;
    }

    /// Relations of lookup and party-list attributes
    pub fn relations(&self) -> &[LookupRelationData] {
        match &self.kind {
            AttributeKind::Lookup { relations } | AttributeKind::PartyList { relations } => {
                relations
            }
            _ => &[],
        }
    }
}

/// A named option
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionData {
    pub name: String,
    pub value: i32,
    /// Owning state value, status options only
    pub state: Option<i32>,
}

/// An option set as an enum
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSetData {
    pub logical_name: String,
    pub display_name: String,
    /// Name derived from metadata, never rewritten
    pub base_name: String,
    /// Enum identifier used inside generated code
    pub enum_name: String,
    /// Identifier the enum is exported under (shared option-set units)
    ///
    /// For global option sets this comes from the org-wide logical name and
    /// is never suffixed, so every entity refers to the same type.
    pub exposed_name: String,
    pub is_global: bool,
    pub options: Vec<OptionData>,
    /// Logical name of the linked state or status option set
    pub linked_option_set: Option<String>,
}

impl OptionSetData {
    pub fn append_suffix(&mut self, suffix: usize) {
        self.enum_name = format!("{}{}", self.base_name, suffix);
        if !self.is_global {
            self.exposed_name = self.enum_name.clone();
        }
    }
}

/// One-to-many accessor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionFetcherData {
    pub relationship_schema_name: String,
    pub related_entity: String,
    pub related_attribute: String,
    pub related_attribute_code_name: String,
    pub target_class_name: String,
    pub target_plural_code_name: String,
    pub accessor_name: String,
}

impl CollectionFetcherData {
    pub fn refresh_accessor_name(&mut self) {
        self.accessor_name = format!(
            "{}_{}",
            self.related_attribute_code_name, self.target_plural_code_name
        );
    }
}

/// Many-to-many accessor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntersectFetcherData {
    pub relationship_schema_name: String,
    pub intersect_entity: String,
    pub target_entity: String,
    pub target_class_name: String,
    pub target_collection_code_name: String,
    pub accessor_name: String,
}

impl IntersectFetcherData {
    pub fn refresh_accessor_name(&mut self) {
        self.accessor_name = format!("{}_{}", ASSOCIATED, self.target_collection_code_name);
    }
}

/// One generated entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityData {
    pub logical_name: String,
    pub schema_name: String,
    pub display_name: String,
    pub class_name: String,
    pub description: Option<String>,
    pub object_type_code: i32,
    pub entity_set_name: Option<String>,
    pub primary_id_attribute: Option<String>,
    pub primary_name_attribute: Option<String>,
    pub attributes: Vec<AttributeData>,
    pub internal_option_sets: Vec<OptionSetData>,
    pub external_option_sets: Vec<OptionSetData>,
    pub collection_fetchers: Vec<CollectionFetcherData>,
    pub intersect_fetchers: Vec<IntersectFetcherData>,
    /// False for intersect entities and entities without a primary id or name
    pub generate: bool,
}

impl EntityData {
    /// Find an option set (internal or external) by logical name
    pub fn option_set(&self, logical_name: &str) -> Option<&OptionSetData> {
        self.internal_option_sets
            .iter()
            .chain(self.external_option_sets.iter())
            .find(|o| o.logical_name == logical_name)
    }

    pub fn generated_attributes(&self) -> impl Iterator<Item = &AttributeData> {
        self.attributes.iter().filter(|a| a.generate)
    }

    pub fn attribute(&self, code_name: &str) -> Option<&AttributeData> {
        self.attributes.iter().find(|a| a.code_name == code_name)
    }
}

/// Direction of an action argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArgumentDirection {
    Input,
    Output,
}

/// Declared type of an action argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArgumentType {
    Boolean,
    DateTime,
    Decimal,
    Double,
    Integer,
    Money,
    String,
    Guid,
    OptionSetValue,
    EntityReference,
    Entity,
    EntityCollection,
}

impl ArgumentType {
    /// Parse the type name used inside `InArgument(...)`/`OutArgument(...)`
    pub fn from_declared(name: &str) -> Option<Self> {
        let parsed = match name {
            "Boolean" => ArgumentType::Boolean,
            "DateTime" => ArgumentType::DateTime,
            "Decimal" => ArgumentType::Decimal,
            "Double" => ArgumentType::Double,
            "Int32" => ArgumentType::Integer,
            "Money" => ArgumentType::Money,
            "String" => ArgumentType::String,
            "Guid" => ArgumentType::Guid,
            "OptionSetValue" => ArgumentType::OptionSetValue,
            "EntityReference" => ArgumentType::EntityReference,
            "Entity" => ArgumentType::Entity,
            "EntityCollection" => ArgumentType::EntityCollection,
            _ => return None,
        };
        Some(parsed)
    }

    /// Entity-typed arguments carry a related entity name
    pub fn is_entity(self) -> bool {
        matches!(self, ArgumentType::EntityReference | ArgumentType::Entity)
    }
}

/// One input or output argument of an action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionArgument {
    pub name: String,
    pub argument_type: ArgumentType,
    pub direction: ArgumentDirection,
    pub required: bool,
    /// Argument bound to the action's primary entity
    pub is_target: bool,
    pub related_entity: Option<String>,
    pub description: Option<String>,
}

/// One generated action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionData {
    pub unique_name: String,
    pub display_name: String,
    pub class_name: String,
    pub primary_entity: Option<String>,
    pub inputs: Vec<ActionArgument>,
    pub outputs: Vec<ActionArgument>,
}

impl ActionData {
    /// Actions bound to an entity receive the record as their target
    pub fn is_target_bound(&self) -> bool {
        self.primary_entity.is_some()
    }
}

//! Metadata records returned by the metadata service.
//!
//! These mirror the shape of the remote entity/attribute/relationship
//! metadata closely enough to be deserialised from a snapshot, and are the
//! only input the model builders read.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Closed set of attribute type codes reported by the metadata service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeTypeCode {
    Boolean,
    Customer,
    DateTime,
    Decimal,
    Double,
    Integer,
    Lookup,
    Memo,
    Money,
    Owner,
    PartyList,
    Picklist,
    State,
    Status,
    String,
    Uniqueidentifier,
    CalendarRules,
    Virtual,
    BigInt,
    ManagedProperty,
    EntityName,
}

impl AttributeTypeCode {
    /// Type codes whose values reference records of other entities
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            AttributeTypeCode::Customer
                | AttributeTypeCode::Lookup
                | AttributeTypeCode::Owner
                | AttributeTypeCode::PartyList
        )
    }

    /// Type codes surfaced through an option set
    pub fn is_option_set(self) -> bool {
        matches!(
            self,
            AttributeTypeCode::Picklist | AttributeTypeCode::State | AttributeTypeCode::Status
        )
    }
}

/// How a date/time attribute stores and presents its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateTimeBehavior {
    #[default]
    UserLocal,
    DateOnly,
    TimeZoneIndependent,
}

/// A single option of an option set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionMetadata {
    pub value: i32,
    #[serde(default)]
    pub label: Option<String>,
    /// Owning state value (status options only)
    #[serde(default)]
    pub state: Option<i32>,
}

/// Option set attached to a picklist, state or status attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSetMetadata {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_global: bool,
    #[serde(default)]
    pub options: Vec<OptionMetadata>,
}

/// Attribute (field) metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMetadata {
    pub logical_name: String,
    #[serde(default)]
    pub schema_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub attribute_type: AttributeTypeCode,
    /// Composite parent attribute, set on sub-attributes such as `owneridname`
    #[serde(default)]
    pub attribute_of: Option<String>,
    #[serde(default = "default_true")]
    pub is_valid_for_create: bool,
    #[serde(default = "default_true")]
    pub is_valid_for_update: bool,
    #[serde(default = "default_true")]
    pub is_valid_for_read: bool,
    /// Target entity logical names of reference attributes
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub precision: Option<u32>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub date_time_behavior: Option<DateTimeBehavior>,
    #[serde(default)]
    pub option_set: Option<OptionSetMetadata>,
}

impl AttributeMetadata {
    /// Minimal attribute record, mostly useful for tests and snapshots
    pub fn new(logical_name: impl Into<String>, attribute_type: AttributeTypeCode) -> Self {
        let logical_name = logical_name.into();
        Self {
            schema_name: logical_name.clone(),
            logical_name,
            display_name: None,
            description: None,
            attribute_type,
            attribute_of: None,
            is_valid_for_create: true,
            is_valid_for_update: true,
            is_valid_for_read: true,
            targets: Vec::new(),
            min_value: None,
            max_value: None,
            precision: None,
            max_length: None,
            date_time_behavior: None,
            option_set: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_targets(mut self, targets: &[&str]) -> Self {
        self.targets = targets.iter().map(|t| t.to_string()).collect();
        self
    }
}

/// One-to-many relationship, seen from either side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneToManyRelationship {
    pub schema_name: String,
    pub referenced_entity: String,
    pub referenced_attribute: String,
    pub referencing_entity: String,
    pub referencing_attribute: String,
}

/// Many-to-many relationship through an intersect entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManyToManyRelationship {
    pub schema_name: String,
    pub intersect_entity_name: String,
    pub entity1_logical_name: String,
    pub entity1_intersect_attribute: String,
    pub entity2_logical_name: String,
    pub entity2_intersect_attribute: String,
}

impl ManyToManyRelationship {
    /// The entity on the other side of the relationship from `entity`
    pub fn partner_of(&self, entity: &str) -> &str {
        if self.entity1_logical_name == entity {
            &self.entity2_logical_name
        } else {
            &self.entity1_logical_name
        }
    }
}

/// Entity metadata including its relationship graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMetadata {
    pub logical_name: String,
    #[serde(default)]
    pub schema_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub display_collection_name: Option<String>,
    #[serde(default)]
    pub entity_set_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub object_type_code: i32,
    #[serde(default)]
    pub primary_id_attribute: Option<String>,
    #[serde(default)]
    pub primary_name_attribute: Option<String>,
    #[serde(default)]
    pub is_intersect: bool,
    #[serde(default)]
    pub attributes: Vec<AttributeMetadata>,
    #[serde(default)]
    pub many_to_one_relationships: Vec<OneToManyRelationship>,
    #[serde(default)]
    pub one_to_many_relationships: Vec<OneToManyRelationship>,
    #[serde(default)]
    pub many_to_many_relationships: Vec<ManyToManyRelationship>,
}

impl EntityMetadata {
    pub fn new(logical_name: impl Into<String>) -> Self {
        let logical_name = logical_name.into();
        Self {
            schema_name: logical_name.clone(),
            logical_name,
            display_name: None,
            display_collection_name: None,
            entity_set_name: None,
            description: None,
            object_type_code: 0,
            primary_id_attribute: None,
            primary_name_attribute: None,
            is_intersect: false,
            attributes: Vec::new(),
            many_to_one_relationships: Vec::new(),
            one_to_many_relationships: Vec::new(),
            many_to_many_relationships: Vec::new(),
        }
    }

    /// Look up an attribute by logical name
    pub fn attribute(&self, logical_name: &str) -> Option<&AttributeMetadata> {
        self.attributes.iter().find(|a| a.logical_name == logical_name)
    }

    /// Whether `logical_name` is this entity's primary id or primary name
    pub fn is_primary(&self, logical_name: &str) -> bool {
        self.primary_id_attribute.as_deref() == Some(logical_name)
            || self.primary_name_attribute.as_deref() == Some(logical_name)
    }

    /// Display name with fallback to the schema name
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.schema_name)
    }
}

/// Custom action definition with its XAML argument list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub unique_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Entity the action is bound to; `None` (or `"none"`) for global actions
    #[serde(default)]
    pub primary_entity: Option<String>,
    pub xaml: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_metadata_from_json() {
        let json = r#"{
            "logicalName": "account",
            "schemaName": "Account",
            "displayName": "Account",
            "primaryIdAttribute": "accountid",
            "attributes": [
                { "logicalName": "name", "attributeType": "String", "maxLength": 160 },
                { "logicalName": "statecode", "attributeType": "State", "isValidForCreate": false }
            ]
        }"#;

        let entity: EntityMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(entity.logical_name, "account");
        assert_eq!(entity.attributes.len(), 2);
        assert_eq!(entity.attribute("name").unwrap().max_length, Some(160));
        assert!(!entity.attribute("statecode").unwrap().is_valid_for_create);
        assert!(entity.attribute("statecode").unwrap().is_valid_for_update);
        assert!(entity.is_primary("accountid"));
    }

    #[test]
    fn test_partner_of_many_to_many() {
        let rel = ManyToManyRelationship {
            schema_name: "accountleads_association".to_string(),
            intersect_entity_name: "accountleads".to_string(),
            entity1_logical_name: "account".to_string(),
            entity1_intersect_attribute: "accountid".to_string(),
            entity2_logical_name: "lead".to_string(),
            entity2_intersect_attribute: "leadid".to_string(),
        };
        assert_eq!(rel.partner_of("account"), "lead");
        assert_eq!(rel.partner_of("lead"), "account");
    }
}

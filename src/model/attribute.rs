//! Attribute model construction.
//!
//! [`build_attribute`] dispatches on the attribute type code to one typed
//! constructor per attribute kind. Each constructor starts from the shared
//! base record (names, eligibility, accessors) and fills in its own kind.

use crate::error::{GenerationError, Result};
use crate::metadata::cache::MetadataCache;
use crate::metadata::types::{AttributeMetadata, AttributeTypeCode, EntityMetadata};
use crate::model::naming;
use crate::model::types::{
    AccessorSpec, AttributeData, AttributeKind, LookupRelationData, ValueType,
};

/// Precision used when metadata does not specify one
pub const DEFAULT_PRECISION: u32 = 2;

/// Entity through which party-list values are stored
pub const ACTIVITY_PARTY: &str = "activityparty";

const DECIMAL_RANGE: (f64, f64) = (-100_000_000_000.0, 100_000_000_000.0);
const DOUBLE_RANGE: (f64, f64) = (-100_000_000_000.0, 100_000_000_000.0);
const MONEY_RANGE: (f64, f64) = (-922_337_203_685_477.0, 922_337_203_685_477.0);

/// Build the generated attribute(s) for one attribute of `entity`
///
/// Returns no attribute for type codes that are never generated and for
/// lookups that resolve to no relationship; money yields two.
pub fn build_attribute(
    entity: &EntityMetadata,
    meta: &AttributeMetadata,
    cache: &MetadataCache,
) -> Result<Vec<AttributeData>> {
    let built = match meta.attribute_type {
        AttributeTypeCode::Boolean => vec![build_boolean_attribute(entity, meta)],
        AttributeTypeCode::Customer | AttributeTypeCode::Lookup | AttributeTypeCode::Owner => {
            build_lookup_attribute(entity, meta, cache)?.into_iter().collect()
        }
        AttributeTypeCode::PartyList => {
            build_party_list_attribute(entity, meta, cache)?.into_iter().collect()
        }
        AttributeTypeCode::DateTime => vec![build_date_time_attribute(entity, meta)],
        AttributeTypeCode::Decimal
        | AttributeTypeCode::Double
        | AttributeTypeCode::Integer
        | AttributeTypeCode::BigInt
        | AttributeTypeCode::Money => build_numeric_attribute(entity, meta),
        AttributeTypeCode::Memo | AttributeTypeCode::String => {
            vec![build_string_attribute(entity, meta)]
        }
        AttributeTypeCode::Uniqueidentifier => vec![build_identifier_attribute(entity, meta)],
        AttributeTypeCode::EntityName => vec![build_entity_name_attribute(entity, meta)],
        AttributeTypeCode::Picklist | AttributeTypeCode::State | AttributeTypeCode::Status => {
            build_option_set_attribute(entity, meta).into_iter().collect()
        }
        AttributeTypeCode::CalendarRules
        | AttributeTypeCode::Virtual
        | AttributeTypeCode::ManagedProperty => Vec::new(),
    };

    Ok(built)
}

/// Base attribute record shared by every kind
///
/// The attribute is eligible when readable and not a sub-attribute of a
/// composite field, unless it is the entity's primary id or name. The setter
/// additionally requires the field to be creatable and updatable.
pub fn build_default_attribute(
    entity: &EntityMetadata,
    meta: &AttributeMetadata,
    value_type: ValueType,
) -> AttributeData {
    let generate = meta.is_valid_for_read
        && (meta.attribute_of.is_none() || entity.is_primary(&meta.logical_name));
    let settable = generate
        && meta.is_valid_for_create
        && meta.is_valid_for_update
        && meta.attribute_of.is_none();

    let display_name = meta
        .display_name
        .clone()
        .unwrap_or_else(|| meta.schema_name.clone());
    let code_name = naming::code_name_or(meta.display_name.as_deref(), &meta.schema_name);

    AttributeData {
        logical_name: meta.logical_name.clone(),
        schema_name: meta.schema_name.clone(),
        summary: meta.description.clone().unwrap_or_else(|| display_name.clone()),
        display_name,
        type_code: meta.attribute_type,
        generate,
        getter: AccessorSpec::new(code_name.clone(), value_type.clone(), generate),
        formatted_getter: AccessorSpec::new(
            naming::formatted_name(&code_name),
            ValueType::String,
            false,
        ),
        setter: AccessorSpec::new(code_name.clone(), value_type, settable),
        code_name,
        kind: AttributeKind::Default,
    }
}

fn with_formatted(mut attribute: AttributeData) -> AttributeData {
    attribute.formatted_getter.generate = attribute.generate;
    attribute
}

pub fn build_boolean_attribute(entity: &EntityMetadata, meta: &AttributeMetadata) -> AttributeData {
    let mut attribute = build_default_attribute(entity, meta, ValueType::Boolean);
    attribute.kind = AttributeKind::Boolean;
    with_formatted(attribute)
}

pub fn build_date_time_attribute(
    entity: &EntityMetadata,
    meta: &AttributeMetadata,
) -> AttributeData {
    let mut attribute = build_default_attribute(entity, meta, ValueType::DateTime);
    attribute.kind = AttributeKind::DateTime {
        behavior: meta.date_time_behavior.unwrap_or_default(),
    };
    with_formatted(attribute)
}

pub fn build_string_attribute(entity: &EntityMetadata, meta: &AttributeMetadata) -> AttributeData {
    let mut attribute = build_default_attribute(entity, meta, ValueType::String);
    attribute.kind = AttributeKind::String {
        max_length: meta.max_length,
    };
    attribute
}

pub fn build_identifier_attribute(
    entity: &EntityMetadata,
    meta: &AttributeMetadata,
) -> AttributeData {
    let mut attribute = build_default_attribute(entity, meta, ValueType::Guid);
    let code_name = naming::identifier_name(&attribute.code_name);
    attribute.rename(code_name);
    attribute.kind = AttributeKind::Identifier;
    attribute
}

/// Entity-name attributes are plain strings and never independently settable
pub fn build_entity_name_attribute(
    entity: &EntityMetadata,
    meta: &AttributeMetadata,
) -> AttributeData {
    let mut attribute = build_default_attribute(entity, meta, ValueType::String);
    attribute.setter.generate = false;
    attribute
}

/// Picklist, state and status attributes typed by their option set
///
/// Returns `None` when the metadata carries no option set.
pub fn build_option_set_attribute(
    entity: &EntityMetadata,
    meta: &AttributeMetadata,
) -> Option<AttributeData> {
    let Some(option_set) = meta.option_set.as_ref() else {
        tracing::warn!(
            "Option set attribute '{}.{}' has no option set metadata, skipping",
            entity.logical_name,
            meta.logical_name
        );
        return None;
    };

    let is_global = option_set.is_global && meta.attribute_type == AttributeTypeCode::Picklist;
    let key = option_set_key(entity, meta);
    let mut attribute = build_default_attribute(
        entity,
        meta,
        ValueType::OptionSet {
            option_set: key.clone(),
        },
    );
    attribute.kind = AttributeKind::OptionSet {
        option_set: key,
        is_global,
    };
    Some(with_formatted(attribute))
}

/// Logical name the entity's option set list uses for this attribute's option set
///
/// Global option sets keep their own name; entity-local ones (including all
/// state and status sets) are keyed by the option set's name as well, which
/// is unique per entity and attribute in the metadata.
pub fn option_set_key(entity: &EntityMetadata, meta: &AttributeMetadata) -> String {
    meta.option_set
        .as_ref()
        .map(|o| o.name.clone())
        .unwrap_or_else(|| format!("{}_{}", entity.logical_name, meta.logical_name))
}

/// Integer, big-integer, decimal, double and money attributes
///
/// Money yields the raw wrapper plus a `<CodeName>Value` numeric accessor
/// that shares the logical name and carries the range bounds.
pub fn build_numeric_attribute(
    entity: &EntityMetadata,
    meta: &AttributeMetadata,
) -> Vec<AttributeData> {
    let precision = meta.precision.unwrap_or(DEFAULT_PRECISION);
    match meta.attribute_type {
        AttributeTypeCode::Integer => {
            let mut attribute = build_default_attribute(entity, meta, ValueType::Integer);
            attribute.kind = AttributeKind::Numeric {
                min: int_bound(meta.min_value, i32::MIN as i64),
                max: int_bound(meta.max_value, i32::MAX as i64),
            };
            vec![with_formatted(attribute)]
        }
        AttributeTypeCode::BigInt => {
            let mut attribute = build_default_attribute(entity, meta, ValueType::BigInt);
            attribute.kind = AttributeKind::Numeric {
                min: int_bound(meta.min_value, i64::MIN),
                max: int_bound(meta.max_value, i64::MAX),
            };
            vec![with_formatted(attribute)]
        }
        AttributeTypeCode::Decimal | AttributeTypeCode::Double => {
            let (value_type, range) = if meta.attribute_type == AttributeTypeCode::Decimal {
                (ValueType::Decimal, DECIMAL_RANGE)
            } else {
                (ValueType::Double, DOUBLE_RANGE)
            };
            let mut attribute = build_default_attribute(entity, meta, value_type);
            attribute.kind = AttributeKind::Precision {
                min: meta.min_value.unwrap_or(range.0),
                max: meta.max_value.unwrap_or(range.1),
                precision,
            };
            vec![with_formatted(attribute)]
        }
        AttributeTypeCode::Money => {
            let mut wrapper = build_default_attribute(entity, meta, ValueType::Money);
            wrapper.kind = AttributeKind::Money { precision };
            let wrapper = with_formatted(wrapper);

            let mut value = build_default_attribute(entity, meta, ValueType::Decimal);
            value.rename(format!("{}Value", wrapper.code_name));
            value.formatted_getter.generate = false;
            value.summary = format!("{} (numeric value)", wrapper.summary);
            value.kind = AttributeKind::MoneyValue {
                min: meta.min_value.unwrap_or(MONEY_RANGE.0),
                max: meta.max_value.unwrap_or(MONEY_RANGE.1),
                precision,
            };

            vec![wrapper, value]
        }
        _ => vec![build_default_attribute(entity, meta, ValueType::String)],
    }
}

fn int_bound(value: Option<f64>, natural: i64) -> i64 {
    value.map(|v| v as i64).unwrap_or(natural)
}

/// Single-valued reference attribute (lookup, customer, owner)
///
/// Returns `None` when no declared target has a matching many-to-one
/// relationship, which happens with stale metadata.
pub fn build_lookup_attribute(
    entity: &EntityMetadata,
    meta: &AttributeMetadata,
    cache: &MetadataCache,
) -> Result<Option<AttributeData>> {
    let relations = resolve_relations(entity, meta, cache)?;
    if relations.is_empty() {
        tracing::warn!(
            "Lookup '{}.{}' resolves to no relationship, skipping",
            entity.logical_name,
            meta.logical_name
        );
        return Ok(None);
    }

    let mut attribute = build_default_attribute(entity, meta, ValueType::EntityReference);
    attribute.summary = reference_summary(&attribute.display_name, "Lookup", &relations);
    attribute.kind = AttributeKind::Lookup { relations };
    Ok(Some(with_formatted(attribute)))
}

/// Party-list attribute: a collection of references, one relation per target
pub fn build_party_list_attribute(
    entity: &EntityMetadata,
    meta: &AttributeMetadata,
    cache: &MetadataCache,
) -> Result<Option<AttributeData>> {
    let relations = resolve_party_targets(entity, meta, cache)?;
    if relations.is_empty() {
        tracing::warn!(
            "Party list '{}.{}' resolves to no target, skipping",
            entity.logical_name,
            meta.logical_name
        );
        return Ok(None);
    }

    let mut attribute =
        build_default_attribute(entity, meta, ValueType::EntityReferenceCollection);
    attribute.summary = reference_summary(&attribute.display_name, "Party list", &relations);
    attribute.kind = AttributeKind::PartyList { relations };
    Ok(Some(attribute))
}

fn reference_summary(display_name: &str, kind: &str, relations: &[LookupRelationData]) -> String {
    let targets: Vec<&str> = relations
        .iter()
        .map(|r| r.referenced_entity.as_str())
        .collect();
    format!("{} ({} to {})", display_name, kind, targets.join(", "))
}

/// One relation per declared target of a party list
///
/// Party lists are stored through activity-party records, so a target
/// usually has no many-to-one relationship of its own; the relation points at
/// the target's primary id. Targets without a primary id are skipped.
fn resolve_party_targets(
    entity: &EntityMetadata,
    meta: &AttributeMetadata,
    cache: &MetadataCache,
) -> Result<Vec<LookupRelationData>> {
    let mut relations = Vec::with_capacity(meta.targets.len());

    for target in &meta.targets {
        let related = cache.get_related_entity(target)?;
        let Some(primary_id) = related.primary_id_attribute.clone() else {
            tracing::debug!("Party list target '{}' has no primary id", target);
            continue;
        };

        let relationship_schema_name = entity
            .many_to_one_relationships
            .iter()
            .find(|r| {
                r.referencing_attribute == meta.logical_name && &r.referenced_entity == target
            })
            .map(|r| r.schema_name.clone())
            .unwrap_or_else(|| ACTIVITY_PARTY.to_string());

        relations.push(LookupRelationData {
            relationship_schema_name,
            referenced_entity: target.clone(),
            referenced_attribute: primary_id,
            referenced_collection: related.collection_name(),
            referenced_display_name: related.label().to_string(),
            referencing_display_name: meta
                .display_name
                .clone()
                .unwrap_or_else(|| meta.schema_name.clone()),
        });
    }

    Ok(relations)
}

/// One relation per declared target that has a many-to-one relationship
///
/// Every related entity must already be cached; a missing key attribute on
/// the related entity is a not-found error.
fn resolve_relations(
    entity: &EntityMetadata,
    meta: &AttributeMetadata,
    cache: &MetadataCache,
) -> Result<Vec<LookupRelationData>> {
    let mut relations = Vec::new();

    for target in &meta.targets {
        let Some(rel) = entity.many_to_one_relationships.iter().find(|r| {
            r.referencing_attribute == meta.logical_name && &r.referenced_entity == target
        }) else {
            tracing::debug!(
                "No relationship from '{}.{}' to '{}'",
                entity.logical_name,
                meta.logical_name,
                target
            );
            continue;
        };

        let related = cache.get_related_entity(target)?;
        if related.attribute(&rel.referenced_attribute).is_none() {
            return Err(GenerationError::AttributeNotFound {
                entity: target.clone(),
                attribute: rel.referenced_attribute.clone(),
            });
        }

        relations.push(LookupRelationData {
            relationship_schema_name: rel.schema_name.clone(),
            referenced_entity: target.clone(),
            referenced_attribute: rel.referenced_attribute.clone(),
            referenced_collection: related.collection_name(),
            referenced_display_name: related.label().to_string(),
            referencing_display_name: meta
                .display_name
                .clone()
                .unwrap_or_else(|| meta.schema_name.clone()),
        });
    }

    Ok(relations)
}

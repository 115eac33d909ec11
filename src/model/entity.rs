//! Entity model construction from root metadata and cached related entities.

use crate::error::{GenerationError, Result};
use crate::metadata::cache::MetadataCache;
use crate::metadata::types::{AttributeMetadata, AttributeTypeCode, EntityMetadata};
use crate::model::attribute::{build_attribute, option_set_key};
use crate::model::naming;
use crate::model::types::{
    CollectionFetcherData, EntityData, IntersectFetcherData, OptionData, OptionSetData,
};
use std::collections::HashSet;

/// System lookups that only mirror the owner split by principal type
const OWNER_DECOMPOSITION: &[&str] = &["owninguser", "owningteam"];

/// Build the full model for one root entity
///
/// Every related entity named by a lookup, one-to-many or many-to-many
/// relationship must already be in `cache`.
pub fn build_entity(meta: &EntityMetadata, cache: &MetadataCache) -> Result<EntityData> {
    let generate = !meta.is_intersect
        && meta.primary_id_attribute.is_some()
        && meta.primary_name_attribute.is_some();
    if !generate {
        tracing::debug!("Entity '{}' is not generated", meta.logical_name);
    }

    let mut entity = EntityData {
        logical_name: meta.logical_name.clone(),
        schema_name: meta.schema_name.clone(),
        display_name: meta.label().to_string(),
        class_name: naming::code_name_or(meta.display_name.as_deref(), &meta.schema_name),
        description: meta.description.clone(),
        object_type_code: meta.object_type_code,
        entity_set_name: meta.entity_set_name.clone(),
        primary_id_attribute: meta.primary_id_attribute.clone(),
        primary_name_attribute: meta.primary_name_attribute.clone(),
        attributes: Vec::new(),
        internal_option_sets: Vec::new(),
        external_option_sets: Vec::new(),
        collection_fetchers: Vec::new(),
        intersect_fetchers: Vec::new(),
        generate,
    };

    for attribute in &meta.attributes {
        if is_owner_decomposition(meta, attribute) {
            tracing::trace!(
                "Skipping owner attribute '{}.{}'",
                meta.logical_name,
                attribute.logical_name
            );
            continue;
        }

        let built = build_attribute(meta, attribute, cache)?;
        if built.is_empty() {
            continue;
        }
        entity.attributes.extend(built);

        if attribute.attribute_type.is_option_set() {
            add_option_set(&mut entity, meta, attribute);
        }
    }
    link_state_and_status(&mut entity, meta);

    entity.collection_fetchers = build_collection_fetchers(meta, cache)?;
    entity.intersect_fetchers = build_intersect_fetchers(meta, cache)?;

    tracing::debug!(
        "Built entity '{}': {} attributes, {} option sets, {} collections, {} intersects",
        entity.logical_name,
        entity.attributes.len(),
        entity.internal_option_sets.len() + entity.external_option_sets.len(),
        entity.collection_fetchers.len(),
        entity.intersect_fetchers.len()
    );

    Ok(entity)
}

/// Owner-type split attributes (`owneridtype`, `owninguser`, ...)
fn is_owner_decomposition(entity: &EntityMetadata, attribute: &AttributeMetadata) -> bool {
    if OWNER_DECOMPOSITION.contains(&attribute.logical_name.as_str()) {
        return true;
    }
    attribute
        .attribute_of
        .as_deref()
        .and_then(|parent| entity.attribute(parent))
        .map(|parent| parent.attribute_type == AttributeTypeCode::Owner)
        .unwrap_or(false)
}

fn add_option_set(entity: &mut EntityData, meta: &EntityMetadata, attribute: &AttributeMetadata) {
    let Some(option_set) = build_option_set(meta, attribute) else {
        return;
    };

    if option_set.is_global {
        if entity
            .external_option_sets
            .iter()
            .any(|o| o.logical_name == option_set.logical_name)
        {
            return;
        }
        entity.external_option_sets.push(option_set);
    } else {
        entity.internal_option_sets.push(option_set);
    }
}

/// Option set model for a picklist, state or status attribute
///
/// State and status option sets are always entity-local.
pub fn build_option_set(
    entity: &EntityMetadata,
    attribute: &AttributeMetadata,
) -> Option<OptionSetData> {
    let metadata = attribute.option_set.as_ref()?;
    let is_global = metadata.is_global && attribute.attribute_type == AttributeTypeCode::Picklist;

    let display_name = metadata
        .display_name
        .clone()
        .or_else(|| attribute.display_name.clone())
        .unwrap_or_else(|| metadata.name.clone());
    let base_name = naming::code_name_or(Some(display_name.as_str()), &metadata.name);

    let mut seen = HashSet::new();
    let options = metadata
        .options
        .iter()
        .map(|option| {
            let label = option
                .label
                .as_deref()
                .map(naming::code_name)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| format!("Value{}", option.value));
            let name = if seen.insert(label.clone()) {
                label
            } else {
                format!("{}_{}", label, option.value)
            };
            OptionData {
                name,
                value: option.value,
                state: option.state,
            }
        })
        .collect();

    Some(OptionSetData {
        logical_name: option_set_key(entity, attribute),
        display_name,
        enum_name: base_name.clone(),
        exposed_name: if is_global {
            naming::shared_type_name(&metadata.name)
        } else {
            base_name.clone()
        },
        base_name,
        is_global,
        options,
        linked_option_set: None,
    })
}

fn link_state_and_status(entity: &mut EntityData, meta: &EntityMetadata) {
    let key_of = |code: AttributeTypeCode| {
        meta.attributes
            .iter()
            .find(|a| a.attribute_type == code && a.option_set.is_some())
            .map(|a| option_set_key(meta, a))
    };
    let (Some(state), Some(status)) = (
        key_of(AttributeTypeCode::State),
        key_of(AttributeTypeCode::Status),
    ) else {
        return;
    };

    for option_set in &mut entity.internal_option_sets {
        if option_set.logical_name == state {
            option_set.linked_option_set = Some(status.clone());
        } else if option_set.logical_name == status {
            option_set.linked_option_set = Some(state.clone());
        }
    }
}

fn build_collection_fetchers(
    meta: &EntityMetadata,
    cache: &MetadataCache,
) -> Result<Vec<CollectionFetcherData>> {
    let mut fetchers = Vec::with_capacity(meta.one_to_many_relationships.len());

    for rel in &meta.one_to_many_relationships {
        let related = cache.get_related_entity(&rel.referencing_entity)?;
        let attribute = related.attribute(&rel.referencing_attribute).ok_or_else(|| {
            GenerationError::AttributeNotFound {
                entity: rel.referencing_entity.clone(),
                attribute: rel.referencing_attribute.clone(),
            }
        })?;

        let mut fetcher = CollectionFetcherData {
            relationship_schema_name: rel.schema_name.clone(),
            related_entity: rel.referencing_entity.clone(),
            related_attribute: rel.referencing_attribute.clone(),
            related_attribute_code_name: attribute.code_name.clone(),
            target_class_name: related.class_name.clone(),
            target_plural_code_name: related.plural_code_name.clone(),
            accessor_name: String::new(),
        };
        fetcher.refresh_accessor_name();
        fetchers.push(fetcher);
    }

    Ok(fetchers)
}

fn build_intersect_fetchers(
    meta: &EntityMetadata,
    cache: &MetadataCache,
) -> Result<Vec<IntersectFetcherData>> {
    let mut fetchers = Vec::with_capacity(meta.many_to_many_relationships.len());

    for rel in &meta.many_to_many_relationships {
        let partner = rel.partner_of(&meta.logical_name);
        let related = cache.get_related_entity(partner)?;

        let mut fetcher = IntersectFetcherData {
            relationship_schema_name: rel.schema_name.clone(),
            intersect_entity: rel.intersect_entity_name.clone(),
            target_entity: partner.to_string(),
            target_class_name: related.class_name.clone(),
            target_collection_code_name: related.plural_code_name.clone(),
            accessor_name: String::new(),
        };
        fetcher.refresh_accessor_name();
        fetchers.push(fetcher);
    }

    Ok(fetchers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::snapshot::fixture_service;
    use crate::model::types::{AttributeKind, ValueType};
    use std::num::NonZeroUsize;

    fn build(key: &str) -> EntityData {
        let service = fixture_service();
        let cache = MetadataCache::new(NonZeroUsize::new(200).unwrap());
        cache
            .get_entities(&service, &[key.to_string()])
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_account_header() {
        let account = build("account");
        assert_eq!(account.class_name, "Account");
        assert_eq!(account.object_type_code, 1);
        assert!(account.generate);
    }

    #[test]
    fn test_owner_decomposition_and_stale_lookup_are_skipped() {
        let account = build("account");
        let logical: Vec<&str> = account
            .attributes
            .iter()
            .map(|a| a.logical_name.as_str())
            .collect();
        assert!(logical.contains(&"ownerid"));
        assert!(!logical.contains(&"owneridtype"));
        assert!(!logical.contains(&"owninguser"));
        assert!(!logical.contains(&"new_legacyid"));
        assert!(!logical.contains(&"entityimage"));
    }

    #[test]
    fn test_lookup_sub_attribute_kept_but_not_generated() {
        let account = build("account");
        let name = account
            .attributes
            .iter()
            .find(|a| a.logical_name == "primarycontactidname")
            .unwrap();
        assert!(!name.generate);
    }

    #[test]
    fn test_owner_lookup_relations() {
        let account = build("account");
        let owner = account.attribute("Owner").unwrap();
        let targets: Vec<&str> = owner
            .relations()
            .iter()
            .map(|r| r.referenced_entity.as_str())
            .collect();
        assert_eq!(targets, vec!["systemuser", "team"]);
    }

    #[test]
    fn test_option_sets_split_internal_and_external() {
        let account = build("account");

        assert_eq!(account.external_option_sets.len(), 1);
        assert_eq!(account.external_option_sets[0].logical_name, "category");

        let internal: Vec<&str> = account
            .internal_option_sets
            .iter()
            .map(|o| o.logical_name.as_str())
            .collect();
        assert_eq!(
            internal,
            vec!["account_industrycode", "account_statecode", "account_statuscode"]
        );

        let state = account.option_set("account_statecode").unwrap();
        let status = account.option_set("account_statuscode").unwrap();
        assert_eq!(state.linked_option_set.as_deref(), Some("account_statuscode"));
        assert_eq!(status.linked_option_set.as_deref(), Some("account_statecode"));
        assert_eq!(status.options[1].state, Some(1));
    }

    #[test]
    fn test_duplicate_option_labels_get_value_suffix() {
        let account = build("account");
        let industry = account.option_set("account_industrycode").unwrap();
        let names: Vec<&str> = industry.options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Accounting",
                "AgricultureAndNon_petrolNaturalResourceExtraction",
                "Accounting_3"
            ]
        );
    }

    #[test]
    fn test_option_set_attribute_typed_by_key() {
        let account = build("account");
        let category = account.attribute("Category").unwrap();
        assert_eq!(
            category.getter.value_type,
            ValueType::OptionSet {
                option_set: "category".to_string()
            }
        );
        assert!(matches!(
            category.kind,
            AttributeKind::OptionSet { is_global: true, .. }
        ));
    }

    #[test]
    fn test_collection_and_intersect_fetchers() {
        let account = build("account");
        let accessors: Vec<&str> = account
            .collection_fetchers
            .iter()
            .map(|f| f.accessor_name.as_str())
            .collect();
        assert_eq!(
            accessors,
            vec![
                "CompanyName_Contacts",
                "ParentAccount_Accounts",
                "Regarding_Tasks",
                "Regarding_EmailMessages"
            ]
        );

        assert_eq!(account.intersect_fetchers.len(), 1);
        assert_eq!(account.intersect_fetchers[0].accessor_name, "Associated_Leads");
        assert_eq!(account.intersect_fetchers[0].target_entity, "lead");
    }

    #[test]
    fn test_polymorphic_regarding_summary() {
        let email = build("email");
        let regarding = email.attribute("Regarding").unwrap();
        assert_eq!(regarding.relations().len(), 3);
        for target in ["account", "contact", "lead"] {
            assert!(regarding.summary.contains(target));
        }

        let to = email.attribute("To").unwrap();
        assert!(matches!(to.kind, AttributeKind::PartyList { .. }));
        let keys: Vec<(&str, &str)> = to
            .relations()
            .iter()
            .map(|r| (r.referenced_entity.as_str(), r.referenced_attribute.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![("account", "accountid"), ("contact", "contactid"), ("lead", "leadid")]
        );
    }

    #[test]
    fn test_intersect_entity_not_generated() {
        let intersect = build("accountleads");
        assert!(!intersect.generate);
    }
}

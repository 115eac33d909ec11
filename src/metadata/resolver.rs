//! Related-entity requirement resolution.
//!
//! Before an entity model can be built, every entity its relationships and
//! lookups point at must be present in the cache, together with the key
//! attributes those relationships name. This module computes what is still
//! missing for a set of root entities.

use crate::metadata::batcher::RequirementMap;
use crate::metadata::cache::MetadataCache;
use crate::metadata::types::EntityMetadata;

/// Compute the related entities and attributes still missing from `cache`
///
/// Requirements of all roots are merged into one map so overlapping needs
/// are fetched once. An entity mapped to an empty set is needed for its
/// existence only (labels, collection names).
pub fn resolve_requirements<'a, I>(roots: I, cache: &MetadataCache) -> RequirementMap
where
    I: IntoIterator<Item = &'a EntityMetadata>,
{
    let mut requirements = RequirementMap::new();

    for root in roots {
        for rel in &root.many_to_one_relationships {
            require(
                &mut requirements,
                cache,
                &rel.referenced_entity,
                Some(&rel.referenced_attribute),
            );
        }

        for rel in &root.one_to_many_relationships {
            require(
                &mut requirements,
                cache,
                &rel.referencing_entity,
                Some(&rel.referencing_attribute),
            );
        }

        for rel in &root.many_to_many_relationships {
            require(&mut requirements, cache, rel.partner_of(&root.logical_name), None);
        }

        for attribute in root
            .attributes
            .iter()
            .filter(|a| a.attribute_type.is_reference())
        {
            for target in &attribute.targets {
                require(&mut requirements, cache, target, None);
            }
        }
    }

    requirements
}

fn require(
    requirements: &mut RequirementMap,
    cache: &MetadataCache,
    entity: &str,
    attribute: Option<&str>,
) {
    match attribute {
        Some(attribute) => {
            if !cache.has_related_attribute(entity, attribute) {
                requirements
                    .entry(entity.to_string())
                    .or_default()
                    .insert(attribute.to_string());
            }
        }
        None => {
            if !cache.contains_related(entity) {
                requirements.entry(entity.to_string()).or_default();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::cache::RelatedEntityData;
    use crate::metadata::types::{
        AttributeMetadata, AttributeTypeCode, ManyToManyRelationship, OneToManyRelationship,
    };
    use std::num::NonZeroUsize;

    fn one_to_many(
        schema: &str,
        referenced: (&str, &str),
        referencing: (&str, &str),
    ) -> OneToManyRelationship {
        OneToManyRelationship {
            schema_name: schema.to_string(),
            referenced_entity: referenced.0.to_string(),
            referenced_attribute: referenced.1.to_string(),
            referencing_entity: referencing.0.to_string(),
            referencing_attribute: referencing.1.to_string(),
        }
    }

    fn contact() -> EntityMetadata {
        let mut contact = EntityMetadata::new("contact");
        contact.attributes = vec![
            AttributeMetadata::new("parentcustomerid", AttributeTypeCode::Customer)
                .with_targets(&["account", "contact"]),
            AttributeMetadata::new("regardingobjectid", AttributeTypeCode::Lookup)
                .with_targets(&["lead"]),
        ];
        contact.many_to_one_relationships = vec![one_to_many(
            "contact_customer_accounts",
            ("account", "accountid"),
            ("contact", "parentcustomerid"),
        )];
        contact.one_to_many_relationships = vec![one_to_many(
            "contact_tasks",
            ("contact", "contactid"),
            ("task", "regardingobjectid"),
        )];
        contact.many_to_many_relationships = vec![ManyToManyRelationship {
            schema_name: "contactleads_association".to_string(),
            intersect_entity_name: "contactleads".to_string(),
            entity1_logical_name: "contact".to_string(),
            entity1_intersect_attribute: "contactid".to_string(),
            entity2_logical_name: "lead".to_string(),
            entity2_intersect_attribute: "leadid".to_string(),
        }];
        contact
    }

    fn cache() -> MetadataCache {
        MetadataCache::new(NonZeroUsize::new(100).unwrap())
    }

    #[test]
    fn test_collects_all_relationship_kinds() {
        let cache = cache();
        let root = contact();
        let reqs = resolve_requirements([&root], &cache);

        assert_eq!(reqs["account"].iter().collect::<Vec<_>>(), vec!["accountid"]);
        assert_eq!(reqs["task"].iter().collect::<Vec<_>>(), vec!["regardingobjectid"]);
        assert!(reqs["lead"].is_empty());
        assert!(reqs["contact"].is_empty());
    }

    #[test]
    fn test_skips_requirements_satisfied_by_cache() {
        let cache = cache();
        let root = contact();
        cache.store_related(RelatedEntityData::from_metadata(&root), false);

        let mut account = EntityMetadata::new("account");
        account.attributes = vec![AttributeMetadata::new(
            "accountid",
            AttributeTypeCode::Uniqueidentifier,
        )];
        cache.store_related(RelatedEntityData::from_metadata(&account), false);

        let reqs = resolve_requirements([&root], &cache);
        assert!(!reqs.contains_key("account"));
        assert!(!reqs.contains_key("contact"));
        assert!(reqs.contains_key("lead"));
        assert!(reqs.contains_key("task"));
    }

    #[test]
    fn test_cached_entity_missing_attribute_is_still_required() {
        let cache = cache();
        cache.store_related(
            RelatedEntityData::from_metadata(&EntityMetadata::new("account")),
            false,
        );

        let root = contact();
        let reqs = resolve_requirements([&root], &cache);
        assert!(reqs["account"].contains("accountid"));
    }

    #[test]
    fn test_requirements_merge_across_roots() {
        let cache = cache();
        let first = contact();
        let mut second = EntityMetadata::new("lead");
        second.many_to_one_relationships = vec![one_to_many(
            "lead_parent_account",
            ("account", "name"),
            ("lead", "parentaccountid"),
        )];

        let reqs = resolve_requirements([&first, &second], &cache);
        let account: Vec<_> = reqs["account"].iter().cloned().collect();
        assert_eq!(account, vec!["accountid", "name"]);
    }
}

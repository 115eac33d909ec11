//! Name collision resolution.
//!
//! Each pass takes an entity model and returns it with colliding derived
//! names suffixed. Passes only rewrite names; metadata-derived fields are
//! never touched. Grouping follows list order, so the first member of every
//! group keeps its name and the output is stable for a given input.
//!
//! Internal option sets are suffixed relative to external ones, so
//! [`dedup_internal_option_sets`] must run after [`dedup_external_option_sets`].

use crate::model::types::{EntityData, ASSOCIATED};
use indexmap::IndexMap;
use std::hash::Hash;

/// Run every pass in dependency order
pub fn deduplicate(entity: EntityData) -> EntityData {
    let entity = dedup_attributes(entity);
    let entity = dedup_external_option_sets(entity);
    let entity = dedup_internal_option_sets(entity);
    let entity = dedup_collection_fetchers(entity);
    dedup_intersect_fetchers(entity)
}

/// Indices of `items` grouped by key, groups and members in first-seen order
fn group_indices<T, K, F>(items: &[T], key: F) -> IndexMap<K, Vec<usize>>
where
    K: Hash + Eq,
    F: Fn(&T) -> Option<K>,
{
    let mut groups: IndexMap<K, Vec<usize>> = IndexMap::new();
    for (index, item) in items.iter().enumerate() {
        if let Some(k) = key(item) {
            groups.entry(k).or_default().push(index);
        }
    }
    groups
}

/// Generated attributes sharing a code name: the n-th member gets `n` appended
///
/// The getter, setter and formatted getter follow the new code name.
pub fn dedup_attributes(mut entity: EntityData) -> EntityData {
    let groups = group_indices(&entity.attributes, |a| {
        a.generate.then(|| a.code_name.clone())
    });

    for (code_name, members) in groups {
        for (position, &index) in members.iter().enumerate().skip(1) {
            let renamed = format!("{}{}", code_name, position + 1);
            tracing::debug!(
                "Renaming attribute '{}.{}' to {}",
                entity.logical_name,
                entity.attributes[index].logical_name,
                renamed
            );
            entity.attributes[index].rename(renamed);
        }
    }
    entity
}

/// External option sets sharing a base name: the k-th member gets `k` appended
pub fn dedup_external_option_sets(mut entity: EntityData) -> EntityData {
    let groups = group_indices(&entity.external_option_sets, |o| Some(o.base_name.clone()));

    for members in groups.values() {
        for (position, &index) in members.iter().enumerate().skip(1) {
            entity.external_option_sets[index].append_suffix(position + 1);
        }
    }
    entity
}

/// Internal option sets, numbered after any external sets with the same base name
pub fn dedup_internal_option_sets(mut entity: EntityData) -> EntityData {
    let groups = group_indices(&entity.internal_option_sets, |o| Some(o.base_name.clone()));

    for (base_name, members) in groups {
        let external = entity
            .external_option_sets
            .iter()
            .filter(|o| o.base_name == base_name)
            .count();

        for (position, &index) in members.iter().enumerate() {
            let prior = external + position;
            if prior > 0 {
                entity.internal_option_sets[index].append_suffix(prior + 1);
            }
        }
    }
    entity
}

/// Collection accessors sharing a related attribute and target
///
/// Only the related-attribute component is suffixed.
pub fn dedup_collection_fetchers(mut entity: EntityData) -> EntityData {
    let groups = group_indices(&entity.collection_fetchers, |f| {
        Some((
            f.related_attribute_code_name.clone(),
            f.target_plural_code_name.clone(),
        ))
    });

    for members in groups.values() {
        for (position, &index) in members.iter().enumerate().skip(1) {
            let fetcher = &mut entity.collection_fetchers[index];
            fetcher.related_attribute_code_name =
                format!("{}{}", fetcher.related_attribute_code_name, position + 1);
            fetcher.refresh_accessor_name();
        }
    }
    entity
}

/// Intersect accessors sharing a target collection
///
/// Collection accessors whose related attribute is itself `Associated`
/// already occupy `Associated_<Target>`, so they count as prior members.
pub fn dedup_intersect_fetchers(mut entity: EntityData) -> EntityData {
    let groups = group_indices(&entity.intersect_fetchers, |f| {
        Some(f.target_collection_code_name.clone())
    });

    for (target, members) in groups {
        let associated = entity
            .collection_fetchers
            .iter()
            .filter(|f| {
                f.related_attribute_code_name == ASSOCIATED && f.target_plural_code_name == target
            })
            .count();

        for (position, &index) in members.iter().enumerate() {
            let prior = associated + position;
            if prior > 0 {
                let fetcher = &mut entity.intersect_fetchers[index];
                fetcher.target_collection_code_name = format!("{}{}", target, prior + 1);
                fetcher.refresh_accessor_name();
            }
        }
    }
    entity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::types::AttributeTypeCode;
    use crate::model::types::{
        AccessorSpec, AttributeData, AttributeKind, CollectionFetcherData, IntersectFetcherData,
        OptionSetData, ValueType,
    };
    use crate::model::naming;

    fn entity() -> EntityData {
        EntityData {
            logical_name: "account".to_string(),
            schema_name: "Account".to_string(),
            display_name: "Account".to_string(),
            class_name: "Account".to_string(),
            description: None,
            object_type_code: 1,
            entity_set_name: None,
            primary_id_attribute: Some("accountid".to_string()),
            primary_name_attribute: Some("name".to_string()),
            attributes: Vec::new(),
            internal_option_sets: Vec::new(),
            external_option_sets: Vec::new(),
            collection_fetchers: Vec::new(),
            intersect_fetchers: Vec::new(),
            generate: true,
        }
    }

    fn attribute(logical_name: &str, code_name: &str, generate: bool) -> AttributeData {
        AttributeData {
            logical_name: logical_name.to_string(),
            schema_name: logical_name.to_string(),
            display_name: code_name.to_string(),
            code_name: code_name.to_string(),
            type_code: AttributeTypeCode::String,
            generate,
            summary: String::new(),
            getter: AccessorSpec::new(code_name, ValueType::String, generate),
            formatted_getter: AccessorSpec::new(
                naming::formatted_name(code_name),
                ValueType::String,
                false,
            ),
            setter: AccessorSpec::new(code_name, ValueType::String, generate),
            kind: AttributeKind::Default,
        }
    }

    fn option_set(logical_name: &str, base_name: &str, is_global: bool) -> OptionSetData {
        OptionSetData {
            logical_name: logical_name.to_string(),
            display_name: base_name.to_string(),
            base_name: base_name.to_string(),
            enum_name: base_name.to_string(),
            exposed_name: if is_global {
                naming::shared_type_name(logical_name)
            } else {
                base_name.to_string()
            },
            is_global,
            options: Vec::new(),
            linked_option_set: None,
        }
    }

    fn collection(related: &str, target: &str) -> CollectionFetcherData {
        let mut fetcher = CollectionFetcherData {
            relationship_schema_name: format!("{}_{}", related, target),
            related_entity: target.to_lowercase(),
            related_attribute: related.to_lowercase(),
            related_attribute_code_name: related.to_string(),
            target_class_name: target.to_string(),
            target_plural_code_name: target.to_string(),
            accessor_name: String::new(),
        };
        fetcher.refresh_accessor_name();
        fetcher
    }

    fn intersect(schema: &str, target: &str) -> IntersectFetcherData {
        let mut fetcher = IntersectFetcherData {
            relationship_schema_name: schema.to_string(),
            intersect_entity: schema.to_lowercase(),
            target_entity: target.to_lowercase(),
            target_class_name: target.to_string(),
            target_collection_code_name: target.to_string(),
            accessor_name: String::new(),
        };
        fetcher.refresh_accessor_name();
        fetcher
    }

    #[test]
    fn test_status_collision() {
        let mut model = entity();
        model.attributes = vec![
            attribute("statecode", "Status", true),
            attribute("new_statusteamid", "Status", true),
        ];

        let model = dedup_attributes(model);
        let renamed = &model.attributes[1];
        assert_eq!(model.attributes[0].code_name, "Status");
        assert_eq!(renamed.code_name, "Status2");
        assert_eq!(renamed.getter.name, "Status2");
        assert_eq!(renamed.setter.name, "Status2");
        assert_eq!(renamed.formatted_getter.name, "Status2_Formatted");
    }

    #[test]
    fn test_formatted_name_separator_collapses() {
        let mut model = entity();
        model.attributes = vec![
            attribute("a", "Amount_", true),
            attribute("b", "Amount_", true),
        ];
        let model = dedup_attributes(model);
        assert_eq!(model.attributes[1].formatted_getter.name, "Amount_2_Formatted");
    }

    #[test]
    fn test_non_generated_attributes_are_ignored() {
        let mut model = entity();
        model.attributes = vec![
            attribute("a", "Name", false),
            attribute("b", "Name", true),
        ];
        let model = dedup_attributes(model);
        assert_eq!(model.attributes[0].code_name, "Name");
        assert_eq!(model.attributes[1].code_name, "Name");
    }

    #[test]
    fn test_many_duplicates_are_distinct_and_first_unchanged() {
        let mut model = entity();
        model.attributes = (0..5)
            .map(|i| attribute(&format!("attr{}", i), "Code", true))
            .collect();

        let model = dedup_attributes(model);
        let names: Vec<&str> = model.attributes.iter().map(|a| a.code_name.as_str()).collect();
        assert_eq!(names, vec!["Code", "Code2", "Code3", "Code4", "Code5"]);
    }

    #[test]
    fn test_deduplicate_is_deterministic() {
        let mut model = entity();
        model.attributes = vec![
            attribute("a", "Status", true),
            attribute("b", "Status", true),
            attribute("c", "Name", true),
        ];
        model.external_option_sets = vec![option_set("g1", "Category", true)];
        model.internal_option_sets = vec![option_set("l1", "Category", false)];
        model.collection_fetchers = vec![
            collection("Regarding", "Tasks"),
            collection("Regarding", "Tasks"),
        ];
        model.intersect_fetchers = vec![
            intersect("a_leads", "Leads"),
            intersect("b_leads", "Leads"),
        ];

        let first = deduplicate(model.clone());
        let second = deduplicate(model);
        assert_eq!(first, second);
    }

    #[test]
    fn test_external_option_sets_get_ordinal_suffix() {
        let mut model = entity();
        model.external_option_sets = vec![
            option_set("category", "Category", true),
            option_set("new_category", "Category", true),
            option_set("other_category", "Category", true),
        ];

        let model = dedup_external_option_sets(model);
        let names: Vec<(&str, &str)> = model
            .external_option_sets
            .iter()
            .map(|o| (o.enum_name.as_str(), o.exposed_name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Category", "Category"),
                ("Category2", "NewCategory"),
                ("Category3", "OtherCategory")
            ]
        );
    }

    #[test]
    fn test_internal_option_sets_account_for_external() {
        let mut model = entity();
        model.external_option_sets = vec![
            option_set("category", "Category", true),
            option_set("new_category", "Category", true),
        ];
        model.internal_option_sets = vec![
            option_set("account_category", "Category", false),
            option_set("account_other", "Category", false),
            option_set("account_industry", "Industry", false),
        ];

        let model = dedup_internal_option_sets(dedup_external_option_sets(model));
        let mut names: Vec<&str> = model
            .external_option_sets
            .iter()
            .chain(model.internal_option_sets.iter())
            .map(|o| o.enum_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["Category", "Category2", "Category3", "Category4", "Industry"]
        );

        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn test_internal_option_sets_without_external() {
        let mut model = entity();
        model.internal_option_sets = vec![
            option_set("a", "Status", false),
            option_set("b", "Status", false),
        ];
        let model = dedup_internal_option_sets(model);
        assert_eq!(model.internal_option_sets[0].enum_name, "Status");
        assert_eq!(model.internal_option_sets[1].enum_name, "Status2");
        assert_eq!(model.internal_option_sets[1].base_name, "Status");
    }

    #[test]
    fn test_collection_accessors_suffix_related_attribute_only() {
        let mut model = entity();
        model.collection_fetchers = vec![
            collection("Regarding", "Tasks"),
            collection("Regarding", "Tasks"),
            collection("Regarding", "Emails"),
        ];

        let model = dedup_collection_fetchers(model);
        let accessors: Vec<&str> = model
            .collection_fetchers
            .iter()
            .map(|f| f.accessor_name.as_str())
            .collect();
        assert_eq!(
            accessors,
            vec!["Regarding_Tasks", "Regarding2_Tasks", "Regarding_Emails"]
        );
        assert_eq!(model.collection_fetchers[1].target_plural_code_name, "Tasks");
    }

    #[test]
    fn test_intersect_accessors() {
        let mut model = entity();
        model.intersect_fetchers = vec![
            intersect("a_leads", "Leads"),
            intersect("b_leads", "Leads"),
        ];

        let model = dedup_intersect_fetchers(model);
        assert_eq!(model.intersect_fetchers[0].accessor_name, "Associated_Leads");
        assert_eq!(model.intersect_fetchers[1].accessor_name, "Associated_Leads2");
    }

    #[test]
    fn test_intersect_accessors_after_associated_collection() {
        let mut model = entity();
        model.collection_fetchers = vec![collection(ASSOCIATED, "Leads")];
        model.intersect_fetchers = vec![
            intersect("a_leads", "Leads"),
            intersect("b_leads", "Leads"),
        ];

        let model = dedup_intersect_fetchers(model);
        assert_eq!(model.collection_fetchers[0].accessor_name, "Associated_Leads");
        assert_eq!(model.intersect_fetchers[0].accessor_name, "Associated_Leads2");
        assert_eq!(model.intersect_fetchers[1].accessor_name, "Associated_Leads3");
    }
}

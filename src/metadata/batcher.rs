//! Request batching for related-entity metadata.
//!
//! The metadata service caps the number of attribute-name filter terms a
//! single request may carry. [`plan_batches`] partitions a requirement map
//! into requests under that cap, splitting an entity's own attribute list
//! across several requests when it alone exceeds the cap.

use crate::metadata::service::{filter_terms, AttributeFilter};
use indexmap::{IndexMap, IndexSet};
use std::num::NonZeroUsize;

/// Entity logical name -> attribute logical names that must be fetched
///
/// An empty attribute set means the entity is required for existence only.
pub type RequirementMap = IndexMap<String, IndexSet<String>>;

/// One metadata request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub entries: AttributeFilter,
}

impl Batch {
    /// Filter terms this batch sends to the service
    pub fn filter_count(&self) -> usize {
        filter_terms(&self.entries)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entity_keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Ordered batches plus the entities whose results must be merged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchPlan {
    pub batches: Vec<Batch>,
    /// Entities split across more than one batch
    pub merge_required: IndexSet<String>,
}

/// Partition `requirements` into batches of at most `cap` filter terms
///
/// Entries are accumulated greedily in input order. An entry whose own
/// attribute set exceeds the cap is split into cap-sized chunks, each under
/// the same entity key, and the entity is flagged in `merge_required`.
pub fn plan_batches(requirements: &RequirementMap, cap: NonZeroUsize) -> BatchPlan {
    let cap = cap.get();
    let mut plan = BatchPlan::default();
    let mut current = Batch::default();
    let mut count = 0;

    for (entity, attributes) in requirements {
        let cost = attributes.len().max(1);

        if cost <= cap {
            if count + cost > cap {
                plan.batches.push(std::mem::take(&mut current));
                count = 0;
            }
            current
                .entries
                .insert(entity.clone(), attributes.iter().cloned().collect());
            count += cost;
            continue;
        }

        plan.merge_required.insert(entity.clone());
        if !current.is_empty() {
            plan.batches.push(std::mem::take(&mut current));
        }

        let attributes: Vec<String> = attributes.iter().cloned().collect();
        for chunk in attributes.chunks(cap) {
            if !current.is_empty() {
                plan.batches.push(std::mem::take(&mut current));
            }
            current.entries.insert(entity.clone(), chunk.to_vec());
            count = chunk.len();
        }
    }

    if !current.is_empty() {
        plan.batches.push(current);
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn requirements(entries: &[(&str, &[&str])]) -> RequirementMap {
        entries
            .iter()
            .map(|(entity, attrs)| {
                (
                    entity.to_string(),
                    attrs.iter().map(|a| a.to_string()).collect(),
                )
            })
            .collect()
    }

    fn cap(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_fits_in_single_batch() {
        let reqs = requirements(&[("account", &["name", "accountid"]), ("contact", &["fullname"])]);
        let plan = plan_batches(&reqs, cap(5));

        assert_eq!(plan.batches.len(), 1);
        assert_eq!(plan.batches[0].filter_count(), 3);
        assert!(plan.merge_required.is_empty());
    }

    #[test]
    fn test_overflow_starts_new_batch() {
        let reqs = requirements(&[
            ("account", &["a", "b", "c"]),
            ("contact", &["d", "e"]),
            ("lead", &["f"]),
        ]);
        let plan = plan_batches(&reqs, cap(4));

        assert_eq!(plan.batches.len(), 2);
        assert_eq!(plan.batches[0].entity_keys(), vec!["account"]);
        assert_eq!(plan.batches[1].entity_keys(), vec!["contact", "lead"]);
    }

    #[test]
    fn test_oversized_entry_is_split_and_flagged() {
        let reqs = requirements(&[
            ("lead", &["x"]),
            ("account", &["a", "b", "c", "d", "e"]),
            ("contact", &["f"]),
        ]);
        let plan = plan_batches(&reqs, cap(2));

        assert!(plan.merge_required.contains("account"));
        assert_eq!(plan.merge_required.len(), 1);

        let account_chunks: Vec<Vec<String>> = plan
            .batches
            .iter()
            .filter_map(|b| b.entries.get("account").cloned())
            .collect();
        assert_eq!(account_chunks.len(), 3);
        assert_eq!(account_chunks.concat(), vec!["a", "b", "c", "d", "e"]);

        // The last chunk (one attribute) leaves room for the following entry
        let last = plan.batches.last().unwrap();
        assert_eq!(last.entity_keys(), vec!["account", "contact"]);
    }

    #[test]
    fn test_existence_only_entries_cost_one_term() {
        let reqs = requirements(&[("account", &[]), ("contact", &[]), ("lead", &[])]);
        let plan = plan_batches(&reqs, cap(2));

        assert_eq!(plan.batches.len(), 2);
        assert!(plan.batches[0].entries["account"].is_empty());
        assert!(plan.merge_required.is_empty());
    }

    #[test]
    fn test_empty_requirements_produce_no_batches() {
        let plan = plan_batches(&RequirementMap::new(), cap(10));
        assert!(plan.batches.is_empty());
    }

    fn arb_requirements() -> impl Strategy<Value = RequirementMap> {
        prop::collection::vec(
            ("[a-z]{1,6}", prop::collection::btree_set("[a-z]{1,8}", 0..12)),
            0..8,
        )
        .prop_map(|entries| {
            entries
                .into_iter()
                .map(|(entity, attrs)| (entity, attrs.into_iter().collect()))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_batches_respect_cap(reqs in arb_requirements(), cap in 1usize..10) {
            let plan = plan_batches(&reqs, NonZeroUsize::new(cap).unwrap());
            for batch in &plan.batches {
                prop_assert!(batch.filter_count() <= cap);
                prop_assert!(!batch.is_empty());
            }
        }

        #[test]
        fn prop_batches_reproduce_input(reqs in arb_requirements(), cap in 1usize..10) {
            let plan = plan_batches(&reqs, NonZeroUsize::new(cap).unwrap());

            let mut rebuilt: IndexMap<String, Vec<String>> = IndexMap::new();
            for batch in &plan.batches {
                for (entity, attrs) in &batch.entries {
                    rebuilt.entry(entity.clone()).or_default().extend(attrs.iter().cloned());
                }
            }

            prop_assert_eq!(rebuilt.len(), reqs.len());
            for (entity, attrs) in &reqs {
                let expected: Vec<String> = attrs.iter().cloned().collect();
                prop_assert_eq!(&rebuilt[entity], &expected);
                prop_assert_eq!(plan.merge_required.contains(entity), attrs.len() > cap);
            }
        }
    }
}

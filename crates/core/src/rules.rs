//! Entitled-collection evaluation.
//!
//! Given a shop's rule and a live snapshot of its collections, compute the
//! numeric ids of the collections a discount should apply to:
//!
//! - no rule, or an empty selection: every valid collection
//! - `exclude`: valid collections not in the selection
//! - `include`: valid collections in the selection
//!
//! Malformed descriptors (blank id, missing title) are dropped with a warning
//! instead of failing the evaluation. The returned order follows the input
//! order but callers must only rely on membership.

use serde::Serialize;

use crate::types::gid::numeric_id;
use crate::types::rule::{CollectionDescriptor, DiscountRule, RuleMode};

/// Compute the numeric ids of the collections a discount should apply to.
#[must_use]
pub fn entitled_collections(
    rule: Option<&DiscountRule>,
    collections: &[CollectionDescriptor],
) -> Vec<String> {
    let valid = collections.iter().filter(|c| {
        let ok = c.is_valid();
        if !ok {
            tracing::warn!(
                collection_id = %c.id,
                has_title = c.title.is_some(),
                "Dropping invalid collection descriptor"
            );
        }
        ok
    });

    let Some(rule) = rule.filter(|r| !r.excluded.is_empty()) else {
        return to_numeric(valid);
    };

    let selected = rule.selected_ids();
    match rule.mode {
        RuleMode::Exclude => to_numeric(valid.filter(|c| !selected.contains(c.id.as_str()))),
        RuleMode::Include => to_numeric(valid.filter(|c| selected.contains(c.id.as_str()))),
    }
}

fn to_numeric<'a>(collections: impl Iterator<Item = &'a CollectionDescriptor>) -> Vec<String> {
    collections
        .filter_map(|c| {
            let id = numeric_id(&c.id);
            if id.is_none() {
                tracing::warn!(collection_id = %c.id, "Invalid collection ID");
            }
            id.map(str::to_string)
        })
        .collect()
}

/// Counts shown to merchants after an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementSummary {
    /// Collections in the inventory snapshot.
    pub total: usize,
    /// Collections the discount applies to.
    pub entitled: usize,
    /// `total - entitled`.
    pub excluded: usize,
}

/// Summarise an evaluation result against the inventory it came from.
#[must_use]
pub fn summarize(collections: &[CollectionDescriptor], entitled: &[String]) -> EntitlementSummary {
    EntitlementSummary {
        total: collections.len(),
        entitled: entitled.len(),
        excluded: collections.len().saturating_sub(entitled.len()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use chrono::Utc;

    use super::*;
    use crate::types::{RuleId, ShopDomain};

    fn collection(n: u32) -> CollectionDescriptor {
        CollectionDescriptor::new(
            format!("gid://shopify/Collection/{n}"),
            format!("Collection {n}"),
            i64::from(n),
        )
    }

    fn rule(mode: RuleMode, selected: &[u32]) -> DiscountRule {
        DiscountRule {
            id: RuleId::new(1),
            shop: ShopDomain::parse("demo.myshopify.com").unwrap(),
            mode,
            active: true,
            excluded: selected.iter().copied().map(collection).collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ids(result: &[String]) -> HashSet<&str> {
        result.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_no_rule_returns_every_valid_collection() {
        let inventory: Vec<_> = (1..=4).map(collection).collect();
        let result = entitled_collections(None, &inventory);
        assert_eq!(ids(&result), HashSet::from(["1", "2", "3", "4"]));
    }

    #[test]
    fn test_empty_selection_is_unrestricted_in_either_mode() {
        let inventory: Vec<_> = (1..=3).map(collection).collect();
        for mode in [RuleMode::Exclude, RuleMode::Include] {
            let r = rule(mode, &[]);
            assert_eq!(entitled_collections(Some(&r), &inventory).len(), 3);
        }
    }

    #[test]
    fn test_exclude_mode_removes_selected() {
        let inventory: Vec<_> = (1..=5).map(collection).collect();
        let r = rule(RuleMode::Exclude, &[2, 4]);
        let result = entitled_collections(Some(&r), &inventory);
        assert_eq!(ids(&result), HashSet::from(["1", "3", "5"]));
    }

    #[test]
    fn test_exclude_mode_partitions_inventory() {
        let inventory: Vec<_> = (1..=6).map(collection).collect();
        let r = rule(RuleMode::Exclude, &[1, 6, 42]);
        let entitled = entitled_collections(Some(&r), &inventory);

        let excluded_present: Vec<String> = inventory
            .iter()
            .filter(|c| r.selected_ids().contains(c.id.as_str()))
            .filter_map(|c| numeric_id(&c.id).map(str::to_string))
            .collect();

        let mut union: Vec<&str> = entitled
            .iter()
            .chain(excluded_present.iter())
            .map(String::as_str)
            .collect();
        union.sort_unstable();
        let mut all: Vec<String> = (1..=6).map(|n| n.to_string()).collect();
        all.sort_unstable();
        assert_eq!(union, all.iter().map(String::as_str).collect::<Vec<_>>());
        assert!(ids(&entitled).is_disjoint(&ids(&excluded_present)));
    }

    #[test]
    fn test_include_mode_keeps_only_selected_present_in_inventory() {
        let inventory: Vec<_> = (1..=5).map(collection).collect();
        let r = rule(RuleMode::Include, &[2, 5, 99]);
        let result = entitled_collections(Some(&r), &inventory);
        assert_eq!(ids(&result), HashSet::from(["2", "5"]));
    }

    #[test]
    fn test_invalid_descriptors_are_dropped() {
        let inventory = vec![
            CollectionDescriptor::new("", "x", 0),
            CollectionDescriptor::new("gid://shopify/Collection/5", "y", 0),
        ];
        assert_eq!(entitled_collections(None, &inventory), vec!["5".to_string()]);
    }

    #[test]
    fn test_untitled_descriptor_dropped_even_when_selected() {
        let untitled = CollectionDescriptor {
            id: "gid://shopify/Collection/7".to_string(),
            title: None,
            products_count: 0,
        };
        let inventory = vec![untitled, collection(8)];
        let r = rule(RuleMode::Include, &[7, 8]);
        assert_eq!(
            entitled_collections(Some(&r), &inventory),
            vec!["8".to_string()]
        );
    }

    #[test]
    fn test_empty_id_suffix_is_skipped() {
        let inventory = vec![
            CollectionDescriptor::new("gid://shopify/Collection/", "Broken", 0),
            collection(3),
        ];
        assert_eq!(entitled_collections(None, &inventory), vec!["3".to_string()]);
    }

    #[test]
    fn test_empty_inventory_yields_empty_set() {
        assert!(entitled_collections(None, &[]).is_empty());
        let r = rule(RuleMode::Include, &[1]);
        assert!(entitled_collections(Some(&r), &[]).is_empty());
        let r = rule(RuleMode::Exclude, &[1]);
        assert!(entitled_collections(Some(&r), &[]).is_empty());
    }

    #[test]
    fn test_summarize_counts() {
        let inventory: Vec<_> = (1..=5).map(collection).collect();
        let r = rule(RuleMode::Exclude, &[1, 2]);
        let entitled = entitled_collections(Some(&r), &inventory);
        assert_eq!(
            summarize(&inventory, &entitled),
            EntitlementSummary {
                total: 5,
                entitled: 3,
                excluded: 2,
            }
        );
    }
}

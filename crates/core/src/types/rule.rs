//! Discount rule model.
//!
//! A shop has at most one active rule. The rule stores a mode and an ordered
//! set of collection descriptors; in `exclude` mode the set lists collections
//! to keep out of discounts, in `include` mode it lists the only collections
//! discounts may apply to.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{RuleId, RuleLogId};
use super::shop::ShopDomain;

/// How a rule's collection set is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "rule_mode", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum RuleMode {
    /// Every collection except the selected ones is eligible.
    #[default]
    Exclude,
    /// Only the selected collections are eligible.
    Include,
}

impl RuleMode {
    /// Past-tense verb used in merchant-facing messages.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Exclude => "excluded",
            Self::Include => "included",
        }
    }
}

impl std::fmt::Display for RuleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exclude => write!(f, "exclude"),
            Self::Include => write!(f, "include"),
        }
    }
}

impl std::str::FromStr for RuleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exclude" => Ok(Self::Exclude),
            "include" => Ok(Self::Include),
            _ => Err(format!("invalid rule mode: {s}")),
        }
    }
}

/// A collection as seen by the rule evaluator.
///
/// `title` is optional because the live inventory may return collections
/// without one; such descriptors are dropped during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDescriptor {
    /// Qualified collection GID.
    pub id: String,
    /// Display title.
    pub title: Option<String>,
    /// Number of products in the collection.
    #[serde(default)]
    pub products_count: i64,
}

impl CollectionDescriptor {
    /// Create a descriptor with a title.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, products_count: i64) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
            products_count,
        }
    }

    /// A descriptor is usable when its id is not blank and it has a title.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty() && self.title.is_some()
    }
}

/// The persisted rule for a shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRule {
    pub id: RuleId,
    pub shop: ShopDomain,
    pub mode: RuleMode,
    pub active: bool,
    /// Selected collections. Excluded in `exclude` mode, included in `include` mode.
    pub excluded: Vec<CollectionDescriptor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DiscountRule {
    /// The set of selected collection GIDs.
    #[must_use]
    pub fn selected_ids(&self) -> HashSet<&str> {
        self.excluded.iter().map(|c| c.id.as_str()).collect()
    }
}

/// Payload for creating or wholesale replacing a shop's rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRule {
    pub shop: ShopDomain,
    pub mode: RuleMode,
    pub excluded: Vec<CollectionDescriptor>,
}

impl NewRule {
    /// Build a rule payload, collapsing duplicate collection ids.
    ///
    /// The first occurrence of each id wins so the stored order matches the
    /// order the merchant selected collections in.
    #[must_use]
    pub fn new(shop: ShopDomain, mode: RuleMode, excluded: Vec<CollectionDescriptor>) -> Self {
        let mut seen = HashSet::new();
        let excluded = excluded
            .into_iter()
            .filter(|c| seen.insert(c.id.clone()))
            .collect();
        Self {
            shop,
            mode,
            excluded,
        }
    }
}

/// Well-known rule log actions.
pub struct RuleAction;

impl RuleAction {
    pub const RULE_SAVED: &'static str = "rule_saved";
    pub const RULE_SAVE_ERROR: &'static str = "rule_save_error";
    pub const RULE_APPLIED: &'static str = "rule_applied";
    pub const RULE_APPLIED_ALL: &'static str = "rule_applied_all";
    pub const SHOP_REDACTED: &'static str = "shop_redacted";
}

/// An entry in the per-shop audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleLogEntry {
    pub id: RuleLogId,
    pub shop: ShopDomain,
    pub action: String,
    pub rule_id: Option<RuleId>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shop() -> ShopDomain {
        ShopDomain::parse("demo.myshopify.com").unwrap()
    }

    #[test]
    fn test_rule_mode_round_trip() {
        for mode in [RuleMode::Exclude, RuleMode::Include] {
            assert_eq!(mode.to_string().parse::<RuleMode>(), Ok(mode));
        }
        assert!("both".parse::<RuleMode>().is_err());
    }

    #[test]
    fn test_rule_mode_serde() {
        assert_eq!(
            serde_json::to_string(&RuleMode::Include).unwrap(),
            "\"include\""
        );
        assert_eq!(
            serde_json::from_str::<RuleMode>("\"exclude\"").unwrap(),
            RuleMode::Exclude
        );
    }

    #[test]
    fn test_descriptor_validity() {
        assert!(CollectionDescriptor::new("gid://shopify/Collection/1", "Sale", 3).is_valid());
        assert!(!CollectionDescriptor::new("", "Sale", 3).is_valid());
        assert!(!CollectionDescriptor::new("  ", "Sale", 3).is_valid());
        let untitled = CollectionDescriptor {
            id: "gid://shopify/Collection/1".to_string(),
            title: None,
            products_count: 0,
        };
        assert!(!untitled.is_valid());
    }

    #[test]
    fn test_new_rule_collapses_duplicates_keeping_first() {
        let rule = NewRule::new(
            shop(),
            RuleMode::Exclude,
            vec![
                CollectionDescriptor::new("gid://shopify/Collection/2", "B", 1),
                CollectionDescriptor::new("gid://shopify/Collection/1", "A", 1),
                CollectionDescriptor::new("gid://shopify/Collection/2", "B again", 9),
            ],
        );
        let titles: Vec<_> = rule
            .excluded
            .iter()
            .map(|c| c.title.as_deref().unwrap())
            .collect();
        assert_eq!(titles, ["B", "A"]);
    }

    #[test]
    fn test_descriptor_deserializes_camel_case() {
        let c: CollectionDescriptor = serde_json::from_str(
            r#"{"id":"gid://shopify/Collection/5","title":"Summer","productsCount":12}"#,
        )
        .unwrap();
        assert_eq!(c.products_count, 12);
        assert_eq!(c.title.as_deref(), Some("Summer"));
    }
}

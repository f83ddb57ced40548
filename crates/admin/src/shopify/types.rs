//! Domain types for Shopify Admin API.
//!
//! These types provide a clean, ergonomic API separate from the raw wire
//! types declared next to each operation in `admin::queries`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use collection_gate_core::{BasicDiscountKind, CollectionDescriptor, DiscountKind, numeric_id};

// =============================================================================
// Common Types
// =============================================================================

/// Pagination information for connection queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Whether there are more items after this page.
    pub has_next_page: bool,
    /// Cursor for the last item.
    pub end_cursor: Option<String>,
}

/// A field-level error reported by a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    /// Path to the offending input field.
    pub field: Option<Vec<String>>,
    /// Error message.
    pub message: String,
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) if !field.is_empty() => write!(f, "{}: {}", field.join("."), self.message),
            _ => f.write_str(&self.message),
        }
    }
}

// =============================================================================
// Collection Types
// =============================================================================

/// A product collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    /// Collection GID.
    pub id: String,
    /// Collection title.
    pub title: Option<String>,
    /// URL handle.
    pub handle: Option<String>,
    /// Number of products in the collection.
    pub products_count: i64,
}

impl Collection {
    /// The descriptor used by rule evaluation and rule storage.
    #[must_use]
    pub fn descriptor(&self) -> CollectionDescriptor {
        CollectionDescriptor {
            id: self.id.clone(),
            title: self.title.clone(),
            products_count: self.products_count,
        }
    }
}

/// Paginated list of collections.
#[derive(Debug, Clone, Default)]
pub struct CollectionConnection {
    /// Collections on this page.
    pub collections: Vec<Collection>,
    /// Pagination info.
    pub page_info: PageInfo,
}

// =============================================================================
// Discount Types
// =============================================================================

/// The value a discount grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountValue {
    /// Percentage off, as reported by the API (e.g. `0.2` or `20`).
    Percentage {
        /// Percentage value, passed through unchanged.
        percentage: f64,
    },
    /// Fixed amount off.
    FixedAmount {
        /// Amount as a decimal.
        amount: Decimal,
        /// ISO 4217 currency code, when reported.
        currency_code: Option<String>,
    },
}

/// A discount as listed in the shop's discount inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountSummary {
    /// Discount node GID (e.g. `gid://shopify/DiscountCodeNode/123`).
    pub id: String,
    /// Numeric suffix of `id`.
    pub numeric_id: String,
    /// Discount title.
    pub title: String,
    /// Discount kind parsed from `__typename`.
    pub kind: DiscountKind,
    /// Status (`ACTIVE`, `EXPIRED`, `SCHEDULED`).
    pub status: Option<String>,
    /// Redeem codes (code discounts only, first page).
    pub codes: Vec<String>,
    /// Current value, when the kind exposes one.
    pub value: Option<DiscountValue>,
}

impl DiscountSummary {
    /// Whether `id` refers to this discount, as a numeric id or a GID.
    #[must_use]
    pub fn matches_id(&self, id: &str) -> bool {
        let id = id.trim();
        if id == self.id || id == self.numeric_id {
            return true;
        }
        id.starts_with("gid://") && numeric_id(id) == Some(self.numeric_id.as_str())
    }
}

/// Paginated list of discounts.
#[derive(Debug, Clone, Default)]
pub struct DiscountConnection {
    /// Discounts on this page.
    pub discounts: Vec<DiscountSummary>,
    /// Pagination info.
    pub page_info: PageInfo,
}

/// Full configuration of a basic discount, read before rewriting it.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountConfig {
    /// Which basic kind the node is.
    pub kind: BasicDiscountKind,
    /// Discount title.
    pub title: String,
    /// Current value. `None` when the API returned a shape we do not know.
    pub value: Option<DiscountValue>,
    /// GIDs of the collections currently attached.
    pub collection_ids: Vec<String>,
    /// Whether the discount can be used once per customer (code discounts only).
    pub applies_once_per_customer: Option<bool>,
    /// Total usage limit (code discounts only).
    pub usage_limit: Option<i64>,
    /// Start date-time.
    pub starts_at: Option<String>,
    /// End date-time.
    pub ends_at: Option<String>,
}

// =============================================================================
// Mutation Input Types
// =============================================================================

/// Discount value in the shape the update mutations accept.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationValue {
    /// `{ percentage }`
    Percentage(f64),
    /// `{ discountAmount: { amount, appliesOnEachItem } }`
    #[serde(rename_all = "camelCase")]
    DiscountAmount {
        /// Amount off.
        amount: Decimal,
        /// Apply the amount to each eligible item instead of once per order.
        applies_on_each_item: bool,
    },
}

/// `customerGets.items` input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemsInput {
    /// Apply to every item in the store.
    pub all: bool,
    /// Explicit collections to attach.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<CollectionsInput>,
}

impl ItemsInput {
    /// `{ all: true }`
    #[must_use]
    pub const fn all() -> Self {
        Self {
            all: true,
            collections: None,
        }
    }

    /// `{ all: false, collections: { add: gids } }`, or `{ all: true }` if `gids` is empty.
    #[must_use]
    pub fn collections(gids: Vec<String>) -> Self {
        if gids.is_empty() {
            return Self::all();
        }
        Self {
            all: false,
            collections: Some(CollectionsInput { add: gids }),
        }
    }
}

/// `customerGets.items.collections` input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionsInput {
    /// Collection GIDs to attach.
    pub add: Vec<String>,
}

/// `customerGets` input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerGetsInput {
    /// Discount value.
    pub value: MutationValue,
    /// Eligible items.
    pub items: ItemsInput,
}

/// The part of `DiscountCodeBasicInput`/`DiscountAutomaticBasicInput` this
/// service writes. Everything else on the discount is left untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicDiscountUpdate {
    /// Value and eligible items.
    pub customer_gets: CustomerGetsInput,
    /// Re-applied from the existing configuration so it is not reset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applies_once_per_customer: Option<bool>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    fn summary() -> DiscountSummary {
        DiscountSummary {
            id: "gid://shopify/DiscountCodeNode/42".to_string(),
            numeric_id: "42".to_string(),
            title: "Spring".to_string(),
            kind: DiscountKind::CodeBasic,
            status: Some("ACTIVE".to_string()),
            codes: vec!["SPRING".to_string()],
            value: None,
        }
    }

    #[test]
    fn test_matches_id_accepts_numeric_and_gid_forms() {
        let discount = summary();
        assert!(discount.matches_id("42"));
        assert!(discount.matches_id("gid://shopify/DiscountCodeNode/42"));
        assert!(discount.matches_id("gid://shopify/DiscountNode/42"));
        assert!(!discount.matches_id("43"));
        assert!(!discount.matches_id("gid://shopify/DiscountNode/420"));
    }

    #[test]
    fn test_user_error_display() {
        let err = UserError {
            field: Some(vec!["basicCodeDiscount".to_string(), "customerGets".to_string()]),
            message: "is invalid".to_string(),
        };
        assert_eq!(err.to_string(), "basicCodeDiscount.customerGets: is invalid");

        let err = UserError {
            field: None,
            message: "Discount not found".to_string(),
        };
        assert_eq!(err.to_string(), "Discount not found");
    }

    #[test]
    fn test_percentage_update_serializes_to_mutation_shape() {
        let update = BasicDiscountUpdate {
            customer_gets: CustomerGetsInput {
                value: MutationValue::Percentage(0.2),
                items: ItemsInput::collections(vec!["gid://shopify/Collection/5".to_string()]),
            },
            applies_once_per_customer: Some(true),
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({
                "customerGets": {
                    "value": { "percentage": 0.2 },
                    "items": {
                        "all": false,
                        "collections": { "add": ["gid://shopify/Collection/5"] }
                    }
                },
                "appliesOncePerCustomer": true
            })
        );
    }

    #[test]
    fn test_amount_update_serializes_to_mutation_shape() {
        let update = BasicDiscountUpdate {
            customer_gets: CustomerGetsInput {
                value: MutationValue::DiscountAmount {
                    amount: Decimal::new(1000, 2),
                    applies_on_each_item: false,
                },
                items: ItemsInput::collections(vec![]),
            },
            applies_once_per_customer: None,
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({
                "customerGets": {
                    "value": {
                        "discountAmount": { "amount": "10.00", "appliesOnEachItem": false }
                    },
                    "items": { "all": true }
                }
            })
        );
    }
}

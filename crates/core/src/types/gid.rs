//! Shopify global ID (GID) helpers.
//!
//! Shopify identifies resources with qualified ids of the form
//! `gid://shopify/<Type>/<numeric>`. Rules store qualified collection ids,
//! while the synchronizer works with the bare numeric suffix and re-qualifies
//! it before sending mutations. [`numeric_id`] and [`collection_gid`] are the
//! two halves of that round trip.

use super::discount::BasicDiscountKind;

/// Prefix shared by every Shopify GID.
pub const GID_PREFIX: &str = "gid://shopify/";

const DISCOUNT_NODE: &str = "DiscountNode";
const DISCOUNT_CODE_NODE: &str = "DiscountCodeNode";
const DISCOUNT_AUTOMATIC_NODE: &str = "DiscountAutomaticNode";

/// Extract the trailing numeric segment of a GID.
///
/// Returns `None` when the trailing segment is empty (e.g. `""` or
/// `"gid://shopify/Collection/"`). A bare id without slashes is returned as-is.
///
/// ```
/// use collection_gate_core::numeric_id;
///
/// assert_eq!(numeric_id("gid://shopify/Collection/123456789"), Some("123456789"));
/// assert_eq!(numeric_id("42"), Some("42"));
/// assert_eq!(numeric_id("gid://shopify/Collection/"), None);
/// ```
#[must_use]
pub fn numeric_id(gid: &str) -> Option<&str> {
    let segment = gid.rsplit('/').next()?.trim();
    (!segment.is_empty()).then_some(segment)
}

/// Build a collection GID from its numeric id.
///
/// ```
/// use collection_gate_core::{collection_gid, numeric_id};
///
/// let gid = collection_gid("5");
/// assert_eq!(gid, "gid://shopify/Collection/5");
/// assert_eq!(numeric_id(&gid), Some("5"));
/// ```
#[must_use]
pub fn collection_gid(numeric: &str) -> String {
    format!("{GID_PREFIX}Collection/{numeric}")
}

/// Qualify a discount id.
///
/// Already-qualified GIDs pass through untouched; bare numeric ids become
/// generic `DiscountNode` GIDs.
#[must_use]
pub fn discount_gid(id: &str) -> String {
    if id.starts_with("gid://") {
        id.to_string()
    } else {
        format!("{GID_PREFIX}{DISCOUNT_NODE}/{id}")
    }
}

/// Rewrite a discount GID into the generic `DiscountNode` form used by the
/// `discountNode(id:)` query.
#[must_use]
pub fn discount_query_gid(gid: &str) -> String {
    replace_node_type(gid, &[DISCOUNT_CODE_NODE, DISCOUNT_AUTOMATIC_NODE], DISCOUNT_NODE)
}

/// Rewrite a discount GID into the node type expected by the update mutation
/// for the given basic discount kind.
#[must_use]
pub fn discount_mutation_gid(gid: &str, kind: BasicDiscountKind) -> String {
    replace_node_type(gid, &[DISCOUNT_NODE], kind.node_type())
}

fn replace_node_type(gid: &str, from: &[&str], to: &str) -> String {
    for node_type in from {
        let needle = format!("{GID_PREFIX}{node_type}/");
        if let Some(rest) = gid.strip_prefix(&needle) {
            return format!("{GID_PREFIX}{to}/{rest}");
        }
    }
    gid.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_extracts_suffix() {
        assert_eq!(numeric_id("gid://shopify/Collection/5"), Some("5"));
        assert_eq!(
            numeric_id("gid://shopify/DiscountNode/1234567890"),
            Some("1234567890")
        );
    }

    #[test]
    fn test_numeric_id_rejects_empty_suffix() {
        assert_eq!(numeric_id(""), None);
        assert_eq!(numeric_id("   "), None);
        assert_eq!(numeric_id("gid://shopify/Collection/"), None);
    }

    #[test]
    fn test_collection_gid_inverts_numeric_id() {
        for gid in ["gid://shopify/Collection/1", "gid://shopify/Collection/987654321"] {
            let numeric = numeric_id(gid);
            assert_eq!(numeric.map(collection_gid).as_deref(), Some(gid));
        }
    }

    #[test]
    fn test_discount_gid_qualifies_bare_ids() {
        assert_eq!(discount_gid("77"), "gid://shopify/DiscountNode/77");
        assert_eq!(
            discount_gid("gid://shopify/DiscountCodeNode/77"),
            "gid://shopify/DiscountCodeNode/77"
        );
    }

    #[test]
    fn test_discount_query_gid_normalizes_node_type() {
        assert_eq!(
            discount_query_gid("gid://shopify/DiscountCodeNode/9"),
            "gid://shopify/DiscountNode/9"
        );
        assert_eq!(
            discount_query_gid("gid://shopify/DiscountAutomaticNode/9"),
            "gid://shopify/DiscountNode/9"
        );
        assert_eq!(
            discount_query_gid("gid://shopify/DiscountNode/9"),
            "gid://shopify/DiscountNode/9"
        );
    }

    #[test]
    fn test_discount_mutation_gid_targets_kind_node() {
        assert_eq!(
            discount_mutation_gid("gid://shopify/DiscountNode/9", BasicDiscountKind::Code),
            "gid://shopify/DiscountCodeNode/9"
        );
        assert_eq!(
            discount_mutation_gid("gid://shopify/DiscountNode/9", BasicDiscountKind::Automatic),
            "gid://shopify/DiscountAutomaticNode/9"
        );
        // Already specific ids are left alone
        assert_eq!(
            discount_mutation_gid(
                "gid://shopify/DiscountCodeNode/9",
                BasicDiscountKind::Code
            ),
            "gid://shopify/DiscountCodeNode/9"
        );
    }
}

//! Conversions from wire types to domain types.

use collection_gate_core::{DiscountKind, numeric_id};

use super::queries::{
    DiscountCustomerGetsValue, DiscountItems, PageInfo as WirePageInfo, get_collections,
    get_discount_config, get_discount_nodes,
};
use crate::shopify::types::{
    Collection, CollectionConnection, DiscountConfig, DiscountConnection, DiscountSummary,
    DiscountValue, PageInfo,
};

fn convert_page_info(page_info: WirePageInfo) -> PageInfo {
    PageInfo {
        has_next_page: page_info.has_next_page,
        end_cursor: page_info.end_cursor,
    }
}

/// Interpret a `DiscountCustomerGetsValue` union.
///
/// Returns `None` when neither a percentage nor an amount is present.
pub fn convert_value(value: DiscountCustomerGetsValue) -> Option<DiscountValue> {
    if let Some(percentage) = value.percentage {
        return Some(DiscountValue::Percentage { percentage });
    }
    value.amount.map(|money| DiscountValue::FixedAmount {
        amount: money.amount,
        currency_code: money.currency_code,
    })
}

fn collection_ids(items: Option<DiscountItems>) -> Vec<String> {
    items
        .and_then(|i| i.collections)
        .map(|c| c.nodes.into_iter().map(|n| n.id).collect())
        .unwrap_or_default()
}

pub fn convert_collection_connection(
    conn: get_collections::CollectionConnection,
) -> CollectionConnection {
    CollectionConnection {
        collections: conn
            .nodes
            .into_iter()
            .map(|node| Collection {
                id: node.id,
                title: node.title,
                handle: node.handle,
                products_count: node.products_count.map_or(0, |c| c.count),
            })
            .collect(),
        page_info: convert_page_info(conn.page_info),
    }
}

pub fn convert_discount_connection(
    conn: get_discount_nodes::DiscountNodeConnection,
) -> DiscountConnection {
    DiscountConnection {
        discounts: conn.nodes.into_iter().map(convert_discount_node).collect(),
        page_info: convert_page_info(conn.page_info),
    }
}

fn convert_discount_node(node: get_discount_nodes::DiscountNode) -> DiscountSummary {
    let discount = node.discount;
    let value = discount
        .customer_gets
        .and_then(|gets| gets.value)
        .and_then(convert_value);

    DiscountSummary {
        numeric_id: numeric_id(&node.id).unwrap_or_default().to_string(),
        id: node.id,
        title: discount.title.unwrap_or_default(),
        kind: DiscountKind::from_typename(&discount.typename),
        status: discount.status,
        codes: discount
            .codes
            .map(|c| c.nodes.into_iter().map(|n| n.code).collect())
            .unwrap_or_default(),
        value,
    }
}

/// Convert a `discountNode` lookup into a [`DiscountConfig`].
///
/// Returns `None` when the node is missing or is not one of the basic kinds.
pub fn convert_discount_config(
    node: Option<get_discount_config::DiscountNode>,
) -> Option<DiscountConfig> {
    let discount = node?.discount;
    let kind = DiscountKind::from_typename(&discount.typename).basic()?;
    let (value, collection_ids) = discount
        .customer_gets
        .map(|gets| (gets.value.and_then(convert_value), collection_ids(gets.items)))
        .unwrap_or_default();

    Some(DiscountConfig {
        kind,
        title: discount.title.unwrap_or_default(),
        value,
        collection_ids,
        applies_once_per_customer: discount.applies_once_per_customer,
        usage_limit: discount.usage_limit,
        starts_at: discount.starts_at,
        ends_at: discount.ends_at,
    })
}

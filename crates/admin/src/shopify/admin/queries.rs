//! GraphQL operation definitions for Shopify Admin API.
//!
//! Each operation is a marker type implementing `graphql_client::GraphQLQuery`
//! with its query document and the serde types for its variables and
//! response. The response types mirror the selection sets exactly; they are
//! converted into domain types in `conversions`.

use graphql_client::{GraphQLQuery, QueryBody};

// =============================================================================
// Shared wire types
// =============================================================================

/// A `{ nodes: [...] }` connection selection.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Nodes<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

impl<T> Default for Nodes<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

/// `pageInfo { hasNextPage endCursor }`
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// A node selected only by `id`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct IdNode {
    pub id: String,
}

/// `MoneyV2 { amount currencyCode }`
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyV2 {
    pub amount: rust_decimal::Decimal,
    pub currency_code: Option<String>,
}

/// `DiscountPercentage | DiscountAmount`, selected with `__typename`.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct DiscountCustomerGetsValue {
    #[serde(rename = "__typename", default)]
    pub typename: Option<String>,
    pub percentage: Option<f64>,
    pub amount: Option<MoneyV2>,
}

/// `DiscountItems` union; only the collections arm is selected.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct DiscountItems {
    #[serde(rename = "__typename", default)]
    pub typename: Option<String>,
    pub collections: Option<Nodes<IdNode>>,
}

/// `userErrors { field message }`
#[derive(Debug, Clone, serde::Deserialize)]
pub struct UserError {
    pub field: Option<Vec<String>>,
    pub message: String,
}

macro_rules! graphql_operation {
    ($name:ident, $module:ident) => {
        impl GraphQLQuery for $name {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $module::QUERY,
                    operation_name: $module::OPERATION_NAME,
                }
            }
        }
    };
}

// =============================================================================
// Collection queries
// =============================================================================

pub struct GetCollections;
graphql_operation!(GetCollections, get_collections);

pub mod get_collections {
    use serde::{Deserialize, Serialize};

    use super::PageInfo;

    pub const OPERATION_NAME: &str = "GetCollections";
    pub const QUERY: &str = r"query GetCollections($first: Int!, $after: String) {
  collections(first: $first, after: $after, sortKey: TITLE) {
    pageInfo {
      hasNextPage
      endCursor
    }
    nodes {
      id
      title
      handle
      productsCount {
        count
      }
    }
  }
}";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub collections: CollectionConnection,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CollectionConnection {
        pub page_info: PageInfo,
        pub nodes: Vec<CollectionNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CollectionNode {
        pub id: String,
        pub title: Option<String>,
        pub handle: Option<String>,
        pub products_count: Option<Count>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Count {
        pub count: i64,
    }
}

// =============================================================================
// Discount queries
// =============================================================================

pub struct GetDiscountNodes;
graphql_operation!(GetDiscountNodes, get_discount_nodes);

pub mod get_discount_nodes {
    use serde::{Deserialize, Serialize};

    use super::{DiscountCustomerGetsValue, Nodes, PageInfo};

    pub const OPERATION_NAME: &str = "GetDiscountNodes";
    pub const QUERY: &str = r"query GetDiscountNodes($first: Int!, $after: String) {
  discountNodes(first: $first, after: $after) {
    pageInfo {
      hasNextPage
      endCursor
    }
    nodes {
      id
      discount {
        __typename
        ... on DiscountCodeBasic {
          title
          status
          codes(first: 5) { nodes { code } }
          customerGets {
            value {
              __typename
              ... on DiscountPercentage { percentage }
              ... on DiscountAmount { amount { amount currencyCode } }
            }
          }
        }
        ... on DiscountAutomaticBasic {
          title
          status
          customerGets {
            value {
              __typename
              ... on DiscountPercentage { percentage }
              ... on DiscountAmount { amount { amount currencyCode } }
            }
          }
        }
        ... on DiscountCodeBxgy {
          title
          status
          codes(first: 5) { nodes { code } }
        }
        ... on DiscountCodeFreeShipping {
          title
          status
          codes(first: 5) { nodes { code } }
        }
        ... on DiscountAutomaticBxgy {
          title
          status
        }
        ... on DiscountAutomaticFreeShipping {
          title
          status
        }
        ... on DiscountCodeApp {
          title
          status
        }
        ... on DiscountAutomaticApp {
          title
          status
        }
      }
    }
  }
}";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub discount_nodes: DiscountNodeConnection,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DiscountNodeConnection {
        pub page_info: PageInfo,
        pub nodes: Vec<DiscountNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct DiscountNode {
        pub id: String,
        pub discount: Discount,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Discount {
        #[serde(rename = "__typename")]
        pub typename: String,
        pub title: Option<String>,
        pub status: Option<String>,
        pub codes: Option<Nodes<RedeemCode>>,
        pub customer_gets: Option<CustomerGets>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct RedeemCode {
        pub code: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CustomerGets {
        pub value: Option<DiscountCustomerGetsValue>,
    }
}

pub struct GetDiscountConfig;
graphql_operation!(GetDiscountConfig, get_discount_config);

pub mod get_discount_config {
    use serde::{Deserialize, Serialize};

    use super::{DiscountCustomerGetsValue, DiscountItems};

    pub const OPERATION_NAME: &str = "GetDiscountConfig";
    pub const QUERY: &str = r"query GetDiscountConfig($id: ID!) {
  discountNode(id: $id) {
    id
    discount {
      __typename
      ... on DiscountCodeBasic {
        title
        customerGets {
          value {
            __typename
            ... on DiscountPercentage { percentage }
            ... on DiscountAmount { amount { amount currencyCode } }
          }
          items {
            __typename
            ... on DiscountCollections { collections(first: 250) { nodes { id } } }
          }
        }
        usageLimit
        appliesOncePerCustomer
        startsAt
        endsAt
      }
      ... on DiscountAutomaticBasic {
        title
        customerGets {
          value {
            __typename
            ... on DiscountPercentage { percentage }
            ... on DiscountAmount { amount { amount currencyCode } }
          }
          items {
            __typename
            ... on DiscountCollections { collections(first: 250) { nodes { id } } }
          }
        }
        startsAt
        endsAt
      }
    }
  }
}";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub discount_node: Option<DiscountNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct DiscountNode {
        pub id: String,
        pub discount: Discount,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Discount {
        #[serde(rename = "__typename")]
        pub typename: String,
        pub title: Option<String>,
        pub customer_gets: Option<CustomerGets>,
        pub usage_limit: Option<i64>,
        pub applies_once_per_customer: Option<bool>,
        pub starts_at: Option<String>,
        pub ends_at: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CustomerGets {
        pub value: Option<DiscountCustomerGetsValue>,
        pub items: Option<DiscountItems>,
    }
}

// =============================================================================
// Discount mutations
// =============================================================================

pub struct DiscountCodeBasicUpdate;
graphql_operation!(DiscountCodeBasicUpdate, discount_code_basic_update);

pub mod discount_code_basic_update {
    use serde::{Deserialize, Serialize};

    use super::UserError;
    use crate::shopify::types::BasicDiscountUpdate;

    pub const OPERATION_NAME: &str = "DiscountCodeBasicUpdate";
    pub const QUERY: &str = r"mutation DiscountCodeBasicUpdate($id: ID!, $basicCodeDiscount: DiscountCodeBasicInput!) {
  discountCodeBasicUpdate(id: $id, basicCodeDiscount: $basicCodeDiscount) {
    codeDiscountNode {
      id
    }
    userErrors {
      field
      message
    }
  }
}";

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub id: String,
        pub basic_code_discount: BasicDiscountUpdate,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub discount_code_basic_update: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        #[serde(default)]
        pub user_errors: Vec<UserError>,
    }
}

pub struct DiscountAutomaticBasicUpdate;
graphql_operation!(DiscountAutomaticBasicUpdate, discount_automatic_basic_update);

pub mod discount_automatic_basic_update {
    use serde::{Deserialize, Serialize};

    use super::UserError;
    use crate::shopify::types::BasicDiscountUpdate;

    pub const OPERATION_NAME: &str = "DiscountAutomaticBasicUpdate";
    pub const QUERY: &str = r"mutation DiscountAutomaticBasicUpdate($id: ID!, $automaticBasicDiscount: DiscountAutomaticBasicInput!) {
  discountAutomaticBasicUpdate(id: $id, automaticBasicDiscount: $automaticBasicDiscount) {
    automaticDiscountNode {
      id
    }
    userErrors {
      field
      message
    }
  }
}";

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub id: String,
        pub automatic_basic_discount: BasicDiscountUpdate,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub discount_automatic_basic_update: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        #[serde(default)]
        pub user_errors: Vec<UserError>,
    }
}

//! Core types for Collection Gate.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod discount;
pub mod gid;
pub mod id;
pub mod rule;
pub mod shop;

pub use discount::{BasicDiscountKind, DiscountKind, IncompatibleKind};
pub use gid::{
    collection_gid, discount_gid, discount_mutation_gid, discount_query_gid, numeric_id,
};
pub use id::*;
pub use rule::{CollectionDescriptor, DiscountRule, NewRule, RuleAction, RuleLogEntry, RuleMode};
pub use shop::{ShopDomain, ShopDomainError};

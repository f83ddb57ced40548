//! Collection Gate Core - Shared types and rule evaluation.
//!
//! This crate provides the types used across all Collection Gate components:
//! - `admin` - Shopify Admin API client, record store and discount synchronizer
//! - `cli` - Command-line tools for migrations and rule management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Rule evaluation lives here because it is a pure
//! function of a rule and a collection inventory.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, Shopify GID helpers, shop domains, rules and discount kinds
//! - [`rules`] - Entitled-collection evaluation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod rules;
pub mod types;

pub use rules::{EntitlementSummary, entitled_collections, summarize};
pub use types::*;

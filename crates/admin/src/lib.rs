//! Collection Gate Admin library.
//!
//! This crate provides the admin functionality as a library,
//! allowing it to be tested and reused by the CLI.
//!
//! # Security
//!
//! This crate contains HIGH PRIVILEGE access:
//! - Shopify Admin API (rewrites every discount in the store)
//! - The rule database
//!
//! Only deploy on trusted infrastructure.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

//! Business logic services for admin.
//!
//! # Services
//!
//! - `rules` - Rule persistence and entitlement evaluation
//! - `sync` - Two-phase discount collection synchronizer
//! - `apply` - Single and bulk rule application
//! - `diagnostics` - Live mutation checks against a development store

pub mod apply;
pub mod diagnostics;
pub mod rules;
pub mod sync;

pub use apply::{ApplyOutcome, BulkApplyReport, BulkItem, BulkStatus, NO_ACTIVE_RULE, RuleApplier};
pub use diagnostics::{DiagnosticResult, Diagnostics};
pub use rules::{RuleService, saved_message};
pub use sync::{DiscountSynchronizer, PhaseResult, SyncError, SyncOutcome, SyncPhases};

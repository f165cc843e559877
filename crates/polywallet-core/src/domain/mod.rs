//! Canonical domain types for the unified multi-venue model.
//!
//! All record types are value objects: created fresh on every aggregation or
//! compute call, never mutated in place, and carried with `Decimal` money
//! fields that serialize as decimal strings.

mod models;
mod timestamp;

pub use models::{OrderKind, Side, UnifiedBalance, UnifiedOrder, UnifiedTicker};
pub use timestamp::UtcDateTime;

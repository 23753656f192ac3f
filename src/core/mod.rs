//! Core business logic - framework-agnostic catalog, ledger, store and reporting operations.
//!
//! Every function takes a `SeaORM` connection and re-reads persisted state; nothing
//! is cached between calls.

/// Append-only audit trail
pub mod activity;
/// Products, stock and name uniqueness
pub mod catalog;
/// Sale recording
pub mod ledger;
/// Cash and profit rollups
pub mod report;
/// Bounded retry of contended writes
pub mod retry;
/// Open/closed switch gating sales
pub mod store_gate;

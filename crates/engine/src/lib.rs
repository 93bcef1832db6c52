//! Group commitment and fulfillment engine.
//!
//! This crate composes the domain logic with storage and collaborators:
//! - Commitment engine orchestrating create / join / leave / transitions
//! - Notification fan-out after committed state changes
//! - Read-only query views with favorite enrichment
//! - Idempotent deadline-expiry sweep and its interval driver

/// Prelude module for convenient imports.
pub mod prelude;

/// Engine configuration.
pub mod config;
/// Commitment engine orchestrator.
pub mod engine;
/// Error types.
pub mod error;
/// Notification fan-out.
pub mod notify;
/// Deadline expiry sweeper.
pub mod sweeper;
/// Read-only query views.
pub mod views;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::EngineConfig;
pub use engine::CommitmentEngine;
pub use error::EngineError;
pub use notify::Notifier;
pub use sweeper::ExpirySweeper;
pub use views::{PoolView, StateInfo, ParticipantSummary};

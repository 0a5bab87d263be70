//! Workflow state store for the Vasari workflow orchestrator.
//!
//! The store is the single source of truth for a workflow's current stage,
//! inputs, intermediate artifacts, and terminal outcome. All pipeline
//! components communicate through it rather than with each other, so the
//! only concurrency discipline required is per-workflow-row atomic
//! read-modify-write: every stage transition is one status-guarded write,
//! and a guard miss surfaces as [`vasari_error::StaleStateError`] instead of
//! a partial update.
//!
//! Two implementations ship here:
//! - [`InMemoryWorkflowStore`] for tests and single-process deployments
//! - [`PostgresWorkflowStore`] (feature `postgres`) backed by Diesel with
//!   embedded migrations and cascading delete from the workflow root

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod memory;
#[cfg(feature = "postgres")]
mod models;
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "postgres")]
mod schema;
mod store;

pub use memory::InMemoryWorkflowStore;
#[cfg(feature = "postgres")]
pub use postgres::{PostgresWorkflowStore, establish_pool};
pub use store::{StageTransition, WorkflowStore};

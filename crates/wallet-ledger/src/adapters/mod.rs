//! # Adapters Layer (Outer Hexagon)
//!
//! Concrete implementations of the outbound ports, plus the in-memory
//! runtime that wires them to the dispatcher.

pub mod admin_registry;
pub mod runtime;
pub mod state_adapter;

pub use admin_registry::{ReloadableAdminRegistry, StaticAdminRegistry};
pub use runtime::InMemoryRuntime;
pub use state_adapter::{CommitReceipt, InMemoryLedgerStore, LedgerTransaction};

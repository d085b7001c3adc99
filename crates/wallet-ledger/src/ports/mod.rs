//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions for the wallet ledger.
//!
//! - **Driving Ports (Inbound)**: `WalletLedgerApi`
//! - **Driven Ports (Outbound)**: `StateAccess`, `AdminRegistry`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;

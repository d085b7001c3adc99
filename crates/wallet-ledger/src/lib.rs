//! # Wallet Ledger - Custodial Balance Ledger
//!
//! ## Purpose
//!
//! Keeps one non-negative integer balance per account in a transactional
//! key-value state. Administrators load (mint), transfer, pay out (burn) and
//! delete balances; anyone may query them.
//!
//! ## Operations
//!
//! | Function | Arguments | Caller | Effect |
//! |----------|-----------|--------|--------|
//! | `load` | account, amount | Administrator | `balance += amount` |
//! | `transfer` | from, to, amount | Administrator | move `amount`, `amount > 0` |
//! | `payout` | account, amount | Administrator | `balance -= amount` |
//! | `queryBalance` | account | Anyone | return stored bytes |
//! | `delete` | account | Administrator | remove the entry |
//!
//! `querywalletAmount` is accepted as an alias of `queryBalance`.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Balances never negative | `domain/services.rs` - `debit()` |
//! | Transfer conserves supply | `domain/invariants.rs` - `check_conservation_invariant()` |
//! | Transfer moves exactly `amount` | `domain/invariants.rs` - `check_exact_movement_invariant()` |
//! | Load/payout change supply by `amount` | `domain/invariants.rs` - `check_supply_change_invariant()` |
//! | Mutations require an administrator | `auth.rs` - `verify_admin_access()` |
//! | Failed invocations write nothing | `adapters/runtime.rs` - `invoke()` |
//!
//! ## Storage Format
//!
//! Key is the account string, value is the balance as ASCII decimal with no
//! sign, padding or separators.
//!
//! ## Outbound Dependencies
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | `StateAccess` | Read/write balances inside the current transaction |
//! | `AdminRegistry` | Administrator allow-list |
//!
//! ## Usage Example
//!
//! ```ignore
//! use wallet_ledger::prelude::*;
//!
//! let runtime = InMemoryRuntime::from_config(&LedgerConfig::with_admins(["admin"]))?;
//! runtime.invoke("admin", "load", &["Alice", "100"]).await;
//!
//! let response = runtime.invoke("anyone", "queryBalance", &["Alice"]).await;
//! assert_eq!(response.payload(), Some(&b"100"[..]));
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{
        AdminSet, BalanceView, InvocationContext, Operation, QueryPayloadMode, Response,
    };

    // Value objects
    pub use crate::domain::value_objects::{AccountId, Amount, Balance, CallerIdentity};

    // Domain services
    pub use crate::domain::services::{
        credit, debit, fund_transfer, plan_transfer, DebitPolicy, TransferPlan,
    };

    // Invariants
    pub use crate::domain::invariants::{check_transfer_invariants, InvariantViolation};

    // Ports
    pub use crate::ports::inbound::WalletLedgerApi;
    pub use crate::ports::outbound::{AdminRegistry, StateAccess};

    // Errors
    pub use crate::errors::{ErrorKind, LedgerError, StateError};

    // Adapters
    pub use crate::adapters::{
        InMemoryLedgerStore, InMemoryRuntime, LedgerTransaction, ReloadableAdminRegistry,
        StaticAdminRegistry,
    };

    // Service
    pub use crate::auth::AuthorizationGate;
    pub use crate::config::{ConfigError, LedgerConfig};
    pub use crate::dispatch::{Dispatched, Dispatcher, LedgerStats};
    pub use crate::service::{ServiceConfig, WalletLedgerService};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Ledger name, used as the tracing service name.
pub const LEDGER_NAME: &str = "wallet-ledger";

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_exports() {
        use prelude::*;
        let _ = LedgerConfig::with_admins(["admin"]);
        let _ = Balance::ZERO;
        assert_eq!(Operation::ALL.len(), 5);
    }
}

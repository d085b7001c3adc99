//! # Driving Ports (API - Inbound)
//!
//! The balance ledger operations exposed to the dispatcher.
//!
//! Every operation receives the invocation's state handle and context
//! explicitly; the ledger keeps no state between invocations.

use crate::domain::entities::InvocationContext;
use crate::errors::LedgerError;
use crate::ports::outbound::StateAccess;
use async_trait::async_trait;

/// Primary API of the balance ledger.
///
/// Arguments arrive as the raw strings of the invocation; implementations
/// validate and parse them. Mutating operations must consult the
/// authorization gate before touching state.
#[async_trait]
pub trait WalletLedgerApi: Send + Sync {
    /// Credit `amount` to `account` (mint). Administrator only.
    async fn load(
        &self,
        state: &dyn StateAccess,
        ctx: &InvocationContext,
        account: &str,
        amount: &str,
    ) -> Result<(), LedgerError>;

    /// Move `amount` from `from` to `to`. Administrator only.
    async fn transfer(
        &self,
        state: &dyn StateAccess,
        ctx: &InvocationContext,
        from: &str,
        to: &str,
        amount: &str,
    ) -> Result<(), LedgerError>;

    /// Debit `amount` from `account` (burn). Administrator only.
    async fn payout(
        &self,
        state: &dyn StateAccess,
        ctx: &InvocationContext,
        account: &str,
        amount: &str,
    ) -> Result<(), LedgerError>;

    /// Return the bytes stored for `account`. Open to every caller.
    async fn query_balance(
        &self,
        state: &dyn StateAccess,
        ctx: &InvocationContext,
        account: &str,
    ) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Remove the balance entry of `account`. Administrator only.
    async fn delete(
        &self,
        state: &dyn StateAccess,
        ctx: &InvocationContext,
        account: &str,
    ) -> Result<(), LedgerError>;
}

//! # Wallet Ledger Service
//!
//! Implements [`WalletLedgerApi`] on top of the domain services.
//!
//! Every handler follows the same shape: gate, parse, read, compute, write.
//! All reads and checks happen before the first write, so a failure leaves
//! no buffered writes behind.

use crate::auth::AuthorizationGate;
use crate::domain::entities::{BalanceView, InvocationContext, QueryPayloadMode};
use crate::domain::invariants::{check_supply_change_invariant, check_transfer_invariants};
use crate::domain::services::{
    credit, debit, fund_transfer, plan_transfer, DebitPolicy, TransferPlan,
};
use crate::domain::value_objects::{AccountId, Amount, Balance};
use crate::errors::LedgerError;
use crate::ports::inbound::WalletLedgerApi;
use crate::ports::outbound::{AdminRegistry, StateAccess};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Service configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServiceConfig {
    /// How `query_balance` reports absent accounts.
    pub query_payload: QueryPayloadMode,
}

/// The balance ledger.
#[derive(Debug, Clone)]
pub struct WalletLedgerService {
    gate: AuthorizationGate,
    config: ServiceConfig,
}

impl WalletLedgerService {
    /// Create a service.
    ///
    /// # Arguments
    ///
    /// * `registry` - Administrator allow-list consulted on every mutating call
    /// * `config` - Service configuration
    pub fn new(registry: Arc<dyn AdminRegistry>, config: ServiceConfig) -> Self {
        Self {
            gate: AuthorizationGate::new(registry),
            config,
        }
    }

    /// Create with default configuration.
    pub fn with_registry(registry: Arc<dyn AdminRegistry>) -> Self {
        Self::new(registry, ServiceConfig::default())
    }

    /// The authorization gate.
    #[must_use]
    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> ServiceConfig {
        self.config
    }
}

#[async_trait]
impl WalletLedgerApi for WalletLedgerService {
    #[instrument(skip(self, state, ctx), fields(tx_id = %ctx.invocation_id))]
    async fn load(
        &self,
        state: &dyn StateAccess,
        ctx: &InvocationContext,
        account: &str,
        amount: &str,
    ) -> Result<(), LedgerError> {
        self.gate.verify_admin_access(&ctx.caller)?;

        let account = AccountId::parse(account, "account")?;
        let amount = Amount::parse(amount)?;

        let current = state.get_balance(&account).await?;
        let updated = credit(&account, current, amount)?;
        debug_assert!(check_supply_change_invariant(
            current.unwrap_or_default(),
            updated,
            amount
        ));
        state.put_balance(&account, updated).await?;

        info!(
            account = %account,
            amount = %amount,
            balance = %updated,
            "Wallet loaded"
        );
        Ok(())
    }

    #[instrument(skip(self, state, ctx), fields(tx_id = %ctx.invocation_id))]
    async fn transfer(
        &self,
        state: &dyn StateAccess,
        ctx: &InvocationContext,
        from: &str,
        to: &str,
        amount: &str,
    ) -> Result<(), LedgerError> {
        self.gate.verify_admin_access(&ctx.caller)?;

        let from = AccountId::parse(from, "source account")?;
        let to = AccountId::parse(to, "destination account")?;
        let amount = Amount::parse_positive(amount)?;

        // Source first: a transfer that cannot be funded never reads the
        // destination.
        let from_balance = state.get_balance(&from).await?;
        let source = fund_transfer(&from, from_balance, amount)?;

        let to_balance = if from == to {
            from_balance
        } else {
            state.get_balance(&to).await?
        };

        let plan = plan_transfer(source, &to, to_balance, amount)?;
        debug_assert!(
            check_transfer_invariants(&plan, amount).is_empty(),
            "transfer plan violates invariants: {plan:?}"
        );

        for write in plan.writes() {
            state.put_balance(&write.account, write.after).await?;
        }

        match plan {
            TransferPlan::Move { debit, credit } => info!(
                from = %from,
                to = %to,
                amount = %amount,
                from_balance = %debit.after,
                to_balance = %credit.after,
                "Funds transferred"
            ),
            TransferPlan::SelfTransfer(update) => info!(
                account = %from,
                amount = %amount,
                balance = %update.after,
                "Self transfer, balance unchanged"
            ),
        }
        Ok(())
    }

    #[instrument(skip(self, state, ctx), fields(tx_id = %ctx.invocation_id))]
    async fn payout(
        &self,
        state: &dyn StateAccess,
        ctx: &InvocationContext,
        account: &str,
        amount: &str,
    ) -> Result<(), LedgerError> {
        self.gate.verify_admin_access(&ctx.caller)?;

        let account = AccountId::parse(account, "account")?;
        let amount = Amount::parse(amount)?;

        let current = state.get_balance(&account).await?;
        let updated = debit(&account, current, amount, DebitPolicy::DefaultZero)?;
        debug_assert!(check_supply_change_invariant(
            current.unwrap_or_default(),
            updated,
            amount
        ));
        state.put_balance(&account, updated).await?;

        info!(
            account = %account,
            amount = %amount,
            balance = %updated,
            "Payout completed"
        );
        Ok(())
    }

    #[instrument(skip(self, state, ctx), fields(tx_id = %ctx.invocation_id))]
    async fn query_balance(
        &self,
        state: &dyn StateAccess,
        ctx: &InvocationContext,
        account: &str,
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        let key = AccountId::unchecked(account);
        let stored = state.get_state(key.as_key()).await?;

        if tracing::enabled!(tracing::Level::DEBUG) {
            let view = BalanceView {
                public_key: key.clone(),
                amount: match &stored {
                    Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                    None => Balance::ZERO.to_string(),
                },
            };
            match serde_json::to_string(&view) {
                Ok(json) => debug!(caller = %ctx.caller, view = %json, "Balance queried"),
                Err(e) => debug!(error = %e, "Failed to serialize balance view"),
            }
        }

        Ok(match (stored, self.config.query_payload) {
            (Some(bytes), _) => Some(bytes),
            (None, QueryPayloadMode::Raw) => None,
            (None, QueryPayloadMode::Normalized) => Some(Balance::ZERO.encode()),
        })
    }

    #[instrument(skip(self, state, ctx), fields(tx_id = %ctx.invocation_id))]
    async fn delete(
        &self,
        state: &dyn StateAccess,
        ctx: &InvocationContext,
        account: &str,
    ) -> Result<(), LedgerError> {
        self.gate.verify_admin_access(&ctx.caller)?;

        let account = AccountId::parse(account, "account")?;
        state.delete_state(account.as_key()).await?;

        info!(account = %account, "Wallet entry deleted");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryLedgerStore, StaticAdminRegistry};
    use crate::errors::{ErrorKind, StateError};

    const ADMIN: &str = "admin";

    fn service() -> WalletLedgerService {
        WalletLedgerService::with_registry(Arc::new(StaticAdminRegistry::from_identities([ADMIN])))
    }

    fn admin() -> InvocationContext {
        InvocationContext::new(ADMIN)
    }

    #[tokio::test]
    async fn test_load_credits_and_buffers_one_write() {
        let store = InMemoryLedgerStore::new();
        store.seed("Alice", "10");

        let tx = store.begin();
        service().load(&tx, &admin(), "Alice", "90").await.unwrap();
        assert_eq!(tx.pending_writes(), 1);
        tx.commit().unwrap();

        assert_eq!(store.get_committed("Alice"), Some(b"100".to_vec()));
    }

    #[tokio::test]
    async fn test_load_rejects_bad_amount_before_reading() {
        let store = InMemoryLedgerStore::new();
        let tx = store.begin();

        let err = service()
            .load(&tx, &admin(), "Alice", "-5")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(tx.pending_writes(), 0);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_load() {
        let store = InMemoryLedgerStore::new();
        let tx = store.begin();

        let err = service()
            .load(&tx, &InvocationContext::new("user"), "Alice", "100")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(tx.pending_writes(), 0);
    }

    #[tokio::test]
    async fn test_transfer_failure_writes_nothing() {
        let store = InMemoryLedgerStore::new();
        store.seed("Alice", "60");
        store.seed("Bob", "40");

        let tx = store.begin();
        let err = service()
            .transfer(&tx, &admin(), "Alice", "Bob", "1000")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(tx.pending_writes(), 0);
    }

    #[tokio::test]
    async fn test_transfer_rejects_zero() {
        let store = InMemoryLedgerStore::new();
        store.seed("Alice", "60");

        let tx = store.begin();
        let err = service()
            .transfer(&tx, &admin(), "Alice", "Bob", "0")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_self_transfer_single_write() {
        let store = InMemoryLedgerStore::new();
        store.seed("Alice", "60");

        let tx = store.begin();
        service()
            .transfer(&tx, &admin(), "Alice", "Alice", "25")
            .await
            .unwrap();
        assert_eq!(tx.pending_writes(), 1);
        tx.commit().unwrap();
        assert_eq!(store.get_committed("Alice"), Some(b"60".to_vec()));
    }

    #[tokio::test]
    async fn test_payout_zero_on_absent_account_writes_zero() {
        let store = InMemoryLedgerStore::new();
        let tx = store.begin();

        service().payout(&tx, &admin(), "Ghost", "0").await.unwrap();
        tx.commit().unwrap();
        assert_eq!(store.get_committed("Ghost"), Some(b"0".to_vec()));
    }

    #[tokio::test]
    async fn test_corrupted_balance_surfaces_state_error() {
        let store = InMemoryLedgerStore::new();
        store.seed("Alice", "12abc");

        let tx = store.begin();
        let err = service()
            .payout(&tx, &admin(), "Alice", "1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::State(StateError::Corrupted { .. })
        ));
    }

    #[tokio::test]
    async fn test_query_modes() {
        let store = InMemoryLedgerStore::new();
        let tx = store.begin();
        let anyone = InvocationContext::new("anyone");

        let raw = service().query_balance(&tx, &anyone, "Nobody").await.unwrap();
        assert_eq!(raw, None);

        let normalized = WalletLedgerService::new(
            Arc::new(StaticAdminRegistry::from_identities([ADMIN])),
            ServiceConfig {
                query_payload: QueryPayloadMode::Normalized,
            },
        );
        let zero = normalized
            .query_balance(&tx, &anyone, "Nobody")
            .await
            .unwrap();
        assert_eq!(zero, Some(b"0".to_vec()));
    }

    #[tokio::test]
    async fn test_query_returns_corrupted_bytes_untouched() {
        let store = InMemoryLedgerStore::new();
        store.seed("Alice", "12abc");

        let tx = store.begin();
        let bytes = service()
            .query_balance(&tx, &InvocationContext::new("anyone"), "Alice")
            .await
            .unwrap();
        assert_eq!(bytes, Some(b"12abc".to_vec()));
    }

    #[tokio::test]
    async fn test_delete_rejects_empty_account() {
        let store = InMemoryLedgerStore::new();
        let tx = store.begin();

        let err = service().delete(&tx, &admin(), "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_unfunded_transfer_skips_destination_read() {
        // Arrange: destination holds a value that would fail to decode
        let store = InMemoryLedgerStore::new();
        store.seed("Alice", "5");
        store.seed("Bob", "12abc");
        let tx = store.begin();

        // Act
        let err = service()
            .transfer(&tx, &admin(), "Alice", "Bob", "10")
            .await
            .unwrap_err();

        // Assert: the source check fails first, Bob is never decoded
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(tx.pending_writes(), 0);

        let funded = store.begin();
        let err = service()
            .transfer(&funded, &admin(), "Alice", "Bob", "5")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }
}

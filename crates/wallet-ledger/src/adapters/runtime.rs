//! # In-Memory Runtime
//!
//! Hosts the ledger the way a permissioned chaincode runtime would: one
//! transaction per invocation, a hard timeout, commit on success, discard on
//! failure. Outcomes are counted after the commit result is known.

use crate::adapters::admin_registry::ReloadableAdminRegistry;
use crate::adapters::state_adapter::InMemoryLedgerStore;
use crate::config::{ConfigError, LedgerConfig};
use crate::dispatch::{Dispatched, Dispatcher, LedgerStats};
use crate::domain::entities::{InvocationContext, Response};
use crate::domain::value_objects::CallerIdentity;
use crate::errors::{LedgerError, StateError};
use crate::service::{ServiceConfig, WalletLedgerService};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use wallet_telemetry::COMMIT_CONFLICTS;

/// Single-process host for the wallet ledger.
#[derive(Debug)]
pub struct InMemoryRuntime {
    store: Arc<InMemoryLedgerStore>,
    registry: Arc<ReloadableAdminRegistry>,
    dispatcher: Dispatcher<WalletLedgerService>,
    timeout: Duration,
}

impl InMemoryRuntime {
    /// Build a runtime with an empty store.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `config` does not validate.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, ConfigError> {
        Self::with_store(config, InMemoryLedgerStore::new())
    }

    /// Build a runtime over an existing store.
    pub fn with_store(
        config: &LedgerConfig,
        store: Arc<InMemoryLedgerStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let registry = Arc::new(ReloadableAdminRegistry::from_config(config));
        let service = WalletLedgerService::new(
            registry.clone(),
            ServiceConfig {
                query_payload: config.query_payload,
            },
        );

        info!(
            admins = config.admins.len(),
            query_payload = ?config.query_payload,
            timeout_ms = config.invocation_timeout_ms,
            "Wallet ledger runtime ready"
        );

        Ok(Self {
            store,
            registry,
            dispatcher: Dispatcher::new(service),
            timeout: Duration::from_millis(config.invocation_timeout_ms),
        })
    }

    /// Instantiation hook. The ledger needs no setup.
    pub fn init(&self) -> Response {
        info!("Wallet ledger instantiated");
        Response::success()
    }

    /// Run one invocation in its own transaction.
    ///
    /// # Arguments
    ///
    /// * `caller` - Verified submitter identity
    /// * `function` - Function name
    /// * `args` - Positional arguments
    pub async fn invoke<S: AsRef<str>>(
        &self,
        caller: impl Into<CallerIdentity>,
        function: &str,
        args: &[S],
    ) -> Response {
        let tx = self.store.begin();
        let ctx = InvocationContext::with_id(caller, tx.tx_id());
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();

        let outcome = tokio::time::timeout(
            self.timeout,
            self.dispatcher.execute(&tx, &ctx, function, &args),
        )
        .await;

        let dispatched = match outcome {
            Ok(dispatched) if dispatched.is_success() => match tx.commit() {
                Ok(_) => dispatched,
                Err(e) => {
                    if matches!(e, StateError::Conflict { .. }) {
                        COMMIT_CONFLICTS.inc();
                    }
                    warn!(tx_id = %ctx.invocation_id, function, error = %e, "Commit rejected");
                    dispatched.into_failure(LedgerError::from(e))
                }
            },
            Ok(dispatched) => {
                tx.discard();
                dispatched
            }
            Err(_) => {
                warn!(tx_id = %ctx.invocation_id, function, "Invocation timed out");
                tx.discard();
                Dispatched::failed(function, LedgerError::from(StateError::Timeout))
            }
        };

        self.dispatcher.record(dispatched).await
    }

    /// Committed state.
    #[must_use]
    pub fn store(&self) -> &Arc<InMemoryLedgerStore> {
        &self.store
    }

    /// Administrator registry, for rotation.
    #[must_use]
    pub fn registry(&self) -> &Arc<ReloadableAdminRegistry> {
        &self.registry
    }

    /// The dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher<WalletLedgerService> {
        &self.dispatcher
    }

    /// Dispatcher counters.
    pub async fn stats(&self) -> LedgerStats {
        self.dispatcher.stats().await
    }
}

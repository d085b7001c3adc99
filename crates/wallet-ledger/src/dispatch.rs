//! # Function Dispatcher
//!
//! Routes an invocation by function name to the matching ledger operation,
//! checks the argument count, and converts the outcome into a [`Response`].
//!
//! Dispatch happens in two steps. [`Dispatcher::execute`] runs the handler
//! and yields a [`Dispatched`] outcome; [`Dispatcher::record`] counts it and
//! builds the response. A host that commits after the handler returns records
//! only once the commit result is known, so a rejected commit is counted as a
//! failure. [`Dispatcher::invoke`] does both for hosts without a commit step.
//!
//! The dispatcher never touches state itself; everything it writes goes
//! through the handler it routes to.

use crate::domain::entities::{InvocationContext, Operation, Response};
use crate::errors::{ErrorKind, LedgerError};
use crate::ports::inbound::WalletLedgerApi;
use crate::ports::outbound::StateAccess;
use tokio::sync::RwLock;
use tracing::{debug, error, instrument, warn};
use wallet_telemetry::{HistogramTimer, INVOCATIONS};

/// Counters kept by the dispatcher.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerStats {
    /// Every invocation, including unknown functions.
    pub invocations: u64,
    /// Invocations that returned success.
    pub successes: u64,
    /// Invocations that returned failure.
    pub failures: u64,
    /// Failures caused by a non-administrator caller.
    pub unauthorized: u64,
    /// Failures caused by an unknown function name.
    pub unknown_functions: u64,
}

/// Outcome of running one invocation, not yet counted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatched {
    /// No operation has this name.
    UnknownFunction(String),
    /// The operation ran.
    Completed {
        /// Resolved operation.
        operation: Operation,
        /// Handler result: query payload or error.
        result: Result<Option<Vec<u8>>, LedgerError>,
    },
}

impl Dispatched {
    /// Outcome for `function` failing with `error` outside the handler,
    /// e.g. a timeout.
    #[must_use]
    pub fn failed(function: &str, error: LedgerError) -> Self {
        match Operation::resolve(function) {
            Some(operation) => Self::Completed {
                operation,
                result: Err(error),
            },
            None => Self::UnknownFunction(function.to_string()),
        }
    }

    /// Returns true if the handler succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { result: Ok(_), .. })
    }

    /// Replace a successful result with `error`. Used when the commit fails.
    #[must_use]
    pub fn into_failure(self, error: LedgerError) -> Self {
        match self {
            Self::Completed { operation, .. } => Self::Completed {
                operation,
                result: Err(error),
            },
            unknown @ Self::UnknownFunction(_) => unknown,
        }
    }
}

/// Routes invocations to a [`WalletLedgerApi`].
#[derive(Debug)]
pub struct Dispatcher<L: WalletLedgerApi> {
    ledger: L,
    stats: RwLock<LedgerStats>,
}

impl<L: WalletLedgerApi> Dispatcher<L> {
    /// Create a dispatcher over `ledger`.
    pub fn new(ledger: L) -> Self {
        Self {
            ledger,
            stats: RwLock::new(LedgerStats::default()),
        }
    }

    /// The wrapped ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Snapshot of the counters.
    pub async fn stats(&self) -> LedgerStats {
        self.stats.read().await.clone()
    }

    /// Handle one invocation and record its outcome.
    ///
    /// # Arguments
    ///
    /// * `state` - State handle of the current transaction
    /// * `ctx` - Caller identity and invocation id
    /// * `function` - Requested function name
    /// * `args` - Positional string arguments
    ///
    /// # Returns
    ///
    /// `Response::Success` with the query payload, if any, or
    /// `Response::Failure` carrying the error message.
    pub async fn invoke(
        &self,
        state: &dyn StateAccess,
        ctx: &InvocationContext,
        function: &str,
        args: &[String],
    ) -> Response {
        let dispatched = self.execute(state, ctx, function, args).await;
        self.record(dispatched).await
    }

    /// Run the handler for `function` without counting the outcome.
    #[instrument(skip(self, state, ctx, args), fields(tx_id = %ctx.invocation_id, caller = %ctx.caller))]
    pub async fn execute(
        &self,
        state: &dyn StateAccess,
        ctx: &InvocationContext,
        function: &str,
        args: &[String],
    ) -> Dispatched {
        let Some(operation) = Operation::resolve(function) else {
            warn!(function, "Unknown function requested");
            return Dispatched::UnknownFunction(function.to_string());
        };

        let _timer = HistogramTimer::for_operation(operation.name());
        let result = self.route(state, ctx, operation, args).await;
        Dispatched::Completed { operation, result }
    }

    /// Count a final outcome and convert it into a [`Response`].
    pub async fn record(&self, dispatched: Dispatched) -> Response {
        let (operation, result) = match dispatched {
            Dispatched::UnknownFunction(function) => {
                INVOCATIONS
                    .with_label_values(&["unknown", "unknown_function"])
                    .inc();
                let mut stats = self.stats.write().await;
                stats.invocations += 1;
                stats.failures += 1;
                stats.unknown_functions += 1;
                return Response::failure(format!("no method of name:{function} found"));
            }
            Dispatched::Completed { operation, result } => (operation, result),
        };

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind().as_str(),
        };
        INVOCATIONS
            .with_label_values(&[operation.name(), outcome])
            .inc();

        let mut stats = self.stats.write().await;
        stats.invocations += 1;
        match result {
            Ok(payload) => {
                stats.successes += 1;
                debug!(operation = %operation, "Invocation succeeded");
                Response::success_with(payload)
            }
            Err(e) => {
                stats.failures += 1;
                match e.kind() {
                    ErrorKind::Unauthorized => stats.unauthorized += 1,
                    ErrorKind::InsufficientFunds => {
                        warn!(operation = %operation, error = %e, "Insufficient funds");
                    }
                    ErrorKind::State => {
                        error!(operation = %operation, error = %e, "State access failed");
                    }
                    ErrorKind::InvalidArgument => {
                        debug!(operation = %operation, error = %e, "Invalid argument");
                    }
                }
                Response::failure(e.to_string())
            }
        }
    }

    async fn route(
        &self,
        state: &dyn StateAccess,
        ctx: &InvocationContext,
        operation: Operation,
        args: &[String],
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        if args.len() != operation.arity() {
            return Err(LedgerError::invalid(format!(
                "incorrect number of arguments for {operation}: expecting {}, got {}",
                operation.arity(),
                args.len()
            )));
        }

        match operation {
            Operation::Load => self
                .ledger
                .load(state, ctx, &args[0], &args[1])
                .await
                .map(|()| None),
            Operation::Transfer => self
                .ledger
                .transfer(state, ctx, &args[0], &args[1], &args[2])
                .await
                .map(|()| None),
            Operation::Payout => self
                .ledger
                .payout(state, ctx, &args[0], &args[1])
                .await
                .map(|()| None),
            Operation::QueryBalance => self.ledger.query_balance(state, ctx, &args[0]).await,
            Operation::Delete => self
                .ledger
                .delete(state, ctx, &args[0])
                .await
                .map(|()| None),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryLedgerStore, StaticAdminRegistry};
    use crate::service::WalletLedgerService;
    use std::sync::Arc;

    fn dispatcher() -> Dispatcher<WalletLedgerService> {
        Dispatcher::new(WalletLedgerService::with_registry(Arc::new(
            StaticAdminRegistry::from_identities(["admin"]),
        )))
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_unknown_function() {
        let store = InMemoryLedgerStore::new();
        let tx = store.begin();
        let dispatcher = dispatcher();

        let response = dispatcher
            .invoke(&tx, &InvocationContext::new("admin"), "mint", &args(&["Alice", "1"]))
            .await;
        assert_eq!(response.message(), Some("no method of name:mint found"));
        assert_eq!(dispatcher.stats().await.unknown_functions, 1);
    }

    #[tokio::test]
    async fn test_arity_checked_before_authorization() {
        let store = InMemoryLedgerStore::new();
        let tx = store.begin();
        let dispatcher = dispatcher();

        let response = dispatcher
            .invoke(&tx, &InvocationContext::new("user"), "load", &args(&["Alice"]))
            .await;
        assert_eq!(
            response.message(),
            Some("invalid argument: incorrect number of arguments for load: expecting 2, got 1")
        );
        assert_eq!(dispatcher.stats().await.unauthorized, 0);
    }

    #[tokio::test]
    async fn test_extra_arguments_rejected() {
        let store = InMemoryLedgerStore::new();
        let tx = store.begin();

        let response = dispatcher()
            .invoke(
                &tx,
                &InvocationContext::new("anyone"),
                "queryBalance",
                &args(&["Alice", "Bob"]),
            )
            .await;
        assert!(!response.is_success());
        assert_eq!(tx.pending_writes(), 0);
    }

    #[tokio::test]
    async fn test_stats_track_outcomes() {
        let store = InMemoryLedgerStore::new();
        let tx = store.begin();
        let dispatcher = dispatcher();

        let ok = dispatcher
            .invoke(&tx, &InvocationContext::new("admin"), "load", &args(&["Alice", "5"]))
            .await;
        assert!(ok.is_success());

        let denied = dispatcher
            .invoke(&tx, &InvocationContext::new("user"), "delete", &args(&["Alice"]))
            .await;
        assert!(!denied.is_success());

        let stats = dispatcher.stats().await;
        assert_eq!(
            stats,
            LedgerStats {
                invocations: 2,
                successes: 1,
                failures: 1,
                unauthorized: 1,
                unknown_functions: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_execute_does_not_count_until_recorded() {
        let store = InMemoryLedgerStore::new();
        let tx = store.begin();
        let dispatcher = dispatcher();

        let dispatched = dispatcher
            .execute(&tx, &InvocationContext::new("admin"), "load", &args(&["Alice", "5"]))
            .await;
        assert!(dispatched.is_success());
        assert_eq!(dispatcher.stats().await.invocations, 0);

        let rejected = dispatched.into_failure(LedgerError::from(
            crate::errors::StateError::Conflict {
                key: "Alice".to_string(),
            },
        ));
        let response = dispatcher.record(rejected).await;
        assert!(!response.is_success());

        let stats = dispatcher.stats().await;
        assert_eq!(stats.invocations, 1);
        assert_eq!(stats.successes, 0);
        assert_eq!(stats.failures, 1);
    }

    #[test]
    fn test_failed_outcome_resolves_operation() {
        let dispatched = Dispatched::failed(
            "querywalletAmount",
            LedgerError::from(crate::errors::StateError::Timeout),
        );
        assert!(matches!(
            dispatched,
            Dispatched::Completed {
                operation: Operation::QueryBalance,
                result: Err(_),
            }
        ));
        assert_eq!(
            Dispatched::failed("mint", LedgerError::invalid("x")),
            Dispatched::UnknownFunction("mint".to_string())
        );
    }
}

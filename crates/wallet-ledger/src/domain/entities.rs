//! # Domain Entities
//!
//! Administrator set, the operation table, invocation context and the
//! response envelope returned to the host runtime.

use crate::domain::value_objects::{AccountId, CallerIdentity};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// ADMINISTRATOR SET
// =============================================================================

/// Identities allowed to invoke mutating operations.
///
/// Membership is an exact byte-for-byte match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdminSet {
    members: HashSet<Vec<u8>>,
}

impl AdminSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `identity` is an administrator.
    #[must_use]
    pub fn contains(&self, identity: &CallerIdentity) -> bool {
        self.members.contains(identity.as_bytes())
    }

    /// Add an identity, returning false if it was already present.
    pub fn insert(&mut self, identity: CallerIdentity) -> bool {
        self.members.insert(identity.as_bytes().to_vec())
    }

    /// Number of administrators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if no administrator is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<I> FromIterator<I> for AdminSet
where
    I: Into<CallerIdentity>,
{
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        let mut set = Self::new();
        for identity in iter {
            set.insert(identity.into());
        }
        set
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Ledger operations reachable through the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Credit an account (mint).
    Load,
    /// Move funds between accounts.
    Transfer,
    /// Debit an account (burn).
    Payout,
    /// Read an account's stored balance.
    QueryBalance,
    /// Remove an account's balance entry.
    Delete,
}

/// Static dispatch metadata for one operation.
#[derive(Debug)]
pub struct OperationSpec {
    /// Operation described by this entry.
    pub operation: Operation,
    /// Canonical function name.
    pub name: &'static str,
    /// Additional accepted function names.
    pub aliases: &'static [&'static str],
    /// Required argument count.
    pub arity: usize,
    /// Whether the operation writes state and requires an administrator.
    pub mutating: bool,
}

/// Indexed by `Operation as usize`.
static OPERATIONS: [OperationSpec; 5] = [
    OperationSpec {
        operation: Operation::Load,
        name: "load",
        aliases: &[],
        arity: 2,
        mutating: true,
    },
    OperationSpec {
        operation: Operation::Transfer,
        name: "transfer",
        aliases: &[],
        arity: 3,
        mutating: true,
    },
    OperationSpec {
        operation: Operation::Payout,
        name: "payout",
        aliases: &[],
        arity: 2,
        mutating: true,
    },
    OperationSpec {
        operation: Operation::QueryBalance,
        name: "queryBalance",
        aliases: &["querywalletAmount"],
        arity: 1,
        mutating: false,
    },
    OperationSpec {
        operation: Operation::Delete,
        name: "delete",
        aliases: &[],
        arity: 1,
        mutating: true,
    },
];

impl Operation {
    /// Every operation, in table order.
    pub const ALL: [Operation; 5] = [
        Operation::Load,
        Operation::Transfer,
        Operation::Payout,
        Operation::QueryBalance,
        Operation::Delete,
    ];

    /// Dispatch metadata.
    #[must_use]
    pub fn spec(self) -> &'static OperationSpec {
        &OPERATIONS[self as usize]
    }

    /// Canonical function name.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Required argument count.
    #[must_use]
    pub fn arity(self) -> usize {
        self.spec().arity
    }

    /// Whether the operation requires an administrator.
    #[must_use]
    pub fn is_mutating(self) -> bool {
        self.spec().mutating
    }

    /// Resolve a function name, including aliases.
    #[must_use]
    pub fn resolve(function: &str) -> Option<Self> {
        OPERATIONS
            .iter()
            .find(|spec| {
                spec.name == function || spec.aliases.iter().any(|alias| *alias == function)
            })
            .map(|spec| spec.operation)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// INVOCATION CONTEXT
// =============================================================================

/// Per-invocation context supplied by the host runtime.
#[derive(Clone, Debug)]
pub struct InvocationContext {
    /// Verified identity of the submitter.
    pub caller: CallerIdentity,
    /// Transaction id assigned by the runtime.
    pub invocation_id: Uuid,
}

impl InvocationContext {
    /// Create a context with a fresh invocation id.
    #[must_use]
    pub fn new(caller: impl Into<CallerIdentity>) -> Self {
        Self::with_id(caller, Uuid::new_v4())
    }

    /// Create a context with a runtime-assigned id.
    #[must_use]
    pub fn with_id(caller: impl Into<CallerIdentity>, invocation_id: Uuid) -> Self {
        Self {
            caller: caller.into(),
            invocation_id,
        }
    }
}

// =============================================================================
// RESPONSE ENVELOPE
// =============================================================================

/// Outcome of one invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    /// Operation applied. Query carries the stored bytes.
    Success {
        /// Optional result bytes.
        payload: Option<Vec<u8>>,
    },
    /// Operation rejected, nothing written.
    Failure {
        /// Human-readable reason.
        message: String,
    },
}

impl Response {
    /// Success without payload.
    #[must_use]
    pub fn success() -> Self {
        Self::Success { payload: None }
    }

    /// Success carrying `payload`.
    #[must_use]
    pub fn success_with(payload: Option<Vec<u8>>) -> Self {
        Self::Success { payload }
    }

    /// Failure with `message`.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    /// Returns true for [`Response::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Success payload, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Self::Success { payload } => payload.as_deref(),
            Self::Failure { .. } => None,
        }
    }

    /// Failure message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { message } => Some(message),
        }
    }
}

// =============================================================================
// QUERY PAYLOAD
// =============================================================================

/// How `queryBalance` reports an account with no stored entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryPayloadMode {
    /// Return the stored bytes untouched; absent stays absent.
    #[default]
    Raw,
    /// Return `"0"` when the account has no stored entry.
    Normalized,
}

impl FromStr for QueryPayloadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "normalized" => Ok(Self::Normalized),
            other => Err(format!("unknown query payload mode: {other}")),
        }
    }
}

/// Structured view of a wallet, emitted in query logs.
#[derive(Clone, Debug, Serialize)]
pub struct BalanceView {
    /// Account key.
    #[serde(rename = "PublicKey")]
    pub public_key: AccountId,
    /// Semantic balance; `"0"` for accounts with no stored entry.
    #[serde(rename = "Amount")]
    pub amount: String,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_table_is_indexed_by_discriminant() {
        for op in Operation::ALL {
            assert_eq!(op.spec().operation, op);
        }
    }

    #[test]
    fn test_resolve_names_and_aliases() {
        assert_eq!(Operation::resolve("load"), Some(Operation::Load));
        assert_eq!(Operation::resolve("transfer"), Some(Operation::Transfer));
        assert_eq!(Operation::resolve("payout"), Some(Operation::Payout));
        assert_eq!(Operation::resolve("queryBalance"), Some(Operation::QueryBalance));
        assert_eq!(
            Operation::resolve("querywalletAmount"),
            Some(Operation::QueryBalance)
        );
        assert_eq!(Operation::resolve("delete"), Some(Operation::Delete));
        assert_eq!(Operation::resolve("Load"), None);
        assert_eq!(Operation::resolve("mint"), None);
    }

    #[test]
    fn test_arity_and_gating() {
        assert_eq!(Operation::Load.arity(), 2);
        assert_eq!(Operation::Transfer.arity(), 3);
        assert_eq!(Operation::Payout.arity(), 2);
        assert_eq!(Operation::QueryBalance.arity(), 1);
        assert_eq!(Operation::Delete.arity(), 1);
        assert!(!Operation::QueryBalance.is_mutating());
        assert!(Operation::ALL
            .iter()
            .filter(|op| **op != Operation::QueryBalance)
            .all(|op| op.is_mutating()));
    }

    #[test]
    fn test_admin_set_exact_match() {
        let set: AdminSet = ["admin", "ops"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&CallerIdentity::from("admin")));
        assert!(!set.contains(&CallerIdentity::from("Admin")));
        assert!(!set.contains(&CallerIdentity::from("admin ")));
        assert!(!set.contains(&CallerIdentity::from("adm")));
    }

    #[test]
    fn test_response_accessors() {
        let ok = Response::success_with(Some(b"100".to_vec()));
        assert!(ok.is_success());
        assert_eq!(ok.payload(), Some(&b"100"[..]));
        assert_eq!(ok.message(), None);

        let err = Response::failure("nope");
        assert!(!err.is_success());
        assert_eq!(err.payload(), None);
        assert_eq!(err.message(), Some("nope"));
    }

    #[test]
    fn test_query_payload_mode_from_str() {
        assert_eq!("raw".parse::<QueryPayloadMode>(), Ok(QueryPayloadMode::Raw));
        assert_eq!(
            "Normalized".parse::<QueryPayloadMode>(),
            Ok(QueryPayloadMode::Normalized)
        );
        assert!("zero".parse::<QueryPayloadMode>().is_err());
    }

    #[test]
    fn test_balance_view_json_shape() {
        let view = BalanceView {
            public_key: AccountId::unchecked("Alice"),
            amount: "0".to_string(),
        };
        let json = serde_json::to_string(&view).unwrap();
        assert_eq!(json, r#"{"PublicKey":"Alice","Amount":"0"}"#);
    }
}

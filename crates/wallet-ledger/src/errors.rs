//! # Error Types
//!
//! All error types for ledger operations.

use thiserror::Error;

// =============================================================================
// LEDGER ERRORS
// =============================================================================

/// Category of a [`LedgerError`], as seen by callers of the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Wrong arity, empty identity, or malformed amount.
    InvalidArgument,
    /// Caller is not in the administrator set.
    Unauthorized,
    /// Source balance missing or below the requested debit.
    InsufficientFunds,
    /// Failure raised by the state accessor.
    State,
}

impl ErrorKind {
    /// Stable snake_case label, used for metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::Unauthorized => "unauthorized",
            Self::InsufficientFunds => "insufficient_funds",
            Self::State => "state",
        }
    }
}

/// Errors raised by balance ledger operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Malformed invocation arguments.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Caller is not an administrator.
    #[error("unauthorized: identity {identity} is not an administrator")]
    Unauthorized {
        /// Printable form of the rejected identity.
        identity: String,
    },

    /// Debit exceeds the available balance.
    ///
    /// `available` is `None` when the account has never been loaded.
    #[error("insufficient funds in account {account}: {}", shortfall(.required, .available))]
    InsufficientFunds {
        /// Account being debited.
        account: String,
        /// Requested debit.
        required: u128,
        /// Recorded balance, if any.
        available: Option<u128>,
    },

    /// State accessor failure.
    #[error(transparent)]
    State(#[from] StateError),
}

fn shortfall(required: &u128, available: &Option<u128>) -> String {
    match available {
        Some(available) => format!("required {required}, available {available}"),
        None => format!("no recorded balance, required {required}"),
    }
}

impl LedgerError {
    /// Shorthand for [`LedgerError::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// The error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::State(_) => ErrorKind::State,
        }
    }

    /// Returns true if the debited account had no stored balance at all.
    #[must_use]
    pub fn is_never_loaded(&self) -> bool {
        matches!(self, Self::InsufficientFunds { available: None, .. })
    }
}

// =============================================================================
// STATE ERRORS
// =============================================================================

/// Errors from state access operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The backing store cannot be reached.
    #[error("state store unavailable")]
    Unavailable,

    /// A stored value is not a decimal balance.
    #[error("corrupted value under key {key:?}: {reason}")]
    Corrupted {
        /// Key whose value failed to decode.
        key: String,
        /// Decoder message.
        reason: String,
    },

    /// A key read by the invocation changed before commit.
    #[error("read conflict on key {key:?}: value changed before commit")]
    Conflict {
        /// First key whose version no longer matches.
        key: String,
    },

    /// State access timed out.
    #[error("state access timeout")]
    Timeout,

    /// Other state error.
    #[error("state error: {0}")]
    Other(String),
}

impl StateError {
    /// Returns true if resubmitting the same invocation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Timeout | Self::Unavailable)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_display() {
        let err = LedgerError::InsufficientFunds {
            account: "Alice".to_string(),
            required: 1000,
            available: Some(60),
        };
        assert_eq!(
            err.to_string(),
            "insufficient funds in account Alice: required 1000, available 60"
        );
        assert!(!err.is_never_loaded());
    }

    #[test]
    fn test_never_loaded_display() {
        let err = LedgerError::InsufficientFunds {
            account: "Carol".to_string(),
            required: 5,
            available: None,
        };
        assert_eq!(
            err.to_string(),
            "insufficient funds in account Carol: no recorded balance, required 5"
        );
        assert!(err.is_never_loaded());
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    }

    #[test]
    fn test_state_error_conversion() {
        let err: LedgerError = StateError::Conflict {
            key: "Alice".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::State);
        assert!(err.to_string().contains("read conflict"));
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(LedgerError::invalid("x").kind().as_str(), "invalid_argument");
        assert_eq!(
            LedgerError::Unauthorized {
                identity: "eve".to_string()
            }
            .kind()
            .as_str(),
            "unauthorized"
        );
    }

    #[test]
    fn test_retryable() {
        assert!(StateError::Conflict { key: "k".into() }.is_retryable());
        assert!(!StateError::Corrupted {
            key: "k".into(),
            reason: "bad".into()
        }
        .is_retryable());
    }
}

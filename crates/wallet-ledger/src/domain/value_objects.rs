//! # Value Objects
//!
//! Immutable, validated building blocks of the ledger: account identifiers,
//! balances, amounts and caller identities.
//!
//! Balances are persisted as decimal ASCII. Parsing is strict: digits only,
//! no sign, no whitespace.

use crate::errors::{LedgerError, StateError};
use serde::Serialize;
use std::fmt;

// =============================================================================
// DECIMAL PARSING
// =============================================================================

/// Why a decimal string was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecimalError {
    /// Empty input.
    Empty,
    /// Leading minus sign.
    Negative,
    /// A character other than `0-9`.
    InvalidDigit,
    /// Value does not fit in 128 bits.
    Overflow,
}

impl fmt::Display for DecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Empty => "empty value",
            Self::Negative => "negative value",
            Self::InvalidDigit => "not a decimal integer",
            Self::Overflow => "value too large",
        };
        f.write_str(reason)
    }
}

/// Parse an unsigned decimal integer.
pub fn parse_decimal(raw: &str) -> Result<u128, DecimalError> {
    if raw.is_empty() {
        return Err(DecimalError::Empty);
    }
    if raw.starts_with('-') {
        return Err(DecimalError::Negative);
    }

    raw.bytes().try_fold(0u128, |acc, byte| {
        if !byte.is_ascii_digit() {
            return Err(DecimalError::InvalidDigit);
        }
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add(u128::from(byte - b'0')))
            .ok_or(DecimalError::Overflow)
    })
}

// =============================================================================
// ACCOUNT ID
// =============================================================================

/// Public-key string identifying a wallet account. Also the state key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AccountId(String);

impl AccountId {
    /// Validate a non-empty account identifier.
    ///
    /// `role` names the argument in the error message (`account`, `from`, `to`).
    pub fn parse(raw: &str, role: &str) -> Result<Self, LedgerError> {
        if raw.is_empty() {
            return Err(LedgerError::invalid(format!("{role} must not be empty")));
        }
        Ok(Self(raw.to_string()))
    }

    /// Wrap a key without validation. Used by read-only lookups.
    #[must_use]
    pub fn unchecked(raw: &str) -> Self {
        Self(raw.to_string())
    }

    /// The state key for this account.
    #[must_use]
    pub fn as_key(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// BALANCE
// =============================================================================

/// Non-negative account balance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Balance(u128);

impl Balance {
    /// Zero balance, the value of an account with no stored entry.
    pub const ZERO: Self = Self(0);

    /// Create a balance.
    #[must_use]
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// Raw value.
    #[must_use]
    pub const fn value(&self) -> u128 {
        self.0
    }

    /// Decode a stored value.
    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self, StateError> {
        let corrupted = |reason: String| StateError::Corrupted {
            key: key.to_string(),
            reason,
        };
        let text = std::str::from_utf8(bytes).map_err(|e| corrupted(e.to_string()))?;
        parse_decimal(text)
            .map(Self)
            .map_err(|e| corrupted(e.to_string()))
    }

    /// Encode for storage as decimal ASCII.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        self.0.to_string().into_bytes()
    }

    /// Add an amount, `None` on overflow.
    #[must_use]
    pub fn checked_credit(self, amount: Amount) -> Option<Self> {
        self.0.checked_add(amount.0).map(Self)
    }

    /// Subtract an amount, `None` if the result would be negative.
    #[must_use]
    pub fn checked_debit(self, amount: Amount) -> Option<Self> {
        self.0.checked_sub(amount.0).map(Self)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// AMOUNT
// =============================================================================

/// Amount carried by a load, transfer or payout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Amount(u128);

impl Amount {
    /// Parse a non-negative decimal amount.
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        parse_decimal(raw).map(Self).map_err(|e| {
            LedgerError::invalid(format!("expecting integer value for amount, got {raw:?}: {e}"))
        })
    }

    /// Parse an amount that must be strictly positive.
    pub fn parse_positive(raw: &str) -> Result<Self, LedgerError> {
        let amount = Self::parse(raw)?;
        if amount.0 == 0 {
            return Err(LedgerError::invalid("amount must be greater than zero"));
        }
        Ok(amount)
    }

    /// Create an amount.
    #[must_use]
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// Raw value.
    #[must_use]
    pub const fn value(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// CALLER IDENTITY
// =============================================================================

/// Opaque, runtime-verified identity of the party submitting an invocation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallerIdentity(Vec<u8>);

impl CallerIdentity {
    /// Wrap raw identity bytes.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Identity bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for CallerIdentity {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<String> for CallerIdentity {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

/// UTF-8 identities print as text, anything else as `0x`-prefixed hex.
impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(text) => f.write_str(text),
            Err(_) => write!(f, "0x{}", hex::encode(&self.0)),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

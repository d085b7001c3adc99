//! # Domain Services
//!
//! Pure balance arithmetic. No I/O: callers read balances from the state
//! accessor, compute the new values here, and write them back only if every
//! step succeeded.

use crate::domain::value_objects::{AccountId, Amount, Balance};
use crate::errors::LedgerError;

/// How a debit treats an account with no stored entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebitPolicy {
    /// Missing entry counts as zero (payout).
    DefaultZero,
    /// Missing entry is an insufficient-funds failure (transfer source).
    RequireRecorded,
}

/// A single balance write produced by an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceUpdate {
    /// Account being written.
    pub account: AccountId,
    /// Stored balance before the operation, `None` if absent.
    pub before: Option<Balance>,
    /// Balance to store.
    pub after: Balance,
}

/// Credit `amount` to an account whose stored balance is `current`.
pub fn credit(
    account: &AccountId,
    current: Option<Balance>,
    amount: Amount,
) -> Result<Balance, LedgerError> {
    current
        .unwrap_or_default()
        .checked_credit(amount)
        .ok_or_else(|| LedgerError::invalid(format!("amount would overflow balance of {account}")))
}

/// Debit `amount` from an account whose stored balance is `current`.
pub fn debit(
    account: &AccountId,
    current: Option<Balance>,
    amount: Amount,
    policy: DebitPolicy,
) -> Result<Balance, LedgerError> {
    let available = match (current, policy) {
        (Some(balance), _) => balance,
        (None, DebitPolicy::DefaultZero) => Balance::ZERO,
        (None, DebitPolicy::RequireRecorded) => {
            return Err(LedgerError::InsufficientFunds {
                account: account.to_string(),
                required: amount.value(),
                available: None,
            })
        }
    };

    available
        .checked_debit(amount)
        .ok_or_else(|| LedgerError::InsufficientFunds {
            account: account.to_string(),
            required: amount.value(),
            available: Some(available.value()),
        })
}

/// Writes needed to settle a transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferPlan {
    /// Distinct accounts: debit first, then credit.
    Move {
        /// Source write.
        debit: BalanceUpdate,
        /// Destination write.
        credit: BalanceUpdate,
    },
    /// Source and destination are the same account; balance is unchanged.
    SelfTransfer(BalanceUpdate),
}

impl TransferPlan {
    /// Writes in the order they must be issued.
    #[must_use]
    pub fn writes(&self) -> Vec<&BalanceUpdate> {
        match self {
            Self::Move { debit, credit } => vec![debit, credit],
            Self::SelfTransfer(update) => vec![update],
        }
    }
}

/// Debit the transfer source.
///
/// A missing source entry is an insufficient-funds failure. The returned
/// update is the source write of the transfer.
pub fn fund_transfer(
    from: &AccountId,
    from_balance: Option<Balance>,
    amount: Amount,
) -> Result<BalanceUpdate, LedgerError> {
    let after = debit(from, from_balance, amount, DebitPolicy::RequireRecorded)?;
    Ok(BalanceUpdate {
        account: from.clone(),
        before: from_balance,
        after,
    })
}

/// Complete a funded transfer by crediting `to`.
///
/// `to_balance` is ignored when `to` is the source account.
pub fn plan_transfer(
    source: BalanceUpdate,
    to: &AccountId,
    to_balance: Option<Balance>,
    amount: Amount,
) -> Result<TransferPlan, LedgerError> {
    if source.account == *to {
        let restored = credit(to, Some(source.after), amount)?;
        return Ok(TransferPlan::SelfTransfer(BalanceUpdate {
            after: restored,
            ..source
        }));
    }

    let credited = credit(to, to_balance, amount)?;
    Ok(TransferPlan::Move {
        debit: source,
        credit: BalanceUpdate {
            account: to.clone(),
            before: to_balance,
            after: credited,
        },
    })
}

// =============================================================================
// TESTS
// =============================================================================

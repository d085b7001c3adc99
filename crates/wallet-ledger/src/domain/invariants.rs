//! # Domain Invariants
//!
//! Checks that must hold for every applied ledger operation.
//!
//! - Conservation: a transfer leaves the sum of the touched balances unchanged
//! - Exact movement: the source loses and the destination gains exactly `amount`
//! - Supply change: load and payout change total supply by exactly `amount`
//!
//! Non-negativity is carried by the `Balance` type itself.

use crate::domain::services::{BalanceUpdate, TransferPlan};
use crate::domain::value_objects::{Amount, Balance};

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

fn before_value(update: &BalanceUpdate) -> u128 {
    update.before.unwrap_or_default().value()
}

/// Sum of the touched balances is the same before and after the transfer.
#[must_use]
pub fn check_conservation_invariant(plan: &TransferPlan) -> bool {
    match plan {
        TransferPlan::Move { debit, credit } => {
            let before = before_value(debit).checked_add(before_value(credit));
            let after = debit.after.value().checked_add(credit.after.value());
            before.is_some() && before == after
        }
        TransferPlan::SelfTransfer(update) => update.before == Some(update.after),
    }
}

/// Source decreases and destination increases by exactly `amount`.
#[must_use]
pub fn check_exact_movement_invariant(plan: &TransferPlan, amount: Amount) -> bool {
    match plan {
        TransferPlan::Move { debit, credit } => {
            before_value(debit).checked_sub(debit.after.value()) == Some(amount.value())
                && credit.after.value().checked_sub(before_value(credit)) == Some(amount.value())
        }
        TransferPlan::SelfTransfer(_) => true,
    }
}

/// A mint or burn changed the balance by exactly `amount`.
#[must_use]
pub fn check_supply_change_invariant(before: Balance, after: Balance, amount: Amount) -> bool {
    before.value().abs_diff(after.value()) == amount.value()
}

/// Invariant violations found by [`check_transfer_invariants`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Sum of touched balances changed.
    ConservationBroken,
    /// Movement differs from the requested amount.
    AmountMismatch {
        /// Requested amount.
        amount: u128,
    },
}

/// Check every transfer invariant at once.
#[must_use]
pub fn check_transfer_invariants(plan: &TransferPlan, amount: Amount) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    if !check_conservation_invariant(plan) {
        violations.push(InvariantViolation::ConservationBroken);
    }

    if !check_exact_movement_invariant(plan, amount) {
        violations.push(InvariantViolation::AmountMismatch {
            amount: amount.value(),
        });
    }

    violations
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::{fund_transfer, plan_transfer};
    use crate::domain::value_objects::AccountId;

    #[test]
    fn test_planned_transfer_satisfies_invariants() {
        let source = fund_transfer(
            &AccountId::unchecked("Alice"),
            Some(Balance::new(100)),
            Amount::new(40),
        )
        .unwrap();
        let plan = plan_transfer(
            source,
            &AccountId::unchecked("Bob"),
            Some(Balance::new(5)),
            Amount::new(40),
        )
        .unwrap();
        assert!(check_transfer_invariants(&plan, Amount::new(40)).is_empty());
    }

    #[test]
    fn test_tampered_plan_detected() {
        let plan = TransferPlan::Move {
            debit: BalanceUpdate {
                account: AccountId::unchecked("Alice"),
                before: Some(Balance::new(100)),
                after: Balance::new(60),
            },
            credit: BalanceUpdate {
                account: AccountId::unchecked("Bob"),
                before: None,
                after: Balance::new(50),
            },
        };
        let violations = check_transfer_invariants(&plan, Amount::new(40));
        assert_eq!(
            violations,
            vec![
                InvariantViolation::ConservationBroken,
                InvariantViolation::AmountMismatch { amount: 40 },
            ]
        );
    }

    #[test]
    fn test_supply_change() {
        assert!(check_supply_change_invariant(
            Balance::new(60),
            Balance::new(100),
            Amount::new(40)
        ));
        assert!(check_supply_change_invariant(
            Balance::new(60),
            Balance::new(20),
            Amount::new(40)
        ));
        assert!(!check_supply_change_invariant(
            Balance::new(60),
            Balance::new(61),
            Amount::new(40)
        ));
    }
}

//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the ledger depends on. The host runtime provides:
//! - State access (versioned key-value store, one transaction per invocation)
//! - The administrator allow-list
//!
//! Dependencies point INWARD: adapters implement these traits.

use crate::domain::value_objects::{AccountId, Balance, CallerIdentity};
use crate::errors::StateError;
use async_trait::async_trait;

// =============================================================================
// STATE ACCESS
// =============================================================================

/// Key-value access scoped to one invocation.
///
/// ## Implementation Notes
///
/// The host runtime is expected to:
/// 1. Serve reads from a consistent view of prior committed state
/// 2. Buffer writes and deletes until the invocation succeeds
/// 3. Commit every buffered write atomically, or none of them
/// 4. Reject the commit if a key that was read changed in the meantime
#[async_trait]
pub trait StateAccess: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Returns
    ///
    /// * `Some(bytes)` - If the key exists
    /// * `None` - If the key was never written or was deleted
    async fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StateError>;

    /// Write `value` under `key`.
    ///
    /// Note: the write becomes visible only when the invocation commits.
    async fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StateError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete_state(&self, key: &str) -> Result<(), StateError>;

    /// Read and decode an account balance.
    ///
    /// `None` means the account has no stored entry.
    async fn get_balance(&self, account: &AccountId) -> Result<Option<Balance>, StateError> {
        match self.get_state(account.as_key()).await? {
            Some(bytes) => Balance::decode(account.as_key(), &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Encode and write an account balance.
    async fn put_balance(&self, account: &AccountId, balance: Balance) -> Result<(), StateError> {
        self.put_state(account.as_key(), balance.encode()).await
    }
}

// =============================================================================
// ADMINISTRATOR REGISTRY
// =============================================================================

/// Source of the administrator allow-list.
///
/// Implementations may be reloaded at runtime; the gate asks on every call.
pub trait AdminRegistry: Send + Sync {
    /// Returns true if `identity` may invoke mutating operations.
    fn is_admin(&self, identity: &CallerIdentity) -> bool;

    /// Number of configured administrators.
    fn admin_count(&self) -> usize;
}

// =============================================================================
// TESTS
// =============================================================================

//! # Authorization Gate
//!
//! Restricts mutating operations to the administrator set. The set comes from
//! an injected [`AdminRegistry`], so rotating administrators needs no redeploy.

use crate::domain::value_objects::CallerIdentity;
use crate::errors::LedgerError;
use crate::ports::outbound::AdminRegistry;
use std::sync::Arc;
use tracing::warn;
use wallet_telemetry::UNAUTHORIZED_REJECTIONS;

/// Checks callers against the administrator registry.
#[derive(Clone)]
pub struct AuthorizationGate {
    registry: Arc<dyn AdminRegistry>,
}

impl AuthorizationGate {
    /// Create a gate backed by `registry`.
    pub fn new(registry: Arc<dyn AdminRegistry>) -> Self {
        Self { registry }
    }

    /// Fail with `Unauthorized` unless `caller` is an administrator.
    pub fn verify_admin_access(&self, caller: &CallerIdentity) -> Result<(), LedgerError> {
        if self.registry.is_admin(caller) {
            return Ok(());
        }

        warn!(caller = %caller, "Rejected mutating operation from non-administrator");
        UNAUTHORIZED_REJECTIONS.inc();
        Err(LedgerError::Unauthorized {
            identity: caller.to_string(),
        })
    }

    /// Number of administrators currently configured.
    #[must_use]
    pub fn admin_count(&self) -> usize {
        self.registry.admin_count()
    }
}

impl std::fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationGate")
            .field("admin_count", &self.registry.admin_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticAdminRegistry;

    fn gate() -> AuthorizationGate {
        AuthorizationGate::new(Arc::new(StaticAdminRegistry::from_identities([
            "admin-1", "admin-2",
        ])))
    }

    #[test]
    fn test_admin_allowed() {
        assert!(gate()
            .verify_admin_access(&CallerIdentity::from("admin-2"))
            .is_ok());
    }

    #[test]
    fn test_non_admin_rejected() {
        let err = gate()
            .verify_admin_access(&CallerIdentity::from("mallory"))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::Unauthorized {
                identity: "mallory".to_string()
            }
        );
    }

    #[test]
    fn test_rejection_counted() {
        let before = UNAUTHORIZED_REJECTIONS.get();
        let _ = gate().verify_admin_access(&CallerIdentity::from("mallory"));
        assert!(UNAUTHORIZED_REJECTIONS.get() >= before + 1.0);
    }

    #[test]
    fn test_empty_registry_rejects_everyone() {
        let gate = AuthorizationGate::new(Arc::new(StaticAdminRegistry::default()));
        assert_eq!(gate.admin_count(), 0);
        assert!(gate
            .verify_admin_access(&CallerIdentity::from("admin-1"))
            .is_err());
    }
}

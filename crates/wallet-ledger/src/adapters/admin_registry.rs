//! # Administrator Registries
//!
//! `StaticAdminRegistry` holds a fixed set. `ReloadableAdminRegistry` swaps
//! its whole set atomically, so a rotation is never observed half-applied.

use crate::config::{ConfigError, LedgerConfig};
use crate::domain::entities::AdminSet;
use crate::domain::value_objects::CallerIdentity;
use crate::ports::outbound::AdminRegistry;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

// ============================================================================
// StaticAdminRegistry
// ============================================================================

/// Fixed administrator set.
#[derive(Debug, Clone, Default)]
pub struct StaticAdminRegistry {
    admins: AdminSet,
}

impl StaticAdminRegistry {
    /// Wrap an existing set.
    #[must_use]
    pub fn new(admins: AdminSet) -> Self {
        Self { admins }
    }

    /// Build from identity strings.
    #[must_use]
    pub fn from_identities<I, S>(identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CallerIdentity>,
    {
        Self::new(identities.into_iter().collect())
    }
}

impl AdminRegistry for StaticAdminRegistry {
    fn is_admin(&self, identity: &CallerIdentity) -> bool {
        self.admins.contains(identity)
    }

    fn admin_count(&self) -> usize {
        self.admins.len()
    }
}

// ============================================================================
// ReloadableAdminRegistry
// ============================================================================

/// Administrator set that can be replaced while invocations are running.
#[derive(Debug, Default)]
pub struct ReloadableAdminRegistry {
    current: RwLock<Arc<AdminSet>>,
}

impl ReloadableAdminRegistry {
    /// Start with `admins`.
    #[must_use]
    pub fn new(admins: AdminSet) -> Self {
        Self {
            current: RwLock::new(Arc::new(admins)),
        }
    }

    /// Start with the administrators of `config`.
    #[must_use]
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.admin_set())
    }

    /// Snapshot of the current set.
    #[must_use]
    pub fn snapshot(&self) -> Arc<AdminSet> {
        Arc::clone(&self.current.read())
    }

    /// Replace the set, returning the previous one.
    pub fn replace(&self, admins: AdminSet) -> Arc<AdminSet> {
        let count = admins.len();
        let previous = std::mem::replace(&mut *self.current.write(), Arc::new(admins));
        info!(
            previous = previous.len(),
            current = count,
            "Administrator set replaced"
        );
        previous
    }

    /// Replace the set from an already loaded configuration.
    ///
    /// The configuration is validated first; on error the current set stays.
    pub fn reload_from_config(&self, config: &LedgerConfig) -> Result<usize, ConfigError> {
        config.validate()?;
        let admins = config.admin_set();
        let count = admins.len();
        self.replace(admins);
        Ok(count)
    }

    /// Re-read a TOML config file and replace the set.
    pub fn reload_from_path<P: AsRef<Path>>(&self, path: P) -> Result<usize, ConfigError> {
        let config = LedgerConfig::load(path)?;
        self.reload_from_config(&config)
    }
}

impl AdminRegistry for ReloadableAdminRegistry {
    fn is_admin(&self, identity: &CallerIdentity) -> bool {
        self.current.read().contains(identity)
    }

    fn admin_count(&self) -> usize {
        self.current.read().len()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_static_registry() {
        let registry = StaticAdminRegistry::from_identities(["admin"]);
        assert!(registry.is_admin(&CallerIdentity::from("admin")));
        assert!(!registry.is_admin(&CallerIdentity::from("user")));
        assert_eq!(registry.admin_count(), 1);
    }

    #[test]
    fn test_replace_rotates_admins() {
        let registry = ReloadableAdminRegistry::new(["old-admin"].into_iter().collect());
        let previous = registry.replace(["new-admin"].into_iter().collect());

        assert!(previous.contains(&CallerIdentity::from("old-admin")));
        assert!(!registry.is_admin(&CallerIdentity::from("old-admin")));
        assert!(registry.is_admin(&CallerIdentity::from("new-admin")));
    }

    #[test]
    fn test_invalid_reload_keeps_current_set() {
        let registry = ReloadableAdminRegistry::new(["admin"].into_iter().collect());
        let err = registry
            .reload_from_config(&LedgerConfig::default())
            .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(registry.is_admin(&CallerIdentity::from("admin")));
    }

    #[test]
    fn test_reload_from_path() {
        let registry = ReloadableAdminRegistry::from_config(&LedgerConfig::with_admins(["a"]));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[access]\nadmins = [\"b\", \"c\"]").unwrap();

        assert_eq!(registry.reload_from_path(file.path()).unwrap(), 2);
        assert!(!registry.is_admin(&CallerIdentity::from("a")));
        assert!(registry.is_admin(&CallerIdentity::from("c")));
        assert_eq!(registry.snapshot().len(), 2);
    }
}

//! Tenant enumeration and scoped store access.
//!
//! A tenant is one SQLite database file under the registry's data directory;
//! the file stem is the tenant ID. Enumeration is a sorted directory scan so
//! runs visit tenants in a stable order.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::TenantStore;

/// Identifier of one tenant site in the network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(String);

impl TenantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Directory of tenant databases.
pub struct TenantRegistry {
    root: PathBuf,
}

impl TenantRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of a tenant's database file.
    pub fn db_path(&self, tenant: &TenantId) -> PathBuf {
        self.root.join(format!("{}.db", tenant.as_str()))
    }

    /// Enumerate tenants, sorted by ID.
    pub fn list_tenants(&self) -> Result<Vec<TenantId>, StoreError> {
        let mut tenants = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "db")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                tenants.push(TenantId::from(stem));
            }
        }
        tenants.sort();
        Ok(tenants)
    }

    /// Open an existing tenant's store.
    pub fn open(&self, tenant: &TenantId) -> Result<TenantStore, StoreError> {
        let path = self.db_path(tenant);
        if !path.exists() {
            return Err(StoreError::TenantNotFound(tenant.to_string()));
        }
        TenantStore::open(tenant.clone(), &path)
    }

    /// Create a tenant database (core tables only) and open its store.
    pub fn create(&self, tenant: &TenantId) -> Result<TenantStore, StoreError> {
        std::fs::create_dir_all(&self.root)?;
        TenantStore::open(tenant.clone(), &self.db_path(tenant))
    }

    /// Run a closure against one tenant's store, releasing it on all exit
    /// paths.
    pub fn with_tenant<T, E, F>(&self, tenant: &TenantId, f: F) -> Result<T, E>
    where
        F: FnOnce(&TenantStore) -> Result<T, E>,
        E: From<StoreError>,
    {
        let store = self.open(tenant)?;
        f(&store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn list_tenants_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        let registry = TenantRegistry::new(dir.path());

        registry.create(&TenantId::from("nursing")).unwrap();
        registry.create(&TenantId::from("medicine")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let tenants = registry.list_tenants().unwrap();
        assert_eq!(
            tenants,
            vec![TenantId::from("medicine"), TenantId::from("nursing")]
        );
    }

    #[test]
    fn open_unknown_tenant_fails() {
        let dir = TempDir::new().unwrap();
        let registry = TenantRegistry::new(dir.path());

        let err = registry.open(&TenantId::from("ghost")).unwrap_err();
        assert!(matches!(err, StoreError::TenantNotFound(_)));
    }

    #[test]
    fn with_tenant_scopes_store_access() {
        let dir = TempDir::new().unwrap();
        let registry = TenantRegistry::new(dir.path());
        registry.create(&TenantId::from("medicine")).unwrap();

        let count: u64 = registry
            .with_tenant(&TenantId::from("medicine"), |store| {
                store.count_records("profiles")
            })
            .unwrap();
        assert_eq!(count, 0);
    }
}

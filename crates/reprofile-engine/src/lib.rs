//! Migration engine for legacy profile records.
//!
//! Converts records of the legacy `profiles` schema to the `person` schema:
//!
//! - **Global renames**: record type, guid tokens, taxonomy and shortcode
//!   rewrites, each one bulk SQL statement
//! - **Field mapping**: copy-if-empty rules, repeater sub-field placement
//!   with row materialization, ordered concatenation
//! - **HTML retagging**: heading element swaps with attribute overrides and
//!   label cleanup
//! - **Content synthesis**: body text assembled from legacy fields through
//!   an ordered template list
//! - **Batch windows**: offset-driven conversion with a count-based
//!   completion signal, safe to re-run and resume at any offset
//!
//! Every write is guarded by a target-is-empty check, so the whole engine is
//! idempotent: re-running any pass over converted data changes nothing.

pub mod batch;
mod error;
pub mod mapping;
pub mod profile;
pub mod rename;
pub mod retag;
pub mod synthesis;

pub use batch::{DEFAULT_PAGE_SIZE, Migrator, WindowReport};
pub use error::EngineError;
pub use mapping::{Capabilities, ConcatPart, MAX_REPEATER_ROWS};
pub use profile::{LEGACY_TYPE, PERSON_TYPE, RecordChanges};
pub use rename::RenameReport;

#[cfg(test)]
pub(crate) mod testutil {
    use reprofile_store::{TenantId, TenantStore};
    use tempfile::TempDir;

    /// Open a throwaway tenant store with the field subsystem provisioned.
    pub fn field_store() -> (TempDir, TenantStore) {
        let dir = TempDir::new().unwrap();
        let store = TenantStore::open(TenantId::from("test"), &dir.path().join("test.db")).unwrap();
        store.provision_fields().unwrap();
        (dir, store)
    }

    /// Open a throwaway tenant store without the field subsystem.
    pub fn bare_store() -> (TempDir, TenantStore) {
        let dir = TempDir::new().unwrap();
        let store = TenantStore::open(TenantId::from("bare"), &dir.path().join("bare.db")).unwrap();
        (dir, store)
    }
}

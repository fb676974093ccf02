//! Tenant registry and per-tenant SQLite content store.
//!
//! Each tenant in the network owns one SQLite database file under the data
//! directory. This crate provides the capability surface the migration engine
//! consumes:
//!
//! - **Records**: typed content rows with status, body, guid and an optional
//!   primary-image reference
//! - **Fields**: the optional custom-field subsystem (scalar values plus
//!   JSON-encoded repeater rows), detectable per tenant
//! - **Terms**: taxonomy assignments subject to bulk rename
//! - **Global rename**: single-statement token rewrites across a column

mod error;
mod store;
mod tenants;
mod types;

pub use error::StoreError;
pub use store::TenantStore;
pub use tenants::{TenantId, TenantRegistry};
pub use types::{MatchMode, NewRecord, Record, RecordId, RenameTarget, RepeaterRow, RepeaterValue};

//! Windowed batch conversion.
//!
//! Drivers hold the cursor: each call converts one `(offset, page_size)`
//! window and the response carries the completion flag and the offset to
//! send next. Completion compares the advanced cursor against the current
//! new-type record count, not against an empty window, so records leaving
//! the legacy type mid-run cannot strand the loop.

use reprofile_store::TenantStore;
use serde::Serialize;
use tracing::info;

use crate::error::EngineError;
use crate::mapping::Capabilities;
use crate::profile::{self, LEGACY_TYPE, PERSON_TYPE};
use crate::rename::{self, RenameReport};

/// Window size used when the driver does not pick one.
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Outcome of one conversion window.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WindowReport {
    /// Offset this window started at.
    pub offset: u64,
    /// Records fetched and run through the rule list.
    pub processed: usize,
    /// Records the rule list actually changed.
    pub changed: usize,
    /// New-type record count at response time, the completion denominator.
    pub total: u64,
    /// Whether the cursor has covered every record.
    pub complete: bool,
    /// Offset the driver should send next, absent once complete.
    pub next_offset: Option<u64>,
}

/// The batch conversion surface drivers talk to.
#[derive(Debug, Clone, Copy)]
pub struct Migrator {
    page_size: u64,
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Migrator {
    /// A migrator with a fixed page size, clamped to at least one record per
    /// window.
    pub fn new(page_size: u64) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// The one-shot rename pass, run once per tenant before windowing.
    pub fn quick_convert(&self, store: &TenantStore) -> Result<RenameReport, EngineError> {
        rename::apply_renames(store)
    }

    /// Progress denominator: profile records however they are currently
    /// typed. Taking the max keeps the figure stable across the rename pass.
    pub fn count_profiles(&self, store: &TenantStore) -> Result<u64, EngineError> {
        let legacy = store.count_records(LEGACY_TYPE)?;
        let person = store.count_records(PERSON_TYPE)?;
        Ok(legacy.max(person))
    }

    /// Convert one window of records starting at `offset`.
    pub fn ranged_convert(
        &self,
        store: &TenantStore,
        offset: u64,
    ) -> Result<WindowReport, EngineError> {
        let caps = Capabilities::detect(store)?;
        let window = store.fetch_window(&[LEGACY_TYPE, PERSON_TYPE], offset, self.page_size, true)?;

        let mut changed = 0;
        for record in &window {
            if profile::convert_record(store, &caps, record)?.any() {
                changed += 1;
            }
        }

        let total = store.count_records(PERSON_TYPE)?;
        let complete = offset + self.page_size >= total;
        let report = WindowReport {
            offset,
            processed: window.len(),
            changed,
            total,
            complete,
            next_offset: (!complete).then(|| offset + self.page_size),
        };

        info!(
            tenant = %store.tenant(),
            offset,
            processed = report.processed,
            changed,
            total,
            complete,
            "converted window"
        );
        Ok(report)
    }
}

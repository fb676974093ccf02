//! Per-tenant migration drive.
//!
//! One tenant's migration is the one-shot rename pass followed by chained
//! conversion windows. The window loop is an explicit poll cycle with a
//! single window in flight at a time: each response reports whether the
//! offset comparison found more work, and if so, the offset to request next.

use std::sync::Arc;

use miette::{IntoDiagnostic, Result};
use reprofile_engine::{Migrator, RenameReport, WindowReport};
use reprofile_store::{TenantId, TenantRegistry};
use tokio::sync::mpsc;
use tokio::task;
use tracing::info;

/// Poll state for one tenant's windowed conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConvertState {
    /// No window requested yet.
    Idle,
    /// One window is in flight at this offset.
    AwaitingWindow { offset: u64 },
    /// A response reported completion; no more requests.
    Complete,
}

/// Client-side loop driving one tenant's conversion windows.
///
/// `next_request` hands out the offset to convert; `on_response` feeds the
/// resulting report back in and advances (or completes) the loop. Replaying
/// a window before responding re-issues the same offset, which is safe
/// because conversion of an already-converted window changes nothing.
#[derive(Debug)]
pub struct ConvertLoop {
    state: ConvertState,
    windows: usize,
    processed: usize,
    changed: usize,
}

impl ConvertLoop {
    /// Start a loop that requests its first window at offset 0.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Start a loop that requests its first window at the given offset.
    pub fn starting_at(offset: u64) -> Self {
        Self {
            state: match offset {
                0 => ConvertState::Idle,
                n => ConvertState::AwaitingWindow { offset: n },
            },
            windows: 0,
            processed: 0,
            changed: 0,
        }
    }

    /// The offset of the next window to convert, or `None` once complete.
    pub fn next_request(&mut self) -> Option<u64> {
        match self.state {
            ConvertState::Idle => {
                self.state = ConvertState::AwaitingWindow { offset: 0 };
                Some(0)
            }
            ConvertState::AwaitingWindow { offset } => Some(offset),
            ConvertState::Complete => None,
        }
    }

    /// Record a window's outcome and advance to the next offset or complete.
    pub fn on_response(&mut self, report: &WindowReport) {
        self.windows += 1;
        self.processed += report.processed;
        self.changed += report.changed;
        self.state = match report.next_offset {
            Some(offset) => ConvertState::AwaitingWindow { offset },
            None => ConvertState::Complete,
        };
    }

    pub fn is_complete(&self) -> bool {
        self.state == ConvertState::Complete
    }

    pub fn windows(&self) -> usize {
        self.windows
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn changed(&self) -> usize {
        self.changed
    }
}

impl Default for ConvertLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one tenant's full drive.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TenantReport {
    pub tenant: TenantId,
    /// Profile count used as the completion denominator.
    pub profiles: u64,
    pub renames: RenameReport,
    pub windows: usize,
    pub processed: usize,
    pub changed: usize,
}

/// A window-completion event sent to the progress aggregator.
#[derive(Debug, Clone)]
pub struct Progress {
    pub tenant: TenantId,
    /// Records visited so far (final window offset plus its processed count).
    pub covered: u64,
    /// Completion denominator for this tenant.
    pub total: u64,
}

/// Run a blocking store operation off the async runtime's worker threads.
async fn blocking<T, E, F>(f: F) -> Result<T>
where
    F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    task::spawn_blocking(f).await.into_diagnostic()?.into_diagnostic()
}

/// Drive one tenant to completion: rename pass, then chained windows.
///
/// Window completions are reported on `progress`; the per-tenant totals come
/// back in the returned report. Any store fault aborts this tenant's drive
/// and surfaces as the error.
pub async fn drive_tenant(
    registry: Arc<TenantRegistry>,
    tenant: TenantId,
    migrator: Migrator,
    progress: mpsc::Sender<Progress>,
) -> Result<TenantReport> {
    let store = {
        let registry = Arc::clone(&registry);
        let tenant = tenant.clone();
        Arc::new(blocking(move || registry.open(&tenant)).await?)
    };

    let renames = {
        let store = Arc::clone(&store);
        blocking(move || migrator.quick_convert(&store)).await?
    };

    let profiles = {
        let store = Arc::clone(&store);
        blocking(move || migrator.count_profiles(&store)).await?
    };

    info!(
        tenant = %tenant,
        profiles,
        renamed = renames.total(),
        "tenant drive started"
    );

    let mut convert = ConvertLoop::new();
    while let Some(offset) = convert.next_request() {
        let report = {
            let store = Arc::clone(&store);
            blocking(move || migrator.ranged_convert(&store, offset)).await?
        };

        let _ = progress
            .send(Progress {
                tenant: tenant.clone(),
                covered: report.offset + report.processed as u64,
                total: report.total,
            })
            .await;

        convert.on_response(&report);
    }

    info!(
        tenant = %tenant,
        windows = convert.windows(),
        changed = convert.changed(),
        "tenant drive finished"
    );

    Ok(TenantReport {
        tenant,
        profiles,
        renames,
        windows: convert.windows(),
        processed: convert.processed(),
        changed: convert.changed(),
    })
}

// ====== Tests ======

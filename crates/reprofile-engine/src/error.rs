use thiserror::Error;

/// Errors surfaced by the migration engine.
///
/// Degraded situations (missing field subsystem, malformed repeater shapes,
/// the repeater sanity cap) are not errors; operations no-op on them. Only
/// store faults propagate, aborting the current batch call.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] reprofile_store::StoreError),
}

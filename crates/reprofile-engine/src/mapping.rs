//! Field mapping rules.
//!
//! All rules share the same discipline: the target-is-empty check comes
//! first, the source must be non-empty, and nothing already populated is ever
//! overwritten. A field is empty when it is absent or holds the empty string.

use reprofile_store::{RecordId, RepeaterRow, RepeaterValue, TenantStore};
use tracing::debug;

use crate::error::EngineError;

/// Most rows a repeater materialization will ever create or address.
pub const MAX_REPEATER_ROWS: usize = 10;

/// Per-tenant feature probes, detected once per batch call.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    /// Whether the custom-field subsystem is present. Without it every
    /// field-mapping and synthesis rule is a silent no-op.
    pub custom_fields: bool,
}

impl Capabilities {
    pub fn detect(store: &TenantStore) -> Result<Self, EngineError> {
        Ok(Self {
            custom_fields: store.has_field_support()?,
        })
    }
}

/// One source of a concatenation rule. Affixes contribute only when the
/// source field is non-empty.
#[derive(Debug, Clone, Copy)]
pub struct ConcatPart<'a> {
    pub field: &'a str,
    pub prefix: Option<&'a str>,
    pub suffix: Option<&'a str>,
}

impl<'a> ConcatPart<'a> {
    pub fn bare(field: &'a str) -> Self {
        Self {
            field,
            prefix: None,
            suffix: None,
        }
    }

    pub fn prefix(mut self, prefix: &'a str) -> Self {
        self.prefix = Some(prefix);
        self
    }

    pub fn suffix(mut self, suffix: &'a str) -> Self {
        self.suffix = Some(suffix);
        self
    }
}

pub(crate) fn field_is_empty(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

/// Read a field, treating the empty string as absent.
pub(crate) fn read_nonempty(
    store: &TenantStore,
    id: RecordId,
    field: &str,
) -> Result<Option<String>, EngineError> {
    Ok(store.read_field(id, field)?.filter(|v| !v.is_empty()))
}

/// Copy `old_field` into `new_field` when the target is empty and the source
/// is not. Returns whether a write happened.
pub fn copy_field(
    store: &TenantStore,
    caps: &Capabilities,
    id: RecordId,
    old_field: &str,
    new_field: &str,
) -> Result<bool, EngineError> {
    if !caps.custom_fields {
        return Ok(false);
    }
    if !field_is_empty(&store.read_field(id, new_field)?) {
        return Ok(false);
    }
    let Some(value) = read_nonempty(store, id, old_field)? else {
        return Ok(false);
    };

    store.write_field(id, new_field, &value)?;
    debug!(record = id, from = old_field, to = new_field, "copied field");
    Ok(true)
}

/// Copy `old_field` into one sub-field of a repeater row.
///
/// `row_index` is 1-based. Missing rows are materialized by appending empty
/// rows, never past [`MAX_REPEATER_ROWS`]; an index at or beyond the cap
/// silently never gets its row and the copy is skipped. A repeater field
/// holding a non-row value is left alone.
pub fn copy_to_repeater_row(
    store: &TenantStore,
    caps: &Capabilities,
    id: RecordId,
    old_field: &str,
    repeater_field: &str,
    row_index: usize,
    sub_field: &str,
) -> Result<bool, EngineError> {
    if !caps.custom_fields || row_index == 0 {
        return Ok(false);
    }
    let mut rows = match store.read_repeater(id, repeater_field)? {
        RepeaterValue::Rows(rows) => rows,
        RepeaterValue::Absent => Vec::new(),
        RepeaterValue::Malformed => return Ok(false),
    };

    let mut appended = 0;
    while row_index > rows.len() && row_index < MAX_REPEATER_ROWS && appended < MAX_REPEATER_ROWS {
        let row = RepeaterRow::from([(sub_field.to_string(), String::new())]);
        store.append_repeater_row(id, repeater_field, row.clone())?;
        rows.push(row);
        appended += 1;
    }
    if row_index > rows.len() {
        return Ok(false);
    }

    let cell = rows[row_index - 1].get(sub_field);
    if cell.is_some_and(|v| !v.is_empty()) {
        return Ok(false);
    }
    let Some(value) = read_nonempty(store, id, old_field)? else {
        return Ok(false);
    };

    rows[row_index - 1].insert(sub_field.to_string(), value);
    store.write_repeater(id, repeater_field, &rows)?;
    debug!(
        record = id,
        from = old_field,
        to = repeater_field,
        row = row_index,
        sub = sub_field,
        "copied field into repeater row"
    );
    Ok(true)
}

/// Concatenate the parts into `new_field` when the target is empty. Parts
/// contribute in order; an empty source contributes nothing, affixes
/// included. Nothing is written when every source is empty.
pub fn concat_fields(
    store: &TenantStore,
    caps: &Capabilities,
    id: RecordId,
    parts: &[ConcatPart<'_>],
    new_field: &str,
) -> Result<bool, EngineError> {
    if !caps.custom_fields {
        return Ok(false);
    }
    if !field_is_empty(&store.read_field(id, new_field)?) {
        return Ok(false);
    }

    let combined = combine(parts, |field| read_nonempty(store, id, field))?;
    if combined.is_empty() {
        return Ok(false);
    }

    store.write_field(id, new_field, &combined)?;
    debug!(record = id, to = new_field, value = %combined, "concatenated fields");
    Ok(true)
}

/// Fold the parts over a field lookup, in input order.
pub(crate) fn combine<'a, E>(
    parts: &[ConcatPart<'a>],
    mut value_of: impl FnMut(&'a str) -> Result<Option<String>, E>,
) -> Result<String, E> {
    let mut combined = String::new();
    for part in parts {
        let Some(value) = value_of(part.field)? else {
            continue;
        };
        if let Some(prefix) = part.prefix {
            combined.push_str(prefix);
        }
        combined.push_str(&value);
        if let Some(suffix) = part.suffix {
            combined.push_str(suffix);
        }
    }
    Ok(combined)
}

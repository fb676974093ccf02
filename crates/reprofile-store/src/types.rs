//! Row types and parameter enums for the content store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Stable record identifier, the deterministic ordering key for windows.
pub type RecordId = i64;

/// One row of a repeater field, mapping sub-field name to scalar value.
pub type RepeaterRow = BTreeMap<String, String>;

/// A content record row from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub record_type: String,
    pub status: String,
    pub title: String,
    pub body: String,
    pub guid: String,
    pub primary_image: Option<String>,
    pub created_at: String,
}

/// Insert parameters for a new record.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub record_type: String,
    pub status: String,
    pub title: String,
    pub body: String,
    pub guid: String,
    pub primary_image: Option<String>,
}

impl NewRecord {
    pub fn new(record_type: &str, title: &str) -> Self {
        Self {
            record_type: record_type.to_string(),
            status: "published".to_string(),
            title: title.to_string(),
            body: String::new(),
            guid: String::new(),
            primary_image: None,
        }
    }
}

/// Result of reading a repeater field.
///
/// A stored value that is not a JSON array of string-valued rows is reported
/// as `Malformed` rather than an error; callers treat it as untouchable.
#[derive(Debug, Clone, PartialEq)]
pub enum RepeaterValue {
    Absent,
    Rows(Vec<RepeaterRow>),
    Malformed,
}

/// How a rename token matches the stored column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Exact,
    Prefix,
    Suffix,
    Substring,
}

impl MatchMode {
    /// LIKE pattern selecting rows the rename applies to. Wildcards in the
    /// token are escaped so it always matches literally.
    pub(crate) fn like_pattern(&self, token: &str) -> String {
        let literal = token
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        match self {
            MatchMode::Exact => literal,
            MatchMode::Prefix => format!("{literal}%"),
            MatchMode::Suffix => format!("%{literal}"),
            MatchMode::Substring => format!("%{literal}%"),
        }
    }
}

/// Column a global rename operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameTarget {
    RecordType,
    Guid,
    Taxonomy,
    Body,
}

impl RenameTarget {
    pub(crate) fn column(&self) -> (&'static str, &'static str) {
        match self {
            RenameTarget::RecordType => ("records", "record_type"),
            RenameTarget::Guid => ("records", "guid"),
            RenameTarget::Taxonomy => ("terms", "taxonomy"),
            RenameTarget::Body => ("records", "body"),
        }
    }
}

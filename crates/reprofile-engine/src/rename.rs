//! Global token renames.
//!
//! The legacy-to-new token tables, each applied as one bulk statement through
//! the store's rename capability. Record types match exactly; guid tokens are
//! rewritten in both their query-parameter and path-segment forms; shortcodes
//! are rewritten in both the bare `[token]` and argument `[token ` forms so a
//! longer token sharing the prefix is never touched. Every rewrite matches
//! nothing on a second run.

use reprofile_store::{MatchMode, RenameTarget, TenantStore};
use serde::Serialize;
use tracing::info;

use crate::error::EngineError;
use crate::profile::{LEGACY_TYPE, PERSON_TYPE};

const RECORD_TYPES: &[(&str, &str)] = &[(LEGACY_TYPE, PERSON_TYPE)];

const TAXONOMIES: &[(&str, &str)] = &[("profiles_category", "people_group")];

const SHORTCODES: &[(&str, &str)] = &[("accordion", "ucf_college_accordion")];

/// Rows matched per rename category in one pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RenameReport {
    pub record_types: usize,
    pub guids: usize,
    pub taxonomies: usize,
    pub shortcodes: usize,
}

impl RenameReport {
    pub fn total(&self) -> usize {
        self.record_types + self.guids + self.taxonomies + self.shortcodes
    }
}

/// Run every rename table against one tenant.
pub fn apply_renames(store: &TenantStore) -> Result<RenameReport, EngineError> {
    let mut report = RenameReport::default();

    for (old, new) in RECORD_TYPES {
        report.record_types +=
            store.global_rename(RenameTarget::RecordType, old, new, MatchMode::Exact)?;
        report.guids += store.global_rename(
            RenameTarget::Guid,
            &format!("post_type={old}"),
            &format!("post_type={new}"),
            MatchMode::Substring,
        )?;
        report.guids += store.global_rename(
            RenameTarget::Guid,
            &format!("/{old}/"),
            &format!("/{new}/"),
            MatchMode::Substring,
        )?;
    }

    for (old, new) in TAXONOMIES {
        report.taxonomies +=
            store.global_rename(RenameTarget::Taxonomy, old, new, MatchMode::Substring)?;
    }

    for (old, new) in SHORTCODES {
        report.shortcodes += store.global_rename(
            RenameTarget::Body,
            &format!("[{old}]"),
            &format!("[{new}]"),
            MatchMode::Substring,
        )?;
        report.shortcodes += store.global_rename(
            RenameTarget::Body,
            &format!("[{old} "),
            &format!("[{new} "),
            MatchMode::Substring,
        )?;
    }

    info!(
        tenant = %store.tenant(),
        record_types = report.record_types,
        guids = report.guids,
        taxonomies = report.taxonomies,
        shortcodes = report.shortcodes,
        "applied global renames"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::field_store;
    use pretty_assertions::assert_eq;
    use reprofile_store::NewRecord;

    #[test]
    fn renames_record_type_and_guid_tokens() {
        let (_dir, store) = field_store();
        let mut query_style = NewRecord::new("profiles", "A");
        query_style.guid = "http://example.test/?post_type=profiles&p=7".to_string();
        let a = store.insert_record(&query_style).unwrap();
        let mut path_style = NewRecord::new("profiles", "B");
        path_style.guid = "http://example.test/profiles/b-doe/".to_string();
        let b = store.insert_record(&path_style).unwrap();

        let report = apply_renames(&store).unwrap();
        assert_eq!(report.record_types, 2);
        assert_eq!(report.guids, 2);

        assert_eq!(store.count_records("profiles").unwrap(), 0);
        assert_eq!(store.count_records("person").unwrap(), 2);
        assert_eq!(
            store.get_record(a).unwrap().unwrap().guid,
            "http://example.test/?post_type=person&p=7"
        );
        assert_eq!(
            store.get_record(b).unwrap().unwrap().guid,
            "http://example.test/person/b-doe/"
        );
    }

    #[test]
    fn renames_shortcodes_in_both_forms_only() {
        let (_dir, store) = field_store();
        let mut new = NewRecord::new("page", "Shortcodes");
        new.body = "[accordion] then [accordion title=\"FAQ\"] but not [accordion_widget]"
            .to_string();
        let id = store.insert_record(&new).unwrap();

        let report = apply_renames(&store).unwrap();
        assert_eq!(report.shortcodes, 2);

        assert_eq!(
            store.get_record(id).unwrap().unwrap().body,
            "[ucf_college_accordion] then [ucf_college_accordion title=\"FAQ\"] but not [accordion_widget]"
        );
    }

    #[test]
    fn renames_taxonomy_rows() {
        let (_dir, store) = field_store();
        store.insert_term("profiles_category", "Faculty").unwrap();
        store.insert_term("profiles_category", "Residents").unwrap();
        store.insert_term("department", "Surgery").unwrap();

        let report = apply_renames(&store).unwrap();
        assert_eq!(report.taxonomies, 2);
        assert_eq!(store.count_terms("profiles_category").unwrap(), 0);
        assert_eq!(store.count_terms("people_group").unwrap(), 2);
        assert_eq!(store.count_terms("department").unwrap(), 1);
    }

    #[test]
    fn second_pass_matches_nothing() {
        let (_dir, store) = field_store();
        let mut new = NewRecord::new("profiles", "A");
        new.guid = "http://example.test/?post_type=profiles&p=7".to_string();
        new.body = "[accordion]".to_string();
        store.insert_record(&new).unwrap();
        store.insert_term("profiles_category", "Faculty").unwrap();

        let first = apply_renames(&store).unwrap();
        assert!(first.total() > 0);

        let second = apply_renames(&store).unwrap();
        assert_eq!(second.total(), 0);
    }
}

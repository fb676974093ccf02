//! Property-based tests for the migration engine's laws.

use proptest::prelude::*;
use reprofile_engine::mapping::{self, Capabilities, ConcatPart};
use reprofile_engine::retag::{retag_fragment, strip_label_colons};
use reprofile_engine::{LEGACY_TYPE, Migrator, rename};
use reprofile_store::{NewRecord, TenantId, TenantStore};
use tempfile::TempDir;

fn field_store() -> (TempDir, TenantStore) {
    let dir = TempDir::new().unwrap();
    let store = TenantStore::open(TenantId::from("prop"), &dir.path().join("prop.db")).unwrap();
    store.provision_fields().unwrap();
    (dir, store)
}

fn caps() -> Capabilities {
    Capabilities {
        custom_fields: true,
    }
}

// Strategy for generating field values, empties included
fn field_value() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ]{0,12}".prop_map(|s| s.to_string())
}

// Strategy for generating optional affixes
fn affix() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[A-Za-z,;: ]{1,3}".prop_map(|s| s.to_string()))
}

proptest! {
    // Concatenation contributes parts in input order, affixes suppressed
    // alongside their empty sources
    #[test]
    fn concat_matches_an_ordered_fold(
        parts in prop::collection::vec((field_value(), affix(), affix()), 1..5),
    ) {
        let (_dir, store) = field_store();
        let id = store.insert_record(&NewRecord::new(LEGACY_TYPE, "P")).unwrap();

        let field_names: Vec<String> = (0..parts.len()).map(|i| format!("src_{i}")).collect();
        let mut expected = String::new();
        for (i, (value, prefix, suffix)) in parts.iter().enumerate() {
            store.write_field(id, &field_names[i], value).unwrap();
            if !value.is_empty() {
                if let Some(prefix) = prefix {
                    expected.push_str(prefix);
                }
                expected.push_str(value);
                if let Some(suffix) = suffix {
                    expected.push_str(suffix);
                }
            }
        }

        let concat_parts: Vec<ConcatPart<'_>> = parts
            .iter()
            .enumerate()
            .map(|(i, (_, prefix, suffix))| {
                let mut part = ConcatPart::bare(&field_names[i]);
                if let Some(prefix) = prefix {
                    part = part.prefix(prefix);
                }
                if let Some(suffix) = suffix {
                    part = part.suffix(suffix);
                }
                part
            })
            .collect();

        let wrote = mapping::concat_fields(&store, &caps(), id, &concat_parts, "combined").unwrap();
        prop_assert_eq!(wrote, !expected.is_empty());
        let stored = store.read_field(id, "combined").unwrap();
        if expected.is_empty() {
            prop_assert_eq!(stored, None);
        } else {
            prop_assert_eq!(stored, Some(expected));
        }
    }

    // A populated target survives any copy attempt
    #[test]
    fn populated_targets_are_never_overwritten(
        source in field_value(),
        target in "[A-Za-z0-9]{1,12}",
    ) {
        let (_dir, store) = field_store();
        let id = store.insert_record(&NewRecord::new(LEGACY_TYPE, "P")).unwrap();
        store.write_field(id, "old_field", &source).unwrap();
        store.write_field(id, "new_field", &target).unwrap();

        let wrote = mapping::copy_field(&store, &caps(), id, "old_field", "new_field").unwrap();
        prop_assert!(!wrote);
        prop_assert_eq!(store.read_field(id, "new_field").unwrap(), Some(target));
    }

    // Retagging rewrites the named tag and nothing else
    #[test]
    fn retag_changes_only_the_named_tag(text in "[A-Za-z0-9 ]{0,20}") {
        let fragment = format!("<h2>{text}</h2><h3>{text}</h3>");
        let out = retag_fragment(&fragment, "h2", "h4", &[("class", "heading-underline")]);
        prop_assert_eq!(
            out,
            format!("<h4 class=\"heading-underline\">{text}</h4><h3>{text}</h3>")
        );
    }

    // Label cleanup strips exactly one trailing colon however many follow
    #[test]
    fn label_cleanup_strips_at_most_one_colon(colons in 0usize..4) {
        let html = format!("Specialties{}", ":".repeat(colons));
        let out = strip_label_colons(&html);
        let expected = if colons == 0 {
            "Specialties".to_string()
        } else {
            format!("Specialties{}", ":".repeat(colons - 1))
        };
        prop_assert_eq!(out, expected);
    }

    // Bodies with no shortcode tokens pass the rename pass untouched
    #[test]
    fn rename_leaves_plain_bodies_alone(body in "[A-Za-z0-9 .,]{0,40}") {
        let (_dir, store) = field_store();
        let mut new = NewRecord::new("page", "Plain");
        new.body = body.clone();
        let id = store.insert_record(&new).unwrap();

        rename::apply_renames(&store).unwrap();
        prop_assert_eq!(store.get_record(id).unwrap().unwrap().body, body);
    }

    // Chained windows visit every record exactly once and finish on the
    // count comparison
    #[test]
    fn windows_tile_the_record_count(total in 0u64..30, page in 1u64..8) {
        let (_dir, store) = field_store();
        for i in 0..total {
            store
                .insert_record(&NewRecord::new("person", &format!("Person {i}")))
                .unwrap();
        }
        let migrator = Migrator::new(page);

        let mut offset = 0;
        let mut calls = 0u64;
        let mut processed = 0usize;
        loop {
            let report = migrator.ranged_convert(&store, offset).unwrap();
            calls += 1;
            processed += report.processed;
            match report.next_offset {
                Some(next) => {
                    prop_assert!(!report.complete);
                    offset = next;
                }
                None => {
                    prop_assert!(report.complete);
                    break;
                }
            }
        }

        prop_assert_eq!(processed as u64, total);
        prop_assert_eq!(calls, total.div_ceil(page).max(1));
    }

    // A second full run over converted data changes nothing
    #[test]
    fn conversion_is_idempotent(
        position in field_value(),
        email in field_value(),
        phone in field_value(),
        last_name in field_value(),
        first_name in field_value(),
        biography in field_value(),
    ) {
        let (_dir, store) = field_store();
        let id = store.insert_record(&NewRecord::new(LEGACY_TYPE, "P")).unwrap();
        store.write_field(id, "position", &position).unwrap();
        store.write_field(id, "email", &email).unwrap();
        store.write_field(id, "phone", &phone).unwrap();
        store.write_field(id, "last_name", &last_name).unwrap();
        store.write_field(id, "first_name", &first_name).unwrap();
        store.write_field(id, "biography", &biography).unwrap();

        let migrator = Migrator::new(5);
        migrator.quick_convert(&store).unwrap();
        let first = migrator.ranged_convert(&store, 0).unwrap();
        prop_assert!(first.complete);

        migrator.quick_convert(&store).unwrap();
        let second = migrator.ranged_convert(&store, 0).unwrap();
        prop_assert_eq!(second.changed, 0);
    }
}

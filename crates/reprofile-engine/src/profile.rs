//! The profiles-to-person conversion rules.
//!
//! One record type pair, one fixed rule list. Rules run in order; each is
//! individually guarded, so a record in any partial state converges to the
//! converted shape and a fully converted record passes through untouched.

use reprofile_store::{Record, TenantStore};
use tracing::debug;

use crate::error::EngineError;
use crate::mapping::{self, Capabilities, ConcatPart, read_nonempty};
use crate::retag;
use crate::synthesis;

/// Legacy record type being retired.
pub const LEGACY_TYPE: &str = "profiles";

/// Record type replacing it.
pub const PERSON_TYPE: &str = "person";

/// Attribute overrides applied when legacy headings are retagged.
const HEADING_OVERRIDES: &[(&str, &str)] = &[("class", "heading-underline")];

/// What one conversion pass changed on a record.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordChanges {
    pub fields: usize,
    pub body: bool,
    pub image: bool,
}

impl RecordChanges {
    pub fn any(&self) -> bool {
        self.fields > 0 || self.body || self.image
    }
}

/// Run the full rule list against one record.
pub fn convert_record(
    store: &TenantStore,
    caps: &Capabilities,
    record: &Record,
) -> Result<RecordChanges, EngineError> {
    let mut changes = RecordChanges::default();
    let id = record.id;

    if mapping::copy_field(store, caps, id, "position", "person_jobtitle")? {
        changes.fields += 1;
    }
    if mapping::copy_to_repeater_row(store, caps, id, "phone", "person_phone_numbers", 1, "number")? {
        changes.fields += 1;
    }
    if mapping::copy_field(store, caps, id, "email", "person_email")? {
        changes.fields += 1;
    }
    if mapping::copy_field(store, caps, id, "office_address", "person_room")? {
        changes.fields += 1;
    }
    if retag::retag_field(
        store,
        caps,
        id,
        "education",
        "person_educationspecialties",
        "h2",
        "h4",
        HEADING_OVERRIDES,
    )? {
        changes.fields += 1;
    }

    let name_parts = [
        ConcatPart::bare("last_name").suffix(", "),
        ConcatPart::bare("first_name").suffix(" "),
        ConcatPart::bare("middle_initial"),
    ];
    if mapping::concat_fields(store, caps, id, &name_parts, "person_orderby_name")? {
        changes.fields += 1;
    }
    // Affiliate/volunteer records carry their name in avf_* fields; the
    // target-is-empty guard makes this a fallback to the rule above
    let avf_name_parts = [
        ConcatPart::bare("avf_last_name_1").suffix(", "),
        ConcatPart::bare("avf_first_name_1").suffix(" "),
        ConcatPart::bare("avf_middle_initial_1"),
    ];
    if mapping::concat_fields(store, caps, id, &avf_name_parts, "person_orderby_name")? {
        changes.fields += 1;
    }

    changes.body = synthesis::synthesize_body(store, caps, record)?;
    changes.image = promote_primary_image(store, caps, record)?;

    if changes.any() {
        debug!(
            record = id,
            title = %record.title,
            fields = changes.fields,
            body = changes.body,
            image = changes.image,
            "converted record"
        );
    }
    Ok(changes)
}

/// Assign the legacy photo reference as the primary image when none is set.
fn promote_primary_image(
    store: &TenantStore,
    caps: &Capabilities,
    record: &Record,
) -> Result<bool, EngineError> {
    if !caps.custom_fields {
        return Ok(false);
    }
    if store.has_primary_image(record.id)? {
        return Ok(false);
    }
    let Some(media_ref) = read_nonempty(store, record.id, "photo")? else {
        return Ok(false);
    };

    store.set_primary_image(record.id, &media_ref)?;
    debug!(record = record.id, media = %media_ref, "promoted photo to primary image");
    Ok(true)
}

//! Body content synthesis from legacy fields.
//!
//! Records arriving with an empty body get one generated from whatever
//! legacy content exists, through an ordered template list: a verbatim
//! biography wins over the affiliate/volunteer block, which wins over the
//! resident block. One template per record; a template with no source
//! content does not fire and never writes a placeholder.

use reprofile_store::{Record, RecordId, TenantStore};
use tracing::debug;

use crate::error::EngineError;
use crate::mapping::{Capabilities, read_nonempty};

/// Appointment level codes and their display titles. Unknown codes pass
/// through verbatim as the display text.
pub const APPOINTMENT_LEVELS: &[(&str, &str)] = &[
    ("INST", "Instructor"),
    ("ASST", "Assistant Professor"),
    ("ASSC", "Associate Professor"),
    ("PROF", "Professor"),
];

/// Expand an appointment level code to its display title.
pub fn appointment_title(code: &str) -> Option<&'static str> {
    APPOINTMENT_LEVELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, title)| *title)
}

/// Body templates in priority order; the first to produce content wins.
const TEMPLATES: &[fn(&TenantStore, RecordId) -> Result<Option<String>, EngineError>] =
    &[biography_body, affiliate_volunteer_body, resident_body];

/// Synthesize a body for a record that has none. Returns whether a body was
/// written.
pub fn synthesize_body(
    store: &TenantStore,
    caps: &Capabilities,
    record: &Record,
) -> Result<bool, EngineError> {
    if !caps.custom_fields {
        return Ok(false);
    }
    if !record.body.is_empty() {
        return Ok(false);
    }

    for template in TEMPLATES {
        if let Some(body) = template(store, record.id)? {
            store.set_body(record.id, &body)?;
            debug!(record = record.id, title = %record.title, "synthesized body");
            return Ok(true);
        }
    }
    Ok(false)
}

fn section(heading: &str, text: &str) -> String {
    format!("<h4 class=\"heading-underline\">{heading}</h4>\n<p>{text}</p>")
}

/// A non-empty biography becomes the body verbatim.
fn biography_body(store: &TenantStore, id: RecordId) -> Result<Option<String>, EngineError> {
    read_nonempty(store, id, "biography")
}

/// Fixed block for affiliate and volunteer faculty: specialization, degree
/// and appointment level, each section present only when sourced.
fn affiliate_volunteer_body(
    store: &TenantStore,
    id: RecordId,
) -> Result<Option<String>, EngineError> {
    let specialization = read_nonempty(store, id, "avf_specialization_1")?;
    let degree_type = read_nonempty(store, id, "avf_degree_type_1")?;
    let degree_description = read_nonempty(store, id, "avf_degree_description_1")?;
    let appointment = read_nonempty(store, id, "avf_appointment_level_1")?;

    let mut sections = Vec::new();
    if let Some(specialization) = specialization {
        sections.push(section("Specialization", &specialization));
    }
    let degree = match (degree_type, degree_description) {
        (Some(kind), Some(description)) => Some(format!("{kind}, {description}")),
        (Some(kind), None) => Some(kind),
        (None, Some(description)) => Some(description),
        (None, None) => None,
    };
    if let Some(degree) = degree {
        sections.push(section("Degree", &degree));
    }
    if let Some(code) = appointment {
        let display = appointment_title(&code).unwrap_or(&code);
        sections.push(format!(
            "<h4 class=\"heading-underline\">Appointment Level</h4>\n<p data-appointment-level=\"{code}\">{display}</p>"
        ));
    }

    if sections.is_empty() {
        return Ok(None);
    }
    Ok(Some(sections.join("\n")))
}

/// Fixed block for residents: medical school, career interests, fun fact.
fn resident_body(store: &TenantStore, id: RecordId) -> Result<Option<String>, EngineError> {
    let sources = [
        ("Medical School", "medical_school"),
        ("Career Interests", "career_interest"),
        ("Fun Fact", "fun_fact"),
    ];

    let mut sections = Vec::new();
    for (heading, field) in sources {
        if let Some(text) = read_nonempty(store, id, field)? {
            sections.push(section(heading, &text));
        }
    }

    if sections.is_empty() {
        return Ok(None);
    }
    Ok(Some(sections.join("\n")))
}

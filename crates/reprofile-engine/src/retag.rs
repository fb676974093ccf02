//! HTML fragment retagging.
//!
//! Rewrites every occurrence of one element tag as another, preserving
//! children in place and carrying attributes over with overrides applied.
//! Fragments are rewritten with targeted substitutions over the open and
//! close tags; heading elements cannot nest, so pairing is positional.

use regex::Regex;
use reprofile_store::{RecordId, TenantStore};
use tracing::debug;

use crate::error::EngineError;
use crate::mapping::{Capabilities, field_is_empty, read_nonempty};

/// Label words that pick up a stray trailing colon in legacy content. The
/// colon is stripped once per label, first occurrence only.
const CLEANUP_LABELS: &[&str] = &["Specialties", "Research Interests"];

/// Copy `old_field` into `new_field` with every `from_tag` element rewritten
/// as `to_tag` and the label cleanup applied. The target-is-empty guard
/// matches the other mapping rules.
#[allow(clippy::too_many_arguments)]
pub fn retag_field(
    store: &TenantStore,
    caps: &Capabilities,
    id: RecordId,
    old_field: &str,
    new_field: &str,
    from_tag: &str,
    to_tag: &str,
    overrides: &[(&str, &str)],
) -> Result<bool, EngineError> {
    if !caps.custom_fields {
        return Ok(false);
    }
    if !field_is_empty(&store.read_field(id, new_field)?) {
        return Ok(false);
    }
    let Some(html) = read_nonempty(store, id, old_field)? else {
        return Ok(false);
    };

    let retagged = retag_fragment(&html, from_tag, to_tag, overrides);
    let cleaned = strip_label_colons(&retagged);
    store.write_field(id, new_field, &cleaned)?;
    debug!(record = id, from = old_field, to = new_field, "retagged field");
    Ok(true)
}

/// Rewrite every `from_tag` element in the fragment as `to_tag`.
///
/// Existing attributes keep their order; overrides replace same-named
/// attributes in place and novel ones are appended. Tag matching is
/// case-insensitive, output tags are the literal `to_tag`.
pub fn retag_fragment(
    fragment: &str,
    from_tag: &str,
    to_tag: &str,
    overrides: &[(&str, &str)],
) -> String {
    let tag = regex::escape(from_tag);
    let open = Regex::new(&format!(r"(?i)<{tag}(\s[^>]*)?>")).unwrap();
    let close = Regex::new(&format!(r"(?i)</{tag}\s*>")).unwrap();

    let opened = open.replace_all(fragment, |caps: &regex::Captures| {
        let attrs = merge_attrs(caps.get(1).map_or("", |m| m.as_str()), overrides);
        if attrs.is_empty() {
            format!("<{to_tag}>")
        } else {
            format!("<{to_tag} {attrs}>")
        }
    });

    close.replace_all(&opened, format!("</{to_tag}>")).to_string()
}

/// Strip one trailing colon after each known label word, at most once per
/// label.
pub fn strip_label_colons(html: &str) -> String {
    let mut out = html.to_string();
    for label in CLEANUP_LABELS {
        out = out.replacen(&format!("{label}:"), label, 1);
    }
    out
}

/// Parse an attribute string, apply overrides and render it back.
fn merge_attrs(existing: &str, overrides: &[(&str, &str)]) -> String {
    let attr = Regex::new(
        r#"([a-zA-Z_:][-\w:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#,
    )
    .unwrap();

    // Bare attributes carry no value and are rendered name-only
    let mut attrs: Vec<(String, Option<String>)> = attr
        .captures_iter(existing)
        .map(|caps| {
            let name = caps[1].to_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string());
            (name, value)
        })
        .collect();

    for (name, value) in overrides {
        match attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = Some(value.to_string()),
            None => attrs.push((name.to_string(), Some(value.to_string()))),
        }
    }

    attrs
        .iter()
        .map(|(name, value)| match value {
            Some(value) => format!(r#"{name}="{value}""#),
            None => name.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

use crate::error::ResolveError;
use crate::value::{Environment, Value};
use miette::{NamedSource, SourceSpan};

/// Placeholder literal that resolves to the name of the key referencing it.
pub const KEY_PLACEHOLDER: &str = "$_key";
/// Placeholder literal that resolves to the name of the open section at the
/// point of reference.
pub const SECTION_PLACEHOLDER: &str = "$_section";

/// Returns true when a raw value is a link expression: it starts with `$`
/// and is not one of the two reserved placeholder literals.
#[must_use]
pub fn is_link(raw: &str) -> bool {
    raw.starts_with('$') && raw != KEY_PLACEHOLDER && raw != SECTION_PLACEHOLDER
}

/// Resolves a dotted link path against the environment as built so far.
///
/// The walk starts at the environment root. An all-digit segment indexes the
/// current reference when it is a sequence; every other segment (including
/// digits over a mapping) is a key lookup. Any missing segment, out-of-range
/// index, or traversal through a scalar fails with [`ResolveError::LinkNotFound`].
///
/// The returned value is an owned copy of the target with the two placeholder
/// passes applied: first `$_key` (replaced by the invoking key), then
/// `$_section` (replaced by the open section name). Each pass replaces at
/// most one matching element or value, so a shared template container
/// resolves per-reference without ever mutating the stored original.
pub(crate) fn resolve_link(
    env: &Environment,
    link: &str,
    key: Option<&str>,
    section: Option<&str>,
    doc_name: &str,
    source_text: &str,
    span: SourceSpan,
) -> Result<Value, ResolveError> {
    let not_found = |segment: &str| ResolveError::LinkNotFound {
        link: link.to_string(),
        segment: segment.to_string(),
        src: NamedSource::new(doc_name, source_text.to_string()),
        span,
    };

    let mut segments = link.split('.');
    // `split` always yields at least one item.
    let first = segments.next().unwrap_or_default();
    let mut current = env.get(first).ok_or_else(|| not_found(first))?;

    for segment in segments {
        current = match current {
            Value::List(items) if is_index(segment) => {
                let index: usize = segment.parse().map_err(|_| not_found(segment))?;
                items.get(index).ok_or_else(|| not_found(segment))?
            }
            Value::Map(map) => map.get(segment).ok_or_else(|| not_found(segment))?,
            _ => return Err(not_found(segment)),
        };
    }

    let key_value = key.map_or(Value::Null, |k| Value::String(k.to_string()));
    let section_value = section.map_or(Value::Null, |s| Value::String(s.to_string()));

    let mut value = current.clone();
    value = substitute(value, KEY_PLACEHOLDER, &key_value);
    value = substitute(value, SECTION_PLACEHOLDER, &section_value);
    Ok(value)
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// One placeholder pass over a resolved copy. Checks the value itself, then
/// the top level of a sequence or mapping; nested containers are left alone.
fn substitute(value: Value, marker: &str, replacement: &Value) -> Value {
    let is_marker = |v: &Value| matches!(v, Value::String(s) if s == marker);
    match value {
        Value::String(ref s) if s == marker => replacement.clone(),
        Value::List(mut items) => {
            if let Some(slot) = items.iter_mut().find(|v| is_marker(v)) {
                *slot = replacement.clone();
            }
            Value::List(items)
        }
        Value::Map(mut map) => {
            if let Some(slot) = map.values_mut().find(|v| is_marker(v)) {
                *slot = replacement.clone();
            }
            Value::Map(map)
        }
        other => other,
    }
}

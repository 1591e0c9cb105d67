use crate::error::ResolveError;
use crate::resolver::{is_link, resolve_link};
use crate::template::interpolate;
use crate::value::{Environment, Value};
use miette::SourceSpan;

/// Converts a raw trimmed value string into a typed [`Value`].
///
/// Rule order, first match wins: link delegation, numeric sniff, boolean and
/// null literals, quote stripping. A value resolved through a link skips the
/// literal rules entirely. Template interpolation runs last and applies to
/// any string result, link-resolved or not.
pub(crate) fn coerce(
    raw: &str,
    key: &str,
    section: Option<&str>,
    env: &Environment,
    doc_name: &str,
    source_text: &str,
    span: SourceSpan,
) -> Result<Value, ResolveError> {
    let value = if is_link(raw) {
        resolve_link(env, &raw[1..], Some(key), section, doc_name, source_text, span)?
    } else {
        coerce_literal(raw)
    };

    Ok(match value {
        Value::String(s) if s.contains("{{") && s.contains("}}") => {
            Value::String(interpolate(s, env))
        }
        other => other,
    })
}

fn coerce_literal(raw: &str) -> Value {
    if let Some(number) = sniff_number(raw) {
        return number;
    }
    match raw {
        "True" | "true" => return Value::Bool(true),
        "False" | "false" => return Value::Bool(false),
        "None" | "none" | "undefined" => return Value::Null,
        _ => {}
    }
    Value::String(strip_quotes(raw).to_string())
}

/// The numeric sniff: after discarding `-`, `+`, `e`, `_` and `.`, the rest
/// must be one or more decimal digits. Exactly one `.` in the original makes
/// it a float, zero makes it an integer, more than one is an ambiguous
/// numeral that stays a string. A sniffed numeral the standard parser still
/// rejects (`1e5` with no dot, `--5`) also stays a string.
fn sniff_number(raw: &str) -> Option<Value> {
    let mut digits = 0usize;
    for c in raw.chars() {
        match c {
            '-' | '+' | 'e' | '_' | '.' => {}
            '0'..='9' => digits += 1,
            _ => return None,
        }
    }
    if digits == 0 {
        return None;
    }

    // Underscore separators are part of the numeral grammar but the std
    // parsers reject them.
    let plain = raw.replace('_', "");
    match raw.matches('.').count() {
        1 => plain.parse::<f64>().ok().map(Value::Float),
        0 => plain.parse::<i64>().ok().map(Value::Int),
        _ => None,
    }
}

fn strip_quotes(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if raw.len() >= 2 && (bytes[0] == b'"' || bytes[0] == b'\'') && bytes[0] == bytes[raw.len() - 1]
    {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coerce_plain(raw: &str) -> Value {
        let env = Environment::new();
        coerce(raw, "k", None, &env, "test.cfex", "", (0, 0).into()).unwrap()
    }

    #[test]
    fn test_integers_and_floats() {
        assert_eq!(coerce_plain("42"), Value::Int(42));
        assert_eq!(coerce_plain("-7"), Value::Int(-7));
        assert_eq!(coerce_plain("3.25"), Value::Float(3.25));
        assert_eq!(coerce_plain("1_000"), Value::Int(1000));
        assert_eq!(coerce_plain("1.5e3"), Value::Float(1500.0));
    }

    #[test]
    fn test_ambiguous_numerals_stay_strings() {
        assert_eq!(coerce_plain("1.2.3"), Value::String("1.2.3".to_string()));
        // No dot routes to the integer parser, which rejects the exponent.
        assert_eq!(coerce_plain("1e5"), Value::String("1e5".to_string()));
        assert_eq!(coerce_plain("--5"), Value::String("--5".to_string()));
    }

    #[test]
    fn test_boolean_and_null_literals() {
        assert_eq!(coerce_plain("True"), Value::Bool(true));
        assert_eq!(coerce_plain("true"), Value::Bool(true));
        assert_eq!(coerce_plain("False"), Value::Bool(false));
        assert_eq!(coerce_plain("false"), Value::Bool(false));
        assert_eq!(coerce_plain("None"), Value::Null);
        assert_eq!(coerce_plain("none"), Value::Null);
        assert_eq!(coerce_plain("undefined"), Value::Null);
        // Exact match only.
        assert_eq!(coerce_plain("TRUE"), Value::String("TRUE".to_string()));
    }

    #[test]
    fn test_quote_stripping_requires_matching_pair() {
        assert_eq!(coerce_plain("\"hi\""), Value::String("hi".to_string()));
        assert_eq!(coerce_plain("'hi'"), Value::String("hi".to_string()));
        assert_eq!(coerce_plain("\"hi'"), Value::String("\"hi'".to_string()));
        assert_eq!(coerce_plain("\""), Value::String("\"".to_string()));
    }

    #[test]
    fn test_quoted_numeral_stays_textual() {
        // The numeric sniff runs before quote stripping, so quotes keep a
        // numeral textual.
        assert_eq!(coerce_plain("\"42\""), Value::String("42".to_string()));
    }

    #[test]
    fn test_placeholder_literals_are_not_links() {
        assert_eq!(
            coerce_plain("$_key"),
            Value::String("$_key".to_string())
        );
        assert_eq!(
            coerce_plain("$_section"),
            Value::String("$_section".to_string())
        );
    }

    #[test]
    fn test_link_resolution_skips_literal_rules() {
        let mut env = Environment::new();
        env.insert("flag".to_string(), Value::String("true".to_string()));
        let value = coerce("$flag", "k", None, &env, "test.cfex", "", (0, 0).into()).unwrap();
        // The linked string is copied as-is, not re-coerced into a boolean.
        assert_eq!(value, Value::String("true".to_string()));
    }

    #[test]
    fn test_interpolation_applies_to_link_results() {
        let mut env = Environment::new();
        env.insert("host".to_string(), Value::String("example.com".to_string()));
        env.insert(
            "url_template".to_string(),
            Value::String("ssh://{{host}}".to_string()),
        );
        let value = coerce(
            "$url_template",
            "url",
            None,
            &env,
            "test.cfex",
            "",
            (0, 0).into(),
        )
        .unwrap();
        assert_eq!(value, Value::String("ssh://example.com".to_string()));
    }

    #[test]
    fn test_missing_link_is_fatal() {
        let env = Environment::new();
        assert!(coerce("$nope", "k", None, &env, "test.cfex", "", (0, 0).into()).is_err());
    }
}

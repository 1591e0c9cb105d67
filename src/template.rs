use crate::value::{Environment, Value};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Substituted text can re-introduce its own marker; the pass cap turns that
/// into graceful termination instead of a spin.
const MAX_PASSES: usize = 64;

/// Root-scope template substitution over a string value.
///
/// Repeatedly locates the first `{{`, then the first `}}` after it, and
/// replaces every occurrence of that exact `{{key}}` with the root
/// environment's string value for `key`. A missing key degrades to the key's
/// own name. The scan ends normally when no further marker pair exists;
/// malformed markers or a non-string target return the string as substituted
/// so far. Never fails.
pub(crate) fn interpolate(mut text: String, env: &Environment) -> String {
    for _ in 0..MAX_PASSES {
        let Some(open) = text.find(OPEN) else {
            return text;
        };
        let key_start = open + OPEN.len();
        let Some(close) = text[key_start..].find(CLOSE) else {
            return text;
        };
        let key = &text[key_start..key_start + close];

        let replacement = match env.get(key) {
            None => key.to_string(),
            Some(Value::String(s)) => s.clone(),
            // Only strings can be spliced into a string template.
            Some(_) => return text,
        };
        let marker = format!("{OPEN}{key}{CLOSE}");
        text = text.replace(&marker, &replacement);
    }
    text
}

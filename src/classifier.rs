/// Represents the different kinds of statements a document line can carry.
/// A line is classified purely by its outer delimiters; classification never
/// depends on what came before it.
#[derive(Debug, PartialEq, Clone)]
pub enum LineKind {
    /// An empty line. Closes the current section and returns to root scope.
    Blank,
    /// A line starting with `#`, skipped entirely.
    Comment,
    /// An `@include` directive; the remainder of the line is the include
    /// path expression (a literal path or a `$`-link).
    Include { path: String },
    /// A `[name]` header opening a mapping section.
    MappingSection { name: String },
    /// A `(name)` header opening a sequence section.
    SequenceSection { name: String },
    /// A `key = value` binding, split on the first `=`, both sides trimmed.
    /// The key is empty for `= value` lines that append to a sequence.
    Assignment { key: String, value: String },
    /// A non-blank line that matched no rule (an assignment with no `=`).
    /// The loader reports this as a fatal error with the line's span.
    Malformed,
}

/// A classified line with its byte span in the source.
#[derive(Debug, Clone)]
pub struct Line {
    pub kind: LineKind,
    pub pos_start: usize,
    pub pos_end: usize,
}

/// A lazy pass over a raw document, yielding one classified [`Line`] per
/// newline-delimited source line. Byte positions are tracked so diagnostics
/// can point back into the source.
pub struct Classifier<'a> {
    source: &'a str,
    offset: usize,
}

impl<'a> Classifier<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, offset: 0 }
    }
}

impl Iterator for Classifier<'_> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        if self.offset > self.source.len() {
            return None;
        }
        let rest = &self.source[self.offset..];
        let (raw, advance) = match rest.find('\n') {
            Some(idx) => (&rest[..idx], idx + 1),
            // Last line; advancing past the end terminates the iterator.
            None => (rest, rest.len() + 1),
        };
        let pos_start = self.offset;
        let pos_end = pos_start + raw.len();
        self.offset += advance;
        Some(Line {
            kind: classify(raw),
            pos_start,
            pos_end,
        })
    }
}

/// Classification rules, checked in order. Only fully empty lines are blank;
/// a line of spaces is not a section boundary.
fn classify(raw: &str) -> LineKind {
    if raw.is_empty() {
        return LineKind::Blank;
    }
    if raw.starts_with('#') {
        return LineKind::Comment;
    }
    if let Some(remainder) = raw.strip_prefix("@include") {
        return LineKind::Include {
            path: remainder.trim().to_string(),
        };
    }
    if raw.len() >= 2 && raw.starts_with('[') && raw.ends_with(']') {
        return LineKind::MappingSection {
            name: raw[1..raw.len() - 1].to_string(),
        };
    }
    if raw.len() >= 2 && raw.starts_with('(') && raw.ends_with(')') {
        return LineKind::SequenceSection {
            name: raw[1..raw.len() - 1].to_string(),
        };
    }
    match raw.split_once('=') {
        Some((key, value)) => LineKind::Assignment {
            key: key.trim().to_string(),
            value: value.trim().to_string(),
        },
        None => LineKind::Malformed,
    }
}

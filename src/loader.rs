use crate::classifier::{Classifier, Line, LineKind};
use crate::coercer::coerce;
use crate::error::{CfexError, DocumentError};
use crate::resolver::{is_link, resolve_link};
use crate::value::{Environment, Value};
use log::{debug, trace};
use miette::{NamedSource, SourceSpan};
use std::fs;
use std::path::{Path, PathBuf};

/// Keys and section names carrying this prefix are visible while the
/// document is processed but stripped from the returned environment.
pub const PRIVATE_PREFIX: &str = "__";

/// Loads a document from disk. A missing or unreadable file yields an empty
/// environment; this is the soft entry includes rely on.
pub(crate) fn load_path(path: &Path, context: Environment) -> Result<Environment, CfexError> {
    load_with_stack(path, context, Vec::new())
}

/// Loads a document that the caller cannot do without.
pub(crate) fn load_required(path: &Path, context: Environment) -> Result<Environment, CfexError> {
    if !path.is_file() {
        return Err(DocumentError::DocumentNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    load_path(path, context)
}

/// Loads a document from an in-memory string. Include directives inside it
/// still hit the filesystem with their paths taken verbatim.
pub(crate) fn load_source(
    source: &str,
    name: &str,
    context: Environment,
) -> Result<Environment, CfexError> {
    Loader::new(name.to_string(), source.to_string(), context, Vec::new()).run()
}

fn load_with_stack(
    path: &Path,
    context: Environment,
    mut stack: Vec<PathBuf>,
) -> Result<Environment, CfexError> {
    // Read errors are deliberately indistinguishable from a missing file.
    let source = match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => String::new(),
    };
    debug!("loading document {}", path.display());
    stack.push(canonical(path));
    Loader::new(path.display().to_string(), source, context, stack).run()
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// The document processor: owns the environment being built for one load,
/// the pending-private list, and the current-section context. All state is
/// scoped to a single run; recursive includes get a fresh loader of their
/// own and only the merge step touches this one.
struct Loader {
    name: String,
    source: String,
    env: Environment,
    pending_clean: Vec<String>,
    current_section: Option<String>,
    /// Documents currently being loaded, this one last. Guards includes
    /// against cycles.
    include_stack: Vec<PathBuf>,
}

impl Loader {
    fn new(
        name: String,
        source: String,
        context: Environment,
        include_stack: Vec<PathBuf>,
    ) -> Self {
        Self {
            name,
            source,
            env: context,
            pending_clean: Vec::new(),
            current_section: None,
            include_stack,
        }
    }

    fn run(mut self) -> Result<Environment, CfexError> {
        // An absent document contributes nothing, even over a seed context.
        if self.source.is_empty() {
            return Ok(Environment::new());
        }
        self.process()?;
        self.clean_private();
        Ok(self.env)
    }

    fn process(&mut self) -> Result<(), CfexError> {
        let lines: Vec<Line> = Classifier::new(&self.source).collect();
        for line in lines {
            let span = span_of(&line);
            match line.kind {
                LineKind::Blank => self.current_section = None,
                LineKind::Comment => {}
                LineKind::Assignment { key, value } => self.assign(&key, &value, span)?,
                LineKind::MappingSection { name } => {
                    self.open_section(name, Value::Map(Environment::new()));
                }
                LineKind::SequenceSection { name } => {
                    self.open_section(name, Value::List(Vec::new()));
                }
                LineKind::Include { path } => self.include(&path, span)?,
                LineKind::Malformed => {
                    return Err(DocumentError::MalformedAssignment {
                        src: self.named_source(),
                        span,
                    }
                    .into())
                }
            }
        }
        Ok(())
    }

    fn assign(&mut self, key: &str, raw: &str, span: SourceSpan) -> Result<(), CfexError> {
        if key.starts_with(PRIVATE_PREFIX) && !self.pending_clean.iter().any(|k| k == key) {
            self.pending_clean.push(key.to_string());
        }

        let section = self.current_section.clone();
        let value = coerce(
            raw,
            key,
            section.as_deref(),
            &self.env,
            &self.name,
            &self.source,
            span,
        )?;
        trace!("assign {:?} in section {:?}", key, section);

        let Some(section) = section else {
            self.env.insert(key.to_string(), value);
            return Ok(());
        };

        let src = self.named_source();
        match (self.section_target(&section, span)?, key.is_empty()) {
            (Value::List(items), true) => items.push(value),
            (Value::Map(map), _) => {
                map.insert(key.to_string(), value);
            }
            _ => return Err(DocumentError::SectionNotFound { section, src, span }.into()),
        }
        Ok(())
    }

    /// Walks the current section name as a dotted path of nested mappings
    /// and returns the container receiving assignments. Section headers
    /// store their name as one flat key, so an undotted name resolves in a
    /// single step; a dotted name only resolves if a matching nested
    /// structure already exists.
    fn section_target(&mut self, section: &str, span: SourceSpan) -> Result<&mut Value, CfexError> {
        let not_found = |src: NamedSource<String>| DocumentError::SectionNotFound {
            section: section.to_string(),
            src,
            span,
        };

        let src = self.named_source();
        let mut segments = section.split('.');
        let first = segments.next().unwrap_or_default();
        let mut current = self
            .env
            .get_mut(first)
            .ok_or_else(|| not_found(src.clone()))?;
        for segment in segments {
            current = match current {
                Value::Map(map) => map
                    .get_mut(segment)
                    .ok_or_else(|| not_found(src.clone()))?,
                _ => return Err(not_found(src).into()),
            };
        }
        Ok(current)
    }

    fn open_section(&mut self, name: String, container: Value) {
        if name.starts_with(PRIVATE_PREFIX) && !self.pending_clean.contains(&name) {
            self.pending_clean.push(name.clone());
        }
        // Stored flat under the literal name, dots included.
        self.env.insert(name.clone(), container);
        self.current_section = Some(name);
    }

    fn include(&mut self, path_expr: &str, span: SourceSpan) -> Result<(), CfexError> {
        let path_str = if is_link(path_expr) {
            let resolved = resolve_link(
                &self.env,
                &path_expr[1..],
                None,
                self.current_section.as_deref(),
                &self.name,
                &self.source,
                span,
            )?;
            match resolved {
                Value::String(s) => s,
                _ => {
                    return Err(DocumentError::BadIncludePath {
                        src: self.named_source(),
                        span,
                    }
                    .into())
                }
            }
        } else {
            path_expr.to_string()
        };

        let target = PathBuf::from(path_str);
        let resolved_target = canonical(&target);
        if self.include_stack.contains(&resolved_target) {
            let cycle = self
                .include_stack
                .iter()
                .chain(std::iter::once(&resolved_target))
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(DocumentError::CircularInclude {
                cycle,
                src: self.named_source(),
                span,
            }
            .into());
        }

        debug!("include {} from {}", target.display(), self.name);
        let merged = load_with_stack(&target, Environment::new(), self.include_stack.clone())?;
        // Keys already present are overwritten; later lines in this
        // document can in turn overwrite the merged ones.
        self.env.extend(merged);
        Ok(())
    }

    fn clean_private(&mut self) {
        for key in &self.pending_clean {
            // A private key may have been bound inside a section or shadowed;
            // only root bindings are removed, and removal is idempotent.
            self.env.remove(key);
        }
    }

    fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.source.clone())
    }
}

fn span_of(line: &Line) -> SourceSpan {
    (line.pos_start, line.pos_end - line.pos_start).into()
}

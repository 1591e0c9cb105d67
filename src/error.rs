use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CfexError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),
}

/// Errors raised while a document is being processed.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum DocumentError {
    #[error("Malformed assignment")]
    #[diagnostic(
        code(cfex::malformed_assignment),
        help("A non-blank, non-comment line must be a section header, an @include directive, or a `key = value` assignment.")
    )]
    MalformedAssignment {
        #[source_code]
        src: NamedSource<String>,
        #[label("This line has no `=`")]
        span: SourceSpan,
    },

    #[error("Section '{section}' cannot receive this assignment")]
    #[diagnostic(
        code(cfex::section_not_found),
        help("The open section must resolve to a mapping for `key = value` lines, or to a sequence for bare `= value` lines.")
    )]
    SectionNotFound {
        section: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("Assigned here while '{section}' was the open section")]
        span: SourceSpan,
    },

    #[error("Include path did not resolve to a string")]
    #[diagnostic(
        code(cfex::bad_include_path),
        help("An `@include $link` must point at a string value in the environment built so far.")
    )]
    BadIncludePath {
        #[source_code]
        src: NamedSource<String>,
        #[label("This link resolved to a non-string value")]
        span: SourceSpan,
    },

    #[error("Circular include detected: {cycle}")]
    #[diagnostic(
        code(cfex::circular_include),
        help("A document cannot include itself, directly or through other documents.")
    )]
    CircularInclude {
        cycle: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("This include re-enters a document that is still being loaded")]
        span: SourceSpan,
    },

    #[error("Document not found: {}", path.display())]
    #[diagnostic(
        code(cfex::document_not_found),
        help("The caller marked this document as required, but there is no readable file at its path.")
    )]
    DocumentNotFound { path: PathBuf },
}

/// Errors raised while resolving a `$`-link against the environment.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ResolveError {
    #[error("Link '${link}' not found")]
    #[diagnostic(
        code(cfex::link_not_found),
        help("Each dotted segment must name an existing key, or a valid index into a sequence. Links only see bindings that appear earlier in the document.")
    )]
    LinkNotFound {
        link: String,
        segment: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("Segment '{segment}' has no target here")]
        span: SourceSpan,
    },
}

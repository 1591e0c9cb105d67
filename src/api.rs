use crate::error::CfexError;
use crate::loader;
use crate::value::{Environment, Value};
use serde::{Serialize, Serializer};
use std::path::Path;

/// The result of successfully loading a CFEX document.
/// Wraps the fully resolved, privacy-stripped environment and provides
/// typed access plus JSON/YAML export.
pub struct LoadResult {
    pub environment: Environment,
}

impl Serialize for LoadResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.environment.serialize(serializer)
    }
}

impl LoadResult {
    /// Looks a binding up at the environment root.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.environment.get(key)
    }

    /// Serializes the resolved environment into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// Serializes the resolved environment into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }
}

/// Loads and resolves the CFEX document at `path`.
///
/// This is the primary entry point. The whole document is processed in one
/// pass: each line is classified, values are coerced and links resolved
/// against the environment built so far, includes are merged, and private
/// (`__`-prefixed) bindings are stripped before the result is returned.
/// A missing or unreadable file yields an empty environment, not an error.
///
/// # Errors
///
/// Returns a `CfexError` when a link cannot be resolved, a line is not a
/// valid statement, or an include chain is circular.
pub fn load(path: impl AsRef<Path>) -> Result<LoadResult, CfexError> {
    load_with_context(path, Environment::new())
}

/// Like [`load`], but seeds the environment with an initial context mapping
/// that the document's own lines may link against or overwrite.
///
/// A missing or empty document still yields an empty environment; the seed
/// only survives when there is a document to process.
///
/// # Errors
///
/// Same conditions as [`load`].
pub fn load_with_context(
    path: impl AsRef<Path>,
    context: Environment,
) -> Result<LoadResult, CfexError> {
    loader::load_path(path.as_ref(), context).map(|environment| LoadResult { environment })
}

/// Like [`load`], but a missing document is fatal. Top-level project
/// configuration goes through this; optional includes do not.
///
/// # Errors
///
/// Returns `DocumentError::DocumentNotFound` when `path` is not a readable
/// file, plus every condition of [`load`].
pub fn load_required(path: impl AsRef<Path>) -> Result<LoadResult, CfexError> {
    loader::load_required(path.as_ref(), Environment::new())
        .map(|environment| LoadResult { environment })
}

/// Loads a document from an in-memory string. `name` is used for error
/// reporting. Include directives inside the source still read from the
/// filesystem, with their paths taken verbatim.
///
/// # Errors
///
/// Same conditions as [`load`].
pub fn load_source(source: &str, name: &str) -> Result<LoadResult, CfexError> {
    loader::load_source(source, name, Environment::new())
        .map(|environment| LoadResult { environment })
}

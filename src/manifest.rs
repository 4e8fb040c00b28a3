//! Manifest loading and per-document descriptor extraction.
//!
//! A manifest is a multi-document YAML file; document order is the
//! reconciliation order. Loading failures are fatal for the whole manifest,
//! and so are extraction failures for any single document.
use serde::Deserialize;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::strategy::{self, Strategy};

/// One object definition as parsed from the manifest.
pub type Document = Value;

/// Fatal errors raised before any document is reconciled.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("file does not exist: {0}")]
    Missing(PathBuf),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Fatal errors raised for a single malformed document. Any of these aborts
/// the entire remaining manifest.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no '{0}' for object")]
    MissingField(&'static str),
    #[error("unsupported object kind {0}")]
    UnsupportedKind(String),
}

/// Identity of one object: enough to probe, delete, and report on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    /// Kind as written in the document (original casing preserved for
    /// reporting and kubectl arguments).
    pub kind: String,
    pub name: String,
    /// `None` means the object is not namespaced; queries run unscoped.
    pub namespace: Option<String>,
    /// Table strategy captured while validating kind membership, so
    /// resolution after extraction cannot fail.
    pub default_strategy: Strategy,
}

/// Load all documents from a manifest file, in file order.
///
/// Empty documents produced by trailing `---` separators are skipped.
pub fn load_documents(path: &Path) -> Result<Vec<Document>, ManifestError> {
    if !path.is_file() {
        return Err(ManifestError::Missing(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut documents = Vec::new();
    for deserializer in serde_yaml::Deserializer::from_str(&text) {
        let value = Value::deserialize(deserializer).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

/// Extract `{kind, name, namespace}` from one document.
///
/// Pure function. Checks run in a fixed order and later checks still run
/// after an earlier failure, so when several fields are missing the
/// last-failed check determines the surfaced error.
pub fn extract_descriptor(doc: &Document) -> Result<ObjectDescriptor, ExtractError> {
    let mut error = None;

    let mut kind = None;
    match doc.get("kind").and_then(Value::as_str) {
        None => error = Some(ExtractError::MissingField("kind")),
        Some(value) => {
            if !strategy::is_supported_kind(value) {
                error = Some(ExtractError::UnsupportedKind(value.to_string()));
            }
            kind = Some(value.to_string());
        }
    }

    let mut name = None;
    let mut namespace = None;
    match doc.get("metadata") {
        None => error = Some(ExtractError::MissingField("metadata")),
        Some(metadata) => {
            match metadata.get("name").and_then(Value::as_str) {
                None => error = Some(ExtractError::MissingField("metadata.name")),
                Some(value) => name = Some(value.to_string()),
            }
            namespace = metadata
                .get("namespace")
                .and_then(Value::as_str)
                .map(str::to_string);
        }
    }

    if let Some(error) = error {
        return Err(error);
    }
    let (Some(kind), Some(name)) = (kind, name) else {
        // Both are recorded whenever no error was, but keep a typed failure
        // rather than a panic if that ever stops holding.
        return Err(ExtractError::MissingField("kind"));
    };
    let default_strategy = strategy::default_strategy(&kind)
        .ok_or_else(|| ExtractError::UnsupportedKind(kind.clone()))?;
    Ok(ObjectDescriptor {
        kind,
        name,
        namespace,
        default_strategy,
    })
}

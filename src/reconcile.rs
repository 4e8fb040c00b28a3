//! Manifest reconciliation: drive every document to the desired state.
//!
//! Documents are processed strictly in file order, one blocking cluster call
//! at a time. A malformed document aborts the entire remaining manifest; a
//! failed mutation is recorded and processing continues with the next
//! document.
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::kubectl::{Cluster, CommandOutput};
use crate::manifest::{self, ExtractError, ObjectDescriptor};
use crate::strategy::{self, RequestedStrategy, Strategy};

/// Literal response for an existing object under create-or-nothing.
pub const NOTHING_TO_DO: &str = "Nothing to do with object";
/// Literal response when an absent-state object is already gone.
pub const ALREADY_ABSENT: &str = "Object already absent";

const PRESENT_ERROR_MSG: &str = "error creating/updating object(s)";
const ABSENT_ERROR_MSG: &str = "error deleting object(s)";

/// Per-document outcome record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    pub status: bool,
    pub file: String,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

impl DocumentResult {
    fn failure(file: &str, response: String) -> Self {
        Self {
            status: false,
            file: file.to_string(),
            response,
            object_kind: None,
            object_name: None,
            object_namespace: None,
            strategy: None,
        }
    }

    fn for_object(
        file: &str,
        descriptor: &ObjectDescriptor,
        output: CommandOutput,
        strategy: Option<Strategy>,
    ) -> Self {
        Self {
            status: output.success,
            file: file.to_string(),
            response: output.text,
            object_kind: Some(descriptor.kind.clone()),
            object_name: Some(descriptor.name.clone()),
            object_namespace: descriptor.namespace.clone(),
            strategy: strategy.map(|s| s.as_str().to_string()),
        }
    }
}

/// Aggregated outcome for one manifest.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// True when at least one document failed (sticky across documents).
    pub failed: bool,
    /// True when at least one document actually changed cluster state.
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    pub results: Vec<DocumentResult>,
}

impl ReconcileReport {
    fn fatal(file: &str, response: String, msg: &str) -> Self {
        Self {
            failed: true,
            changed: false,
            msg: Some(msg.to_string()),
            results: vec![DocumentResult::failure(file, response)],
        }
    }
}

/// Ensure every object in the manifest exists and matches its document,
/// under the requested strategy (`Default` resolves per kind).
pub fn ensure_present(
    cluster: &dyn Cluster,
    file: &Path,
    requested: RequestedStrategy,
) -> ReconcileReport {
    let file_label = file.display().to_string();
    let documents = match manifest::load_documents(file) {
        Ok(documents) => documents,
        Err(err) => return ReconcileReport::fatal(&file_label, err.to_string(), PRESENT_ERROR_MSG),
    };

    let mut results = Vec::new();
    let mut any_error = false;
    let mut any_change = false;

    for (index, doc) in documents.iter().enumerate() {
        let descriptor = match manifest::extract_descriptor(doc) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                return ReconcileReport::fatal(
                    &file_label,
                    document_error(&err, index),
                    PRESENT_ERROR_MSG,
                );
            }
        };
        let strategy = strategy::resolve(requested, descriptor.default_strategy);
        let namespace = descriptor.namespace.as_deref();
        let probe = cluster.exists(&descriptor);
        tracing::debug!(
            kind = %descriptor.kind,
            name = %descriptor.name,
            strategy = strategy.as_str(),
            found = probe.found,
            "reconciling document"
        );

        // Strategy only governs existing objects; absent objects are
        // always created, whatever the strategy resolved to.
        let (output, changed) = if probe.found {
            match strategy {
                Strategy::CreateOrReplace => mutated(cluster.replace(doc, namespace)),
                Strategy::CreateOrApply => mutated(cluster.apply(doc, namespace)),
                Strategy::CreateOrNothing => (
                    CommandOutput {
                        success: true,
                        text: NOTHING_TO_DO.to_string(),
                    },
                    false,
                ),
            }
        } else {
            mutated(cluster.create(doc, namespace))
        };

        any_error |= !output.success;
        any_change |= changed;
        results.push(DocumentResult::for_object(
            &file_label,
            &descriptor,
            output,
            Some(strategy),
        ));
    }

    ReconcileReport {
        failed: any_error,
        changed: any_change,
        msg: any_error.then(|| PRESENT_ERROR_MSG.to_string()),
        results,
    }
}

/// Ensure no object named by the manifest remains in the cluster.
///
/// `failed` aggregates across all documents, mirroring the present flow.
pub fn ensure_absent(cluster: &dyn Cluster, file: &Path) -> ReconcileReport {
    let file_label = file.display().to_string();
    let documents = match manifest::load_documents(file) {
        Ok(documents) => documents,
        Err(err) => return ReconcileReport::fatal(&file_label, err.to_string(), ABSENT_ERROR_MSG),
    };

    let mut results = Vec::new();
    let mut any_error = false;
    let mut any_change = false;

    for (index, doc) in documents.iter().enumerate() {
        let descriptor = match manifest::extract_descriptor(doc) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                return ReconcileReport::fatal(
                    &file_label,
                    document_error(&err, index),
                    ABSENT_ERROR_MSG,
                );
            }
        };

        let (output, changed) = if cluster.exists(&descriptor).found {
            mutated(cluster.delete(&descriptor))
        } else {
            (
                CommandOutput {
                    success: true,
                    text: ALREADY_ABSENT.to_string(),
                },
                false,
            )
        };

        any_error |= !output.success;
        any_change |= changed;
        results.push(DocumentResult::for_object(
            &file_label,
            &descriptor,
            output,
            None,
        ));
    }

    ReconcileReport {
        failed: any_error,
        changed: any_change,
        msg: any_error.then(|| ABSENT_ERROR_MSG.to_string()),
        results,
    }
}

/// A mutation that could not even be spawned counts as a failed mutation for
/// that document, never as a manifest abort.
fn mutated(result: anyhow::Result<CommandOutput>) -> (CommandOutput, bool) {
    let output = result.unwrap_or_else(|err| CommandOutput {
        success: false,
        text: format!("{err:#}"),
    });
    let changed = output.success;
    (output, changed)
}

fn document_error(err: &ExtractError, index: usize) -> String {
    format!("{err} [doc num: {index}]")
}

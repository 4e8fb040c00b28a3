//! Cluster access through the `kubectl` binary.
//!
//! Every cluster interaction is one blocking subprocess call built from a
//! structured argument list; the free-text extra-options string is tokenized
//! once at startup with shell-words, never re-parsed per call. Documents fed
//! to `-f` verbs are spooled to a named temp file that is removed when the
//! call returns, on success and failure alike.
use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use crate::manifest::{Document, ObjectDescriptor};

/// Outcome of one kubectl invocation: exit-status success plus stdout on
/// success or stderr on failure.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub text: String,
}

/// Existence probe result. `found` mirrors the exit status of `kubectl get`;
/// any failure is treated as "absent", so `raw` keeps the failure text as a
/// distinguishable signal for callers and logs.
#[derive(Debug, Clone)]
pub struct Probe {
    pub found: bool,
    pub raw: String,
}

/// Operations the reconciler needs from a cluster. [`Kubectl`] is the
/// production implementation; tests substitute a recording fake.
pub trait Cluster {
    fn exists(&self, descriptor: &ObjectDescriptor) -> Probe;
    fn create(&self, doc: &Document, namespace: Option<&str>) -> Result<CommandOutput>;
    fn apply(&self, doc: &Document, namespace: Option<&str>) -> Result<CommandOutput>;
    fn replace(&self, doc: &Document, namespace: Option<&str>) -> Result<CommandOutput>;
    fn delete(&self, descriptor: &ObjectDescriptor) -> Result<CommandOutput>;
}

/// Handle on a resolved kubectl binary plus the extra options prepended to
/// every invocation (e.g. `--context=live`).
#[derive(Debug, Clone)]
pub struct Kubectl {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl Kubectl {
    /// Resolve the binary and tokenize the extra-options string up front so
    /// a bad configuration fails before any document is touched.
    pub fn new(bin: &str, opts: &str) -> Result<Self> {
        let program = which::which(bin).with_context(|| format!("locate {bin}"))?;
        let extra_args =
            shell_words::split(opts).with_context(|| format!("parse kubectl options: {opts}"))?;
        Ok(Self {
            program,
            extra_args,
        })
    }

    fn exec(&self, args: &[&str], namespace: Option<&str>) -> Result<CommandOutput> {
        let mut command = Command::new(&self.program);
        command.args(&self.extra_args);
        command.args(args);
        if let Some(namespace) = namespace {
            command.arg(format!("--namespace={namespace}"));
        }
        tracing::debug!(?command, "invoking kubectl");
        let output = command
            .output()
            .with_context(|| format!("run {}", self.program.display()))?;
        let success = output.status.success();
        let bytes = if success { output.stdout } else { output.stderr };
        Ok(CommandOutput {
            success,
            text: String::from_utf8_lossy(&bytes).trim_end().to_string(),
        })
    }

    fn mutate_with_file(
        &self,
        verb: &str,
        doc: &Document,
        namespace: Option<&str>,
    ) -> Result<CommandOutput> {
        let file = spool_document(doc)?;
        let path = file
            .path()
            .to_str()
            .ok_or_else(|| anyhow!("temp manifest path is not valid UTF-8"))?;
        self.exec(&[verb, "-f", path], namespace)
        // `file` drops here, removing the temp manifest on every path.
    }
}

impl Cluster for Kubectl {
    fn exists(&self, descriptor: &ObjectDescriptor) -> Probe {
        let result = self.exec(
            &["get", &descriptor.kind, &descriptor.name],
            descriptor.namespace.as_deref(),
        );
        match result {
            Ok(output) => {
                if !output.success {
                    // A failed get is indistinguishable from true absence
                    // here; surface the response so e.g. auth failures can
                    // be diagnosed from the logs.
                    tracing::debug!(
                        kind = %descriptor.kind,
                        name = %descriptor.name,
                        response = %output.text,
                        "get failed; treating object as absent"
                    );
                }
                Probe {
                    found: output.success,
                    raw: output.text,
                }
            }
            Err(err) => {
                tracing::warn!(
                    kind = %descriptor.kind,
                    name = %descriptor.name,
                    error = %format!("{err:#}"),
                    "existence probe could not run; treating object as absent"
                );
                Probe {
                    found: false,
                    raw: format!("{err:#}"),
                }
            }
        }
    }

    fn create(&self, doc: &Document, namespace: Option<&str>) -> Result<CommandOutput> {
        self.mutate_with_file("create", doc, namespace)
    }

    fn apply(&self, doc: &Document, namespace: Option<&str>) -> Result<CommandOutput> {
        self.mutate_with_file("apply", doc, namespace)
    }

    fn replace(&self, doc: &Document, namespace: Option<&str>) -> Result<CommandOutput> {
        self.mutate_with_file("replace", doc, namespace)
    }

    fn delete(&self, descriptor: &ObjectDescriptor) -> Result<CommandOutput> {
        self.exec(
            &["delete", &descriptor.kind, &descriptor.name],
            descriptor.namespace.as_deref(),
        )
    }
}

fn spool_document(doc: &Document) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new().context("create temp manifest file")?;
    let text = serde_yaml::to_string(doc).context("serialize document to YAML")?;
    file.write_all(text.as_bytes())
        .context("write temp manifest file")?;
    file.flush().context("flush temp manifest file")?;
    Ok(file)
}

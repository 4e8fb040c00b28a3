//! CLI argument parsing for manifest reconciliation.
//!
//! The CLI is intentionally thin: it wires one idempotent reconcile pass and
//! reports the result as JSON, so the same core logic can be reused from
//! automation.
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::strategy::RequestedStrategy;

/// Desired presence state for every object in the manifest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum State {
    Present,
    Absent,
}

#[derive(Parser, Debug)]
#[command(
    name = "kube-ensure",
    version,
    about = "Ensure Kubernetes objects from a YAML manifest are present or absent",
    after_help = "Examples:\n  kube-ensure --file objects.yml\n  kube-ensure --file objects.yml --state absent\n  kube-ensure --file objects.yml --strategy create_or_apply\n  kube-ensure --file objects.yml --kubectl-opts \"--context=live\""
)]
pub struct RootArgs {
    /// Path to the multi-document YAML manifest
    #[arg(long, value_name = "PATH")]
    pub file: PathBuf,

    /// Desired state for every object in the manifest
    #[arg(long, value_enum, default_value = "present")]
    pub state: State,

    /// Strategy for objects that already exist (default = per-kind table)
    #[arg(long, value_enum, default_value = "default")]
    pub strategy: RequestedStrategy,

    /// Extra options prepended to every kubectl invocation (e.g. "--context=live")
    #[arg(long, value_name = "OPTS", default_value = "", allow_hyphen_values = true)]
    pub kubectl_opts: String,

    /// kubectl binary to invoke
    #[arg(long, value_name = "BIN", default_value = "kubectl")]
    pub kubectl_bin: String,

    /// Emit indented JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Emit a verbose transcript of every cluster call on stderr
    #[arg(long)]
    pub verbose: bool,
}

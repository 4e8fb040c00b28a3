//! Per-kind reconciliation strategy table and resolution.
//!
//! The table is a fixed design artifact, not user configuration: it encodes
//! which kinds are safe to fully replace, which should be merged via apply,
//! and which must never be touched once they exist.
use clap::ValueEnum;

/// Concrete action policy for an object whose kind already exists in the
/// cluster. Objects that do not exist yet are always created, regardless of
/// strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    CreateOrReplace,
    CreateOrApply,
    CreateOrNothing,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::CreateOrReplace => "create_or_replace",
            Strategy::CreateOrApply => "create_or_apply",
            Strategy::CreateOrNothing => "create_or_nothing",
        }
    }
}

/// Strategy requested by the caller. `Default` defers to the per-kind table
/// and is resolved to a concrete [`Strategy`] before any cluster call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum RequestedStrategy {
    Default,
    CreateOrReplace,
    CreateOrApply,
    CreateOrNothing,
}

/// Resolve a requested strategy against the table default for the kind.
/// A non-default request always wins.
pub fn resolve(requested: RequestedStrategy, kind_default: Strategy) -> Strategy {
    match requested {
        RequestedStrategy::Default => kind_default,
        RequestedStrategy::CreateOrReplace => Strategy::CreateOrReplace,
        RequestedStrategy::CreateOrApply => Strategy::CreateOrApply,
        RequestedStrategy::CreateOrNothing => Strategy::CreateOrNothing,
    }
}

/// Table strategy for a kind, or `None` when the kind is unsupported.
/// Kinds match case-insensitively.
pub fn default_strategy(kind: &str) -> Option<Strategy> {
    let strategy = match kind.to_ascii_lowercase().as_str() {
        "cluster" | "componentstatus" | "endpoint" | "event" | "horizontalpodautoscaler"
        | "ingress" | "limitrange" | "networkpolicies" | "node" | "persistentvolumeclaim"
        | "pod" | "podsecuritypolicy" | "podtemplate" | "replicaset"
        | "replicationcontroller" | "resourcequota" | "serviceaccount" | "storageclass"
        | "thirdpartyresource" => Strategy::CreateOrNothing,
        "configmap" | "deployment" | "petset" | "statefulset" | "cronjob" | "scheduledjob"
        | "secret" => Strategy::CreateOrReplace,
        "daemonset" | "job" | "namespace" | "persistentvolume" | "service" => {
            Strategy::CreateOrApply
        }
        _ => return None,
    };
    Some(strategy)
}

pub fn is_supported_kind(kind: &str) -> bool {
    default_strategy(kind).is_some()
}

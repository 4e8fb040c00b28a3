//! Shared test infrastructure: a stub kubectl plus report parsing.
//!
//! The stub records every invocation to `calls.log` and keeps cluster state
//! as marker files under `objects/`, so tests can assert which verbs ran,
//! what flags they carried, and how the cluster state evolved.
//!
//! Not every helper is used by every test binary.
#![allow(dead_code)]

use serde::Deserialize;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const STUB_KUBECTL: &str = r#"#!/bin/sh
dir=$(cd "$(dirname "$0")" && pwd)
printf '%s\n' "$*" >> "$dir/calls.log"

# Skip global flags (e.g. --context=...) that precede the verb.
while [ $# -gt 0 ]; do
  case "$1" in
    -*) shift ;;
    *) break ;;
  esac
done
verb=$1
shift

case "$verb" in
  get)
    kind=$(printf '%s' "$1" | tr '[:upper:]' '[:lower:]')
    name=$2
    if [ -f "$dir/objects/$kind.$name" ]; then
      printf '%s/%s\n' "$kind" "$name"
      exit 0
    fi
    printf 'Error from server (NotFound): %s "%s" not found\n' "$kind" "$name" >&2
    exit 1
    ;;
  create|apply|replace)
    file=""
    while [ $# -gt 0 ]; do
      if [ "$1" = "-f" ]; then file=$2; shift; fi
      shift
    done
    if [ ! -f "$file" ]; then
      printf 'manifest file missing: %s\n' "$file" >&2
      exit 2
    fi
    cp "$file" "$dir/last_manifest.yml"
    if [ -f "$dir/fail_$verb" ]; then
      printf 'simulated %s failure\n' "$verb" >&2
      exit 1
    fi
    printf 'object %s ok\n' "$verb"
    exit 0
    ;;
  delete)
    kind=$(printf '%s' "$1" | tr '[:upper:]' '[:lower:]')
    name=$2
    if [ -f "$dir/objects/$kind.$name" ]; then
      rm -f "$dir/objects/$kind.$name"
      printf '%s "%s" deleted\n' "$kind" "$name"
      exit 0
    fi
    printf 'Error from server (NotFound): %s "%s" not found\n' "$kind" "$name" >&2
    exit 1
    ;;
  *)
    printf 'unknown verb: %s\n' "$verb" >&2
    exit 64
    ;;
esac
"#;

/// Stub cluster backed by a temp directory.
pub struct FakeCluster {
    dir: TempDir,
}

impl FakeCluster {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create stub cluster dir");
        let kubectl = dir.path().join("kubectl");
        fs::write(&kubectl, STUB_KUBECTL).expect("write stub kubectl");
        fs::set_permissions(&kubectl, fs::Permissions::from_mode(0o755))
            .expect("mark stub kubectl executable");
        fs::create_dir(dir.path().join("objects")).expect("create objects dir");
        Self { dir }
    }

    pub fn kubectl(&self) -> PathBuf {
        self.dir.path().join("kubectl")
    }

    /// Pre-seed an object so the stub reports it as existing.
    pub fn seed(&self, kind: &str, name: &str) {
        let marker = self
            .dir
            .path()
            .join("objects")
            .join(format!("{}.{name}", kind.to_ascii_lowercase()));
        fs::write(marker, "").expect("seed object marker");
    }

    pub fn has_object(&self, kind: &str, name: &str) -> bool {
        self.dir
            .path()
            .join("objects")
            .join(format!("{}.{name}", kind.to_ascii_lowercase()))
            .exists()
    }

    /// Make one mutating verb fail with a nonzero exit.
    pub fn fail_verb(&self, verb: &str) {
        fs::write(self.dir.path().join(format!("fail_{verb}")), "").expect("set fail marker");
    }

    /// All stub invocations, one argv line per call, in order.
    pub fn calls(&self) -> Vec<String> {
        let log = self.dir.path().join("calls.log");
        if !log.exists() {
            return Vec::new();
        }
        fs::read_to_string(log)
            .expect("read calls.log")
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Temp manifest paths that were passed to `-f` verbs.
    pub fn manifest_paths_passed(&self) -> Vec<PathBuf> {
        self.calls()
            .iter()
            .filter_map(|call| {
                let mut tokens = call.split_whitespace();
                tokens
                    .by_ref()
                    .find(|token| *token == "-f")
                    .and_then(|_| tokens.next())
                    .map(PathBuf::from)
            })
            .collect()
    }

    /// Write a manifest file next to the stub and return its path.
    pub fn write_manifest(&self, name: &str, text: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, text).expect("write manifest fixture");
        path
    }
}

/// Report shape mirrored from the binary's JSON output.
#[derive(Debug, Deserialize)]
pub struct Report {
    pub failed: bool,
    pub changed: bool,
    #[serde(default)]
    pub msg: Option<String>,
    pub results: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
pub struct Entry {
    pub status: bool,
    pub file: String,
    pub response: String,
    #[serde(default)]
    pub object_kind: Option<String>,
    #[serde(default)]
    pub object_name: Option<String>,
    #[serde(default)]
    pub object_namespace: Option<String>,
    #[serde(default)]
    pub strategy: Option<String>,
}

pub struct RunOutcome {
    pub report: Report,
    pub exit_ok: bool,
}

/// Run the kube-ensure binary against the stub cluster and parse its report.
pub fn run_ensure(cluster: &FakeCluster, manifest: &Path, extra: &[&str]) -> RunOutcome {
    let output = run_raw(cluster, manifest, extra);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let report: Report = serde_json::from_str(stdout.trim()).unwrap_or_else(|err| {
        panic!(
            "report JSON did not parse: {err}\nstdout: {stdout}\nstderr: {}",
            String::from_utf8_lossy(&output.stderr)
        )
    });
    RunOutcome {
        report,
        exit_ok: output.status.success(),
    }
}

pub fn run_raw(cluster: &FakeCluster, manifest: &Path, extra: &[&str]) -> Output {
    let kubectl = cluster.kubectl();
    Command::new(env!("CARGO_BIN_EXE_kube-ensure"))
        .arg("--file")
        .arg(manifest)
        .arg("--kubectl-bin")
        .arg(&kubectl)
        .args(extra)
        .output()
        .expect("run kube-ensure")
}

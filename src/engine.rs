//! Container engine access: discovery, availability probing, state queries.
//!
//! The engine is the single source of truth for container existence and
//! identity; every query here is read-only and runs under a deadline so a
//! wedged daemon cannot hang an invocation.

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use once_cell::sync::OnceCell;
use which::which;

use crate::errors::{LauncherError, Result};
use crate::util::exec::{ExecOutput, ExecRequest, ExecService};

/// Marker label carried by every session container; `--list` filters on it.
pub const SESSION_LABEL: &str = "vibecode.session";
pub const KEY_LABEL: &str = "vibecode.key";
pub const MODE_LABEL: &str = "vibecode.mode";

pub fn container_engine_path() -> io::Result<PathBuf> {
    // Allow tests or callers to explicitly disable engine detection
    if env::var("VIBECODE_SKIP_ENGINE").ok().as_deref() == Some("1") {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            "Container engine disabled by environment override.",
        ));
    }

    if let Ok(p) = which("docker") {
        return Ok(p);
    }
    Err(io::Error::new(
        io::ErrorKind::NotFound,
        "Docker is required but was not found in PATH.",
    ))
}

fn exec_service() -> &'static ExecService {
    static SVC: OnceCell<ExecService> = OnceCell::new();
    SVC.get_or_init(|| ExecService::new(Duration::from_secs(30)))
}

/// Run an engine query with captured output. Spawn failures and timeouts
/// surface as `EngineUnavailable`; a non-zero exit is the caller's to
/// interpret (an absent container is not an unavailable engine).
pub fn engine_output(
    runtime: &Path,
    args: &[&str],
    timeout: Duration,
) -> Result<ExecOutput> {
    exec_service()
        .run(
            ExecRequest::new(runtime)
                .args(args.iter().copied())
                .timeout(timeout)
                .capture_output(true),
        )
        .map_err(|e| LauncherError::EngineUnavailable(e.to_string()))
}

/// Probe the daemon. Fatal and never retried: a missing engine is not a
/// transient condition in this design.
pub fn ensure_engine_available(runtime: &Path) -> Result<()> {
    let out = engine_output(
        runtime,
        &["info", "--format", "{{.ServerVersion}}"],
        Duration::from_secs(10),
    )?;
    if !out.status.success() {
        let diag = out.stderr.trim().to_string();
        let diag = if diag.is_empty() {
            "engine daemon is not responding".to_string()
        } else {
            diag
        };
        return Err(LauncherError::EngineUnavailable(diag));
    }
    Ok(())
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContainerState {
    Absent,
    Stopped,
    Running,
}

/// Current state of the named container, straight from `inspect`.
pub fn inspect_state(runtime: &Path, name: &str) -> Result<ContainerState> {
    let out = engine_output(
        runtime,
        &["inspect", "--type", "container", name],
        Duration::from_secs(10),
    )?;
    if !out.status.success() {
        return Ok(ContainerState::Absent);
    }
    let doc: serde_json::Value = serde_json::from_str(&out.stdout).map_err(|e| {
        LauncherError::EngineUnavailable(format!("unparseable inspect output: {e}"))
    })?;
    let running = doc
        .pointer("/0/State/Running")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    Ok(if running {
        ContainerState::Running
    } else {
        ContainerState::Stopped
    })
}

/// `src:dst` pairs recorded on an existing container (used to surface mount
/// divergence on restart; a stopped container cannot be remounted).
pub fn container_mounts(runtime: &Path, name: &str) -> Result<Vec<String>> {
    let out = engine_output(
        runtime,
        &["inspect", "--type", "container", name],
        Duration::from_secs(10),
    )?;
    if !out.status.success() {
        return Ok(Vec::new());
    }
    let doc: serde_json::Value = serde_json::from_str(&out.stdout).map_err(|e| {
        LauncherError::EngineUnavailable(format!("unparseable inspect output: {e}"))
    })?;
    let mut pairs = Vec::new();
    if let Some(mounts) = doc.pointer("/0/Mounts").and_then(|v| v.as_array()) {
        for m in mounts {
            let src = m.get("Source").and_then(|v| v.as_str()).unwrap_or("");
            let dst = m.get("Destination").and_then(|v| v.as_str()).unwrap_or("");
            if !src.is_empty() && !dst.is_empty() {
                pairs.push(format!("{src}:{dst}"));
            }
        }
    }
    Ok(pairs)
}

/// Return true if an image exists locally (without pulling).
pub fn image_exists(runtime: &Path, image: &str) -> bool {
    Command::new(runtime)
        .arg("image")
        .arg("inspect")
        .arg(image)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

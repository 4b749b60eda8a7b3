#![allow(clippy::module_name_repetitions)]
//! Mount planning: reserved mounts, workdir preservation, user volumes.
//!
//! The plan is ordered and deterministic: reserved mounts first (engine
//! socket, credential paths), then the path-preserving working-directory
//! mount, then user volumes in command-line order, then config-file volumes.
//! All validation happens here, before any engine call.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::errors::{LauncherError, Result};

/// Home of the unprivileged user inside the sandbox; the entrypoint fixes
/// its ownership to the mapped UID/GID.
pub const CONTAINER_HOME: &str = "/home/vibe";
pub const CONTAINER_USER: &str = "vibe";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountSpec {
    pub host: PathBuf,
    pub container: String,
    pub read_only: bool,
}

impl MountSpec {
    pub fn rw(host: impl Into<PathBuf>, container: impl Into<String>) -> MountSpec {
        MountSpec {
            host: host.into(),
            container: container.into(),
            read_only: false,
        }
    }

    pub fn ro(host: impl Into<PathBuf>, container: impl Into<String>) -> MountSpec {
        MountSpec {
            host: host.into(),
            container: container.into(),
            read_only: true,
        }
    }

    /// Render as an engine `-v` value: `host:container[:ro]`.
    pub fn render(&self) -> String {
        if self.read_only {
            format!("{}:{}:ro", self.host.display(), self.container)
        } else {
            format!("{}:{}", self.host.display(), self.container)
        }
    }
}

/// Parse a `--volume` value. `SRC:DST` with an optional `:ro`/`:rw` suffix;
/// a missing separator is a configuration error, reported before anything
/// touches the engine.
pub fn parse_volume_spec(spec: &str) -> Result<MountSpec> {
    let (src, rest) = spec.split_once(':').ok_or_else(|| {
        LauncherError::Configuration(format!("--volume expects SRC:DST, got {spec:?}"))
    })?;
    let (dst, read_only) = if let Some(d) = rest.strip_suffix(":ro") {
        (d, true)
    } else if let Some(d) = rest.strip_suffix(":rw") {
        (d, false)
    } else {
        (rest, false)
    };
    if src.is_empty() || dst.is_empty() {
        return Err(LauncherError::Configuration(format!(
            "--volume has an empty source or target: {spec:?}"
        )));
    }
    if !Path::new(src).is_absolute() {
        return Err(LauncherError::Configuration(format!(
            "--volume source must be an absolute path: {src:?}"
        )));
    }
    if !Path::new(dst).is_absolute() {
        return Err(LauncherError::Configuration(format!(
            "--volume target must be an absolute path: {dst:?}"
        )));
    }
    Ok(MountSpec {
        host: PathBuf::from(src),
        container: dst.to_string(),
        read_only,
    })
}

/// Fixed container environment matching the mount layout.
pub fn container_env_args() -> Vec<String> {
    vec![
        "-e".to_string(),
        format!("HOME={CONTAINER_HOME}"),
        "-e".to_string(),
        format!("USER={CONTAINER_USER}"),
    ]
}

fn allowed_by_roots(host: &Path, roots: &[PathBuf]) -> bool {
    if roots.is_empty() {
        return true;
    }
    let canon = fs::canonicalize(host).unwrap_or_else(|_| host.to_path_buf());
    roots.iter().any(|root| {
        let root = fs::canonicalize(root).unwrap_or_else(|_| root.clone());
        canon.starts_with(&root)
    })
}

/// Build the ordered mount plan for one invocation.
#[cfg_attr(feature = "trace", tracing::instrument(level = "debug", skip_all))]
pub fn plan_mounts(
    cwd: &Path,
    host_home: &Path,
    user: &[MountSpec],
    cfg: &Config,
) -> Result<Vec<MountSpec>> {
    let mut plan: Vec<MountSpec> = Vec::new();

    // Reserved mounts, fixed order. The socket stays read-write so the
    // sandbox can reach the host engine layer; credentials stay read-only so
    // nothing the wrapper launches can corrupt them.
    plan.push(MountSpec::rw(
        cfg.engine_socket.clone(),
        cfg.engine_socket.display().to_string(),
    ));
    let cred_dir = host_home.join(".claude");
    let _ = fs::create_dir_all(&cred_dir);
    plan.push(MountSpec::ro(cred_dir, format!("{CONTAINER_HOME}/.claude")));
    let cred_file = host_home.join(".claude.json");
    crate::ensure_file_exists(&cred_file).ok();
    plan.push(MountSpec::ro(
        cred_file,
        format!("{CONTAINER_HOME}/.claude.json"),
    ));

    // Path-preserving working-directory mount, skipped when an explicit
    // volume already covers cwd (avoids duplicate/overlapping mounts).
    let covered = user
        .iter()
        .any(|m| cwd.starts_with(Path::new(&m.container)));
    if !covered {
        plan.push(MountSpec::rw(
            cwd.to_path_buf(),
            cwd.display().to_string(),
        ));
    }

    // User volumes: must exist, must respect the allow-list.
    for m in user {
        if !m.host.exists() {
            return Err(LauncherError::Mount(format!(
                "host path does not exist: {}",
                m.host.display()
            )));
        }
        if !allowed_by_roots(&m.host, &cfg.allowed_volume_roots) {
            return Err(LauncherError::Mount(format!(
                "host path {} is outside the configured allowed_volume_roots",
                m.host.display()
            )));
        }
        plan.push(m.clone());
    }

    // Config-file volumes are softer: a stale entry is skipped with a
    // warning instead of failing every invocation in the directory.
    for spec in &cfg.volumes {
        match parse_volume_spec(spec) {
            Ok(m) if !m.host.exists() => {
                crate::warn_print(&format!(
                    "skipping configured volume {}: host path does not exist",
                    m.host.display()
                ));
            }
            Ok(m) => {
                if plan.iter().any(|p| p.container == m.container) {
                    crate::warn_print(&format!(
                        "skipping configured volume {}: container path already mounted",
                        m.container
                    ));
                } else {
                    plan.push(m);
                }
            }
            Err(e) => {
                crate::warn_print(&format!("skipping configured volume {spec:?}: {e}"));
            }
        }
    }

    // Duplicate container paths (reserved vs user or user vs user) are a
    // configuration mistake the engine would otherwise surface much later.
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for m in &plan {
        if !seen.insert(m.container.as_str()) {
            return Err(LauncherError::Mount(format!(
                "duplicate container path in mount plan: {}",
                m.container
            )));
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let m = MountSpec::rw("/tmp", "/tmp");
        assert_eq!(m.render(), "/tmp:/tmp");
        let m = MountSpec::ro("/home/u/.claude", "/home/vibe/.claude");
        assert_eq!(m.render(), "/home/u/.claude:/home/vibe/.claude:ro");
    }

    #[test]
    fn test_parse_volume_spec_shapes() {
        let m = parse_volume_spec("/data:/data").expect("plain");
        assert!(!m.read_only);
        let m = parse_volume_spec("/data:/mnt/data:ro").expect("ro");
        assert!(m.read_only);
        assert_eq!(m.container, "/mnt/data");
        let m = parse_volume_spec("/data:/mnt/data:rw").expect("rw");
        assert!(!m.read_only);
    }

    #[test]
    fn test_parse_volume_spec_rejects_malformed() {
        for bad in ["/data", "", ":", "/data:", ":/data", "rel:/data", "/data:rel"] {
            let err = parse_volume_spec(bad).expect_err(bad);
            assert!(
                matches!(err, LauncherError::Configuration(_)),
                "{bad:?} must be a configuration error, got {err}"
            );
        }
    }
}

//! Create-or-attach lifecycle for session containers.
//!
//! State machine per container name:
//! - Absent  -> create + start (`run -d`, no command: the entrypoint brings
//!              up the nested daemon and idles)
//! - Stopped -> restart in place; mount divergence is surfaced as a warning,
//!              never a silent remount
//! - Running -> no-op; the command is exec'd into the existing container
//!
//! Create is idempotent: when two invocations race on the same name, the
//! engine's name-uniqueness constraint is the only lock: "already exists"
//! from the engine means the other invocation won, and we attach.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::engine::{self, ContainerState};
use crate::errors::{LauncherError, Result};
use crate::mounts::{container_env_args, MountSpec};
use crate::session::Session;
use crate::shell_join;

/// Argument vector for the detached session container (everything after
/// `docker`). No trailing command: the entrypoint idles once ready.
pub fn build_persistent_run_args(
    session: &Session,
    plan: &[MountSpec],
    image: &str,
    cwd: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = vec!["run".into(), "-d".into()];
    args.push("--name".into());
    args.push(session.container_name.clone());
    args.push("--hostname".into());
    args.push(session.container_name.clone());
    // The entrypoint starts a nested engine daemon
    args.push("--privileged".into());
    args.extend(session.label_args());
    args.push("--user".into());
    args.push(session.user_arg());
    for m in plan {
        args.push("-v".into());
        args.push(m.render());
    }
    args.push("-w".into());
    args.push(cwd.display().to_string());
    args.extend(container_env_args());
    args.push(image.to_string());
    args
}

/// Image reference a run would use, without touching the engine (previews).
pub fn preview_image(session: &Session, cfg: &Config) -> String {
    if cfg.image_dir.is_some() {
        session.image_tag()
    } else {
        cfg.image.clone()
    }
}

/// Resolve the image for this session: reuse the per-user tag when present,
/// build it on demand when a build context is configured, otherwise fall
/// back to the configured base reference (pulled by the engine at run time;
/// UID/GID mapping then rests on the `--user` flag alone).
pub fn ensure_image(
    runtime: &Path,
    session: &Session,
    cfg: &Config,
    verbose: bool,
) -> Result<String> {
    let tag = session.image_tag();
    if engine::image_exists(runtime, &tag) {
        return Ok(tag);
    }
    let Some(dir) = cfg.image_dir.as_ref().filter(|d| d.is_dir()) else {
        return Ok(cfg.image.clone());
    };

    let uid_arg = format!("USER_UID={}", session.uid);
    let gid_arg = format!("USER_GID={}", session.gid);
    let args: Vec<String> = vec![
        "build".into(),
        "-t".into(),
        tag.clone(),
        "--build-arg".into(),
        uid_arg,
        "--build-arg".into(),
        gid_arg,
        dir.display().to_string(),
    ];
    if verbose {
        eprintln!("vibecode: docker: {}", preview_line(&args));
    }

    let mut cmd = Command::new(runtime);
    cmd.args(&args);
    if verbose {
        // Let build progress stream to the terminal
        let status = cmd
            .status()
            .map_err(|e| LauncherError::Build(format!("failed to run engine build: {e}")))?;
        if !status.success() {
            return Err(LauncherError::Build(format!(
                "engine build of {tag} exited with {:?}",
                status.code()
            )));
        }
    } else {
        let out = cmd
            .output()
            .map_err(|e| LauncherError::Build(format!("failed to run engine build: {e}")))?;
        if !out.status.success() {
            return Err(LauncherError::Build(
                String::from_utf8_lossy(&out.stderr).trim().to_string(),
            ));
        }
    }
    Ok(tag)
}

/// Ensure a usable, exec-ready container for the session.
#[cfg_attr(
    feature = "trace",
    tracing::instrument(
        level = "info",
        err,
        skip_all,
        fields(container = %session.container_name)
    )
)]
pub fn ensure_container(
    runtime: &Path,
    session: &Session,
    plan: &[MountSpec],
    cfg: &Config,
    cwd: &Path,
    verbose: bool,
) -> Result<()> {
    let name = &session.container_name;
    match engine::inspect_state(runtime, name)? {
        ContainerState::Running => {
            if verbose {
                eprintln!("vibecode: reusing running container {name}");
            }
            Ok(())
        }
        ContainerState::Stopped => {
            warn_if_mount_divergence(runtime, name, plan);
            let out =
                engine::engine_output(runtime, &["start", name.as_str()], Duration::from_secs(30))?;
            if !out.status.success() {
                return Err(LauncherError::Start(out.stderr.trim().to_string()));
            }
            if verbose {
                eprintln!("vibecode: restarted stopped container {name}");
            }
            wait_container_ready(runtime, name, cfg.ready_timeout)
        }
        ContainerState::Absent => {
            let image = ensure_image(runtime, session, cfg, verbose)?;
            let args = build_persistent_run_args(session, plan, &image, cwd);
            if verbose {
                eprintln!("vibecode: docker: {}", preview_line(&args));
            }
            let mut cmd = Command::new(runtime);
            cmd.args(&args);
            let created = if verbose {
                cmd.status().map(|s| s.success())
            } else {
                // run -d prints the container id on stdout; swallow it, keep
                // the status
                cmd.output().map(|o| o.status.success())
            };
            let created = created
                .map_err(|e| LauncherError::Start(format!("failed to invoke engine run: {e}")))?;
            if !created {
                // Concurrent invocations race here; the engine's name
                // uniqueness is the tie-break. If the container exists now,
                // a peer won the race and create counts as success.
                let mut exists_after = false;
                for _ in 0..5 {
                    if engine::inspect_state(runtime, name)? != ContainerState::Absent {
                        exists_after = true;
                        break;
                    }
                    thread::sleep(Duration::from_millis(200));
                }
                if !exists_after {
                    return Err(LauncherError::Start(format!(
                        "engine refused to create container {name}"
                    )));
                }
            }
            wait_container_ready(runtime, name, cfg.ready_timeout)
        }
    }
}

/// Poll until the container accepts exec, at 1-second intervals within a
/// fixed budget. This mirrors the entrypoint's own readiness contract for
/// the nested daemon; outside the window "not accepting exec" is fatal.
pub fn wait_container_ready(runtime: &Path, name: &str, budget: Duration) -> Result<()> {
    let deadline = Instant::now() + budget;
    loop {
        let ok = Command::new(runtime)
            .args(["exec", name, "true"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        if ok {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(LauncherError::Start(format!(
                "container {name} did not accept exec within {}s (nested daemon still starting?)",
                budget.as_secs()
            )));
        }
        thread::sleep(Duration::from_secs(1));
    }
}

fn warn_if_mount_divergence(runtime: &Path, name: &str, plan: &[MountSpec]) {
    let Ok(existing) = engine::container_mounts(runtime, name) else {
        return;
    };
    if existing.is_empty() {
        return;
    }
    let planned: BTreeSet<String> = plan
        .iter()
        .map(|m| format!("{}:{}", m.host.display(), m.container))
        .collect();
    let existing: BTreeSet<String> = existing.into_iter().collect();
    if planned != existing {
        crate::warn_print(&format!(
            "mount plan differs from the recorded mounts of stopped container {name}; \
             restarting it as-is. Remove the container (docker rm {name}) to apply new mounts."
        ));
    }
}

/// Render an engine argument vector as a copy-pasteable preview line.
pub fn preview_line(args: &[String]) -> String {
    let mut full: Vec<String> = Vec::with_capacity(args.len() + 1);
    full.push("docker".to_string());
    full.extend_from_slice(args);
    shell_join(&full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileConfig;
    use crate::session::Session;

    fn test_config() -> Config {
        Config::from_file(FileConfig::default())
    }

    #[test]
    fn test_persistent_run_args_shape() {
        let s = Session::named("demo", 1000, 1000);
        let cwd = Path::new("/work/proj");
        let plan = vec![
            MountSpec::rw("/var/run/docker.sock", "/var/run/docker.sock"),
            MountSpec::rw("/work/proj", "/work/proj"),
        ];
        let args = build_persistent_run_args(&s, &plan, "vibecode:u1000-g1000", cwd);
        assert_eq!(args[0], "run");
        assert_eq!(args[1], "-d");
        let joined = args.join(" ");
        assert!(joined.contains("--name vibecode-demo-1000-1000"));
        assert!(joined.contains("--label vibecode.session=1"));
        assert!(joined.contains("--label vibecode.key=demo"));
        assert!(joined.contains("--user 1000:1000"));
        assert!(joined.contains("-v /work/proj:/work/proj"));
        assert!(joined.contains("-w /work/proj"));
        // image is the final token: no command, the entrypoint idles
        assert_eq!(args.last().map(String::as_str), Some("vibecode:u1000-g1000"));
    }

    #[test]
    fn test_preview_image_prefers_per_user_tag_with_build_context() {
        let s = Session::named("demo", 1000, 1000);
        let mut cfg = test_config();
        cfg.image_dir = None;
        assert_eq!(preview_image(&s, &cfg), cfg.image);
        cfg.image_dir = Some(std::env::temp_dir());
        assert_eq!(preview_image(&s, &cfg), "vibecode:u1000-g1000");
    }

    #[test]
    fn test_preview_line_escapes() {
        let args = vec!["run".to_string(), "a b".to_string()];
        assert_eq!(preview_line(&args), "docker run 'a b'");
    }
}

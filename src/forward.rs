//! Execution forwarding: argv composition, TTY negotiation, signal
//! pass-through, exit-code relay.
//!
//! The remote command is always an argument vector handed to the engine,
//! never a concatenated shell string, so tool arguments pass through
//! byte-exact with no quoting layer in between.

use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus};

use crate::mounts::{container_env_args, MountSpec};
use crate::session::Session;

/// `-it` when a terminal is attached, `-i` otherwise (piped output must stay
/// byte-exact, e.g. `vibecode claude ... | jq`).
pub fn tty_flag() -> &'static str {
    if atty::is(atty::Stream::Stdin) || atty::is(atty::Stream::Stdout) {
        "-it"
    } else {
        "-i"
    }
}

/// Exec argv for a persistent session container (everything after `docker`).
pub fn build_exec_args(
    session: &Session,
    cwd: &Path,
    tool: &str,
    tool_args: &[String],
) -> Vec<String> {
    let mut args: Vec<String> = vec!["exec".into(), tty_flag().into()];
    args.push("-w".into());
    args.push(cwd.display().to_string());
    args.extend(container_env_args());
    args.push(session.container_name.clone());
    args.push(tool.to_string());
    args.extend(tool_args.iter().cloned());
    args
}

/// Foreground `run --rm` argv for an ephemeral invocation: the container
/// carries the command itself and is guaranteed gone afterwards, success or
/// failure.
pub fn build_ephemeral_run_args(
    session: &Session,
    plan: &[MountSpec],
    image: &str,
    cwd: &Path,
    tool: &str,
    tool_args: &[String],
) -> Vec<String> {
    let mut args: Vec<String> = vec!["run".into(), "--rm".into(), tty_flag().into()];
    args.push("--name".into());
    args.push(session.container_name.clone());
    args.push("--hostname".into());
    args.push(session.container_name.clone());
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
    args.push(tool.to_string());
    args.extend(tool_args.iter().cloned());
    args
}

/// Run the composed engine command with inherited streams and return the
/// remote exit code. While the child runs, SIGINT/SIGTERM are ignored in the
/// wrapper: the foreground exec session receives them directly, and the
/// wrapper survives to relay the resulting exit code.
pub fn forward(runtime: &Path, args: &[String]) -> io::Result<i32> {
    let mut cmd = Command::new(runtime);
    cmd.args(args);
    let _guard = ForwardGuard::install();
    let status = cmd.status()?;
    Ok(exit_code_from_status(status))
}

fn exit_code_from_status(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => {
            #[cfg(unix)]
            {
                use std::os::unix::process::ExitStatusExt;
                status.signal().map(|s| 128 + s).unwrap_or(1)
            }
            #[cfg(not(unix))]
            {
                1
            }
        }
    }
}

/// Ignores termination signals for the guard's lifetime, restoring the
/// previous dispositions on drop.
struct ForwardGuard {
    #[cfg(unix)]
    saved: Vec<(nix::sys::signal::Signal, nix::sys::signal::SigAction)>,
}

impl ForwardGuard {
    fn install() -> ForwardGuard {
        #[cfg(unix)]
        {
            use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
            let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
            let mut saved = Vec::new();
            for sig in [Signal::SIGINT, Signal::SIGTERM] {
                if let Ok(prev) = unsafe { sigaction(sig, &ignore) } {
                    saved.push((sig, prev));
                }
            }
            ForwardGuard { saved }
        }
        #[cfg(not(unix))]
        {
            ForwardGuard {}
        }
    }
}

impl Drop for ForwardGuard {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use nix::sys::signal::sigaction;
            for (sig, prev) in self.saved.drain(..) {
                let _ = unsafe { sigaction(sig, &prev) };
            }
        }
    }
}

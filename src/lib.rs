/*!
vibecode: launch AI coding assistants inside disposable Docker-in-Docker
sandboxes.

Each invocation resolves a session identity (explicit `--session` name, the
working directory, or a one-off `--rm` run), plans the container's bind
mounts, ensures a matching container exists and is ready, and forwards the
tool command into it with streams and exit code relayed transparently.

The container engine is the single source of truth: the wrapper keeps no
lock files or databases, and relies on the engine's container-name
uniqueness to make concurrent create-or-attach invocations safe.
*/

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::SystemTime;

pub mod args;
pub mod color;
pub mod config;
pub mod engine;
pub mod errors;
pub mod forward;
pub mod list;
pub mod mounts;
pub mod orchestrator;
pub mod session;
#[cfg(feature = "trace")]
pub mod telemetry;
pub mod ui;
pub mod util;

pub use color::{
    color_enabled_stderr, color_enabled_stdout, log_error_stderr, log_info_stderr,
    log_warn_stderr, paint, set_color_mode, ColorMode,
};
pub use engine::container_engine_path;
pub use errors::{exit_code_for, exit_code_for_io_error, LauncherError};
pub use ui::warn::warn_print;

/// Ensure a file exists by creating parent directories as needed.
pub fn ensure_file_exists(p: &Path) -> io::Result<()> {
    if !p.exists() {
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent)?;
        }
        File::create(p)?;
    }
    Ok(())
}

/// Join arguments with conservative shell escaping (previews only; real
/// execution always passes an argument vector).
pub fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|a| shell_escape(a))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escape a single shell word safely for POSIX sh.
pub fn shell_escape(s: &str) -> String {
    if s.is_empty() {
        "''".to_string()
    } else if s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_=./:@".contains(c))
    {
        s.to_string()
    } else {
        let escaped = s.replace('\'', "'\"'\"'");
        format!("'{}'", escaped)
    }
}

/// Short random token for ephemeral container names (base36, 40 bits).
pub fn create_ephemeral_id() -> String {
    let mut buf = [0u8; 8];
    if getrandom::getrandom(&mut buf).is_err() {
        // Entropy source unavailable: mix time and pid instead
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_else(|_| std::time::Duration::from_secs(0));
        let mix = now.as_nanos() ^ (std::process::id() as u128);
        buf.copy_from_slice(&(mix as u64).to_le_bytes());
    }
    let mut v = u64::from_le_bytes(buf) & 0xff_ffff_ffff;
    let mut s = String::new();
    let alphabet = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if v == 0 {
        s.push('0');
    } else {
        while v > 0 {
            let idx = (v % 36) as usize;
            s.push(alphabet[idx] as char);
            v /= 36;
        }
    }
    s.chars().rev().collect()
}

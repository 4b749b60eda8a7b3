//! Error taxonomy for the launcher.
//!
//! Every wrapper-side failure carries a category prefix so the terminal
//! output tells the user which layer refused: flag parsing, mount planning,
//! the engine itself, or image/container lifecycle. The forwarded command's
//! own failure is never wrapped; its exit code is relayed verbatim.
use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LauncherError {
    /// Bad wrapper flags or volume specs. User-fixable; reported before any
    /// engine call and without side effects.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invalid or colliding mount. Reported before any engine call.
    #[error("mount error: {0}")]
    Mount(String),

    /// The engine daemon is unreachable. Fatal, never retried.
    #[error(
        "engine unavailable: {0}\n\
         Start the Docker daemon (e.g. `sudo systemctl start docker`) or point\n\
         VIBECODE_ENGINE_SOCKET at a reachable engine socket."
    )]
    EngineUnavailable(String),

    /// The engine failed to build the per-user sandbox image.
    #[error("image build failed: {0}")]
    Build(String),

    /// The engine failed to create or start a container, or the container
    /// never accepted exec within the entrypoint's readiness window.
    #[error("container start failed: {0}")]
    Start(String),
}

pub type Result<T> = std::result::Result<T, LauncherError>;

/// Wrapper-side failures all map to exit code 1; the remote command's exit
/// code is propagated separately and never passes through here.
pub fn exit_code_for(e: &LauncherError) -> u8 {
    let _ = e;
    1
}

/// Map an io::Error to a process exit code:
/// - 127 for NotFound (engine binary missing, the command-not-found convention)
/// - 1 for all other errors
pub fn exit_code_for_io_error(e: &io::Error) -> u8 {
    if e.kind() == io::ErrorKind::NotFound {
        127
    } else {
        1
    }
}

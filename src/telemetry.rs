//! Tracing subscriber wiring (cargo feature `trace`).
//!
//! Spans go to stderr; `VIBECODE_LOG` takes the usual env-filter syntax.

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter =
        EnvFilter::try_from_env("VIBECODE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

use std::process::Command;

use vibecode::config::{config_file_path, Config};

pub(crate) fn run_doctor() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("vibecode doctor");
    eprintln!();
    eprintln!(
        "  version: v{} ({}, {})",
        version,
        env!("VIBECODE_BUILD_DATE"),
        env!("VIBECODE_BUILD_TARGET")
    );
    eprintln!("  rustc:   {}", env!("VIBECODE_BUILD_RUSTC"));
    eprintln!(
        "  host:    {} / {}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    eprintln!();

    match vibecode::container_engine_path() {
        Ok(p) => {
            eprintln!("  engine: {}", p.display());
            if let Ok(out) = Command::new(&p).arg("--version").output() {
                let s = String::from_utf8_lossy(&out.stdout).trim().to_string();
                if !s.is_empty() {
                    eprintln!("  engine --version: {}", s);
                }
            }
            match vibecode::engine::ensure_engine_available(&p) {
                Ok(()) => eprintln!("  daemon: reachable"),
                Err(e) => eprintln!("  daemon: unreachable ({e})"),
            }
        }
        Err(e) => {
            eprintln!("  engine: not found ({e})");
        }
    }
    eprintln!();

    let cfg = Config::load();
    eprintln!("  socket:  {}", cfg.engine_socket.display());
    eprintln!("  image:   {}", cfg.image);
    match &cfg.image_dir {
        Some(d) => eprintln!("  build context: {}", d.display()),
        None => eprintln!("  build context: (none; base image is pulled as-is)"),
    }
    if let Some(p) = config_file_path() {
        eprintln!(
            "  config:  {} ({})",
            p.display(),
            if p.exists() { "present" } else { "absent" }
        );
    }

    eprintln!();
    eprintln!("doctor: completed diagnostics.");
}

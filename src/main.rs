use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;

use vibecode::args::{split_wrapper_args, validate_session_name};
use vibecode::config::Config;
use vibecode::errors::{exit_code_for, LauncherError};
use vibecode::mounts::{parse_volume_spec, plan_mounts, MountSpec};
use vibecode::session::{Session, SessionMode};
use vibecode::{color_enabled_stderr, log_error_stderr};
use vibecode::{engine, forward, list, orchestrator};

mod cli;
mod doctor;

fn main() -> ExitCode {
    let raw: Vec<String> = env::args().skip(1).collect();
    // Split the wrapper head from the opaque tool tail before clap sees
    // anything: everything after the first unrecognized token is forwarded
    // verbatim.
    let (head, tail) = split_wrapper_args(&raw);

    let mut argv: Vec<String> = vec!["vibecode".to_string()];
    argv.extend(head);
    let cli = match cli::Cli::try_parse_from(&argv) {
        Ok(c) => c,
        Err(e) => {
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = e.print();
                    ExitCode::SUCCESS
                }
                _ => {
                    let _ = e.print();
                    ExitCode::from(1)
                }
            };
        }
    };

    // The splitter never leaves positionals for clap; the tool tail is `tail`.
    debug_assert!(cli.command.is_empty());

    if let Some(mode) = cli.color {
        vibecode::set_color_mode(mode);
    }
    #[cfg(feature = "trace")]
    vibecode::telemetry::init();

    match run(&cli, &tail) {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            let use_err = color_enabled_stderr();
            log_error_stderr(use_err, &format!("vibecode: {e}"));
            ExitCode::from(exit_code_for(&e))
        }
    }
}

fn run(cli: &cli::Cli, tail: &[String]) -> Result<i32, LauncherError> {
    // --list and --doctor short-circuit: no identity, no mounts, no tool.
    if cli.list {
        let runtime = match engine::container_engine_path() {
            Ok(p) => p,
            Err(e) => return Ok(report_engine_missing(&e)),
        };
        engine::ensure_engine_available(&runtime)?;
        return list::run_list(&runtime, cli.json);
    }
    if cli.doctor {
        doctor::run_doctor();
        return Ok(0);
    }

    if let Some(name) = cli.session.as_deref() {
        validate_session_name(name)?;
        if cli.rm {
            return Err(LauncherError::Configuration(
                "--rm cannot be combined with --session (one-off runs are anonymous)".to_string(),
            ));
        }
    }
    let (tool, tool_args) = tail.split_first().ok_or_else(|| {
        LauncherError::Configuration("no tool given; try `vibecode --help`".to_string())
    })?;

    let mut cfg = Config::load();
    if let Some(image) = cli.image.as_deref() {
        if !image.trim().is_empty() {
            cfg.image = image.to_string();
        }
    }

    let cwd = {
        let p = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        fs::canonicalize(&p).unwrap_or(p)
    };
    let session = Session::resolve(cli.session.as_deref(), cli.rm, &cwd);

    let user_mounts: Vec<MountSpec> = cli
        .volumes
        .iter()
        .map(|spec| parse_volume_spec(spec))
        .collect::<Result<_, _>>()?;
    let host_home = home::home_dir().unwrap_or_else(|| PathBuf::from(""));
    let plan = plan_mounts(&cwd, &host_home, &user_mounts, &cfg)?;

    if cli.verbose {
        eprintln!("vibecode: session: {} ({})", session.key, session.mode.as_str());
        eprintln!("vibecode: container: {}", session.container_name);
    }

    // Dry-run prepares and prints without touching the engine at all.
    if cli.dry_run {
        let image = orchestrator::preview_image(&session, &cfg);
        if session.mode == SessionMode::Ephemeral {
            let args = forward::build_ephemeral_run_args(
                &session, &plan, &image, &cwd, tool, tool_args,
            );
            eprintln!("vibecode: docker: {}", orchestrator::preview_line(&args));
        } else {
            let run_args =
                orchestrator::build_persistent_run_args(&session, &plan, &image, &cwd);
            eprintln!("vibecode: docker: {}", orchestrator::preview_line(&run_args));
            let exec_args = forward::build_exec_args(&session, &cwd, tool, tool_args);
            eprintln!("vibecode: docker: {}", orchestrator::preview_line(&exec_args));
        }
        eprintln!("vibecode: dry-run requested; not executing the engine.");
        return Ok(0);
    }

    let runtime = match engine::container_engine_path() {
        Ok(p) => p,
        Err(e) => return Ok(report_engine_missing(&e)),
    };
    engine::ensure_engine_available(&runtime)?;

    let exec_args = if session.mode == SessionMode::Ephemeral {
        let image = orchestrator::ensure_image(&runtime, &session, &cfg, cli.verbose)?;
        forward::build_ephemeral_run_args(&session, &plan, &image, &cwd, tool, tool_args)
    } else {
        orchestrator::ensure_container(&runtime, &session, &plan, &cfg, &cwd, cli.verbose)?;
        forward::build_exec_args(&session, &cwd, tool, tool_args)
    };
    if cli.verbose {
        eprintln!("vibecode: docker: {}", orchestrator::preview_line(&exec_args));
    }

    // From here on the exit code belongs to the remote command and is
    // relayed verbatim; a tool failure is not a wrapper error.
    forward::forward(&runtime, &exec_args)
        .map_err(|e| LauncherError::Start(format!("failed to invoke engine exec: {e}")))
}

fn report_engine_missing(e: &std::io::Error) -> i32 {
    let use_err = color_enabled_stderr();
    log_error_stderr(use_err, &format!("vibecode: engine unavailable: {e}"));
    i32::from(vibecode::exit_code_for_io_error(e))
}

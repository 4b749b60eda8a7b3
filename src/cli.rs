use clap::Parser;

use vibecode::ColorMode;

#[derive(Parser, Debug)]
#[command(
    name = "vibecode",
    version,
    about = "Run AI coding assistants inside a disposable Docker-in-Docker sandbox with the current directory mounted.",
    override_usage = "vibecode [OPTIONS] TOOL [ARGS...]",
    after_long_help = "Examples:\n  vibecode claude\n  vibecode --session demo bash\n  vibecode --volume /data:/data claude --version\n  vibecode --rm qwen --help\n  vibecode --list --json\n",
    after_help = "\n"
)]
pub(crate) struct Cli {
    /// Reuse a named session instead of deriving one from the working directory
    #[arg(long)]
    pub(crate) session: Option<String>,

    /// Additional bind mount SRC:DST[:ro] (repeatable)
    #[arg(long = "volume")]
    pub(crate) volumes: Vec<String>,

    /// One-off run: auto-remove the container when the command exits
    #[arg(long)]
    pub(crate) rm: bool,

    /// Override the sandbox base image (full ref)
    #[arg(long)]
    pub(crate) image: Option<String>,

    /// Enumerate sessions and exit
    #[arg(long)]
    pub(crate) list: bool,

    /// With --list, emit machine-readable JSON
    #[arg(long)]
    pub(crate) json: bool,

    /// Run environment diagnostics and exit
    #[arg(long)]
    pub(crate) doctor: bool,

    /// Print detailed execution info
    #[arg(long)]
    pub(crate) verbose: bool,

    /// Prepare and print what would run, but do not execute
    #[arg(long)]
    pub(crate) dry_run: bool,

    /// Colorize output: auto|always|never
    #[arg(long = "color", value_enum)]
    pub(crate) color: Option<ColorMode>,

    /// Tool to run inside the sandbox, followed by its arguments (forwarded
    /// verbatim)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub(crate) command: Vec<String>,
}

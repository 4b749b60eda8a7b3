//! Wrapper-flag classification.
//!
//! The wrapper's own flags are a small, closed set; everything from the
//! first unrecognized token onward is the tool name plus an opaque argument
//! tail forwarded verbatim (hyphens included). Splitting happens before clap
//! ever sees the argv, so a tool flag like `--model` can never be mistaken
//! for a wrapper flag.
//!
//! Keep the flag tables in sync with `cli::Cli`.

use crate::errors::{LauncherError, Result};

/// Wrapper flags that consume a separate value argument.
const VALUE_FLAGS: &[&str] = &["--session", "--volume", "--image", "--color"];

/// Wrapper flags that stand alone.
const UNARY_FLAGS: &[&str] = &[
    "--list",
    "--json",
    "--rm",
    "--doctor",
    "--verbose",
    "--dry-run",
    "--help",
    "-h",
    "--version",
    "-V",
];

/// Split raw argv (program name already stripped) into the wrapper-flag head
/// and the `TOOL [ARGS...]` tail. Pure: no validation, no side effects.
pub fn split_wrapper_args(raw: &[String]) -> (Vec<String>, Vec<String>) {
    let mut head = Vec::new();
    let mut i = 0;
    while i < raw.len() {
        let tok = raw[i].as_str();
        if UNARY_FLAGS.contains(&tok) {
            head.push(raw[i].clone());
            i += 1;
            continue;
        }
        if VALUE_FLAGS.contains(&tok) {
            head.push(raw[i].clone());
            if i + 1 < raw.len() {
                head.push(raw[i + 1].clone());
                i += 2;
            } else {
                // missing value: clap reports it against the head
                i += 1;
            }
            continue;
        }
        if let Some((flag, _)) = tok.split_once('=') {
            if VALUE_FLAGS.contains(&flag) {
                head.push(raw[i].clone());
                i += 1;
                continue;
            }
        }
        // First unrecognized token ends wrapper parsing and begins the tool
        break;
    }
    (head, raw[i..].to_vec())
}

/// `--session` must name something; an empty or blank name is a
/// configuration error, not a fall-through to path derivation.
pub fn validate_session_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LauncherError::Configuration(
            "--session requires a non-empty name".to_string(),
        ));
    }
    Ok(())
}

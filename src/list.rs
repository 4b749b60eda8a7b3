//! Session enumeration for `--list`.
//!
//! Pure read over the engine's own records; removal stays an explicit
//! external `docker rm` so a wrapper launched by one AI tool can never
//! delete another session's sandbox.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::engine::{self, SESSION_LABEL};
use crate::errors::Result;

#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub name: String,
    pub state: String,
    pub key: String,
    pub created: String,
}

// {{"\t"}} is the template-level tab; a raw \t would reach the template
// engine as two characters.
const PS_FORMAT: &str =
    r#"{{.Names}}{{"\t"}}{{.State}}{{"\t"}}{{.Label "vibecode.key"}}{{"\t"}}{{.CreatedAt}}"#;

/// All containers carrying the session label, stopped ones included.
pub fn list_sessions(runtime: &Path) -> Result<Vec<SessionRecord>> {
    let filter = format!("label={SESSION_LABEL}");
    let out = engine::engine_output(
        runtime,
        &["ps", "-a", "--filter", filter.as_str(), "--format", PS_FORMAT],
        Duration::from_secs(15),
    )?;
    if !out.status.success() {
        return Err(crate::LauncherError::EngineUnavailable(
            out.stderr.trim().to_string(),
        ));
    }
    Ok(parse_ps_lines(&out.stdout))
}

fn parse_ps_lines(stdout: &str) -> Vec<SessionRecord> {
    let mut records = Vec::new();
    for line in stdout.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.splitn(4, '\t');
        let name = parts.next().unwrap_or("").to_string();
        let state = parts.next().unwrap_or("").to_string();
        let key = parts.next().unwrap_or("").to_string();
        let created = parts.next().unwrap_or("").to_string();
        if name.is_empty() {
            continue;
        }
        records.push(SessionRecord {
            name,
            state,
            key,
            created,
        });
    }
    records
}

pub fn render_plain(records: &[SessionRecord]) -> String {
    records
        .iter()
        .map(|r| format!("{}\t{}\t{}\t{}", r.name, r.state, r.key, r.created))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `--list`: one record per line on stdout (or a JSON array with `--json`),
/// exit 0, including when no sessions exist.
pub fn run_list(runtime: &Path, json: bool) -> Result<i32> {
    let records = list_sessions(runtime)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&records).unwrap_or_else(|_| "[]".to_string())
        );
    } else if !records.is_empty() {
        println!("{}", render_plain(&records));
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ps_lines() {
        let stdout = "vibecode-demo-1000-1000\trunning\tdemo\t2026-08-07 10:00:00 +0000 UTC\n\
                      vibecode-proj-abc123def4567890-1000-1000\texited\t/work/proj\t2026-08-06 09:00:00 +0000 UTC\n";
        let recs = parse_ps_lines(stdout);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].name, "vibecode-demo-1000-1000");
        assert_eq!(recs[0].state, "running");
        assert_eq!(recs[0].key, "demo");
        assert_eq!(recs[1].key, "/work/proj");
    }

    #[test]
    fn test_parse_ps_lines_empty() {
        assert!(parse_ps_lines("").is_empty());
        assert!(parse_ps_lines("\n\n").is_empty());
    }

    #[test]
    fn test_render_plain_and_json_round() {
        let recs = vec![SessionRecord {
            name: "vibecode-demo-1000-1000".into(),
            state: "running".into(),
            key: "demo".into(),
            created: "2026-08-07".into(),
        }];
        let plain = render_plain(&recs);
        assert_eq!(plain, "vibecode-demo-1000-1000\trunning\tdemo\t2026-08-07");
        let json = serde_json::to_string(&recs).expect("serializable");
        assert!(json.contains("\"key\":\"demo\""));
    }
}

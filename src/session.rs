//! Session identity: stable keys and engine-legal container names.
//!
//! Container names must be deterministic so repeated invocations land on the
//! same sandbox, and must embed the invoking UID/GID so a permission change
//! yields a fresh container instead of silently reusing one whose files are
//! owned by somebody else.
//!
//! Name scheme (engine name charset is `[a-zA-Z0-9][a-zA-Z0-9_.-]*`):
//! - named:        `vibecode-<slug>-<uid>-<gid>`
//!   (when sanitizing changed the raw name, a 16-hex FNV-1a hash of the raw
//!   name is inserted so distinct raw names never alias)
//! - path-derived: `vibecode-<basename-slug>-<hash16>-<uid>-<gid>`
//!   (the path itself is the key; `/` is illegal in names, so the readable
//!   basename is kept and the full-path hash makes the mapping collision-free)
//! - ephemeral:    `vibecode-tmp.<id>-<uid>-<gid>`
//!   (sanitizing never emits `.`, so ephemeral names are disjoint from the
//!   other two modes by construction)

use std::fs;
use std::path::Path;

#[cfg(unix)]
use nix::unistd::{getgid, getuid};

/// Fixed prefix for every container this wrapper owns.
pub const NAME_PREFIX: &str = "vibecode";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionMode {
    Named,
    PathDerived,
    Ephemeral,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Named => "named",
            SessionMode::PathDerived => "path",
            SessionMode::Ephemeral => "ephemeral",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Session {
    /// Explicit session name, or the canonical absolute working directory.
    pub key: String,
    pub mode: SessionMode,
    pub container_name: String,
    pub uid: u32,
    pub gid: u32,
}

/// UID/GID of the invoking user (0:0 on non-unix hosts).
pub fn current_uid_gid() -> (u32, u32) {
    #[cfg(unix)]
    {
        (u32::from(getuid()), u32::from(getgid()))
    }
    #[cfg(not(unix))]
    {
        (0, 0)
    }
}

/// Lowercase, keep alphanumerics, collapse everything else into single
/// dashes, trim edges, cap at 40 chars.
pub fn sanitize_session_name(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_dash = false;
    for ch in s.chars() {
        let c = ch.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            out.push(c);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    out.truncate(40);
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Stable 64-bit FNV-1a hash; returns 16-hex lowercase id.
pub fn hash_key_hex(s: &str) -> String {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 1099511628211;
    let mut h: u64 = FNV_OFFSET;
    for b in s.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    format!("{:016x}", h)
}

fn canonical_key(cwd: &Path) -> String {
    let canon = fs::canonicalize(cwd).unwrap_or_else(|_| cwd.to_path_buf());
    canon.to_string_lossy().to_string()
}

impl Session {
    pub fn named(name: &str, uid: u32, gid: u32) -> Session {
        let slug = sanitize_session_name(name);
        let container_name = if slug == name {
            format!("{NAME_PREFIX}-{slug}-{uid}-{gid}")
        } else {
            let slug = if slug.is_empty() { "s".to_string() } else { slug };
            format!("{NAME_PREFIX}-{slug}-{}-{uid}-{gid}", hash_key_hex(name))
        };
        Session {
            key: name.to_string(),
            mode: SessionMode::Named,
            container_name,
            uid,
            gid,
        }
    }

    pub fn path_derived(cwd: &Path, uid: u32, gid: u32) -> Session {
        let key = canonical_key(cwd);
        let base = Path::new(&key)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("root");
        let slug = {
            let s = sanitize_session_name(base);
            if s.is_empty() {
                "root".to_string()
            } else {
                s
            }
        };
        let container_name =
            format!("{NAME_PREFIX}-{slug}-{}-{uid}-{gid}", hash_key_hex(&key));
        Session {
            key,
            mode: SessionMode::PathDerived,
            container_name,
            uid,
            gid,
        }
    }

    pub fn ephemeral(cwd: &Path, uid: u32, gid: u32) -> Session {
        let container_name = format!(
            "{NAME_PREFIX}-tmp.{}-{uid}-{gid}",
            crate::create_ephemeral_id()
        );
        Session {
            key: canonical_key(cwd),
            mode: SessionMode::Ephemeral,
            container_name,
            uid,
            gid,
        }
    }

    /// Map an invocation to its session. Total: this stage has no failure
    /// modes of its own (flag validation happens in the classifier).
    pub fn resolve(name: Option<&str>, ephemeral: bool, cwd: &Path) -> Session {
        let (uid, gid) = current_uid_gid();
        if ephemeral {
            Session::ephemeral(cwd, uid, gid)
        } else if let Some(n) = name {
            Session::named(n, uid, gid)
        } else {
            Session::path_derived(cwd, uid, gid)
        }
    }

    /// Per-user image tag; a UID/GID change never reuses a mismatched image.
    pub fn image_tag(&self) -> String {
        format!("{NAME_PREFIX}:u{}-g{}", self.uid, self.gid)
    }

    /// Engine labels carried by every session container; `--list` filters on
    /// the marker label.
    pub fn label_args(&self) -> Vec<String> {
        vec![
            "--label".to_string(),
            format!("{}=1", crate::engine::SESSION_LABEL),
            "--label".to_string(),
            format!("{}={}", crate::engine::KEY_LABEL, self.key),
            "--label".to_string(),
            format!("{}={}", crate::engine::MODE_LABEL, self.mode.as_str()),
        ]
    }

    pub fn user_arg(&self) -> String {
        format!("{}:{}", self.uid, self.gid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_basic() {
        assert_eq!(sanitize_session_name("Main"), "main");
        assert_eq!(sanitize_session_name("feature/XYZ"), "feature-xyz");
        assert_eq!(sanitize_session_name("a//b__c..d"), "a-b-c-d");
        assert_eq!(sanitize_session_name("/-._Hello_-./"), "hello");
        assert_eq!(sanitize_session_name(""), "");
    }

    #[test]
    fn test_sanitize_never_emits_dot() {
        for raw in ["tmp.x", "a.b.c", "..", "v1.2.3"] {
            assert!(
                !sanitize_session_name(raw).contains('.'),
                "sanitized {raw:?} must not contain a dot"
            );
        }
    }

    #[test]
    fn test_named_clean_name_scheme() {
        let s = Session::named("demo", 1000, 1000);
        assert_eq!(s.container_name, "vibecode-demo-1000-1000");
        assert_eq!(s.key, "demo");
        assert_eq!(s.mode, SessionMode::Named);
    }

    #[test]
    fn test_named_dirty_names_do_not_alias() {
        let a = Session::named("My Work", 1000, 1000);
        let b = Session::named("my/work", 1000, 1000);
        assert_ne!(a.container_name, b.container_name);
        // both collapse to the same slug, so the raw-name hash must differ
        assert!(a.container_name.contains("my-work"));
        assert!(b.container_name.contains("my-work"));
    }

    #[test]
    fn test_hash_is_stable_and_hex() {
        let h = hash_key_hex("/some/path");
        assert_eq!(h.len(), 16);
        assert_eq!(h, hash_key_hex("/some/path"));
        assert_ne!(h, hash_key_hex("/some/other"));
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_ephemeral_disjoint_from_named() {
        let cwd = std::env::temp_dir();
        let e = Session::ephemeral(&cwd, 1000, 1000);
        assert!(e.container_name.contains("-tmp."));
        // a user naming their session "tmp.x" still cannot collide: the dot
        // never survives sanitization
        let n = Session::named("tmp.x", 1000, 1000);
        assert!(!n.container_name.contains("tmp.x"));
    }

    #[test]
    fn test_image_tag_embeds_uid_gid() {
        let s = Session::named("demo", 1000, 984);
        assert_eq!(s.image_tag(), "vibecode:u1000-g984");
    }
}

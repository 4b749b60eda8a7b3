use std::fs;
use std::process::Command;

use vibecode::session::{current_uid_gid, Session};

/// Dry-run composes and prints the full engine command lines without ever
/// touching the engine, so this works on hosts without docker.
#[test]
fn test_cli_dry_run_previews_create_and_exec() {
    let home = tempfile::tempdir().expect("home");
    let work = tempfile::tempdir().expect("work");
    let data = tempfile::tempdir().expect("data");
    let work_canon = fs::canonicalize(work.path()).expect("canon");

    let bin = env!("CARGO_BIN_EXE_vibecode");
    let out = Command::new(bin)
        .args([
            "--session",
            "demo",
            "--dry-run",
            "--volume",
            &format!("{}:/data", data.path().display()),
            "bash",
        ])
        .current_dir(work.path())
        .env("HOME", home.path())
        .env("VIBECODE_CONFIG", home.path().join("absent.yaml"))
        .env("VIBECODE_SKIP_ENGINE", "1")
        .output()
        .expect("failed to run vibecode --dry-run");

    assert!(
        out.status.success(),
        "dry-run exited non-zero: {:?}\nstdout:\n{}\nstderr:\n{}",
        out.status.code(),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );

    let err = String::from_utf8_lossy(&out.stderr);
    let (uid, gid) = current_uid_gid();
    let expected = Session::named("demo", uid, gid).container_name;
    assert!(
        err.contains("vibecode: docker: docker run -d"),
        "expected detached create preview in stderr:\n{err}"
    );
    assert!(
        err.contains("vibecode: docker: docker exec"),
        "expected exec preview in stderr:\n{err}"
    );
    assert!(
        err.contains(&expected),
        "expected container name {expected} in previews:\n{err}"
    );
    assert!(
        err.contains(&format!(
            "{}:{}",
            work_canon.display(),
            work_canon.display()
        )),
        "expected path-preserving workdir mount in previews:\n{err}"
    );
    assert!(
        err.contains("/data"),
        "expected user volume in previews:\n{err}"
    );
    assert!(
        err.contains("dry-run requested"),
        "expected dry-run notice:\n{err}"
    );
}

#[test]
fn test_cli_dry_run_ephemeral_uses_auto_remove() {
    let home = tempfile::tempdir().expect("home");
    let work = tempfile::tempdir().expect("work");

    let bin = env!("CARGO_BIN_EXE_vibecode");
    let out = Command::new(bin)
        .args(["--rm", "--dry-run", "qwen", "--version"])
        .current_dir(work.path())
        .env("HOME", home.path())
        .env("VIBECODE_CONFIG", home.path().join("absent.yaml"))
        .env("VIBECODE_SKIP_ENGINE", "1")
        .output()
        .expect("failed to run vibecode --rm --dry-run");

    assert!(out.status.success(), "exit: {:?}", out.status.code());
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(
        err.contains("docker run --rm"),
        "ephemeral preview must be a foreground auto-removing run:\n{err}"
    );
    assert!(
        !err.contains("docker exec"),
        "ephemeral mode must not exec into a persistent container:\n{err}"
    );
    assert!(
        err.contains("qwen"),
        "forwarded tool must appear in the preview:\n{err}"
    );
}

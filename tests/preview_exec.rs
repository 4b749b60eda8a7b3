use std::path::Path;
use std::time::Duration;

use vibecode::config::Config;
use vibecode::forward::{build_ephemeral_run_args, build_exec_args};
use vibecode::mounts::plan_mounts;
use vibecode::orchestrator::{build_persistent_run_args, preview_line};
use vibecode::session::Session;

fn test_cfg() -> Config {
    Config {
        image: "vibecode/sandbox:latest".to_string(),
        image_dir: None,
        engine_socket: "/var/run/docker.sock".into(),
        ready_timeout: Duration::from_secs(30),
        volumes: Vec::new(),
        allowed_volume_roots: Vec::new(),
    }
}

#[test]
fn test_full_pipeline_plan_to_run_args() {
    let home = tempfile::tempdir().expect("home");
    let work = tempfile::tempdir().expect("work");
    let cfg = test_cfg();
    let session = Session::named("demo", 1000, 1000);

    let plan = plan_mounts(work.path(), home.path(), &[], &cfg).expect("plan");
    let args = build_persistent_run_args(&session, &plan, "vibecode:u1000-g1000", work.path());

    let joined = args.join(" ");
    // every planned mount shows up, in plan order
    let mut last = 0;
    for m in &plan {
        let rendered = m.render();
        let idx = joined.find(&rendered).unwrap_or_else(|| {
            panic!("mount {rendered} missing from run args: {joined}")
        });
        assert!(idx >= last, "mount order must follow the plan: {joined}");
        last = idx;
    }
    assert!(joined.contains(&format!("-w {}", work.path().display())));
    assert!(joined.contains("HOME=/home/vibe"));
}

#[test]
fn test_exec_args_forward_tail_verbatim() {
    let session = Session::named("demo", 1000, 1000);
    let tool_args = vec![
        "--model".to_string(),
        "opus".to_string(),
        "--".to_string(),
        "weird arg with spaces".to_string(),
    ];
    let args = build_exec_args(&session, Path::new("/work"), "claude", &tool_args);
    // the tail is structured argv, never a joined shell string
    let name_idx = args
        .iter()
        .position(|a| a == &session.container_name)
        .expect("container name");
    assert_eq!(args[name_idx + 1], "claude");
    assert_eq!(&args[name_idx + 2..], tool_args.as_slice());

    // the preview escapes for display only
    let preview = preview_line(&args);
    assert!(preview.contains("'weird arg with spaces'"), "{preview}");
}

#[test]
fn test_ephemeral_run_carries_labels_and_user_mapping() {
    let home = tempfile::tempdir().expect("home");
    let work = tempfile::tempdir().expect("work");
    let cfg = test_cfg();
    let session = Session::ephemeral(work.path(), 1000, 984);

    let plan = plan_mounts(work.path(), home.path(), &[], &cfg).expect("plan");
    let args = build_ephemeral_run_args(
        &session,
        &plan,
        "vibecode/sandbox:latest",
        work.path(),
        "bash",
        &[],
    );
    let joined = args.join(" ");
    assert!(joined.starts_with("run --rm"));
    assert!(joined.contains("--label vibecode.session=1"));
    assert!(joined.contains("--label vibecode.mode=ephemeral"));
    assert!(joined.contains("--user 1000:984"));
    assert!(joined.ends_with("vibecode/sandbox:latest bash"));
}

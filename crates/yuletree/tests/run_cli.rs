use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn yuletree(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_yuletree"))
        .env("YULETREE_CONFIG_DIR", config_dir)
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run yuletree")
}

fn snapshots(output: &Output) -> Vec<Value> {
    String::from_utf8(output.stdout.clone())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).expect("snapshot line is json"))
        .collect()
}

#[test]
fn idle_run_holds_the_assembled_tree() {
    let root = TempDir::new().unwrap();
    let output = yuletree(root.path(), &["run", "--fps", "50", "--duration", "500ms", "--every", "10"]);
    assert!(output.status.success(), "{output:?}");

    let lines = snapshots(&output);
    assert!(!lines.is_empty());
    for line in &lines {
        assert_eq!(line["mix_factor"], 1.0);
        assert_eq!(line["target"], 1);
        assert_eq!(line["instances"], 90);
        assert_eq!(line["audio"]["playing"], false);
    }
    assert_eq!(lines.last().unwrap()["elapsed_ms"], 500);
}

#[test]
fn scripted_upload_disperses_then_reassembles() {
    let root = TempDir::new().unwrap();
    let script = root.path().join("script.toml");
    fs::write(
        &script,
        r#"
[[events]]
at = "100ms"
kind = "upload"
count = 60

[[events]]
at = "200ms"
kind = "signature"
text = "Merry Christmas from the whole family"
"#,
    )
    .unwrap();

    let output = yuletree(
        root.path(),
        &[
            "run",
            "--script",
            script.to_str().unwrap(),
            "--fps",
            "50",
            "--duration",
            "6s",
        ],
    );
    assert!(output.status.success(), "{output:?}");
    let lines = snapshots(&output);

    let during = lines
        .iter()
        .find(|line| line["elapsed_ms"] == 1000)
        .expect("frame at 1s");
    assert_eq!(during["target"], 0);
    assert_eq!(during["processing"], true);
    assert_eq!(during["total_photos"], 50);
    assert_eq!(during["photos"].as_array().unwrap().len(), 10);
    assert!(during["mix_factor"].as_f64().unwrap() < 1.0);

    let last = lines.last().unwrap();
    assert_eq!(last["target"], 1);
    assert_eq!(last["processing"], false);
    assert_eq!(last["upload_phase"], "idle");
    assert_eq!(last["mix_factor"], 1.0);
    assert_eq!(last["signature_text"].as_str().unwrap().chars().count(), 20);
    assert_eq!(last["instances"], 60 + 30 + 10);
}

#[test]
fn gesture_file_drives_the_target() {
    let root = TempDir::new().unwrap();
    let gestures = root.path().join("hand.jsonl");
    fs::write(
        &gestures,
        concat!(
            "{\"detected\":true,\"open\":true,\"x\":0.5,\"y\":0.2}\n",
            "{\"detected\":true,\"open\":true,\"x\":0.5,\"y\":0.2}\n",
            "{\"detected\":false}\n",
        ),
    )
    .unwrap();

    let output = yuletree(
        root.path(),
        &[
            "run",
            "--gestures",
            gestures.to_str().unwrap(),
            "--duration",
            "3s",
        ],
    );
    assert!(output.status.success(), "{output:?}");
    let lines = snapshots(&output);

    assert_eq!(lines[0]["target"], 0);
    assert_eq!(lines[0]["pointer"]["active"], true);
    assert_eq!(lines[0]["audio"]["unlocked"], true);
    let last = lines.last().unwrap();
    assert_eq!(last["target"], 0);
    assert_eq!(last["mix_factor"], 0.0);
    assert_eq!(last["pointer"]["active"], false);
    assert!((last["pointer"]["x"].as_f64().unwrap() - 0.6).abs() < 1e-6);
}

#[test]
fn seed_flag_makes_photo_selection_reproducible() {
    let root = TempDir::new().unwrap();
    let script = root.path().join("script.toml");
    fs::write(&script, "[[events]]\nat = \"0s\"\nkind = \"upload\"\ncount = 30\n").unwrap();
    let args = [
        "run",
        "--script",
        script.to_str().unwrap(),
        "--duration",
        "200ms",
        "--every",
        "1000",
        "--seed",
        "99",
    ];
    let first = snapshots(&yuletree(root.path(), &args));
    let second = snapshots(&yuletree(root.path(), &args));
    assert_eq!(first.last().unwrap()["photos"], second.last().unwrap()["photos"]);
    assert_eq!(first.last().unwrap()["photos"].as_array().unwrap().len(), 10);
}

#[test]
fn malformed_script_fails_with_context() {
    let root = TempDir::new().unwrap();
    let script = root.path().join("broken.toml");
    fs::write(&script, "[[events]]\nat = \"1s\"\nkind = \"dance\"\n").unwrap();
    let output = yuletree(root.path(), &["run", "--script", script.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("broken.toml"), "{stderr}");
}

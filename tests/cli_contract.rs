use std::fs;
use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::tempdir;

fn write_settings(path: &Path, yaml: &str) {
    fs::write(path, yaml).expect("settings should write");
}

fn run_cppn(cwd: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_cppn-art"))
        .current_dir(cwd)
        .args(args)
        .output()
        .expect("cppn-art command should run")
}

#[test]
fn check_json_reports_resolved_settings_and_scales() {
    let dir = tempdir().expect("tempdir should create");
    write_settings(
        &dir.path().join("art.yaml"),
        r#"
resolution: 64
activation: sin
z1_speed: 3
seed: 12
"#,
    );

    let output = run_cppn(
        dir.path(),
        &["check", "--config", "art.yaml", "--set", "layers=5", "--json"],
    );
    assert!(output.status.success(), "check --json should succeed");

    let parsed: Value = serde_json::from_slice(&output.stdout).expect("json should parse");
    assert_eq!(parsed["settings"]["resolution"], 64);
    assert_eq!(parsed["settings"]["activation"], "sin");
    assert_eq!(parsed["settings"]["layers"], 5);
    assert_eq!(parsed["z1_scale"], 100.0);
    assert_eq!(parsed["z2_scale"], 102.0);
    assert_eq!(parsed["max_layers"], 10);
}

#[test]
fn check_rejects_unknown_activation() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_cppn(dir.path(), &["check", "--set", "activation=bogus"]);
    assert!(!output.status.success(), "bogus activation should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown activation 'bogus'"), "{stderr}");
}

#[test]
fn check_reports_yaml_location_for_unknown_fields() {
    let dir = tempdir().expect("tempdir should create");
    write_settings(&dir.path().join("art.yaml"), "resolution: 32\ndepth: 3\n");

    let output = run_cppn(dir.path(), &["check", "--config", "art.yaml"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"), "{stderr}");
}

#[test]
fn still_writes_png_of_requested_size() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_cppn(
        dir.path(),
        &[
            "still",
            "--set",
            "resolution=24",
            "--set",
            "seed=5",
            "-o",
            "out/still.png",
        ],
    );
    assert!(output.status.success(), "still should succeed");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Wrote out/still.png"));

    let image = image::open(dir.path().join("out/still.png"))
        .expect("png should decode")
        .to_rgba8();
    assert_eq!(image.dimensions(), (24, 24));
    assert!(image.pixels().all(|pixel| pixel[3] == 255));
}

#[test]
fn frames_writes_numbered_sequence() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_cppn(
        dir.path(),
        &[
            "frames",
            "--set",
            "resolution=16",
            "--set",
            "seed=1",
            "--frames",
            "3",
            "-o",
            "seq",
        ],
    );
    assert!(output.status.success(), "frames should succeed");

    let mut names = fs::read_dir(dir.path().join("seq"))
        .expect("sequence dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    names.sort();
    assert_eq!(
        names,
        vec!["frame_000000.png", "frame_000001.png", "frame_000002.png"]
    );
}

#[test]
fn identical_seeds_render_identical_stills() {
    let dir = tempdir().expect("tempdir should create");
    for name in ["a.png", "b.png"] {
        let output = run_cppn(
            dir.path(),
            &[
                "still",
                "--set",
                "resolution=20",
                "--set",
                "seed=77",
                "--at-frame",
                "4",
                "-o",
                name,
            ],
        );
        assert!(output.status.success(), "still should succeed");
    }

    let a = fs::read(dir.path().join("a.png")).expect("a");
    let b = fs::read(dir.path().join("b.png")).expect("b");
    assert_eq!(a, b);
}

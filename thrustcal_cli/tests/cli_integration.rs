use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Minimal valid TOML config for sim mode, tuned so a full sweep finishes
// in well under a second.
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[sweep]
esc_index = 1
esc_count = 4
step = 400
upper = 8100
lower = 100
warmup_ticks = 2
tick_ms = 1

[band]
spin_min = 0.15
spin_max = 0.95

[timeouts]
telemetry_ms = 10

[safety]
max_run_ms = 500

[link]
mode = "sim"
sim_expo = 0.7
sim_telemetry_ms = 1
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["calibrate"], 0, "expo = ", "stdout")]
#[case(&["self-check"], 0, "self-check ok", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("thrustcal").unwrap();
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => assert.stdout(predicate::str::contains(needle)),
        _ => assert.stderr(predicate::str::contains(needle)),
    };
}

#[test]
fn json_report_recovers_the_sim_expo() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let output = Command::cargo_bin("thrustcal")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("--json")
        .arg("calibrate")
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {:?}", output.stderr);

    let stdout = String::from_utf8(output.stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    let expo = v["expo"].as_f64().unwrap();
    assert!(
        (expo - 0.7).abs() < 0.1,
        "expected expo near 0.7, got {expo}"
    );
    assert!(v["samples"].as_u64().unwrap() > 10);
    assert!(v["duration_ms"].as_u64().is_some());
}

#[test]
fn missing_config_fails_with_a_clear_message() {
    Command::cargo_bin("thrustcal")
        .unwrap()
        .arg("--config")
        .arg("/nonexistent/thrustcal.toml")
        .arg("calibrate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("thrustcal.toml"));
}

#[test]
fn invalid_config_is_rejected_before_running() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[sweep]\nupper = 50\nlower = 100\n").unwrap();

    Command::cargo_bin("thrustcal")
        .unwrap()
        .arg("--config")
        .arg(&path)
        .arg("calibrate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration is invalid"));
}

#[test]
fn log_file_does_not_silence_the_console() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let mut toml = fs::read_to_string(&cfg).unwrap();
    toml.push_str("\n[logging]\nfile = \"run.log\"\n");
    fs::write(&cfg, toml).unwrap();

    // The file appender resolves relative to the working directory.
    let output = Command::cargo_bin("thrustcal")
        .unwrap()
        .current_dir(dir.path())
        .arg("--config")
        .arg(&cfg)
        .arg("calibrate")
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {:?}", output.stderr);

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(
        stderr.contains("calibration run starting"),
        "console logging disappeared: {stderr}"
    );
    assert!(dir.path().join("run.log").exists());
}

#[test]
fn max_run_ms_override_caps_the_sweep() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    // 60 ms covers warm-up (2 ticks) plus a short slice of the sweep; the
    // run must ramp down and still produce a report.
    let output = Command::cargo_bin("thrustcal")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("--json")
        .arg("calibrate")
        .arg("--max-run-ms")
        .arg("60")
        .output()
        .unwrap();
    if output.status.success() {
        let stdout = String::from_utf8(output.stdout).unwrap();
        let v: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
        // A capped run records far fewer samples than the 500 ms sweep.
        assert!(v["samples"].as_u64().unwrap() < 400);
    } else {
        // A very tight ceiling can legitimately leave too few in-band
        // points; that must surface as the structured fit/normalize error.
        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains("reason"), "stderr: {stderr}");
    }
}

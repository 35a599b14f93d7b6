//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary HOME so the
//! stored data never leaks between tests or into the user's profile.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_tickwell"))
        .args(args)
        .env("HOME", home)
        .env_remove("TICKWELL_ENV")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

const RUNNING_EXPORT: &str = r#"{
    "timers": [
        {
            "id": "1760000000000",
            "title": "Imported focus",
            "duration": 1500,
            "remainingTime": 900,
            "isRunning": true,
            "createdAt": 1760000000000,
            "mode": "countdown",
            "whiteNoise": "rain"
        }
    ],
    "whiteNoises": [
        { "id": "rain", "name": "Rain", "file": "/audio/rain.mp3", "isActive": true }
    ],
    "exportDate": "2026-10-16T08:00:00.000Z",
    "version": "1.0"
}"#;

#[test]
fn test_presets() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["presets"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("25:00"));
    assert!(stdout.contains("2:00:00"));
}

#[test]
fn test_timer_list_empty() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["timer", "list", "--json"]);
    assert_eq!(code, 0, "timer list failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed, serde_json::json!([]));
}

#[test]
fn test_import_then_list_is_paused() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("backup.json");
    std::fs::write(&file, RUNNING_EXPORT).unwrap();

    let (code, stdout, _) = run_cli(home.path(), &["data", "import", file.to_str().unwrap()]);
    assert_eq!(code, 0, "import failed");
    assert!(stdout.contains("imported 1 timer(s) and 1 track(s)"));

    let (_, stdout, _) = run_cli(home.path(), &["timer", "list", "--json"]);
    let timers: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(timers[0]["title"], "Imported focus");
    assert_eq!(timers[0]["remainingTime"], 900);
    assert_eq!(timers[0]["isRunning"], false);

    let (_, stdout, _) = run_cli(home.path(), &["noise", "list", "--json"]);
    let tracks: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(tracks[0]["isActive"], false);
}

#[test]
fn test_noise_list_flags_missing_files() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["noise", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("builtin:pink"));
    assert!(!stdout.contains("(missing)"));

    let file = home.path().join("backup.json");
    std::fs::write(&file, RUNNING_EXPORT).unwrap();
    run_cli(home.path(), &["data", "import", file.to_str().unwrap()]);
    let (_, stdout, _) = run_cli(home.path(), &["noise", "list"]);
    assert!(stdout.contains("/audio/rain.mp3  (missing)"));

    let audio = home.path().join(".config/tickwell/audio");
    std::fs::write(audio.join("rain.mp3"), b"ID3").unwrap();
    let (_, stdout, _) = run_cli(home.path(), &["noise", "list"]);
    assert!(!stdout.contains("(missing)"));
}

#[test]
fn test_invalid_import_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("broken.json");
    std::fs::write(&file, r#"{ "timers": [] }"#).unwrap();

    let (code, _, stderr) = run_cli(home.path(), &["data", "import", file.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert!(stderr.contains("whiteNoises"));
}

#[test]
fn test_export_stdout() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["data", "export", "--stdout"]);
    assert_eq!(code, 0);
    let bundle: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(bundle["version"], "1.0");
    assert_eq!(bundle["whiteNoises"].as_array().unwrap().len(), 3);
}

#[test]
fn test_delete_by_list_number() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("backup.json");
    std::fs::write(&file, RUNNING_EXPORT).unwrap();
    run_cli(home.path(), &["data", "import", file.to_str().unwrap()]);

    let (code, stdout, _) = run_cli(home.path(), &["timer", "delete", "1"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Imported focus"));

    let (code, _, stderr) = run_cli(home.path(), &["timer", "delete", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no timer matches"));
}

#[test]
fn test_clear_requires_confirmation() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["data", "clear"]);
    assert_eq!(code, 1);
    let (code, _, _) = run_cli(home.path(), &["data", "clear", "--yes"]);
    assert_eq!(code, 0);
}

#[test]
fn test_config_get_set() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "notifications.sound"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "true");

    let (code, _, _) = run_cli(home.path(), &["config", "set", "notifications.sound", "false"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "notifications.sound"]);
    assert_eq!(stdout.trim(), "false");

    let (code, _, _) = run_cli(home.path(), &["config", "get", "engine.nope"]);
    assert_eq!(code, 1);

    let (code, _, stderr) =
        run_cli(home.path(), &["config", "set", "engine.tick_interval_ms", "100"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown config key"));
}

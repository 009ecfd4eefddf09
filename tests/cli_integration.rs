use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ebus-charging"))
        .args(args)
        .env_remove("EBUS_FLEET")
        .env_remove("RUST_LOG")
        .output()
        .expect("ebus-charging process should run")
}

fn stdout_of(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        output.status.success(),
        "{args:?} failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout should be valid UTF-8")
}

#[test]
fn profile_csv_from_fleet_file() {
    let stdout = stdout_of(&[
        "profile",
        "--fleet",
        "fleets/depot.toml",
        "--vehicle",
        "SB",
        "--format",
        "csv",
    ]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "time_h,soc");
    // fleet file asks for 21 samples
    assert_eq!(lines.len(), 22);
    assert_eq!(lines[1], "0.000000,0.100000");
    assert!(lines[21].ends_with(",0.900000"), "last row: {}", lines[21]);
}

#[test]
fn profile_json_from_preset_by_id() {
    let stdout = stdout_of(&[
        "profile",
        "--preset",
        "mixed_fleet",
        "--vehicle",
        "3",
        "--samples",
        "6",
        "--format",
        "json",
    ]);
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let samples = value["samples"].as_array().expect("samples array");
    assert_eq!(samples.len(), 6);
    assert_eq!(samples[0]["soc"].as_f64(), Some(0.2));
    assert_eq!(samples[5]["soc"].as_f64(), Some(0.95));
}

#[test]
fn duration_reports_hours() {
    let stdout = stdout_of(&["duration", "--vehicle", "SB", "--from", "0.1", "--to", "0.8"]);
    // 0.7 of 300 kWh at 142.5 kW effective
    assert!(stdout.contains("takes 1.47 h"), "stdout: {stdout}");
}

#[test]
fn validate_accepts_presets_and_rejects_unknown() {
    let stdout = stdout_of(&["validate", "--preset", "articulated_bus"]);
    assert!(stdout.contains("fleet is valid"));

    let output = run(&["validate", "--preset", "no_such_fleet"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown preset"));
}

#[test]
fn unknown_vehicle_lists_known_types() {
    let output = run(&["soc", "--vehicle", "XL", "--hours", "1"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SB (1)"), "stderr: {stderr}");
}

use std::process::Command;

use meshui_testkit::assert_close;
use serde_json::Value;

fn run_demo(args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_meshui");
    Command::new(bin)
        .args(["--config", "does/not/exist.toml", "--no-system-font"])
        .args(args)
        .env("RUST_LOG", "error")
        .output()
        .expect("spawn meshui")
}

fn report(args: &[&str]) -> Value {
    let output = run_demo(args);
    assert!(
        output.status.success(),
        "meshui failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is a json report")
}

#[test]
fn keep_all_report_lists_forced_lines() {
    let report = report(&["--text", "ab\\ncd", "--word-break", "keep-all"]);
    let lines = report["lines"].as_array().expect("lines array");
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["text"], "ab");
    assert_eq!(lines[1]["offset"], 3);
    assert_eq!(lines[1]["text"], "cd");
    assert_eq!(report["word_break"], "keep-all");
}

#[test]
fn unknown_word_break_exits_with_error() {
    let output = run_demo(&["--word-break", "anywhere"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("anywhere"), "stderr: {stderr}");
}

#[test]
fn report_file_records_scroll_frames() {
    let path = std::env::temp_dir().join(format!("meshui-report-{}.json", std::process::id()));
    let text = "row\\n".repeat(30);
    let output = run_demo(&[
        "--text",
        &text,
        "--scroll-delta",
        "25",
        "--frames",
        "3",
        "--report",
        path.to_str().expect("utf-8 temp path"),
    ]);
    assert!(output.status.success());
    let report: Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("report written"))
            .expect("valid json");
    assert_eq!(report["scroll"]["frames"].as_array().map(Vec::len), Some(3));
    let y = report["scroll"]["final_state"]["position"][1]
        .as_f64()
        .expect("position y") as f32;
    assert_close(y, 25.0);
}

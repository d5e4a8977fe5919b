#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::TempDir;

fn agentzero(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("agentzero").unwrap();
    cmd.current_dir(dir.path())
        .env("AGENTZERO_ROOT", dir.path())
        .env_remove("KESTRA_WEBHOOK_URL")
        .env_remove("GEMINI_KEYS")
        .env_remove("GEMINI_API_KEY")
        .env_remove("GOOGLE_API_KEY");
    cmd
}

fn write_signals(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("signals.json");
    std::fs::write(&path, body).unwrap();
    path
}

// ---------------------------------------------------------------------------
// agentzero init
// ---------------------------------------------------------------------------

#[test]
fn init_writes_default_config() {
    let dir = TempDir::new().unwrap();
    agentzero(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .agentzero/config.yaml"));

    let raw = std::fs::read_to_string(dir.path().join(".agentzero/config.yaml")).unwrap();
    let yaml: serde_yaml::Value = serde_yaml::from_str(&raw).unwrap();
    assert_eq!(yaml["server"]["port"].as_u64(), Some(3000));
    assert_eq!(yaml["kestra"]["flow_id"].as_str(), Some("github-events"));
}

#[test]
fn init_keeps_existing_config() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".agentzero")).unwrap();
    std::fs::write(
        dir.path().join(".agentzero/config.yaml"),
        "server:\n  port: 4100\n",
    )
    .unwrap();

    agentzero(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:"));

    let raw = std::fs::read_to_string(dir.path().join(".agentzero/config.yaml")).unwrap();
    assert!(raw.contains("4100"));
}

// ---------------------------------------------------------------------------
// agentzero mcs aggregate
// ---------------------------------------------------------------------------

#[test]
fn mcs_aggregate_prints_breakdown() {
    let dir = TempDir::new().unwrap();
    let file = write_signals(
        &dir,
        r#"{"coderabbit":{"status":"approvable"},"vercel":{"status":"ready"},"codecov":{"coverage":90},"shadow_agent":{"critical_issues":0}}"#,
    );

    agentzero(&dir)
        .args(["mcs", "aggregate"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("MCS: 98 (MERGE_CANDIDATE)"))
        .stdout(predicate::str::contains("CodeRabbit: +40 (Approvable)"));
}

#[test]
fn mcs_aggregate_json_applies_build_penalty() {
    let dir = TempDir::new().unwrap();
    let file = write_signals(&dir, r#"{"vercel":{"status":"failed"}}"#);

    let out = agentzero(&dir)
        .args(["--json", "mcs", "aggregate"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    // 20 neutral CodeRabbit, build failure penalty, 0 coverage, +10 shadow agent
    assert_eq!(json["mcs"], 10);
    assert_eq!(json["status"], "AUTOCORRECT");
}

#[test]
fn mcs_aggregate_reads_stdin() {
    let dir = TempDir::new().unwrap();
    agentzero(&dir)
        .args(["mcs", "aggregate", "-"])
        .write_stdin(r#"{"coderabbit":{"status":"changes_requested"}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("CodeRabbit: +0 (Changes Requested)"));
}

#[test]
fn mcs_aggregate_rejects_bad_json() {
    let dir = TempDir::new().unwrap();
    let file = write_signals(&dir, "not json");

    agentzero(&dir)
        .args(["mcs", "aggregate"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid signals JSON"));
}

// ---------------------------------------------------------------------------
// agentzero mcs analyze
// ---------------------------------------------------------------------------

const GEMINI_PATH: &str = "/v1beta/models/gemini-pro:generateContent";

/// Point the Gemini client at `url` through the project config.
fn use_gemini_at(dir: &TempDir, url: &str) {
    std::fs::create_dir_all(dir.path().join(".agentzero")).unwrap();
    std::fs::write(
        dir.path().join(".agentzero/config.yaml"),
        format!("gemini:\n  base_url: {url}\n"),
    )
    .unwrap();
}

fn gemini_reply(text: &str) -> String {
    serde_json::json!({"candidates": [{"content": {"parts": [{"text": text}]}}]}).to_string()
}

#[test]
fn mcs_analyze_returns_model_verdict() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", GEMINI_PATH)
        .match_query(mockito::Matcher::UrlEncoded("key".into(), "ci-key".into()))
        .match_body(mockito::Matcher::Regex("tests failed: 3".into()))
        .with_body(gemini_reply(
            "```json\n{\"mcs\": 35, \"status\": \"AUTOCORRECT\", \"reasoning\": \"Tests are failing.\", \"suggested_fix\": \"npm test\"}\n```",
        ))
        .create();
    use_gemini_at(&dir, &server.url());
    let file = write_signals(&dir, r#"{"ci": "tests failed: 3"}"#);

    let out = agentzero(&dir)
        .env("GEMINI_API_KEY", "ci-key")
        .args(["--json", "mcs", "analyze"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(out.status.success());
    mock.assert();
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["mcs"], 35);
    assert_eq!(json["status"], "AUTOCORRECT");
    assert_eq!(json["suggested_fix"], "npm test");
}

#[test]
fn mcs_analyze_falls_back_when_gemini_fails() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    server
        .mock("POST", GEMINI_PATH)
        .match_query(mockito::Matcher::Any)
        .with_status(500)
        .with_body(r#"{"error": {"message": "internal"}}"#)
        .create();
    use_gemini_at(&dir, &server.url());

    agentzero(&dir)
        .env("GEMINI_API_KEY", "ci-key")
        .args(["mcs", "analyze", "-"])
        .write_stdin("{}")
        .assert()
        .success()
        .stdout(predicate::str::contains("MCS: 0 (NEEDS_REVIEW)"))
        .stdout(predicate::str::contains("AI Analysis Failed: "))
        .stdout(predicate::str::contains("Suggested fix: N/A"));
}

#[test]
fn mcs_analyze_sends_input_errors_as_context() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", GEMINI_PATH)
        .match_query(mockito::Matcher::Any)
        .match_body(mockito::Matcher::Regex("Input parsing failed".into()))
        .with_body(gemini_reply("not json at all"))
        .create();
    use_gemini_at(&dir, &server.url());
    let file = write_signals(&dir, "not json");

    let out = agentzero(&dir)
        .env("GEMINI_API_KEY", "ci-key")
        .args(["--json", "mcs", "analyze"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(out.status.success());
    mock.assert();
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["mcs"], 0);
    assert_eq!(json["status"], "NEEDS_REVIEW");
}

#[test]
fn mcs_analyze_requires_api_key() {
    let dir = TempDir::new().unwrap();
    let file = write_signals(&dir, "{}");

    agentzero(&dir)
        .args(["mcs", "analyze"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing GEMINI_API_KEY"));
}

// ---------------------------------------------------------------------------
// agentzero reports
// ---------------------------------------------------------------------------

#[test]
fn reports_empty_store() {
    let dir = TempDir::new().unwrap();
    agentzero(&dir)
        .arg("reports")
        .assert()
        .success()
        .stdout(predicate::str::contains("No reports."));

    agentzero(&dir)
        .args(["reports", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

// ---------------------------------------------------------------------------
// agentzero relay
// ---------------------------------------------------------------------------

fn frame(body: &[u8]) -> Vec<u8> {
    let mut out = (body.len() as u32).to_ne_bytes().to_vec();
    out.extend_from_slice(body);
    out
}

fn read_frames(mut bytes: &[u8]) -> Vec<serde_json::Value> {
    let mut out = Vec::new();
    while bytes.len() >= 4 {
        let len = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        out.push(serde_json::from_slice(&bytes[4..4 + len]).unwrap());
        bytes = &bytes[4 + len..];
    }
    out
}

#[test]
fn relay_answers_framed_messages_on_stdout() {
    let dir = TempDir::new().unwrap();
    let relay_dir = dir.path().join("relay");

    let mut input = frame(br#"{"type":"GET_CONFIG"}"#);
    input.extend(frame(br#"{"type":"SOMETHING_ELSE"}"#));

    let out = agentzero(&dir)
        .arg("relay")
        .arg("--dir")
        .arg(&relay_dir)
        .write_stdin(input)
        .output()
        .unwrap();
    assert!(out.status.success());

    let replies = read_frames(&out.stdout);
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["success"], true);
    assert_eq!(replies[0]["config"]["dashboardUrl"], "http://localhost:3000/api");
    assert_eq!(replies[1]["error"], "Unknown message type");
    assert!(relay_dir.join("storage.json").exists());
}

#[test]
fn relay_accepts_browser_origin_argument() {
    let dir = TempDir::new().unwrap();
    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("agentzero"))
        .args(["relay", "--dir"])
        .arg(dir.path())
        .arg("chrome-extension://abcdef/")
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(&frame(br#"{"type":"GET_CONFIG"}"#))
        .unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());
    assert_eq!(read_frames(&out.stdout).len(), 1);
}

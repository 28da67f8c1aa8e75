//! CLI integration tests
//!
//! The extraction engines are stood in for by small shell scripts that
//! discard their input and print a canned result.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("tagratio")
}

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

/// Writes an executable engine script that drains stdin and then runs `body`.
fn fake_engine(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, format!("#!/bin/sh\ncat >/dev/null\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn printing_engine(dir: &TempDir, fixture: &str) -> PathBuf {
    let fixture = fs::canonicalize(get_fixture_path(fixture)).unwrap();
    fake_engine(dir, "engine.sh", &format!("cat '{}'", fixture.display()))
}

fn content_cmd(engine: &Path) -> assert_cmd::Command {
    let mut cmd = cmd();
    cmd.arg("--content-engine").arg(engine);
    cmd
}

#[test]
fn test_cli_content_report() {
    let tmp = TempDir::new().unwrap();
    let engine = printing_engine(&tmp, "content.xml");

    content_cmd(&engine)
        .args(["-f", "report", &get_fixture_path("page.html")])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("   <table id=\"result\">"))
        .stdout(predicate::str::contains("<th class=\"id\">4</th>"))
        .stdout(predicate::str::contains("<th class=\"id\">5</th>").not())
        .stdout(predicate::str::contains("<span class=\"text\">Tag ratios &amp; their derivatives</span>"))
        .stdout(predicate::str::contains("<td class=\"number\">0.03</td>"));
}

#[test]
fn test_cli_page_for_file_input() {
    let tmp = TempDir::new().unwrap();
    let engine = printing_engine(&tmp, "content.xml");

    content_cmd(&engine)
        .arg(get_fixture_path("page.html"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<!DOCTYPE html>"))
        .stdout(predicate::str::contains("<title>HTML Text Extraction (CETR)</title>"))
        .stdout(predicate::str::contains("<li class=\"on\"><a href=\"?form=file\">"))
        .stdout(predicate::str::contains("Text extraction succeeded."));
}

#[test]
fn test_cli_stdin_input() {
    let tmp = TempDir::new().unwrap();
    let engine = printing_engine(&tmp, "content.xml");
    let html = fs::read_to_string(get_fixture_path("page.html")).unwrap();

    content_cmd(&engine)
        .arg("-")
        .write_stdin(html)
        .assert()
        .success()
        .stdout(predicate::str::contains("<li class=\"on\"><a href=\"?form=html\">"));
}

#[test]
fn test_cli_text_kind() {
    let tmp = TempDir::new().unwrap();
    let engine = printing_engine(&tmp, "text.txt");

    cmd()
        .arg("--text-engine")
        .arg(&engine)
        .args(["--kind", "text", "-f", "report", &get_fixture_path("page.html")])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("   <table id=\"text\">"))
        .stdout(predicate::str::contains("<td>&lt;Second&gt; &amp; &quot;quoted&quot; line</td>"))
        .stdout(predicate::str::contains("<th>4</th>"))
        .stdout(predicate::str::contains("<th>5</th>").not());
}

#[test]
fn test_cli_json_format() {
    let tmp = TempDir::new().unwrap();
    let engine = printing_engine(&tmp, "content.xml");

    let output = content_cmd(&engine)
        .args(["-f", "json", &get_fixture_path("page.html")])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["kind"], "content");
    let lines = value["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[1]["is_content"], true);
    assert_eq!(lines[1]["units"][1]["content"], "Tag ratios & their derivatives");
}

#[test]
fn test_cli_output_file() {
    let tmp = TempDir::new().unwrap();
    let engine = printing_engine(&tmp, "content.xml");
    let output = tmp.path().join("report.html");

    content_cmd(&engine)
        .args(["-f", "report", "-o", output.to_str().unwrap()])
        .arg(get_fixture_path("page.html"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains("<table id=\"result\">"));
}

#[test]
fn test_cli_engine_failure() {
    let tmp = TempDir::new().unwrap();
    let engine = fake_engine(&tmp, "broken.sh", "echo '<ResultSet>'\nexit 3");

    content_cmd(&engine)
        .arg(get_fixture_path("page.html"))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Extraction engine failed in content-single mode"));
}

#[test]
fn test_cli_malformed_engine_output() {
    let tmp = TempDir::new().unwrap();
    let engine = fake_engine(&tmp, "garbage.sh", "echo 'not a result'");

    content_cmd(&engine)
        .arg(get_fixture_path("page.html"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse content engine output"));
}

#[test]
fn test_cli_unsupported_scheme() {
    cmd()
        .arg("gopher://example.com/")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported URL scheme: \"gopher\""));
}

#[test]
fn test_cli_emit_archive_needs_url() {
    cmd()
        .args(["--emit-archive", &get_fixture_path("page.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs a URL input"));
}

#[test]
fn test_cli_missing_file() {
    cmd()
        .arg("does-not-exist.html")
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_cli_invalid_format() {
    cmd()
        .args(["-f", "markdown", &get_fixture_path("page.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid format"));
}

#[test]
fn test_cli_invalid_kind() {
    cmd()
        .args(["--kind", "summary", &get_fixture_path("page.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid kind"));
}

#[test]
fn test_completions_use_real_flag_names() {
    let bash = fs::read_to_string(Path::new(env!("OUT_DIR")).join("completions/tagratio.bash")).unwrap();
    let help = cmd().arg("--help").assert().success().get_output().stdout.clone();
    let help = String::from_utf8(help).unwrap();
    for flag in ["--emit-archive", "--content-engine", "--text-engine", "--engine-timeout", "--user-agent"] {
        assert!(bash.contains(flag), "completions should offer {flag}");
        assert!(help.contains(flag), "the binary should accept {flag}");
    }
    assert!(!bash.contains("--emit_archive"));
    assert!(!bash.contains("--user_agent"));
}

//! Integration tests for the publish stages of a run

use crate::helpers::{TestWorkspace, run_curator, stderr_of, stdout_of};
use anyhow::Result;

const TOKEN: (&str, &str) = ("CURATOR_AUTH_TOKEN", "test-token");

#[test]
fn test_simplified_upload_publishes_bundle() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_curator(&ws.path, &["rolling", "--upload"], &[TOKEN])?;

  assert!(output.status.success(), "stderr: {}", stderr_of(&output));
  let stdout = stdout_of(&output);
  assert!(stdout.contains("Publish report"));
  assert!(stdout.contains("✅ bundle: https://example.org/bundles/1"));
  Ok(())
}

#[test]
fn test_legacy_upload_runs_all_stages() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_credentials("alice s3cret\n")?;

  let output = run_curator(&ws.path, &["rolling", "--upload", "--legacy-upload"], &[TOKEN])?;

  assert!(output.status.success(), "stderr: {}", stderr_of(&output));
  let stdout = stdout_of(&output);
  assert!(stdout.contains("✅ snapshot: snap-123"));
  assert!(stdout.contains("✅ docs: docs uploaded"));
  assert!(stdout.contains("✅ doc-map: doc map uploaded"));
  assert!(stdout.contains("✅ distro: distro entry for alice"));
  Ok(())
}

#[test]
fn test_snapshot_failure_skips_docs_but_completes_the_run() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_credentials("alice s3cret\n")?;

  let output = run_curator(
    &ws.path,
    &["rolling", "--upload", "--legacy-upload"],
    &[TOKEN, ("FAIL_SNAPSHOT", "1")],
  )?;

  // Partial publish failure still counts as a completed run
  assert!(output.status.success(), "stderr: {}", stderr_of(&output));
  let stdout = stdout_of(&output);
  assert!(stdout.contains("❌ snapshot"));
  assert!(stdout.contains("⏭️  docs: skipped (no snapshot identifier)"));
  assert!(stdout.contains("⏭️  doc-map: skipped (no snapshot identifier)"));
  assert!(stdout.contains("✅ distro: distro entry for alice"));
  assert!(stdout.contains("publish stage(s) failed"));
  assert!(stdout.contains("completed"));
  Ok(())
}

#[test]
fn test_missing_credentials_skip_the_distro_stage() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_curator(&ws.path, &["rolling", "--upload", "--legacy-upload"], &[TOKEN])?;

  assert!(output.status.success(), "stderr: {}", stderr_of(&output));
  let stdout = stdout_of(&output);
  assert!(stdout.contains("✅ snapshot: snap-123"));
  assert!(stdout.contains("⏭️  distro: skipped"));
  Ok(())
}

#[test]
fn test_upload_without_token_is_fatal() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_curator(&ws.path, &["rolling", "--upload"], &[])?;

  assert_eq!(output.status.code(), Some(2));
  assert!(stderr_of(&output).contains("auth token"));
  Ok(())
}

#[test]
fn test_json_report_is_machine_readable() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_curator(&ws.path, &["rolling", "--upload", "--json"], &[TOKEN])?;
  assert!(output.status.success(), "stderr: {}", stderr_of(&output));

  // The report is the only pretty-printed JSON object on stdout
  let stdout = stdout_of(&output);
  let json: String = stdout
    .lines()
    .skip_while(|line| *line != "{")
    .take_while(|line| *line != "}")
    .chain(std::iter::once("}"))
    .map(|line| format!("{}\n", line))
    .collect();

  let report: serde_json::Value = serde_json::from_str(&json)?;
  let entries = report["entries"].as_array().expect("entries array");
  assert_eq!(entries.len(), 1);
  assert_eq!(entries[0]["stage"], "bundle");
  assert_eq!(entries[0]["status"], "succeeded");
  Ok(())
}

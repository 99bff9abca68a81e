//! Integration tests for `curator rolling`

use crate::helpers::{TestWorkspace, rolling_slug, run_curator, stderr_of, stdout_of};
use anyhow::Result;

#[test]
fn test_rolling_run_creates_plan_and_bundle() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let slug = rolling_slug();

  let output = run_curator(&ws.path, &["rolling"], &[])?;

  assert!(output.status.success(), "stderr: {}", stderr_of(&output));
  assert!(ws.plan_path(&slug).exists(), "plan file should be persisted");
  assert!(ws.bundle_path(&slug).exists(), "bundle should be created");
  assert!(ws.log_path(&slug).exists(), "build log should be flushed");

  let stdout = stdout_of(&output);
  assert!(stdout.contains("completed"));
  // Upload disabled: no publish report
  assert!(!stdout.contains("Publish report"));
  Ok(())
}

#[test]
fn test_rolling_plan_contains_derived_packages() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let slug = rolling_slug();

  let output = run_curator(&ws.path, &["rolling"], &[])?;
  assert!(output.status.success(), "stderr: {}", stderr_of(&output));

  let plan: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(ws.plan_path(&slug))?)?;
  assert_eq!(plan["compiler"], "ghc-9.8.2");
  assert_eq!(plan["packages"][0]["name"], "base");
  Ok(())
}

#[test]
fn test_validation_failure_aborts_with_validation_exit_code() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.reject_validation()?;
  let slug = rolling_slug();

  let output = run_curator(&ws.path, &["rolling"], &[])?;

  assert_eq!(output.status.code(), Some(3));
  assert!(stderr_of(&output).contains("validation"));
  // Rejected plan is still inspectable
  assert!(ws.plan_path(&slug).exists());
  assert!(!ws.bundle_path(&slug).exists());
  Ok(())
}

#[test]
fn test_skip_validation_bypasses_rejecting_validator() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.reject_validation()?;

  let output = run_curator(&ws.path, &["rolling", "--skip-validation"], &[])?;

  assert!(output.status.success(), "stderr: {}", stderr_of(&output));
  assert!(stdout_of(&output).contains("Validation skipped"));
  Ok(())
}

#[test]
fn test_missing_config_fails_with_user_exit_code() -> Result<()> {
  let dir = tempfile::tempdir()?;

  let output = run_curator(dir.path(), &["rolling"], &[])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr_of(&output).contains("curator.toml"));
  Ok(())
}

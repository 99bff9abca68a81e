//! Integration tests for `curator train`

use crate::helpers::{TestWorkspace, run_curator, stderr_of, stdout_of};
use anyhow::Result;

#[test]
fn test_major_first_release_is_zero_zero() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_curator(&ws.path, &["train", "major"], &[])?;

  assert!(output.status.success(), "stderr: {}", stderr_of(&output));
  assert!(ws.plan_path("train-0.0").exists());
  assert!(ws.bundle_path("train-0.0").exists());
  Ok(())
}

#[test]
fn test_major_bump_continues_from_greatest_existing() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.seed_train_plan("5.3", "ghc-9.6.4")?;
  ws.seed_train_plan("5.9", "ghc-9.6.4")?;
  ws.seed_train_plan("6.1", "ghc-9.8.2")?;

  let output = run_curator(&ws.path, &["train", "major"], &[])?;

  assert!(output.status.success(), "stderr: {}", stderr_of(&output));
  assert!(ws.plan_path("train-7.0").exists());
  // Major bumps re-baseline: the prior plan is not consulted
  assert!(!ws.path.join("update-constraints.used").exists());
  Ok(())
}

#[test]
fn test_minor_bump_seeds_constraints_from_prior_plan() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.seed_train_plan("5.3", "ghc-9.6.4")?;
  ws.seed_train_plan("5.9", "ghc-9.6.4")?;

  let output = run_curator(&ws.path, &["train", "minor", "--goal", "5"], &[])?;

  assert!(output.status.success(), "stderr: {}", stderr_of(&output));
  assert!(ws.plan_path("train-5.10").exists());
  assert!(ws.path.join("update-constraints.used").exists());

  // The new plan carries the compiler from the updated constraints
  let plan: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(ws.plan_path("train-5.10"))?)?;
  assert_eq!(plan["compiler"], "ghc-9.6.4");
  Ok(())
}

#[test]
fn test_minor_bump_without_matching_base_fails() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.seed_train_plan("6.0", "ghc-9.8.2")?;

  let output = run_curator(&ws.path, &["train", "minor", "--goal", "5"], &[])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr_of(&output).contains("minor bump"));
  assert!(!ws.plan_path("train-5.1").exists());
  Ok(())
}

#[test]
fn test_goal_expression_bounds_the_base() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.seed_train_plan("5.9", "ghc-9.6.4")?;
  ws.seed_train_plan("6.1", "ghc-9.8.2")?;

  // Goal "5.9" is a strict bound, so only 5.3 would match; seed it
  ws.seed_train_plan("5.3", "ghc-9.6.4")?;
  let output = run_curator(&ws.path, &["train", "minor", "--goal", "5.9"], &[])?;

  assert!(output.status.success(), "stderr: {}", stderr_of(&output));
  assert!(ws.plan_path("train-5.4").exists());
  Ok(())
}

#[test]
fn test_malformed_goal_is_a_user_error() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_curator(&ws.path, &["train", "major", "--goal", "lts-8"], &[])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr_of(&output).contains("goal"));
  Ok(())
}

#[test]
fn test_build_failure_aborts_before_bundle_with_partial_log() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.seed_train_plan("5.9", "ghc-9.6.4")?;
  ws.fail_build()?;

  let output = run_curator(&ws.path, &["train", "minor", "--goal", "5"], &[])?;

  assert_eq!(output.status.code(), Some(2));
  let stderr = stderr_of(&output);
  assert!(stderr.contains("Build failed"), "stderr: {}", stderr);

  // Plan was persisted, bundle never attempted
  assert!(ws.plan_path("train-5.10").exists());
  assert!(!ws.bundle_path("train-5.10").exists());

  // The partial log reached the sink before the abort
  let log = std::fs::read_to_string(ws.log_path("train-5.10"))?;
  assert!(log.contains("compiling base"));
  Ok(())
}

#[test]
fn test_verbose_prints_resolved_version() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.seed_train_plan("5.9", "ghc-9.6.4")?;

  let output = run_curator(&ws.path, &["train", "minor", "--goal", "5", "--verbose"], &[])?;

  assert!(output.status.success(), "stderr: {}", stderr_of(&output));
  assert!(stdout_of(&output).contains("5.10"));
  Ok(())
}

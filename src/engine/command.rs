//! Command-backed engine implementations
//!
//! Each collaborator is a configured executable spoken to over a small
//! argv/stdin protocol: structured payloads (constraints, plans) travel as
//! JSON on stdin/stdout, everything else as flags. Secrets go through the
//! child environment, never argv.

use crate::core::error::{CuratorError, CuratorResult, ResultExt};
use crate::engine::{
  BuildExecutor, BuildFailure, BuildOptions, BuildOutput, BundleCodec, Constraints, Plan, PlanEngine, PlanValidator,
  PublishClient, UploadRequest,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Run a tool to completion, feeding `stdin` if given
fn run_tool(bin: &Path, args: &[&str], stdin: Option<&str>, envs: &[(&str, &str)]) -> CuratorResult<Output> {
  let mut command = Command::new(bin);
  command.args(args);
  for (key, value) in envs {
    command.env(key, value);
  }

  let output = if let Some(input) = stdin {
    command.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = command
      .spawn()
      .with_context(|| format!("Failed to run {}", bin.display()))?;
    // stdin was requested as piped above, so take() cannot miss
    if let Some(mut pipe) = child.stdin.take() {
      pipe.write_all(input.as_bytes())?;
    }
    child.wait_with_output()?
  } else {
    command
      .output()
      .with_context(|| format!("Failed to run {}", bin.display()))?
  };

  Ok(output)
}

fn expect_success(bin: &Path, args: &[&str], output: &Output) -> CuratorResult<()> {
  if output.status.success() {
    return Ok(());
  }
  Err(CuratorError::message(format!(
    "{} {} failed: {}",
    bin.display(),
    args.join(" "),
    String::from_utf8_lossy(&output.stderr).trim()
  )))
}

fn stdout_string(output: &Output) -> CuratorResult<String> {
  Ok(String::from_utf8(output.stdout.clone())?.trim().to_string())
}

/// PlanEngine implementation driving the configured solver executable
pub struct CommandPlanEngine {
  bin: PathBuf,
}

impl CommandPlanEngine {
  pub fn new(bin: impl Into<PathBuf>) -> Self {
    Self { bin: bin.into() }
  }
}

impl PlanEngine for CommandPlanEngine {
  fn compute_constraints(&self) -> CuratorResult<Constraints> {
    let args = ["constraints"];
    let output = run_tool(&self.bin, &args, None, &[])?;
    expect_success(&self.bin, &args, &output)?;
    serde_json::from_str(&stdout_string(&output)?).context("Plan engine produced unparseable constraints")
  }

  fn update_constraints(&self, prior: &Plan) -> CuratorResult<Constraints> {
    let args = ["update-constraints"];
    let input = serde_json::to_string(prior)?;
    let output = run_tool(&self.bin, &args, Some(&input), &[])?;
    expect_success(&self.bin, &args, &output)?;
    serde_json::from_str(&stdout_string(&output)?).context("Plan engine produced unparseable constraints")
  }

  fn derive_plan(&self, constraints: &Constraints) -> CuratorResult<Plan> {
    let args = ["plan"];
    let input = serde_json::to_string(constraints)?;
    let output = run_tool(&self.bin, &args, Some(&input), &[])?;
    expect_success(&self.bin, &args, &output)?;
    serde_json::from_str(&stdout_string(&output)?).context("Plan engine produced an unparseable plan")
  }
}

/// PlanValidator implementation: exit status decides, stderr is the reason
pub struct CommandValidator {
  bin: PathBuf,
}

impl CommandValidator {
  pub fn new(bin: impl Into<PathBuf>) -> Self {
    Self { bin: bin.into() }
  }
}

impl PlanValidator for CommandValidator {
  fn validate(&self, plan: &Plan) -> CuratorResult<()> {
    let input = serde_json::to_string(plan)?;
    let output = run_tool(&self.bin, &["validate"], Some(&input), &[])?;
    if output.status.success() {
      Ok(())
    } else {
      Err(CuratorError::Validation {
        reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      })
    }
  }
}

/// BuildExecutor implementation; stdout/stderr of the builder become the log
pub struct CommandBuilder {
  bin: PathBuf,
}

impl CommandBuilder {
  pub fn new(bin: impl Into<PathBuf>) -> Self {
    Self { bin: bin.into() }
  }
}

impl BuildExecutor for CommandBuilder {
  fn execute(&self, plan: &Plan, options: &BuildOptions) -> Result<BuildOutput, BuildFailure> {
    let workers = options.workers.to_string();
    let mut args: Vec<&str> = vec!["build", "--jobs", &workers];
    let install_root = options.install_root.to_string_lossy().into_owned();
    let out_dir = options.out_dir.to_string_lossy().into_owned();
    args.extend(["--install-root", &install_root, "--out", &out_dir]);
    for (enabled, flag) in [
      (options.tests, "--tests"),
      (options.docs, "--docs"),
      (options.profiling, "--profiling"),
      (options.dynamic_executables, "--dynamic-executables"),
      (options.doc_index, "--doc-index"),
      (options.verbose, "--verbose"),
    ] {
      if enabled {
        args.push(flag);
      }
    }

    let input = serde_json::to_string(plan).map_err(|e| BuildFailure {
      reason: format!("Failed to serialize plan for builder: {}", e),
      partial_log: String::new(),
    })?;
    let output = run_tool(&self.bin, &args, Some(&input), &[]).map_err(|e| BuildFailure {
      reason: e.to_string(),
      partial_log: String::new(),
    })?;

    let log = format!(
      "{}{}",
      String::from_utf8_lossy(&output.stdout),
      String::from_utf8_lossy(&output.stderr)
    );

    if output.status.success() {
      Ok(BuildOutput {
        docs_dir: options.out_dir.join("docs"),
        log,
      })
    } else {
      Err(BuildFailure {
        reason: format!("builder exited with {}", output.status),
        partial_log: log,
      })
    }
  }
}

/// BundleCodec implementation
pub struct CommandBundler {
  bin: PathBuf,
}

impl CommandBundler {
  pub fn new(bin: impl Into<PathBuf>) -> Self {
    Self { bin: bin.into() }
  }
}

impl BundleCodec for CommandBundler {
  fn create_bundle(&self, plan: &Plan, slug: &str, docs_dir: &Path, dest: &Path) -> CuratorResult<PathBuf> {
    if let Some(parent) = dest.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let docs = docs_dir.to_string_lossy().into_owned();
    let out = dest.to_string_lossy().into_owned();
    let args = ["bundle", "--kind", slug, "--docs", &docs, "--out", &out];
    let input = serde_json::to_string(plan)?;
    let output = run_tool(&self.bin, &args, Some(&input), &[])?;
    if !output.status.success() {
      return Err(CuratorError::Bundle {
        reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }
    Ok(dest.to_path_buf())
  }
}

/// PublishClient implementation. The auth token and distro credentials reach
/// the uploader through its environment.
pub struct CommandUploader {
  bin: PathBuf,
}

impl CommandUploader {
  pub fn new(bin: impl Into<PathBuf>) -> Self {
    Self { bin: bin.into() }
  }

  fn run_stage(&self, args: &[&str], stdin: Option<&str>, envs: &[(&str, &str)]) -> CuratorResult<String> {
    let output = run_tool(&self.bin, args, stdin, envs)?;
    expect_success(&self.bin, args, &output)?;
    stdout_string(&output)
  }
}

impl PublishClient for CommandUploader {
  fn upload_bundle(&self, bundle: &Path, digest: &str, server_url: &str, token: &str) -> CuratorResult<String> {
    let bundle = bundle.to_string_lossy().into_owned();
    self.run_stage(
      &["bundle", "--server", server_url, "--sha256", digest, &bundle],
      None,
      &[("CURATOR_AUTH_TOKEN", token)],
    )
  }

  fn upload_snapshot(&self, request: &UploadRequest, plan_path: &Path, token: &str) -> CuratorResult<String> {
    let plan = plan_path.to_string_lossy().into_owned();
    self.run_stage(
      &[
        "snapshot",
        "--server",
        &request.server_url,
        "--title",
        &request.title,
        "--slug",
        &request.slug,
        &plan,
      ],
      None,
      &[("CURATOR_AUTH_TOKEN", token)],
    )
  }

  fn upload_docs(&self, docs_dir: &Path, snapshot_id: &str, server_url: &str, token: &str) -> CuratorResult<String> {
    let docs = docs_dir.to_string_lossy().into_owned();
    self.run_stage(
      &["docs", "--server", server_url, "--snapshot", snapshot_id, &docs],
      None,
      &[("CURATOR_AUTH_TOKEN", token)],
    )
  }

  fn upload_doc_map(
    &self,
    docs_dir: &Path,
    snapshot_id: &str,
    server_url: &str,
    token: &str,
  ) -> CuratorResult<String> {
    let docs = docs_dir.to_string_lossy().into_owned();
    self.run_stage(
      &["doc-map", "--server", server_url, "--snapshot", snapshot_id, &docs],
      None,
      &[("CURATOR_AUTH_TOKEN", token)],
    )
  }

  fn upload_distro(
    &self,
    plan_path: &Path,
    distro_name: &str,
    username: &str,
    password: &str,
  ) -> CuratorResult<String> {
    let plan = plan_path.to_string_lossy().into_owned();
    self.run_stage(
      &["distro", "--name", distro_name, &plan],
      None,
      &[("CURATOR_DISTRO_USER", username), ("CURATOR_DISTRO_PASS", password)],
    )
  }
}

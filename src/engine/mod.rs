//! External engine contracts
//!
//! The pipeline has no opinion about how constraints are solved, packages are
//! compiled, bundles are packed or uploads travel the wire. It only depends on
//! the trait contracts in this module; `command.rs` provides the production
//! implementations that drive the configured executables.

pub mod command;
pub mod vcs;

use crate::core::error::{CuratorError, CuratorResult, ResultExt};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Version constraints fed into plan derivation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraints {
  /// Compiler the constraint set targets, e.g. "ghc-9.8.2"
  pub compiler: String,
  #[serde(default)]
  pub packages: Vec<PackageConstraint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConstraint {
  pub name: String,
  pub range: String,
}

/// A resolved build plan: the exact package set for one snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
  pub compiler: String,
  #[serde(default)]
  pub packages: Vec<PlanPackage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanPackage {
  pub name: String,
  pub version: String,
}

impl Plan {
  /// Load a previously accepted plan from its canonical file
  pub fn load(path: &Path) -> CuratorResult<Self> {
    let content =
      std::fs::read_to_string(path).with_context(|| format!("Failed to read plan from {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse plan from {}", path.display()))
  }

  /// Persist the plan as pretty JSON at its canonical path
  pub fn persist(&self, path: &Path) -> CuratorResult<()> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(self)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write plan to {}", path.display()))?;
    Ok(())
  }
}

/// Constraint solving and plan derivation
pub trait PlanEngine {
  /// Fresh constraints from the curated package registry
  fn compute_constraints(&self) -> CuratorResult<Constraints>;

  /// Constraints seeded from a previously accepted plan (minor bumps)
  fn update_constraints(&self, prior: &Plan) -> CuratorResult<Constraints>;

  /// Solve the constraints into an exact plan
  fn derive_plan(&self, constraints: &Constraints) -> CuratorResult<Plan>;
}

/// Plan validation rules
pub trait PlanValidator {
  /// Accept or reject a plan; the Err reason is user-facing
  fn validate(&self, plan: &Plan) -> CuratorResult<()>;
}

/// Options passed to the build executor, derived one-to-one from BuildFlags
#[derive(Debug, Clone)]
pub struct BuildOptions {
  pub tests: bool,
  pub docs: bool,
  pub profiling: bool,
  pub dynamic_executables: bool,
  pub doc_index: bool,
  pub verbose: bool,
  /// Internal build parallelism; the pipeline treats the call as one atomic unit
  pub workers: usize,
  /// Non-global install target under the build directory
  pub install_root: PathBuf,
  /// Where build outputs (including the docs tree) land
  pub out_dir: PathBuf,
}

/// Successful build output
#[derive(Debug, Clone)]
pub struct BuildOutput {
  /// Documentation tree produced by the build, consumed by bundling/publishing
  pub docs_dir: PathBuf,
  /// Full build log text
  pub log: String,
}

/// Build failure carrying whatever log output the executor produced before dying
#[derive(Debug)]
pub struct BuildFailure {
  pub reason: String,
  pub partial_log: String,
}

/// Package compilation and testing
pub trait BuildExecutor {
  /// Build the plan. On failure the partial log must still be returned so the
  /// pipeline can flush it to the log sink before aborting.
  fn execute(&self, plan: &Plan, options: &BuildOptions) -> Result<BuildOutput, BuildFailure>;
}

/// Artifact packaging
pub trait BundleCodec {
  /// Pack the plan, snapshot identity and docs tree into a single bundle file
  fn create_bundle(&self, plan: &Plan, slug: &str, docs_dir: &Path, dest: &Path) -> CuratorResult<PathBuf>;
}

/// Remote publish calls. Opaque network operations returning identifiers or
/// locations; every method is one fault-isolation unit for the coordinator.
pub trait PublishClient: Send + Sync {
  /// Simplified protocol: upload the finished bundle, returns its location
  fn upload_bundle(&self, bundle: &Path, digest: &str, server_url: &str, token: &str) -> CuratorResult<String>;

  /// Legacy stage 1: upload the snapshot contents, returns the snapshot identifier
  fn upload_snapshot(&self, request: &UploadRequest, plan_path: &Path, token: &str) -> CuratorResult<String>;

  /// Legacy stage 2: per-package documentation
  fn upload_docs(&self, docs_dir: &Path, snapshot_id: &str, server_url: &str, token: &str) -> CuratorResult<String>;

  /// Legacy stage 3: documentation index/map
  fn upload_doc_map(&self, docs_dir: &Path, snapshot_id: &str, server_url: &str, token: &str)
  -> CuratorResult<String>;

  /// Legacy stage 4: publish the plan as a named distro entry
  fn upload_distro(
    &self,
    plan_path: &Path,
    distro_name: &str,
    username: &str,
    password: &str,
  ) -> CuratorResult<String>;
}

/// Parameters of a snapshot upload, shaped by the settings' argument mutator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
  pub server_url: String,
  pub title: String,
  pub slug: String,
}

/// Calendar source for rolling identities
pub trait Clock {
  fn today(&self) -> NaiveDate;
}

/// Wall-clock implementation
pub struct SystemClock;

impl Clock for SystemClock {
  fn today(&self) -> NaiveDate {
    chrono::Local::now().date_naive()
  }
}

impl From<BuildFailure> for CuratorError {
  fn from(failure: BuildFailure) -> Self {
    CuratorError::Build {
      reason: failure.reason,
      log_path: None,
    }
  }
}

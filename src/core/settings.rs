//! Resolved per-run settings
//!
//! One `ResolvedSettings` is built per pipeline run, after the release
//! identity is known, and is passed by shared reference to every later stage.
//! The closure-valued fields (title formatter, upload-argument mutator,
//! post-build hook) capture only the resolved identity; nothing mutable.

use crate::core::config::CuratorConfig;
use crate::core::error::CuratorResult;
use crate::core::version::ReleaseVersion;
use crate::engine::UploadRequest;
use crate::engine::vcs::SourceControlClient;
use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Identity of one snapshot run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotId {
  /// Date-keyed snapshot with no version lineage
  Rolling(NaiveDate),
  /// Versioned snapshot on a long-term train
  Train(ReleaseVersion),
}

impl SnapshotId {
  /// Machine-readable identity: `rolling-2026-08-25` or `train-5.10`
  pub fn slug(&self) -> String {
    match self {
      SnapshotId::Rolling(date) => format!("rolling-{}", date.format("%Y-%m-%d")),
      SnapshotId::Train(version) => format!("train-{}", version),
    }
  }

  /// Canonical plan file name for this identity
  pub fn plan_file_name(&self) -> String {
    format!("{}.json", self.slug())
  }
}

impl fmt::Display for SnapshotId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.slug())
  }
}

/// Display title formatter: compiler-version string to human-readable title
pub type TitleFormatter = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Shapes the snapshot upload request for the resolved identity
pub type UploadArgsMutator = Box<dyn Fn(&str, UploadRequest) -> UploadRequest + Send + Sync>;

/// Zero-argument side effect run after publishing; failures are caught by the
/// caller and reported, never propagated
pub type PostBuildHook = Box<dyn Fn() -> CuratorResult<()> + Send + Sync>;

/// Immutable configuration bundle consumed by every pipeline stage
pub struct ResolvedSettings {
  pub snapshot: SnapshotId,
  pub slug: String,
  /// Distro listing name on the package archive
  pub distro_name: String,
  pub plan_path: PathBuf,
  pub build_dir: PathBuf,
  pub log_dir: PathBuf,
  pub bundle_path: PathBuf,
  pub title: TitleFormatter,
  pub upload_args: UploadArgsMutator,
  pub post_build: PostBuildHook,
}

impl ResolvedSettings {
  /// Settings for a rolling build. Constraints are always freshly derived and
  /// the post-build hook is a no-op.
  pub fn for_rolling(date: NaiveDate, config: &CuratorConfig) -> Self {
    let snapshot = SnapshotId::Rolling(date);
    Self::with_common(snapshot, "Rolling".to_string(), Box::new(|| Ok(())), config)
  }

  /// Settings for a train build. The post-build hook stages, commits and
  /// pushes the accepted plan file through the source control client.
  pub fn for_train(version: ReleaseVersion, config: &CuratorConfig, scm: Arc<dyn SourceControlClient>) -> Self {
    let snapshot = SnapshotId::Train(version);
    let plan_path = config.dirs.plans.join(snapshot.plan_file_name());
    let hook: PostBuildHook =
      Box::new(move || scm.commit_and_push(&plan_path, &format!("Accept train snapshot {}", version)));
    Self::with_common(snapshot, "Stable".to_string(), hook, config)
  }

  fn with_common(snapshot: SnapshotId, distro_name: String, post_build: PostBuildHook, config: &CuratorConfig) -> Self {
    let slug = snapshot.slug();

    let title: TitleFormatter = Box::new(move |compiler| display_title(&snapshot, compiler));
    let mutator_slug = slug.clone();
    let upload_args: UploadArgsMutator = Box::new(move |compiler, mut request| {
      request.slug = mutator_slug.clone();
      request.title = display_title(&snapshot, compiler);
      request
    });

    Self {
      slug: slug.clone(),
      distro_name,
      plan_path: config.dirs.plans.join(snapshot.plan_file_name()),
      build_dir: config.dirs.builds.join(&slug),
      log_dir: config.dirs.logs.clone(),
      bundle_path: config.dirs.bundles.join(format!("{}.bundle", slug)),
      snapshot,
      title,
      upload_args,
      post_build,
    }
  }
}

/// Human-readable snapshot title shown on the remote server
fn display_title(snapshot: &SnapshotId, compiler: &str) -> String {
  match snapshot {
    SnapshotId::Rolling(date) => format!("Rolling Snapshot {} ({})", date.format("%Y-%m-%d"), compiler),
    SnapshotId::Train(version) => format!("Stable Train {} ({})", version, compiler),
  }
}

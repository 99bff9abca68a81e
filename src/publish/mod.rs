//! Publish coordination: best-effort fan-out with per-stage failure isolation
//!
//! Everything at or after publish is best-effort. Each remote call is wrapped
//! individually and its outcome appended to the report; one remote outage
//! never prevents sibling artifacts from reaching their destinations, and the
//! run still counts as completed. Only a missing auth token is fatal, since
//! the caller explicitly asked for an upload that cannot happen at all.

pub mod auth;

use crate::core::config::{BuildFlags, CuratorConfig};
use crate::core::error::CuratorResult;
use crate::core::settings::ResolvedSettings;
use crate::engine::{Plan, PublishClient, UploadRequest};
use crate::publish::auth::{AUTH_TOKEN_ENV, auth_token, load_credentials};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

/// One publish stage in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublishStage {
  Bundle,
  Snapshot,
  Docs,
  DocMap,
  Distro,
  PostBuildHook,
}

impl PublishStage {
  pub fn name(&self) -> &'static str {
    match self {
      PublishStage::Bundle => "bundle",
      PublishStage::Snapshot => "snapshot",
      PublishStage::Docs => "docs",
      PublishStage::DocMap => "doc-map",
      PublishStage::Distro => "distro",
      PublishStage::PostBuildHook => "post-build hook",
    }
  }
}

/// Per-stage result; collected into the aggregate report, never aborts early
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PublishOutcome {
  Succeeded { stage: PublishStage, info: String },
  Failed { stage: PublishStage, error: String },
  Skipped { stage: PublishStage, reason: String },
}

impl PublishOutcome {
  pub fn stage(&self) -> PublishStage {
    match self {
      PublishOutcome::Succeeded { stage, .. } => *stage,
      PublishOutcome::Failed { stage, .. } => *stage,
      PublishOutcome::Skipped { stage, .. } => *stage,
    }
  }

  pub fn is_failure(&self) -> bool {
    matches!(self, PublishOutcome::Failed { .. })
  }
}

/// Aggregate end-of-run publish report: exactly one entry per attempted stage
#[derive(Debug, Default, Serialize)]
pub struct PublishReport {
  pub entries: Vec<PublishOutcome>,
}

impl PublishReport {
  pub fn new() -> Self {
    Self::default()
  }

  fn push(&mut self, outcome: PublishOutcome) {
    self.entries.push(outcome);
  }

  /// Record the outcome of one fault-isolated stage call
  fn record(&mut self, stage: PublishStage, result: CuratorResult<String>) -> Option<String> {
    match result {
      Ok(info) => {
        self.push(PublishOutcome::Succeeded {
          stage,
          info: info.clone(),
        });
        Some(info)
      }
      Err(e) => {
        self.push(PublishOutcome::Failed {
          stage,
          error: e.to_string(),
        });
        None
      }
    }
  }

  pub fn failed_stages(&self) -> usize {
    self.entries.iter().filter(|e| e.is_failure()).count()
  }

  /// Print the per-stage summary in the usual icon-per-line form
  pub fn print(&self) {
    println!();
    println!("📦 Publish report");
    for entry in &self.entries {
      match entry {
        PublishOutcome::Succeeded { stage, info } => println!("  ✅ {}: {}", stage.name(), info),
        PublishOutcome::Failed { stage, error } => println!("  ❌ {}: {}", stage.name(), error),
        PublishOutcome::Skipped { stage, reason } => println!("  ⏭️  {}: skipped ({})", stage.name(), reason),
      }
    }
    if self.failed_stages() > 0 {
      println!("⚠️  {} publish stage(s) failed; remaining artifacts were still published", self.failed_stages());
    }
  }
}

/// Fan out the publish stages for one finished build.
///
/// Simplified protocol: a single bundle upload. Legacy protocol: snapshot,
/// docs, doc-map and distro stages in that fixed order; docs and doc-map are
/// independent given the snapshot identifier and run concurrently; the distro
/// stage is independent of the identifier and always runs. The post-build
/// hook runs after all stages, its failure caught and reported.
pub fn publish(
  settings: &ResolvedSettings,
  plan: &Plan,
  docs_dir: &Path,
  client: &dyn PublishClient,
  config: &CuratorConfig,
  flags: &BuildFlags,
) -> CuratorResult<PublishReport> {
  let token = auth_token(std::env::var(AUTH_TOKEN_ENV).ok(), &config.auth.token_file)?;
  let server_url = flags.server.url(&config.servers);

  let mut report = PublishReport::new();

  if flags.legacy_upload {
    publish_legacy(settings, plan, docs_dir, client, config, server_url, &token, &mut report);
  } else {
    let outcome = bundle_digest(&settings.bundle_path)
      .and_then(|digest| client.upload_bundle(&settings.bundle_path, &digest, server_url, &token));
    report.record(PublishStage::Bundle, outcome);
  }

  // Hook failures are caught here and never propagated past the report
  if let Err(e) = (settings.post_build)() {
    report.push(PublishOutcome::Failed {
      stage: PublishStage::PostBuildHook,
      error: e.to_string(),
    });
  }

  Ok(report)
}

#[allow(clippy::too_many_arguments)]
fn publish_legacy(
  settings: &ResolvedSettings,
  plan: &Plan,
  docs_dir: &Path,
  client: &dyn PublishClient,
  config: &CuratorConfig,
  server_url: &str,
  token: &str,
  report: &mut PublishReport,
) {
  // Stage 1: snapshot upload. Its identifier gates stages 2-3.
  let request = (settings.upload_args)(
    &plan.compiler,
    UploadRequest {
      server_url: server_url.to_string(),
      title: String::new(),
      slug: String::new(),
    },
  );
  let snapshot_id = report.record(
    PublishStage::Snapshot,
    client.upload_snapshot(&request, &settings.plan_path, token),
  );

  // Stages 2-3: independent of each other, both need the identifier
  match &snapshot_id {
    Some(id) => {
      let (docs, doc_map) = rayon::join(
        || client.upload_docs(docs_dir, id, server_url, token),
        || client.upload_doc_map(docs_dir, id, server_url, token),
      );
      report.record(PublishStage::Docs, docs);
      report.record(PublishStage::DocMap, doc_map);
    }
    None => {
      for stage in [PublishStage::Docs, PublishStage::DocMap] {
        report.push(PublishOutcome::Skipped {
          stage,
          reason: "no snapshot identifier".to_string(),
        });
      }
    }
  }

  // Stage 4: distro upload, independent of the identifier
  match load_credentials(&config.auth.credentials_file) {
    Some(creds) => {
      report.record(
        PublishStage::Distro,
        client.upload_distro(&settings.plan_path, &settings.distro_name, &creds.username, &creds.password),
      );
    }
    None => {
      report.push(PublishOutcome::Skipped {
        stage: PublishStage::Distro,
        reason: format!(
          "credentials file {} missing or malformed",
          config.auth.credentials_file.display()
        ),
      });
    }
  }
}

/// Sha256 of the bundle artifact, recorded alongside the upload
fn bundle_digest(bundle: &Path) -> CuratorResult<String> {
  let bytes = std::fs::read(bundle)?;
  let digest = Sha256::digest(&bytes);
  Ok(format!("{:x}", digest))
}

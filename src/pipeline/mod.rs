//! The ordered release pipeline
//!
//! Linear, single-threaded, fail-fast until the build is done:
//! resolve → persist plan → validate (optional) → build → bundle → publish.
//! Each stage's side effects complete before the next stage begins. Publish
//! is delegated to the coordinator and by contract never aborts the run.

use crate::core::config::{BuildFlags, CuratorConfig};
use crate::core::error::{CuratorError, CuratorResult, ResultExt};
use crate::core::settings::ResolvedSettings;
use crate::core::version::{BumpKind, Goal, ReleaseRequest, Resolution, resolve, scan_existing};
use crate::engine::vcs::SourceControlClient;
use crate::engine::{BuildExecutor, BuildOptions, BundleCodec, Clock, Plan, PlanEngine, PlanValidator, PublishClient};
use crate::publish::{PublishReport, publish};
use crate::ui::heartbeat::with_heartbeat;
use std::sync::Arc;
use std::time::Duration;

/// Fixed internal parallelism passed to the build executor
const BUILD_WORKERS: usize = 8;

/// Tick interval for the build liveness heartbeat
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// The external collaborators one pipeline run drives
pub struct Engines {
  pub clock: Box<dyn Clock>,
  pub plan_engine: Box<dyn PlanEngine>,
  pub validator: Box<dyn PlanValidator>,
  pub builder: Box<dyn BuildExecutor>,
  pub bundler: Box<dyn BundleCodec>,
  pub uploader: Box<dyn PublishClient>,
  pub scm: Arc<dyn SourceControlClient>,
}

/// Outcome of a completed run; publishing happened only if a report is present
#[derive(Debug)]
pub struct RunOutcome {
  pub slug: String,
  pub report: Option<PublishReport>,
}

/// Drives one release from request to report
pub struct Orchestrator<'a> {
  config: &'a CuratorConfig,
  flags: &'a BuildFlags,
  engines: Engines,
}

impl<'a> Orchestrator<'a> {
  pub fn new(config: &'a CuratorConfig, flags: &'a BuildFlags, engines: Engines) -> Self {
    Self { config, flags, engines }
  }

  /// Run the full pipeline. Everything before the build is fail-fast and
  /// aborts with a diagnostic; publish failures live in the returned report.
  pub fn run(&self, request: &ReleaseRequest) -> CuratorResult<RunOutcome> {
    // Resolve identity and derive the plan; no side effects yet
    let (settings, plan) = self.resolve(request)?;
    println!("🚀 Building {}", settings.slug);

    // Persist before validation so a rejected plan stays inspectable
    plan.persist(&settings.plan_path)?;
    println!("📝 Plan written to {}", settings.plan_path.display());

    if self.flags.skip_validation {
      println!("⏭️  Validation skipped (--skip-validation)");
    } else {
      self.engines.validator.validate(&plan)?;
      println!("✅ Plan validated");
    }

    let docs_dir = self.build(&settings, &plan)?;
    println!("🔨 Build finished");

    let bundle = self
      .engines
      .bundler
      .create_bundle(&plan, &settings.slug, &docs_dir, &settings.bundle_path)?;
    println!("🎁 Bundle created at {}", bundle.display());

    let report = if self.flags.upload {
      let report = publish(
        &settings,
        &plan,
        &docs_dir,
        self.engines.uploader.as_ref(),
        self.config,
        self.flags,
      )?;
      Some(report)
    } else {
      println!("⏭️  Upload disabled; run complete without publishing");
      None
    };

    Ok(RunOutcome {
      slug: settings.slug.clone(),
      report,
    })
  }

  /// Resolve the release identity, derive constraints and the plan, and
  /// build the immutable settings bundle. Fatal on goal or base errors.
  fn resolve(&self, request: &ReleaseRequest) -> CuratorResult<(ResolvedSettings, Plan)> {
    match request {
      ReleaseRequest::Rolling => {
        let date = self.engines.clock.today();
        // Rolling builds always start from fresh constraints
        let constraints = self.engines.plan_engine.compute_constraints()?;
        let plan = self.engines.plan_engine.derive_plan(&constraints)?;
        Ok((ResolvedSettings::for_rolling(date, self.config), plan))
      }
      ReleaseRequest::Train { bump, goal } => {
        let goal = Goal::parse(goal)?;
        let existing = scan_existing(&self.config.dirs.plans)?;
        let resolution = resolve(*bump, &goal, &existing)?;
        if self.flags.verbose {
          println!("🔢 Resolved train version {}", resolution.version);
        }

        // Minor bumps seed constraints from the base version's accepted plan;
        // major bumps re-baseline from scratch
        let constraints = match (bump, resolution) {
          (BumpKind::Minor, Resolution { base: Some(base), .. }) => {
            let prior_path = self
              .config
              .dirs
              .plans
              .join(crate::core::settings::SnapshotId::Train(base).plan_file_name());
            let prior = Plan::load(&prior_path)
              .with_context(|| format!("Minor bump requires the prior plan for {}", base))?;
            self.engines.plan_engine.update_constraints(&prior)?
          }
          _ => self.engines.plan_engine.compute_constraints()?,
        };
        let plan = self.engines.plan_engine.derive_plan(&constraints)?;

        let settings = ResolvedSettings::for_train(resolution.version, self.config, Arc::clone(&self.engines.scm));
        Ok((settings, plan))
      }
    }
  }

  /// Run the build under the heartbeat and flush its log to the log sink,
  /// on success and on failure alike.
  fn build(&self, settings: &ResolvedSettings, plan: &Plan) -> CuratorResult<std::path::PathBuf> {
    std::fs::create_dir_all(&settings.build_dir)?;
    std::fs::create_dir_all(&settings.log_dir)?;

    let options = BuildOptions {
      tests: self.flags.tests,
      docs: self.flags.docs,
      profiling: self.flags.profiling,
      dynamic_executables: self.flags.dynamic_executables,
      doc_index: self.flags.doc_index,
      verbose: self.flags.verbose,
      workers: BUILD_WORKERS,
      install_root: settings.build_dir.join("install"),
      out_dir: settings.build_dir.clone(),
    };

    let result = with_heartbeat(HEARTBEAT_INTERVAL, &settings.slug, || {
      self.engines.builder.execute(plan, &options)
    });

    let log_path = settings.log_dir.join(format!("{}.log", settings.slug));
    match result {
      Ok(output) => {
        std::fs::write(&log_path, &output.log)?;
        Ok(output.docs_dir)
      }
      Err(failure) => {
        // Partial logs are flushed before the run aborts
        std::fs::write(&log_path, &failure.partial_log)?;
        Err(CuratorError::Build {
          reason: failure.reason,
          log_path: Some(log_path),
        })
      }
    }
  }
}

mod core;
mod engine;
mod pipeline;
mod publish;
mod ui;

use crate::core::config::{BuildFlags, CuratorConfig, TargetServer};
use crate::core::error::{CuratorError, print_error};
use crate::core::version::{BumpKind, ReleaseRequest};
use crate::engine::SystemClock;
use crate::engine::command::{CommandBuilder, CommandBundler, CommandPlanEngine, CommandUploader, CommandValidator};
use crate::engine::vcs::SystemGit;
use crate::pipeline::{Engines, Orchestrator};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;

/// Release pipeline orchestrator for curated package-set snapshots
#[derive(Parser)]
#[command(name = "curator")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build a date-stamped rolling snapshot (no version lineage)
  Rolling {
    #[command(flatten)]
    flags: FlagArgs,
  },

  /// Build the next snapshot on a long-term version train
  Train {
    /// Which part of the train version to bump
    #[arg(value_enum)]
    bump: BumpArg,
    /// Goal expression narrowing the bump base: empty, '8', or '8.2'
    #[arg(long, default_value = "")]
    goal: String,
    #[command(flatten)]
    flags: FlagArgs,
  },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BumpArg {
  Major,
  Minor,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum ServerArg {
  #[default]
  Production,
  Staging,
}

#[derive(clap::Args, Debug)]
struct FlagArgs {
  /// Run package test suites during the build
  #[arg(long)]
  tests: bool,
  /// Build per-package documentation
  #[arg(long)]
  docs: bool,
  /// Publish artifacts after a successful build
  #[arg(long)]
  upload: bool,
  /// Build libraries with profiling support
  #[arg(long)]
  profiling: bool,
  /// Link executables dynamically
  #[arg(long)]
  dynamic_executables: bool,
  /// Verbose output
  #[arg(short, long)]
  verbose: bool,
  /// Skip plan validation entirely (no substitute check runs)
  #[arg(long)]
  skip_validation: bool,
  /// Use the legacy multi-stage upload protocol
  #[arg(long)]
  legacy_upload: bool,
  /// Generate the documentation index during the build
  #[arg(long)]
  doc_index: bool,
  /// Remote endpoint to publish to
  #[arg(long, value_enum, default_value_t)]
  server: ServerArg,
  /// Output the publish report as JSON
  #[arg(long)]
  json: bool,
}

impl FlagArgs {
  fn to_build_flags(&self) -> BuildFlags {
    BuildFlags {
      tests: self.tests,
      docs: self.docs,
      upload: self.upload,
      profiling: self.profiling,
      dynamic_executables: self.dynamic_executables,
      verbose: self.verbose,
      skip_validation: self.skip_validation,
      legacy_upload: self.legacy_upload,
      doc_index: self.doc_index,
      server: match self.server {
        ServerArg::Production => TargetServer::Production,
        ServerArg::Staging => TargetServer::Staging,
      },
    }
  }
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();

  let (request, flag_args) = match cli.command {
    Commands::Rolling { flags } => (ReleaseRequest::Rolling, flags),
    Commands::Train { bump, goal, flags } => (
      ReleaseRequest::Train {
        bump: match bump {
          BumpArg::Major => BumpKind::Major,
          BumpArg::Minor => BumpKind::Minor,
        },
        goal,
      },
      flags,
    ),
  };

  if let Err(err) = run(&request, &flag_args) {
    handle_error(err);
  }
}

fn run(request: &ReleaseRequest, flag_args: &FlagArgs) -> Result<(), CuratorError> {
  let working_dir = std::env::current_dir()?;
  let config = CuratorConfig::load(&working_dir)?;
  let flags = flag_args.to_build_flags();

  let engines = Engines {
    clock: Box::new(SystemClock),
    plan_engine: Box::new(CommandPlanEngine::new(&config.tools.plan_engine)),
    validator: Box::new(CommandValidator::new(&config.tools.validator)),
    builder: Box::new(CommandBuilder::new(&config.tools.builder)),
    bundler: Box::new(CommandBundler::new(&config.tools.bundler)),
    uploader: Box::new(CommandUploader::new(&config.tools.uploader)),
    scm: Arc::new(SystemGit::new(
      &working_dir,
      config.scm.remote.as_str(),
      config.scm.branch.as_str(),
    )),
  };

  let orchestrator = Orchestrator::new(&config, &flags, engines);
  let outcome = orchestrator.run(request)?;

  if let Some(report) = &outcome.report {
    if flag_args.json {
      println!("{}", serde_json::to_string_pretty(report)?);
    } else {
      report.print();
    }
  }
  println!();
  println!("✅ Run for {} completed", outcome.slug);

  Ok(())
}

fn handle_error(err: CuratorError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}

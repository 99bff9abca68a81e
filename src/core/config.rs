//! Configuration for curator
//!
//! `curator.toml` supplies the directory layout, remote endpoints, the
//! external engine executables and the side files used for publishing.
//! Build flags come from the CLI and stay separate; they are pure per-run
//! configuration with no derived state.

use crate::core::error::{ConfigError, CuratorError, CuratorResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for curator
/// Searched in order: curator.toml, .curator.toml, .config/curator.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuratorConfig {
  #[serde(default)]
  pub dirs: DirsConfig,
  #[serde(default)]
  pub servers: ServersConfig,
  pub tools: ToolsConfig,
  #[serde(default)]
  pub auth: AuthConfig,
  #[serde(default)]
  pub scm: ScmConfig,
}

/// Directory layout, relative to the config's directory unless absolute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirsConfig {
  #[serde(default = "default_plans_dir")]
  pub plans: PathBuf,
  #[serde(default = "default_builds_dir")]
  pub builds: PathBuf,
  #[serde(default = "default_logs_dir")]
  pub logs: PathBuf,
  #[serde(default = "default_bundles_dir")]
  pub bundles: PathBuf,
}

fn default_plans_dir() -> PathBuf {
  PathBuf::from("plans")
}

fn default_builds_dir() -> PathBuf {
  PathBuf::from("builds")
}

fn default_logs_dir() -> PathBuf {
  PathBuf::from("logs")
}

fn default_bundles_dir() -> PathBuf {
  PathBuf::from("bundles")
}

impl Default for DirsConfig {
  fn default() -> Self {
    Self {
      plans: default_plans_dir(),
      builds: default_builds_dir(),
      logs: default_logs_dir(),
      bundles: default_bundles_dir(),
    }
  }
}

/// Remote publish endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServersConfig {
  #[serde(default = "default_production_url")]
  pub production: String,
  #[serde(default = "default_staging_url")]
  pub staging: String,
}

fn default_production_url() -> String {
  "https://snapshots.example.org".to_string()
}

fn default_staging_url() -> String {
  "https://staging.snapshots.example.org".to_string()
}

impl Default for ServersConfig {
  fn default() -> Self {
    Self {
      production: default_production_url(),
      staging: default_staging_url(),
    }
  }
}

/// External engine executables driven via std::process::Command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
  /// Constraint solver / plan generator
  pub plan_engine: PathBuf,
  /// Plan validator
  pub validator: PathBuf,
  /// Package build executor
  pub builder: PathBuf,
  /// Bundle packager
  pub bundler: PathBuf,
  /// Remote upload client
  pub uploader: PathBuf,
}

/// Side files for publish authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
  /// Fallback token file, used when CURATOR_AUTH_TOKEN is unset
  #[serde(default = "default_token_file")]
  pub token_file: PathBuf,
  /// Two whitespace-separated tokens (username, password) for the distro upload
  #[serde(default = "default_credentials_file")]
  pub credentials_file: PathBuf,
}

fn default_token_file() -> PathBuf {
  PathBuf::from("curator-token.txt")
}

fn default_credentials_file() -> PathBuf {
  PathBuf::from("distro-credentials.txt")
}

impl Default for AuthConfig {
  fn default() -> Self {
    Self {
      token_file: default_token_file(),
      credentials_file: default_credentials_file(),
    }
  }
}

/// Where accepted train plans are committed and pushed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScmConfig {
  #[serde(default = "default_remote")]
  pub remote: String,
  #[serde(default = "default_branch")]
  pub branch: String,
}

fn default_remote() -> String {
  "origin".to_string()
}

fn default_branch() -> String {
  "main".to_string()
}

impl Default for ScmConfig {
  fn default() -> Self {
    Self {
      remote: default_remote(),
      branch: default_branch(),
    }
  }
}

impl CuratorConfig {
  /// Find config file in search order: curator.toml, .curator.toml, .config/curator.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("curator.toml"),
      path.join(".curator.toml"),
      path.join(".config").join("curator.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from curator.toml (searches multiple locations)
  pub fn load(path: &Path) -> CuratorResult<Self> {
    let config_path = Self::find_config_path(path).ok_or_else(|| {
      CuratorError::Config(ConfigError::NotFound {
        root: path.to_path_buf(),
      })
    })?;

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: CuratorConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config.validate()?;

    Ok(config.anchored_at(config_path.parent().unwrap_or(path)))
  }

  /// Validate tool entries; everything else has usable defaults
  pub fn validate(&self) -> CuratorResult<()> {
    for (field, path) in [
      ("tools.plan_engine", &self.tools.plan_engine),
      ("tools.validator", &self.tools.validator),
      ("tools.builder", &self.tools.builder),
      ("tools.bundler", &self.tools.bundler),
      ("tools.uploader", &self.tools.uploader),
    ] {
      if path.as_os_str().is_empty() {
        return Err(CuratorError::Config(ConfigError::MissingField {
          field: field.to_string(),
        }));
      }
    }
    Ok(())
  }

  /// Resolve relative directories and side files against the config location
  fn anchored_at(mut self, root: &Path) -> Self {
    let anchor = |p: &mut PathBuf| {
      if p.is_relative() {
        *p = root.join(&*p);
      }
    };
    anchor(&mut self.dirs.plans);
    anchor(&mut self.dirs.builds);
    anchor(&mut self.dirs.logs);
    anchor(&mut self.dirs.bundles);
    anchor(&mut self.auth.token_file);
    anchor(&mut self.auth.credentials_file);
    self
  }
}

/// Target server selector for publishing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetServer {
  #[default]
  Production,
  Staging,
}

impl TargetServer {
  /// Resolve to the configured endpoint URL
  pub fn url<'a>(&self, servers: &'a ServersConfig) -> &'a str {
    match self {
      TargetServer::Production => &servers.production,
      TargetServer::Staging => &servers.staging,
    }
  }
}

/// Per-run build toggles, mapped one-to-one from CLI flags
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildFlags {
  pub tests: bool,
  pub docs: bool,
  pub upload: bool,
  pub profiling: bool,
  pub dynamic_executables: bool,
  pub verbose: bool,
  pub skip_validation: bool,
  pub legacy_upload: bool,
  pub doc_index: bool,
  pub server: TargetServer,
}

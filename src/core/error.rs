//! Error types for curator with contextual messages and exit codes
//!
//! This module provides a unified error type that categorizes errors and provides
//! contextual help messages to users. Fatal errors map to process exit codes;
//! per-stage publish failures never surface here (they live in the publish report).

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for curator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid goal expressions, missing base versions)
  User = 1,
  /// System error (engines, git, I/O)
  System = 2,
  /// Validation failure (plan rejected by the validator)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for curator
#[derive(Debug)]
pub enum CuratorError {
  /// Version resolution errors (goal parsing, missing bump base)
  Version(VersionError),

  /// Configuration errors
  Config(ConfigError),

  /// Plan rejected by the validator
  Validation { reason: String },

  /// Build executor failure
  Build { reason: String, log_path: Option<PathBuf> },

  /// Bundle creation failure
  Bundle { reason: String },

  /// Fatal publish failure (e.g. upload requested but no auth token available)
  Publish { reason: String },

  /// Git operation errors
  Git(GitError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl CuratorError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    CuratorError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      CuratorError::Message { message, context, help } => CuratorError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      other => CuratorError::Message {
        message: other.to_string(),
        context: Some(ctx_str),
        help: other.help_message(),
      },
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      CuratorError::Version(_) => ExitCode::User,
      CuratorError::Config(_) => ExitCode::User,
      CuratorError::Validation { .. } => ExitCode::Validation,
      CuratorError::Build { .. } => ExitCode::System,
      CuratorError::Bundle { .. } => ExitCode::System,
      CuratorError::Publish { .. } => ExitCode::System,
      CuratorError::Git(_) => ExitCode::System,
      CuratorError::Io(_) => ExitCode::System,
      CuratorError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      CuratorError::Version(e) => e.help_message(),
      CuratorError::Config(e) => e.help_message(),
      CuratorError::Publish { .. } => Some(
        "Set the CURATOR_AUTH_TOKEN environment variable or write the token to the configured token file.".to_string(),
      ),
      CuratorError::Build { log_path: Some(path), .. } => {
        Some(format!("Full build log written to {}", path.display()))
      }
      CuratorError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for CuratorError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CuratorError::Version(e) => write!(f, "{}", e),
      CuratorError::Config(e) => write!(f, "{}", e),
      CuratorError::Validation { reason } => write!(f, "Plan validation failed: {}", reason),
      CuratorError::Build { reason, .. } => write!(f, "Build failed: {}", reason),
      CuratorError::Bundle { reason } => write!(f, "Bundle creation failed: {}", reason),
      CuratorError::Publish { reason } => write!(f, "Publish failed: {}", reason),
      CuratorError::Git(e) => write!(f, "{}", e),
      CuratorError::Io(e) => write!(f, "I/O error: {}", e),
      CuratorError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for CuratorError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      CuratorError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for CuratorError {
  fn from(err: io::Error) -> Self {
    CuratorError::Io(err)
  }
}

impl From<String> for CuratorError {
  fn from(msg: String) -> Self {
    CuratorError::message(msg)
  }
}

impl From<&str> for CuratorError {
  fn from(msg: &str) -> Self {
    CuratorError::message(msg)
  }
}

impl From<toml_edit::TomlError> for CuratorError {
  fn from(err: toml_edit::TomlError) -> Self {
    CuratorError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for CuratorError {
  fn from(err: toml_edit::de::Error) -> Self {
    CuratorError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for CuratorError {
  fn from(err: toml_edit::ser::Error) -> Self {
    CuratorError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<serde_json::Error> for CuratorError {
  fn from(err: serde_json::Error) -> Self {
    CuratorError::message(format!("JSON error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for CuratorError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    CuratorError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Version resolution errors
#[derive(Debug)]
pub enum VersionError {
  /// Malformed goal expression
  GoalParse { expression: String },

  /// Minor bump requested but no existing version matches the goal
  MissingBase { goal: String },
}

impl VersionError {
  fn help_message(&self) -> Option<String> {
    match self {
      VersionError::GoalParse { .. } => {
        Some("A goal is empty (accept all), a major version like '8', or a bound like '8.2'.".to_string())
      }
      VersionError::MissingBase { .. } => {
        Some("Minor bumps continue an existing train. Run a major bump first to start one.".to_string())
      }
    }
  }
}

impl fmt::Display for VersionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionError::GoalParse { expression } => {
        write!(f, "Invalid goal expression: '{}'", expression)
      }
      VersionError::MissingBase { goal } => {
        write!(f, "No existing train version matches goal '{}' to base a minor bump on", goal)
      }
    }
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// curator.toml not found
  NotFound { root: PathBuf },

  /// Missing required field
  MissingField { field: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => Some("Create a curator.toml in the working directory.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { root } => {
        write!(f, "No curator configuration found.\nExpected file: {}/curator.toml", root.display())
      }
      ConfigError::MissingField { field } => {
        write!(f, "Missing required field in config: {}", field)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Push failed
  PushFailed {
    remote: String,
    branch: String,
    reason: String,
  },
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::PushFailed { remote, branch, reason } => {
        write!(f, "Push to {}/{} failed: {}", remote, branch, reason)
      }
    }
  }
}

/// Result type alias for curator
pub type CuratorResult<T> = Result<T, CuratorError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> CuratorResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> CuratorResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<CuratorError>,
{
  fn context(self, ctx: impl Into<String>) -> CuratorResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> CuratorResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with colors and help text
pub fn print_error(error: &CuratorError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

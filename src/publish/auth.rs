//! Publish authentication from environment and side files
//!
//! The auth token comes from CURATOR_AUTH_TOKEN, falling back to a token
//! file. Distro credentials live in their own side file; a missing or
//! malformed file is ordinary data (None), never an error: the distro stage
//! is skipped with a diagnostic instead.

use crate::core::error::{CuratorError, CuratorResult};
use std::path::Path;

/// Environment variable consulted before the token side file
pub const AUTH_TOKEN_ENV: &str = "CURATOR_AUTH_TOKEN";

/// Username/password pair for the distro upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
  pub username: String,
  pub password: String,
}

/// Resolve the publish auth token: env value first, then the side file.
/// Missing both is fatal to publishing; upload was explicitly requested.
pub fn auth_token(env_token: Option<String>, token_file: &Path) -> CuratorResult<String> {
  if let Some(token) = env_token
    && !token.trim().is_empty()
  {
    return Ok(token.trim().to_string());
  }

  if let Ok(content) = std::fs::read_to_string(token_file) {
    let token = content.trim();
    if !token.is_empty() {
      return Ok(token.to_string());
    }
  }

  Err(CuratorError::Publish {
    reason: format!(
      "No auth token: {} is unset and {} is missing or empty",
      AUTH_TOKEN_ENV,
      token_file.display()
    ),
  })
}

/// Read distro credentials: exactly two whitespace-separated tokens.
/// Absence or malformed content yields None.
pub fn load_credentials(path: &Path) -> Option<Credentials> {
  let content = std::fs::read_to_string(path).ok()?;
  let mut tokens = content.split_whitespace();
  let username = tokens.next()?;
  let password = tokens.next()?;
  if tokens.next().is_some() {
    return None;
  }
  Some(Credentials {
    username: username.to_string(),
    password: password.to_string(),
  })
}

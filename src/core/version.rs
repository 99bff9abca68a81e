//! Release identities and the bump-resolution algorithm
//!
//! Train snapshots are keyed by a two-part `major.minor` version. Resolution
//! filters existing versions through a goal expression, takes the greatest
//! survivor as the base, and bumps it. Rolling snapshots bypass all of this;
//! their identity is the calendar date.

use crate::core::error::{CuratorError, CuratorResult, VersionError};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// What the caller asked the pipeline to build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseRequest {
  /// Date-stamped snapshot, no version lineage
  Rolling,
  /// Next snapshot on a version train
  Train { bump: BumpKind, goal: String },
}

/// Which part of the train version to bump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpKind {
  Major,
  Minor,
}

/// Two-part train version, totally ordered by (major, minor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleaseVersion {
  pub major: u64,
  pub minor: u64,
}

impl ReleaseVersion {
  pub fn new(major: u64, minor: u64) -> Self {
    Self { major, minor }
  }
}

impl fmt::Display for ReleaseVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}", self.major, self.minor)
  }
}

impl FromStr for ReleaseVersion {
  type Err = CuratorError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || CuratorError::message(format!("Invalid version '{}': expected 'major.minor'", s));
    let (major, minor) = s.split_once('.').ok_or_else(invalid)?;
    match (parse_number(major), parse_number(minor)) {
      (Some(major), Some(minor)) => Ok(Self { major, minor }),
      _ => Err(invalid()),
    }
  }
}

/// Parse a bare decimal number. Unlike `u64::from_str` this rejects signs, so
/// `+8` is not a valid version component or goal.
fn parse_number(s: &str) -> Option<u64> {
  if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  s.parse().ok()
}

/// Goal expression: narrows which existing versions are eligible as a bump base
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Goal {
  /// Empty expression: every version is eligible
  Any,
  /// Bare integer `N`: versions with major <= N
  MajorUpTo(u64),
  /// Full `major.minor`: versions strictly below the bound
  Below(ReleaseVersion),
}

impl Goal {
  /// Parse a goal expression. Anything that is not empty, a bare integer or
  /// a `major.minor` pair is rejected.
  pub fn parse(expression: &str) -> CuratorResult<Self> {
    if expression.is_empty() {
      return Ok(Goal::Any);
    }
    if let Some(major) = parse_number(expression) {
      return Ok(Goal::MajorUpTo(major));
    }
    if let Some((major, minor)) = expression.split_once('.')
      && let (Some(major), Some(minor)) = (parse_number(major), parse_number(minor))
    {
      return Ok(Goal::Below(ReleaseVersion::new(major, minor)));
    }
    Err(CuratorError::Version(VersionError::GoalParse {
      expression: expression.to_string(),
    }))
  }

  /// Whether a version is eligible under this goal
  pub fn admits(&self, version: ReleaseVersion) -> bool {
    match self {
      Goal::Any => true,
      Goal::MajorUpTo(major) => version.major <= *major,
      Goal::Below(bound) => version < *bound,
    }
  }
}

/// Outcome of version resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
  /// The version the new snapshot will carry
  pub version: ReleaseVersion,
  /// For minor bumps: the unbumped base whose plan seeds the new constraints.
  /// Major bumps re-baseline from fresh constraints and carry no base.
  pub base: Option<ReleaseVersion>,
}

/// Compute the next train version from the existing identifiers.
///
/// Major bumps start a new train: `(base.major + 1, 0)`, or `(0, 0)` when no
/// existing version matches the goal. Minor bumps continue one and require a
/// base to exist.
pub fn resolve(bump: BumpKind, goal: &Goal, existing: &BTreeSet<ReleaseVersion>) -> CuratorResult<Resolution> {
  let base = existing.iter().rev().copied().find(|v| goal.admits(*v));

  match bump {
    BumpKind::Major => {
      let version = match base {
        Some(base) => ReleaseVersion::new(base.major + 1, 0),
        None => ReleaseVersion::new(0, 0),
      };
      Ok(Resolution { version, base: None })
    }
    BumpKind::Minor => {
      let base = base.ok_or_else(|| {
        CuratorError::Version(VersionError::MissingBase {
          goal: match goal {
            Goal::Any => String::new(),
            Goal::MajorUpTo(major) => major.to_string(),
            Goal::Below(bound) => bound.to_string(),
          },
        })
      })?;
      Ok(Resolution {
        version: ReleaseVersion::new(base.major, base.minor + 1),
        base: Some(base),
      })
    }
  }
}

/// Scan a plans directory for existing train identifiers.
///
/// Matches file names of the form `train-<major>.<minor>.json`; anything else
/// (rolling plans, stray files) is ignored. A missing directory is an empty
/// set, not an error: first releases start from nothing.
pub fn scan_existing(plans_dir: &Path) -> CuratorResult<BTreeSet<ReleaseVersion>> {
  let mut versions = BTreeSet::new();

  let entries = match std::fs::read_dir(plans_dir) {
    Ok(entries) => entries,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(versions),
    Err(e) => return Err(e.into()),
  };

  for entry in entries {
    let name = entry?.file_name();
    let Some(name) = name.to_str() else { continue };
    if let Some(stem) = name.strip_prefix("train-").and_then(|rest| rest.strip_suffix(".json"))
      && let Ok(version) = stem.parse::<ReleaseVersion>()
    {
      versions.insert(version);
    }
  }

  Ok(versions)
}

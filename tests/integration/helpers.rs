//! Test helpers for integration tests

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A test workspace with a curator.toml and stub engine executables
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  /// Create a workspace whose stub tools all succeed
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    std::fs::create_dir_all(path.join("bin"))?;

    let ws = Self { _root: root, path };
    ws.write_default_tools()?;
    ws.write_config()?;
    Ok(ws)
  }

  fn write_config(&self) -> Result<()> {
    let bin = self.path.join("bin");
    let config = format!(
      r#"[tools]
plan_engine = "{bin}/plan-engine"
validator = "{bin}/validator"
builder = "{bin}/builder"
bundler = "{bin}/bundler"
uploader = "{bin}/uploader"
"#,
      bin = bin.display()
    );
    std::fs::write(self.path.join("curator.toml"), config)?;
    Ok(())
  }

  fn write_default_tools(&self) -> Result<()> {
    self.write_tool(
      "plan-engine",
      r#"#!/bin/sh
case "$1" in
  constraints)
    echo '{"compiler":"ghc-9.8.2","packages":[{"name":"base","range":">=4.19"}]}'
    ;;
  update-constraints)
    cat >/dev/null
    touch "$(dirname "$0")/../update-constraints.used"
    echo '{"compiler":"ghc-9.6.4","packages":[]}'
    ;;
  plan)
    compiler=$(sed 's/.*"compiler":"\([^"]*\)".*/\1/')
    echo "{\"compiler\":\"$compiler\",\"packages\":[{\"name\":\"base\",\"version\":\"4.19.0.0\"}]}"
    ;;
  *)
    echo "unknown command: $1" >&2
    exit 2
    ;;
esac
"#,
    )?;

    self.write_tool(
      "validator",
      r#"#!/bin/sh
cat >/dev/null
exit 0
"#,
    )?;

    self.write_tool(
      "builder",
      r#"#!/bin/sh
shift
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    --out) out="$2"; shift 2 ;;
    --install-root|--jobs) shift 2 ;;
    *) shift ;;
  esac
done
cat >/dev/null
mkdir -p "$out/docs"
echo "compiled 1 package"
"#,
    )?;

    self.write_tool(
      "bundler",
      r#"#!/bin/sh
shift
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    --out) out="$2"; shift 2 ;;
    --kind|--docs) shift 2 ;;
    *) shift ;;
  esac
done
cat >/dev/null
echo "bundle-bytes" > "$out"
"#,
    )?;

    self.write_tool(
      "uploader",
      r#"#!/bin/sh
case "$1" in
  snapshot)
    if [ -n "$FAIL_SNAPSHOT" ]; then
      echo "snapshot endpoint rejected the upload" >&2
      exit 1
    fi
    echo "snap-123"
    ;;
  docs) echo "docs uploaded" ;;
  doc-map) echo "doc map uploaded" ;;
  distro) echo "distro entry for $CURATOR_DISTRO_USER" ;;
  bundle) echo "https://example.org/bundles/1" ;;
  *)
    echo "unknown command: $1" >&2
    exit 2
    ;;
esac
"#,
    )?;

    Ok(())
  }

  /// Write (or overwrite) a stub tool script
  pub fn write_tool(&self, name: &str, body: &str) -> Result<()> {
    let path = self.path.join("bin").join(name);
    std::fs::write(&path, body)?;
    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
  }

  /// Make the validator reject every plan
  pub fn reject_validation(&self) -> Result<()> {
    self.write_tool(
      "validator",
      r#"#!/bin/sh
cat >/dev/null
echo "upper bounds violated for base" >&2
exit 1
"#,
    )
  }

  /// Make the builder fail after emitting a partial log
  pub fn fail_build(&self) -> Result<()> {
    self.write_tool(
      "builder",
      r#"#!/bin/sh
cat >/dev/null
echo "compiling base..."
echo "error: base failed to compile" >&2
exit 1
"#,
    )
  }

  /// Seed an accepted train plan file
  pub fn seed_train_plan(&self, version: &str, compiler: &str) -> Result<PathBuf> {
    let plans = self.path.join("plans");
    std::fs::create_dir_all(&plans)?;
    let path = plans.join(format!("train-{}.json", version));
    std::fs::write(&path, format!(r#"{{"compiler":"{}","packages":[]}}"#, compiler))?;
    Ok(path)
  }

  /// Write the distro credentials side file
  pub fn write_credentials(&self, content: &str) -> Result<()> {
    std::fs::write(self.path.join("distro-credentials.txt"), content)?;
    Ok(())
  }

  pub fn plan_path(&self, slug: &str) -> PathBuf {
    self.path.join("plans").join(format!("{}.json", slug))
  }

  pub fn bundle_path(&self, slug: &str) -> PathBuf {
    self.path.join("bundles").join(format!("{}.bundle", slug))
  }

  pub fn log_path(&self, slug: &str) -> PathBuf {
    self.path.join("logs").join(format!("{}.log", slug))
  }
}

/// Today's rolling slug, matching the binary's clock
pub fn rolling_slug() -> String {
  format!("rolling-{}", chrono::Local::now().date_naive().format("%Y-%m-%d"))
}

/// Run the curator binary in the workspace
pub fn run_curator(workspace: &Path, args: &[&str], envs: &[(&str, &str)]) -> Result<Output> {
  let mut command = Command::new(env!("CARGO_BIN_EXE_curator"));
  command.current_dir(workspace).args(args);
  // Keep host credentials out of the picture
  command.env_remove("CURATOR_AUTH_TOKEN");
  for (key, value) in envs {
    command.env(key, value);
  }
  Ok(command.output()?)
}

pub fn stdout_of(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_of(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).into_owned()
}

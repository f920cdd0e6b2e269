//! Direct-dependency reduction
//!
//! The lockfile delta contains mostly transitive packages. Only packages the
//! workspace depends on directly can appear at import sites, so the changed
//! set is reduced through the package manager's own listing command. Yarn has
//! no listing that maps transitive packages back to their direct parents, so
//! it intersects the root manifest and warns about the rest.

use crate::core::error::{BlastError, BlastResult};
use crate::core::proc;
use crate::lockfile::PackageManager;
use crate::ui::Logger;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

/// Reduce changed packages to the workspace's direct dependencies among them.
pub fn find_direct_deps(
  manager: PackageManager,
  cwd: &Path,
  packages: &[String],
  log: &Logger,
) -> BlastResult<Vec<String>> {
  match manager {
    PackageManager::Npm => npm_direct_deps(cwd, packages),
    PackageManager::Yarn => yarn_direct_deps(cwd, packages, log),
    PackageManager::Pnpm => pnpm_direct_deps(cwd, packages),
  }
}

#[derive(Debug, Deserialize)]
struct NpmListJson {
  #[serde(default)]
  dependencies: BTreeMap<String, serde_json::Value>,
}

fn npm_direct_deps(cwd: &Path, packages: &[String]) -> BlastResult<Vec<String>> {
  let mut cmd = Command::new("npm");
  cmd.current_dir(cwd).args(["ls", "--all", "--json", "--package-lock-only"]).args(packages);

  // npm exits non-zero on unmet filters but still prints the JSON tree.
  let out = proc::run_captured(&mut cmd, "npm ls --all --json --package-lock-only")?;
  let parsed: NpmListJson = serde_json::from_str(&out.stdout)
    .map_err(|e| BlastError::message(format!("Could not parse `npm ls` output: {}", e)))?;

  Ok(parsed.dependencies.into_keys().collect())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PnpmListJson {
  #[serde(default)]
  dependencies: BTreeMap<String, serde_json::Value>,

  #[serde(default)]
  dev_dependencies: BTreeMap<String, serde_json::Value>,
}

fn pnpm_direct_deps(cwd: &Path, packages: &[String]) -> BlastResult<Vec<String>> {
  let mut cmd = Command::new("pnpm");
  cmd.current_dir(cwd).arg("ls").args(packages).args(["--depth", "Infinity", "--json"]);

  let out = proc::run_captured(&mut cmd, "pnpm ls --depth Infinity --json")?;
  let parsed: Vec<PnpmListJson> = serde_json::from_str(&out.stdout)
    .map_err(|e| BlastError::message(format!("Could not parse `pnpm ls` output: {}", e)))?;

  let Some(first) = parsed.into_iter().next() else {
    return Ok(Vec::new());
  };

  let mut direct: Vec<String> = first
    .dependencies
    .into_keys()
    .chain(first.dev_dependencies.into_keys())
    .collect();
  direct.sort();
  direct.dedup();
  Ok(direct)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RootManifest {
  #[serde(default)]
  dependencies: BTreeMap<String, String>,

  #[serde(default)]
  dev_dependencies: BTreeMap<String, String>,
}

fn yarn_direct_deps(cwd: &Path, packages: &[String], log: &Logger) -> BlastResult<Vec<String>> {
  let manifest_path = cwd.join("package.json");
  let content = std::fs::read_to_string(&manifest_path)?;
  let manifest: RootManifest = serde_json::from_str(&content)
    .map_err(|e| BlastError::message(format!("Could not parse {}: {}", manifest_path.display(), e)))?;

  let declared: Vec<String> = manifest
    .dependencies
    .into_keys()
    .chain(manifest.dev_dependencies.into_keys())
    .collect();

  let direct: Vec<String> = packages.iter().filter(|p| declared.contains(p)).cloned().collect();

  if direct.len() < packages.len() {
    log.warn(
      "yarn cannot map transitive packages back to their direct dependents; only top-level dependencies are considered",
    );
  }

  Ok(direct)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  #[test]
  fn test_yarn_intersects_root_manifest() {
    let dir = TempDir::new().unwrap();
    fs::write(
      dir.path().join("package.json"),
      r#"{
        "dependencies": { "lodash": "^4.0.0" },
        "devDependencies": { "jest": "^29.0.0" }
      }"#,
    )
    .unwrap();

    let packages = vec!["lodash".to_string(), "jest".to_string(), "transitive-only".to_string()];
    let log = Logger::new("TEST", false);
    let direct = yarn_direct_deps(dir.path(), &packages, &log).unwrap();

    assert_eq!(direct, vec!["lodash", "jest"]);
  }

  #[test]
  fn test_npm_list_json_shape() {
    let json = r#"{ "name": "root", "dependencies": { "lodash": { "version": "4.17.21" } } }"#;
    let parsed: NpmListJson = serde_json::from_str(json).unwrap();
    assert_eq!(parsed.dependencies.keys().collect::<Vec<_>>(), vec!["lodash"]);
  }

  #[test]
  fn test_pnpm_list_json_shape() {
    let json = r#"[{ "dependencies": { "a": {} }, "devDependencies": { "b": {} } }]"#;
    let parsed: Vec<PnpmListJson> = serde_json::from_str(json).unwrap();
    assert_eq!(parsed[0].dependencies.keys().collect::<Vec<_>>(), vec!["a"]);
    assert_eq!(parsed[0].dev_dependencies.keys().collect::<Vec<_>>(), vec!["b"]);
  }
}

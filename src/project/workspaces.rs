//! Package-workspaces project discovery
//!
//! Fallback provider for repos managed by plain package-manager workspaces
//! (turbo-style): member globs come from `pnpm-workspace.yaml` or the root
//! `package.json` `workspaces` field, and each member's `package.json` name
//! becomes the project name with its directory as the source root.

use crate::core::error::BlastResult;
use crate::project::Project;
use crate::ui::Logger;
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct PnpmWorkspaceFile {
  #[serde(default)]
  packages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RootPackageJson {
  #[serde(default)]
  workspaces: Option<WorkspacesField>,
}

/// `workspaces` appears both as a bare array and as `{ "packages": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkspacesField {
  Globs(Vec<String>),
  Object {
    #[serde(default)]
    packages: Vec<String>,
  },
}

#[derive(Debug, Deserialize)]
struct MemberPackageJson {
  #[serde(default)]
  name: Option<String>,

  #[serde(default)]
  scripts: BTreeMap<String, String>,
}

/// Discover workspace-member projects under `cwd`.
pub fn discover(cwd: &Path, log: &Logger) -> BlastResult<Vec<Project>> {
  let Some(globs) = member_globs(cwd)? else {
    return Ok(Vec::new());
  };

  let (includes, excludes): (Vec<&String>, Vec<&String>) = globs.iter().partition(|g| !g.starts_with('!'));

  let mut members: Vec<PathBuf> = Vec::new();
  for pattern in includes {
    let full = cwd.join(pattern.trim_end_matches('/')).join("package.json");
    for entry in glob::glob(&full.to_string_lossy())? {
      let Ok(path) = entry else { continue };
      let Some(dir) = path.parent() else { continue };
      let Ok(rel_dir) = dir.strip_prefix(cwd) else { continue };
      if excludes.iter().any(|ex| matches_exclude(rel_dir, ex.trim_start_matches('!'))) {
        continue;
      }
      members.push(path);
    }
  }

  members.sort();
  members.dedup();

  let parsed: Vec<(PathBuf, MemberPackageJson)> = members
    .par_iter()
    .filter_map(|path| {
      let content = fs::read_to_string(path).ok()?;
      let package: MemberPackageJson = serde_json::from_str(&content).ok()?;
      Some((path.clone(), package))
    })
    .collect();

  let mut projects = Vec::with_capacity(parsed.len());
  for (path, package) in parsed {
    let Some(dir) = path.parent() else { continue };
    let rel_dir = dir.strip_prefix(cwd).unwrap_or(dir).to_path_buf();

    let Some(name) = package.name else {
      log.warn(format!("Workspace member at {} has no name, skipping", path.display()));
      continue;
    };

    log.debug(format!("Found workspace member '{}' at {}", name, rel_dir.display()));

    projects.push(Project {
      name,
      source_root: rel_dir,
      implicit_dependencies: vec![],
      targets: package.scripts.into_keys().collect(),
    });
  }

  Ok(projects)
}

/// Read the member glob list, preferring pnpm-workspace.yaml.
fn member_globs(cwd: &Path) -> BlastResult<Option<Vec<String>>> {
  let pnpm_path = cwd.join("pnpm-workspace.yaml");
  if pnpm_path.is_file() {
    let content = fs::read_to_string(&pnpm_path)?;
    let file: PnpmWorkspaceFile = serde_yaml::from_str(&content)?;
    return Ok(Some(file.packages));
  }

  let package_path = cwd.join("package.json");
  if package_path.is_file() {
    let content = fs::read_to_string(&package_path)?;
    let file: RootPackageJson = serde_json::from_str(&content)?;
    return Ok(match file.workspaces {
      Some(WorkspacesField::Globs(globs)) => Some(globs),
      Some(WorkspacesField::Object { packages }) => Some(packages),
      None => None,
    });
  }

  Ok(None)
}

/// Match a negated member glob against a member directory.
fn matches_exclude(rel_dir: &Path, pattern: &str) -> bool {
  let pattern = pattern.trim_end_matches('/');
  glob::Pattern::new(pattern).is_ok_and(|p| p.matches_path(rel_dir))
}

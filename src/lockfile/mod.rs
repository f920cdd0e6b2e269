//! Lockfile delta analysis
//!
//! A changed lockfile affects the projects importing the packages whose
//! resolved versions moved. The flow: parse the lockfile at the working tree
//! and at the base revision into name-to-version maps, diff them, reduce the
//! changed set to direct dependencies via the package manager's list command,
//! then search the index for import sites of those packages. Those sites
//! re-enter the propagation engine as changed lines.

pub mod direct_deps;

use crate::core::error::{BlastResult, LockfileError, ResultExt};
use crate::core::vcs::{ChangedFile, SystemGit};
use crate::index::FileIndex;
use crate::ui::Logger;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Package manager whose lockfile is analyzed.
///
/// Always explicit: detection looks only at which lockfile exists in the
/// workspace, never at installed binaries or environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
  Npm,
  Yarn,
  Pnpm,
}

impl PackageManager {
  /// Lockfile name for this package manager
  pub fn lockfile_name(self) -> &'static str {
    match self {
      PackageManager::Npm => "package-lock.json",
      PackageManager::Yarn => "yarn.lock",
      PackageManager::Pnpm => "pnpm-lock.yaml",
    }
  }

  /// Detect by lockfile presence in the workspace root.
  pub fn detect(cwd: &Path) -> Option<Self> {
    [PackageManager::Npm, PackageManager::Yarn, PackageManager::Pnpm]
      .into_iter()
      .find(|pm| cwd.join(pm.lockfile_name()).is_file())
  }

  /// Parse lockfile content into a package-name to resolved-version map.
  pub fn parse_lockfile(self, content: &str, path: &Path) -> BlastResult<BTreeMap<String, String>> {
    let result = match self {
      PackageManager::Npm => parse_package_lock(content),
      PackageManager::Yarn => Ok(parse_yarn_lock(content)),
      PackageManager::Pnpm => parse_pnpm_lock(content),
    };
    result.map_err(|reason| {
      LockfileError::Unparsable {
        path: path.to_path_buf(),
        reason,
      }
      .into()
    })
  }
}

/// Is the lockfile among the changed files?
pub fn lockfile_changed(manager: PackageManager, changes: &[ChangedFile]) -> bool {
  changes.iter().any(|c| c.file_path == Path::new(manager.lockfile_name()))
}

/// Packages whose resolved version differs between the two maps
pub fn changed_packages(prev: &BTreeMap<String, String>, current: &BTreeMap<String, String>) -> Vec<String> {
  let mut changed = Vec::new();
  for (name, version) in current {
    if prev.get(name) != Some(version) {
      changed.push(name.clone());
    }
  }
  for name in prev.keys() {
    if !current.contains_key(name) {
      changed.push(name.clone());
    }
  }
  changed.sort();
  changed.dedup();
  changed
}

/// Find source lines importing any of the given packages.
///
/// A line counts when it quotes the package name, optionally followed by a
/// subpath (`'pkg'` or `'pkg/sub/mod'`).
pub fn find_import_sites(index: &FileIndex, packages: &[String]) -> BlastResult<Vec<ChangedFile>> {
  if packages.is_empty() {
    return Ok(Vec::new());
  }

  let alternatives = packages.iter().map(|p| regex::escape(p)).collect::<Vec<_>>().join("|");
  let pattern = regex::Regex::new(&format!(r#"['"`](?:{})(?:/[^'"`]*)?['"`]"#, alternatives))?;

  let mut affected = Vec::new();
  for file in index.files() {
    let lines: Vec<u32> = file
      .content
      .lines()
      .enumerate()
      .filter(|(_, line)| pattern.is_match(line))
      .map(|(idx, _)| (idx + 1) as u32)
      .collect();

    if !lines.is_empty() {
      affected.push(ChangedFile {
        file_path: file.rel_path.clone(),
        changed_lines: lines,
      });
    }
  }

  affected.sort_by(|a, b| a.file_path.cmp(&b.file_path));
  Ok(affected)
}

/// Full lockfile flow: delta, direct-dependency reduction, import search.
pub fn find_lockfile_affected(
  manager: PackageManager,
  git: &SystemGit,
  base: &str,
  cwd: &Path,
  index: &FileIndex,
  log: &Logger,
) -> BlastResult<Vec<ChangedFile>> {
  let lockfile_path = cwd.join(manager.lockfile_name());
  let current_content = fs::read_to_string(&lockfile_path).map_err(|e| LockfileError::Unreadable {
    path: lockfile_path.clone(),
    reason: e.to_string(),
  })?;

  // A lockfile absent at the base revision diffs against an empty map.
  let prev_content = git
    .show_file(base, Path::new(manager.lockfile_name()))
    .context("Reading lockfile at the base revision")?;

  let current = manager.parse_lockfile(&current_content, &lockfile_path)?;
  let prev = match &prev_content {
    Some(content) => manager.parse_lockfile(content, &lockfile_path)?,
    None => BTreeMap::new(),
  };

  let changed = changed_packages(&prev, &current);
  log.debug(format!("Lockfile delta: {} package(s) changed", changed.len()));
  if changed.is_empty() {
    return Ok(Vec::new());
  }

  let direct = direct_deps::find_direct_deps(manager, cwd, &changed, log)?;
  log.debug(format!("{} changed package(s) are direct dependencies", direct.len()));

  find_import_sites(index, &direct)
}

fn parse_package_lock(content: &str) -> Result<BTreeMap<String, String>, String> {
  let value: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
  let mut map = BTreeMap::new();

  // Lockfile v2/v3 keeps a flat "packages" map keyed by install path; v1
  // nests under "dependencies".
  if let Some(packages) = value.get("packages").and_then(|p| p.as_object()) {
    for (key, entry) in packages {
      if key.is_empty() {
        continue;
      }
      let name = match key.rfind("node_modules/") {
        Some(idx) => &key[idx + "node_modules/".len()..],
        None => key.as_str(),
      };
      if let Some(version) = entry.get("version").and_then(|v| v.as_str()) {
        map.insert(name.to_string(), version.to_string());
      }
    }
    return Ok(map);
  }

  if let Some(dependencies) = value.get("dependencies").and_then(|d| d.as_object()) {
    for (name, entry) in dependencies {
      if let Some(version) = entry.get("version").and_then(|v| v.as_str()) {
        map.insert(name.clone(), version.to_string());
      }
    }
  }

  Ok(map)
}

fn parse_yarn_lock(content: &str) -> BTreeMap<String, String> {
  let mut map = BTreeMap::new();
  let mut current_name: Option<String> = None;

  for line in content.lines() {
    let trimmed = line.trim_end();
    if trimmed.is_empty() || trimmed.starts_with('#') {
      continue;
    }

    // Entry headers start at column 0 and end with ':'.
    if !line.starts_with(' ') && trimmed.ends_with(':') {
      let first_selector = trimmed.trim_end_matches(':').split(',').next().unwrap_or("");
      current_name = yarn_selector_name(first_selector.trim().trim_matches('"'));
      continue;
    }

    if let Some(name) = &current_name
      && let Some(rest) = line.trim_start().strip_prefix("version")
    {
      let version = rest.trim_start_matches(':').trim().trim_matches('"');
      if !version.is_empty() {
        map.insert(name.clone(), version.to_string());
      }
    }
  }

  map
}

/// Extract the package name from a yarn selector like `@scope/pkg@^1.0.0`.
fn yarn_selector_name(selector: &str) -> Option<String> {
  let at = selector.rfind('@')?;
  if at == 0 {
    return Some(selector.to_string());
  }
  Some(selector[..at].to_string())
}

fn parse_pnpm_lock(content: &str) -> Result<BTreeMap<String, String>, String> {
  let value: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
  let mut map = BTreeMap::new();

  let Some(packages) = value.get("packages").and_then(|p| p.as_mapping()) else {
    return Ok(map);
  };

  for key in packages.keys() {
    let Some(key) = key.as_str() else { continue };
    if let Some((name, version)) = pnpm_key_parts(key) {
      map.insert(name, version);
    }
  }

  Ok(map)
}

/// Split a pnpm packages key (`/name@1.2.3`, `/@scope/name@1.2.3(peers)`,
/// or the older `/name/1.2.3`) into name and version.
fn pnpm_key_parts(key: &str) -> Option<(String, String)> {
  let key = key.trim_start_matches('/');
  let key = key.split('(').next().unwrap_or(key);

  if let Some(at) = key.rfind('@')
    && at > 0
  {
    return Some((key[..at].to_string(), key[at + 1..].to_string()));
  }

  let slash = key.rfind('/')?;
  let version = &key[slash + 1..];
  if version.chars().next().is_some_and(|c| c.is_ascii_digit()) {
    return Some((key[..slash].to_string(), version.to_string()));
  }
  None
}

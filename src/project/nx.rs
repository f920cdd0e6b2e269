//! Nx project discovery
//!
//! Walks the workspace for `project.json` files and maps them to the blast
//! project model. A missing `name` falls back to the directory name, a
//! missing `sourceRoot` to the project directory; both fallbacks warn, since
//! they usually indicate a half-migrated workspace.

use crate::core::error::BlastResult;
use crate::index::is_ignored_for_discovery;
use crate::project::Project;
use crate::ui::Logger;
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NxProjectFile {
  #[serde(default)]
  name: Option<String>,

  #[serde(default)]
  source_root: Option<String>,

  #[serde(default)]
  implicit_dependencies: Vec<String>,

  #[serde(default)]
  targets: BTreeMap<String, serde_json::Value>,
}

/// Discover nx projects under `cwd`.
///
/// File reads are independent and side-effect-free, so they run in parallel.
pub fn discover(cwd: &Path, ignored_paths: &[String], log: &Logger) -> BlastResult<Vec<Project>> {
  let pattern = cwd.join("**").join("project.json");
  let mut candidates: Vec<PathBuf> = Vec::new();

  for entry in glob::glob(&pattern.to_string_lossy())? {
    let Ok(path) = entry else { continue };
    let Ok(rel) = path.strip_prefix(cwd) else { continue };
    if is_ignored_for_discovery(rel, ignored_paths) {
      continue;
    }
    candidates.push(path);
  }

  candidates.sort();

  let parsed: Vec<(PathBuf, NxProjectFile)> = candidates
    .par_iter()
    .filter_map(|path| {
      let content = fs::read_to_string(path).ok()?;
      let project: NxProjectFile = serde_json::from_str(&content).ok()?;
      Some((path.clone(), project))
    })
    .collect();

  let mut projects = Vec::with_capacity(parsed.len());

  for (path, file) in parsed {
    let project_dir = path.parent().unwrap_or(cwd);
    let rel_dir = project_dir.strip_prefix(cwd).unwrap_or(project_dir).to_path_buf();

    let name = match file.name {
      Some(name) => name,
      None => {
        let fallback = project_dir
          .file_name()
          .map(|n| n.to_string_lossy().into_owned())
          .unwrap_or_else(|| "unnamed".to_string());
        log.warn(format!(
          "Project at {} has no name property, using directory name '{}'",
          path.display(),
          fallback
        ));
        fallback
      }
    };

    let source_root = match file.source_root {
      Some(root) => PathBuf::from(root),
      None => {
        log.warn(format!(
          "Project at {} has no sourceRoot property, using the project directory",
          path.display()
        ));
        rel_dir.clone()
      }
    };

    log.debug(format!("Found project '{}' with source root {}", name, source_root.display()));

    projects.push(Project {
      name,
      source_root,
      implicit_dependencies: file.implicit_dependencies,
      targets: file.targets.into_keys().collect(),
    });
  }

  Ok(projects)
}

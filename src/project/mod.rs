//! Project model, file-to-project attribution and implicit dependencies
//!
//! Projects are supplied by a monorepo-manager provider (nx project.json
//! files or package.json workspaces) and are immutable for the duration of
//! one propagation run.

pub mod nx;
pub mod workspaces;

use crate::core::error::{BlastError, BlastResult, ConfigError};
use crate::ui::Logger;
use indexmap::IndexSet;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A buildable project in the monorepo
#[derive(Debug, Clone, Serialize)]
pub struct Project {
  /// Unique project name
  pub name: String,

  /// Path prefix owning the project's files (workspace-relative)
  pub source_root: PathBuf,

  /// Declared non-import dependencies: this project must be considered
  /// affected whenever any of the named projects is
  pub implicit_dependencies: Vec<String>,

  /// Build targets declared by the project (used for --target filtering)
  pub targets: Vec<String>,
}

/// Discover projects: nx project.json files first, package workspaces as
/// the fallback. A workspace with neither is a config error.
pub fn discover(cwd: &Path, ignored_paths: &[String], log: &Logger) -> BlastResult<Vec<Project>> {
  let projects = nx::discover(cwd, ignored_paths, &log.with_namespace("NX"))?;
  if !projects.is_empty() {
    return Ok(projects);
  }

  let projects = workspaces::discover(cwd, &log.with_namespace("WORKSPACES"))?;
  if !projects.is_empty() {
    return Ok(projects);
  }

  Err(BlastError::Config(ConfigError::NoProjects {
    workspace_root: cwd.to_path_buf(),
  }))
}

/// Find the project owning `file_path` (workspace-relative).
///
/// Every project whose source root is a path prefix of `file_path` matches;
/// with nested roots the most specific (longest) one wins. Prefix matching is
/// component-aware so `libs/a` does not claim `libs/ab/x.ts`. A file matching
/// no root contributes nothing.
pub fn project_for_path<'a>(file_path: &Path, projects: &'a [Project]) -> Option<&'a Project> {
  projects
    .iter()
    .filter(|p| file_path.starts_with(&p.source_root))
    .max_by_key(|p| p.source_root.components().count())
}

/// Declared implicit-dependency relation over the project set.
///
/// Edge `P → Q` means "P declares Q as an implicit dependency". Expansion is
/// reverse reachability from the affected set: every project from which an
/// affected project can be reached is added. This is a fixed point, so
/// multi-hop chains (A→B→C) resolve regardless of iteration order.
pub struct ImplicitGraph {
  graph: DiGraph<String, ()>,
  name_to_node: HashMap<String, NodeIndex>,
}

impl ImplicitGraph {
  pub fn build(projects: &[Project]) -> Self {
    let mut graph = DiGraph::new();
    let mut name_to_node = HashMap::new();

    for project in projects {
      let idx = graph.add_node(project.name.clone());
      name_to_node.insert(project.name.clone(), idx);
    }

    for project in projects {
      let from = name_to_node[&project.name];
      for dep in &project.implicit_dependencies {
        if let Some(&to) = name_to_node.get(dep) {
          graph.add_edge(from, to, ());
        }
      }
    }

    Self { graph, name_to_node }
  }

  /// Expand `affected` in place with every declaring ancestor.
  pub fn expand(&self, affected: &mut IndexSet<String>) {
    let mut stack: Vec<NodeIndex> = affected.iter().filter_map(|name| self.name_to_node.get(name)).copied().collect();
    let mut visited: Vec<NodeIndex> = stack.clone();

    while let Some(node) = stack.pop() {
      for dependent in self.graph.neighbors_directed(node, Direction::Incoming) {
        if !visited.contains(&dependent) {
          visited.push(dependent);
          affected.insert(self.graph[dependent].clone());
          stack.push(dependent);
        }
      }
    }
  }
}

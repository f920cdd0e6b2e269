//! Per-run in-memory index of the monorepo's source files
//!
//! Every propagation run builds its own index from the project source roots:
//! file content plus the scanned top-level statements. Nothing is shared or
//! persisted across runs; correctness comes from rebuilding, not caching.

use crate::core::error::BlastResult;
use crate::lang::{self, Statement};
use crate::project::Project;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions considered compiled source
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// Is this path a compiled-source file (by extension)?
pub fn is_source_path(path: &Path) -> bool {
  path
    .extension()
    .and_then(|e| e.to_str())
    .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e))
}

/// A source file loaded into the index
#[derive(Debug)]
pub struct SourceFile {
  /// Path relative to the workspace root
  pub rel_path: PathBuf,

  /// Absolute path on disk
  pub abs_path: PathBuf,

  /// Full file content
  pub content: String,

  /// Scanned top-level statements
  pub statements: Vec<Statement>,
}

/// In-memory file index for one propagation run
pub struct FileIndex {
  root: PathBuf,
  files: HashMap<PathBuf, SourceFile>,
}

impl FileIndex {
  /// Build the index from the projects' source roots.
  ///
  /// File reads and statement scans are independent and side-effect-free,
  /// so they run in parallel; everything downstream is single-threaded.
  pub fn build(root: &Path, projects: &[Project], ignored_paths: &[String]) -> BlastResult<Self> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    for project in projects {
      let pattern = root.join(&project.source_root).join("**").join("*");
      for entry in glob::glob(&pattern.to_string_lossy())? {
        let Ok(path) = entry else { continue };
        if !path.is_file() || !is_source_path(&path) {
          continue;
        }
        let Ok(rel) = path.strip_prefix(root) else { continue };
        if is_ignored_for_discovery(rel, ignored_paths) {
          continue;
        }
        candidates.push(path);
      }
    }

    candidates.sort();
    candidates.dedup();

    let loaded: Vec<SourceFile> = candidates
      .par_iter()
      .filter_map(|path| {
        let content = fs::read_to_string(path).ok()?;
        let rel_path = path.strip_prefix(root).ok()?.to_path_buf();
        let statements = lang::scan(&content);
        Some(SourceFile {
          rel_path,
          abs_path: path.clone(),
          content,
          statements,
        })
      })
      .collect();

    let mut files = HashMap::with_capacity(loaded.len());
    for file in loaded {
      files.insert(file.rel_path.clone(), file);
    }

    Ok(Self {
      root: root.to_path_buf(),
      files,
    })
  }

  /// Workspace root this index was built from
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Look up a file by workspace-relative path
  pub fn get(&self, rel_path: &Path) -> Option<&SourceFile> {
    self.files.get(rel_path)
  }

  /// Is this workspace-relative path indexed?
  pub fn contains(&self, rel_path: &Path) -> bool {
    self.files.contains_key(rel_path)
  }

  /// Iterate over all indexed files (unordered)
  pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
    self.files.values()
  }

  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }

  /// Insert a file directly (tests build fixture indexes this way)
  pub fn insert(&mut self, rel_path: impl Into<PathBuf>, content: impl Into<String>) {
    let rel_path = rel_path.into();
    let content = content.into();
    let statements = lang::scan(&content);
    let abs_path = self.root.join(&rel_path);
    self.files.insert(
      rel_path.clone(),
      SourceFile {
        rel_path,
        abs_path,
        content,
        statements,
      },
    );
  }

  /// Create an empty index rooted at `root` (tests populate via `insert`)
  pub fn empty(root: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
      files: HashMap::new(),
    }
  }
}

/// Does an ignore entry exclude this workspace-relative path?
///
/// Entries match either a leading path prefix (`./dist`, `apps/legacy`) or a
/// bare folder name anywhere in the path (`node_modules`). Project discovery
/// walks the same folders and shares this matcher.
pub fn is_ignored_for_discovery(rel_path: &Path, ignored_paths: &[String]) -> bool {
  for entry in ignored_paths {
    let entry = entry.trim_start_matches("./");
    if entry.is_empty() {
      continue;
    }
    if rel_path.starts_with(entry) {
      return true;
    }
    if !entry.contains('/') && rel_path.components().any(|c| c.as_os_str() == entry) {
      return true;
    }
  }
  false
}

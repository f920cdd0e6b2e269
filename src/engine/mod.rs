//! Reference-closure propagation
//!
//! Turns a set of changed lines into the set of semantically affected
//! projects. For each changed line the enclosing top-level statement is
//! located; the owning project is attributed, and unless the statement is a
//! structural kind (imports, exports, module wrappers, expression statements,
//! top-level ifs) its declared identifier is expanded: every usage site is
//! attributed in turn and recursively expanded under the same policy. A
//! visited set keyed on (file, identifier) makes the closure terminate on
//! cyclic references.

pub mod resolver;

pub use resolver::{Reference, ReferenceResolver, TextReferenceResolver};

use crate::core::error::BlastResult;
use crate::core::vcs::ChangedFile;
use crate::index::FileIndex;
use crate::lang::{self, StatementKind};
use crate::project::{self, Project};
use crate::ui::Logger;
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Tracks which (file, identifier) pairs have already been expanded
#[derive(Default)]
struct VisitedSet {
  by_file: HashMap<PathBuf, HashSet<String>>,
}

impl VisitedSet {
  /// Returns false if the pair was already present
  fn insert(&mut self, file: &Path, identifier: &str) -> bool {
    self
      .by_file
      .entry(file.to_path_buf())
      .or_default()
      .insert(identifier.to_string())
  }
}

pub struct Engine<'a> {
  index: &'a FileIndex,
  projects: &'a [Project],
  resolver: &'a dyn ReferenceResolver,
  log: Logger,
}

impl<'a> Engine<'a> {
  pub fn new(
    index: &'a FileIndex,
    projects: &'a [Project],
    resolver: &'a dyn ReferenceResolver,
    log: Logger,
  ) -> Self {
    Self {
      index,
      projects,
      resolver,
      log,
    }
  }

  /// Compute the affected-project set.
  ///
  /// `changes` are directly edited source files; `asset_hits` are reference
  /// sites of changed non-source files, which follow a narrower policy: an
  /// import site expands the imported binding, any other site attributes
  /// its project without expansion.
  ///
  /// Output order is discovery order, so the run is deterministic for a
  /// given change set and index.
  pub fn affected_projects(
    &self,
    changes: &[ChangedFile],
    asset_hits: &[ChangedFile],
  ) -> BlastResult<IndexSet<String>> {
    let mut affected = IndexSet::new();
    let mut visited = VisitedSet::default();

    for change in changes {
      let Some(file) = self.index.get(&change.file_path) else {
        continue;
      };

      for &line in &change.changed_lines {
        let Some(statement) = lang::statement_at(&file.statements, line) else {
          continue;
        };

        // The changed file's own project is affected even when the
        // statement is a structural kind that we never expand from.
        self.attribute(&change.file_path, &mut affected);

        if statement.kind.is_ignorable() {
          continue;
        }
        if let Some(identifier) = &statement.identifier {
          self.expand(&change.file_path, identifier, &mut visited, &mut affected)?;
        }
      }
    }

    for hit in asset_hits {
      let Some(file) = self.index.get(&hit.file_path) else {
        continue;
      };

      for &line in &hit.changed_lines {
        let Some(statement) = lang::statement_at(&file.statements, line) else {
          continue;
        };

        self.attribute(&hit.file_path, &mut affected);

        if statement.kind == StatementKind::Import
          && let Some(identifier) = &statement.identifier
        {
          self.expand(&hit.file_path, identifier, &mut visited, &mut affected)?;
        }
      }
    }

    Ok(affected)
  }

  fn expand(
    &self,
    file: &Path,
    identifier: &str,
    visited: &mut VisitedSet,
    affected: &mut IndexSet<String>,
  ) -> BlastResult<()> {
    if !visited.insert(file, identifier) {
      return Ok(());
    }

    self.log.debug(format!("Expanding '{}' from {}", identifier, file.display()));

    for reference in self.resolver.find_references(identifier)? {
      let Some(source) = self.index.get(&reference.file) else {
        continue;
      };
      let Some(statement) = lang::statement_at(&source.statements, reference.line) else {
        continue;
      };

      self.attribute(&reference.file, affected);

      if statement.kind.is_ignorable() {
        continue;
      }
      if let Some(enclosing) = statement.identifier.as_deref() {
        self.expand(&reference.file, enclosing, visited, affected)?;
      }
    }

    Ok(())
  }

  fn attribute(&self, file: &Path, affected: &mut IndexSet<String>) {
    if let Some(project) = project::project_for_path(file, self.projects)
      && affected.insert(project.name.clone())
    {
      self.log.debug(format!("Project '{}' affected via {}", project.name, file.display()));
    }
  }
}

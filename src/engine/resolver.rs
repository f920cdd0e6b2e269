//! Reference lookup behind a trait seam
//!
//! The engine only asks one question: "where is this identifier used?".
//! Keeping that behind a trait lets the closure logic stay independent of how
//! references are found. The default implementation is a whole-word textual
//! search over the file index, which over-approximates (shadowed or unrelated
//! same-named identifiers match too) but never under-approximates.

use crate::core::error::BlastResult;
use crate::index::FileIndex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

/// One occurrence of an identifier in an indexed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
  /// Workspace-relative path of the file containing the occurrence
  pub file: PathBuf,

  /// 1-based line of the occurrence
  pub line: u32,
}

/// Finds every usage site of an identifier across the workspace.
pub trait ReferenceResolver {
  fn find_references(&self, identifier: &str) -> BlastResult<Vec<Reference>>;
}

/// Whole-word textual resolver over the file index.
///
/// Identifiers recur during expansion (every reference site of a popular
/// helper asks for the same names), so results are cached per identifier.
pub struct TextReferenceResolver<'a> {
  index: &'a FileIndex,
  cache: RwLock<HashMap<String, Vec<Reference>>>,
}

impl<'a> TextReferenceResolver<'a> {
  pub fn new(index: &'a FileIndex) -> Self {
    Self {
      index,
      cache: RwLock::new(HashMap::new()),
    }
  }

  fn search(&self, identifier: &str) -> BlastResult<Vec<Reference>> {
    let pattern = regex::Regex::new(&format!(r"\b{}\b", regex::escape(identifier)))?;
    let mut references = Vec::new();

    for file in self.index.files() {
      for (idx, line) in file.content.lines().enumerate() {
        if pattern.is_match(line) {
          references.push(Reference {
            file: file.rel_path.clone(),
            line: (idx + 1) as u32,
          });
        }
      }
    }

    // Index iteration order is not stable; the engine's output order is.
    references.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
    Ok(references)
  }
}

impl ReferenceResolver for TextReferenceResolver<'_> {
  fn find_references(&self, identifier: &str) -> BlastResult<Vec<Reference>> {
    if let Some(hit) = self.cache.read().ok().and_then(|c| c.get(identifier).cloned()) {
      return Ok(hit);
    }

    let references = self.search(identifier)?;
    if let Ok(mut cache) = self.cache.write() {
      cache.insert(identifier.to_string(), references.clone());
    }
    Ok(references)
  }
}

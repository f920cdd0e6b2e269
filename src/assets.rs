//! Non-source change mapping
//!
//! Changed files that are not compiled source (JSON, SVG, styles, templates)
//! still affect the projects whose code references them. The mapping is
//! textual: find indexed source files mentioning the changed file's basename,
//! confirm the mention is a quoted path that resolves to the changed file,
//! and re-enter the propagation engine at the referencing lines.

use crate::core::error::BlastResult;
use crate::core::vcs::ChangedFile;
use crate::index::FileIndex;
use std::path::{Component, Path, PathBuf};

/// Find source files referencing the changed non-source file.
///
/// Candidate lines mention the basename; they count only when the quoted
/// path on that line resolves (against the candidate file's directory) to
/// the changed file, and the file still exists on disk.
pub fn find_non_source_affected(index: &FileIndex, changed_path: &Path) -> BlastResult<Vec<ChangedFile>> {
  let Some(basename) = changed_path.file_name().and_then(|n| n.to_str()) else {
    return Ok(Vec::new());
  };

  let quoted = regex::Regex::new(&format!(r#"['"`](?P<rel>[^'"`]*{})['"`]"#, regex::escape(basename)))?;
  let changed_abs = normalize(&index.root().join(changed_path));

  let mut affected = Vec::new();

  for file in index.files() {
    if !file.content.contains(basename) {
      continue;
    }

    let file_dir = file.abs_path.parent().unwrap_or(index.root());
    let mut lines = Vec::new();

    for (idx, line) in file.content.lines().enumerate() {
      let Some(captures) = quoted.captures(line) else { continue };
      let Some(rel) = captures.name("rel") else { continue };

      let referenced = normalize(&file_dir.join(rel.as_str()));
      if referenced == changed_abs && referenced.is_file() {
        lines.push((idx + 1) as u32);
      }
    }

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

/// Lexical path normalization: resolves `.` and `..` without touching disk.
fn normalize(path: &Path) -> PathBuf {
  let mut out = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if !out.pop() {
          out.push(Component::ParentDir);
        }
      }
      other => out.push(other),
    }
  }
  out
}

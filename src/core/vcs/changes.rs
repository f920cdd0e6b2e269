//! Unified diff parsing into (file, changed lines) pairs

use serde::Serialize;
use std::path::PathBuf;

/// A changed file with the 1-based start lines of its hunks in the
/// post-change revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedFile {
  pub file_path: PathBuf,
  pub changed_lines: Vec<u32>,
}

/// Parse `git diff --unified=0` output.
///
/// Splits on per-file `diff --git` headers. Per file section:
/// - the post-change path (the ` b/` side of the header)
/// - every hunk's new-file start line (the number after `+` in `@@ -a +b @@`)
///
/// A file section with no hunks (e.g. mode-only changes) is omitted.
pub fn parse_diff(diff: &str) -> Vec<ChangedFile> {
  let mut result = Vec::new();
  let mut current: Option<ChangedFile> = None;

  for line in diff.lines() {
    if let Some(header) = line.strip_prefix("diff --git ") {
      flush(&mut result, current.take());
      current = parse_header(header).map(|path| ChangedFile {
        file_path: path,
        changed_lines: Vec::new(),
      });
    } else if line.starts_with("@@ ") {
      if let (Some(file), Some(start)) = (current.as_mut(), parse_hunk_start(line)) {
        file.changed_lines.push(start);
      }
    }
  }

  flush(&mut result, current.take());
  result
}

fn flush(result: &mut Vec<ChangedFile>, file: Option<ChangedFile>) {
  if let Some(file) = file
    && !file.changed_lines.is_empty()
  {
    result.push(file);
  }
}

/// Extract the post-change path from `a/<old> b/<new>`.
///
/// Splits on the last ` b/` so paths containing spaces survive.
fn parse_header(header: &str) -> Option<PathBuf> {
  let idx = header.rfind(" b/")?;
  let new_path = &header[idx + 3..];
  if new_path.is_empty() {
    return None;
  }
  Some(PathBuf::from(new_path))
}

/// Extract the new-file start line from `@@ -a[,n] +b[,m] @@`.
fn parse_hunk_start(line: &str) -> Option<u32> {
  let plus = line.find('+')?;
  let rest = &line[plus + 1..];
  let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
  digits.parse().ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  const DIFF: &str = "\
diff --git a/libs/one/src/index.ts b/libs/one/src/index.ts
index 1234567..89abcde 100644
--- a/libs/one/src/index.ts
+++ b/libs/one/src/index.ts
@@ -3,0 +4 @@ export const a = 1;
+export const b = 2;
@@ -10 +11,2 @@ function f() {
+  return 42;
+}
diff --git a/assets/logo.svg b/assets/logo.svg
index aaa..bbb 100644
--- a/assets/logo.svg
+++ b/assets/logo.svg
@@ -1 +1 @@
+<svg/>
";

  #[test]
  fn test_parse_diff_files_and_lines() {
    let changed = parse_diff(DIFF);
    assert_eq!(changed.len(), 2);

    assert_eq!(changed[0].file_path, PathBuf::from("libs/one/src/index.ts"));
    assert_eq!(changed[0].changed_lines, vec![4, 11]);

    assert_eq!(changed[1].file_path, PathBuf::from("assets/logo.svg"));
    assert_eq!(changed[1].changed_lines, vec![1]);
  }

  #[test]
  fn test_file_without_hunks_is_omitted() {
    let diff = "\
diff --git a/script.sh b/script.sh
old mode 100644
new mode 100755
";
    assert!(parse_diff(diff).is_empty());
  }

  #[test]
  fn test_empty_diff() {
    assert!(parse_diff("").is_empty());
  }

  #[test]
  fn test_path_with_spaces() {
    let diff = "\
diff --git a/docs/read me.md b/docs/read me.md
@@ -1 +2 @@
+x
";
    let changed = parse_diff(diff);
    assert_eq!(changed[0].file_path, PathBuf::from("docs/read me.md"));
    assert_eq!(changed[0].changed_lines, vec![2]);
  }
}

//! Integration tests for `blast affected`

use crate::helpers::{TestWorkspace, run_blast, run_blast_raw};
use anyhow::Result;

fn names(output: &std::process::Output) -> Vec<String> {
  String::from_utf8_lossy(&output.stdout)
    .lines()
    .map(String::from)
    .collect()
}

#[test]
fn test_affected_propagates_through_references() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_project("util", &[])?;
  ws.add_project("app", &[])?;
  ws.add_project("idle", &[])?;
  ws.write_file(
    "libs/util/src/index.ts",
    "export const helper = () => {\n  return 1;\n};\n",
  )?;
  ws.write_file(
    "libs/app/src/main.ts",
    "import { helper } from '../../util/src/index';\nexport const run = () => helper();\n",
  )?;
  ws.write_file("libs/idle/src/index.ts", "export const nothing = 0;\n")?;
  ws.commit("initial projects")?;
  ws.baseline()?;

  // Change the body of helper
  ws.write_file(
    "libs/util/src/index.ts",
    "export const helper = () => {\n  return 2;\n};\n",
  )?;
  ws.commit("change helper body")?;

  let output = run_blast(&ws.path, &["affected", "--base", "origin/main", "--format", "names"])?;
  let affected = names(&output);

  assert!(affected.contains(&"util".to_string()), "got: {:?}", affected);
  assert!(affected.contains(&"app".to_string()), "got: {:?}", affected);
  assert!(!affected.contains(&"idle".to_string()), "got: {:?}", affected);

  Ok(())
}

#[test]
fn test_affected_no_changes() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_project("util", &[])?;
  ws.write_file("libs/util/src/index.ts", "export const a = 1;\n")?;
  ws.commit("initial")?;
  ws.baseline()?;

  let output = run_blast(&ws.path, &["affected", "--base", "origin/main"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("No projects affected"), "got: {}", stdout);

  Ok(())
}

#[test]
fn test_affected_import_only_change_stays_local() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_project("base", &[])?;
  ws.add_project("mid", &[])?;
  ws.add_project("top", &[])?;
  ws.write_file("libs/base/src/index.ts", "export const thing = 1;\n")?;
  ws.write_file(
    "libs/mid/src/index.ts",
    "import { thing } from '../../base/src/index';\nexport const use = () => thing;\n",
  )?;
  ws.write_file(
    "libs/top/src/index.ts",
    "import { use } from '../../mid/src/index';\nexport const go = () => use();\n",
  )?;
  ws.commit("initial")?;
  ws.baseline()?;

  // Rewrite only the import line in mid; the exported declaration is untouched
  ws.write_file(
    "libs/mid/src/index.ts",
    "import { thing } from '../../base/src';\nexport const use = () => thing;\n",
  )?;
  ws.commit("reorder import")?;

  let output = run_blast(&ws.path, &["affected", "--base", "origin/main", "--format", "names"])?;
  let affected = names(&output);

  assert_eq!(affected, vec!["mid"], "import-only changes must not expand");

  Ok(())
}

#[test]
fn test_affected_implicit_dependencies_expand() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_project("core", &[])?;
  ws.add_project("e2e", &["core"])?;
  ws.write_file("libs/core/src/index.ts", "export const x = 1;\n")?;
  ws.write_file("libs/e2e/src/index.ts", "export const unrelated = 1;\n")?;
  ws.commit("initial")?;
  ws.baseline()?;

  ws.write_file("libs/core/src/index.ts", "export const x = 2;\n")?;
  ws.commit("change core")?;

  let output = run_blast(&ws.path, &["affected", "--base", "origin/main", "--format", "names"])?;
  let affected = names(&output);

  assert!(affected.contains(&"core".to_string()), "got: {:?}", affected);
  assert!(affected.contains(&"e2e".to_string()), "declared dependent must follow: {:?}", affected);

  Ok(())
}

#[test]
fn test_affected_test_file_always_includes_project() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_project("util", &[])?;
  ws.write_file("libs/util/src/index.ts", "export const a = 1;\n")?;
  ws.write_file("libs/util/src/index.spec.ts", "// first\n// second\n")?;
  ws.commit("initial")?;
  ws.baseline()?;

  // Only a comment line changes: no statement, so the engine alone would
  // report nothing, but spec files always mark their project.
  ws.write_file("libs/util/src/index.spec.ts", "// changed\n// second\n")?;
  ws.commit("touch spec comment")?;

  let output = run_blast(&ws.path, &["affected", "--base", "origin/main", "--format", "names"])?;
  assert_eq!(names(&output), vec!["util"]);

  Ok(())
}

#[test]
fn test_affected_non_source_asset_maps_to_referencing_project() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_project("ui", &[])?;
  ws.add_project("other", &[])?;
  ws.write_file("libs/ui/src/data.json", "{\"color\": \"red\"}\n")?;
  ws.write_file(
    "libs/ui/src/theme.ts",
    "import data from './data.json';\nexport const theme = data;\n",
  )?;
  ws.write_file("libs/other/src/index.ts", "export const n = 1;\n")?;
  ws.commit("initial")?;
  ws.baseline()?;

  ws.write_file("libs/ui/src/data.json", "{\"color\": \"blue\"}\n")?;
  ws.commit("change asset")?;

  let output = run_blast(&ws.path, &["affected", "--base", "origin/main", "--format", "names"])?;
  let affected = names(&output);

  assert!(affected.contains(&"ui".to_string()), "got: {:?}", affected);
  assert!(!affected.contains(&"other".to_string()), "got: {:?}", affected);

  Ok(())
}

#[test]
fn test_affected_lockfile_delta_marks_import_sites() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_project("vendorish", &[])?;
  ws.add_project("clean", &[])?;
  ws.write_file(
    "package.json",
    r#"{ "name": "root", "dependencies": { "lodash": "^4.0.0" } }"#,
  )?;
  ws.write_file("yarn.lock", "lodash@^4.0.0:\n  version \"4.17.20\"\n")?;
  ws.write_file(
    "libs/vendorish/src/index.ts",
    "import _ from 'lodash';\nexport const wrapped = _;\n",
  )?;
  ws.write_file("libs/clean/src/index.ts", "export const pure = 1;\n")?;
  ws.commit("initial")?;
  ws.baseline()?;

  ws.write_file("yarn.lock", "lodash@^4.0.0:\n  version \"4.17.21\"\n")?;
  ws.commit("bump lodash")?;

  let output = run_blast(
    &ws.path,
    &["affected", "--base", "origin/main", "--lockfile-check", "--format", "names"],
  )?;
  let affected = names(&output);

  assert!(affected.contains(&"vendorish".to_string()), "got: {:?}", affected);
  assert!(!affected.contains(&"clean".to_string()), "got: {:?}", affected);

  Ok(())
}

#[test]
fn test_affected_without_lockfile_check_ignores_lockfile() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_project("vendorish", &[])?;
  ws.write_file(
    "package.json",
    r#"{ "name": "root", "dependencies": { "lodash": "^4.0.0" } }"#,
  )?;
  ws.write_file("yarn.lock", "lodash@^4.0.0:\n  version \"4.17.20\"\n")?;
  ws.write_file(
    "libs/vendorish/src/index.ts",
    "import _ from 'lodash';\nexport const wrapped = _;\n",
  )?;
  ws.commit("initial")?;
  ws.baseline()?;

  ws.write_file("yarn.lock", "lodash@^4.0.0:\n  version \"4.17.21\"\n")?;
  ws.commit("bump lodash")?;

  let output = run_blast(&ws.path, &["affected", "--base", "origin/main"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("No projects affected"), "got: {}", stdout);

  Ok(())
}

#[test]
fn test_affected_all_lists_everything() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_project("one", &[])?;
  ws.add_project("two", &[])?;
  ws.write_file("libs/one/src/index.ts", "export const a = 1;\n")?;
  ws.write_file("libs/two/src/index.ts", "export const b = 1;\n")?;
  ws.commit("initial")?;
  ws.baseline()?;

  let output = run_blast(&ws.path, &["affected", "--all", "--format", "names"])?;
  let affected = names(&output);

  assert!(affected.contains(&"one".to_string()));
  assert!(affected.contains(&"two".to_string()));

  Ok(())
}

#[test]
fn test_affected_json_output() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_project("one", &[])?;
  ws.write_file("libs/one/src/index.ts", "export const a = 1;\n")?;
  ws.commit("initial")?;
  ws.baseline()?;

  ws.write_file("libs/one/src/index.ts", "export const a = 2;\n")?;
  ws.commit("change")?;

  let output = run_blast(&ws.path, &["affected", "--base", "origin/main", "--format", "json"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  let json: serde_json::Value = serde_json::from_str(&stdout).expect("Should be valid JSON");
  let affected = json["affected"].as_array().expect("affected array");
  assert!(affected.iter().any(|v| v == "one"));

  Ok(())
}

#[test]
fn test_affected_invalid_base_fails_loudly() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_project("one", &[])?;
  ws.write_file("libs/one/src/index.ts", "export const a = 1;\n")?;
  ws.commit("initial")?;

  let output = run_blast_raw(&ws.path, &["affected", "--base", "no-such-revision"])?;

  assert!(!output.status.success(), "unknown base must not succeed");
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("no-such-revision"), "got: {}", stderr);

  Ok(())
}

#[test]
fn test_affected_is_deterministic() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_project("util", &[])?;
  ws.add_project("app", &[])?;
  ws.write_file("libs/util/src/index.ts", "export const helper = () => 1;\n")?;
  ws.write_file(
    "libs/app/src/main.ts",
    "import { helper } from '../../util/src/index';\nexport const run = () => helper();\n",
  )?;
  ws.commit("initial")?;
  ws.baseline()?;

  ws.write_file("libs/util/src/index.ts", "export const helper = () => 2;\n")?;
  ws.commit("change")?;

  let first = names(&run_blast(&ws.path, &["affected", "--base", "origin/main", "--format", "names"])?);
  let second = names(&run_blast(&ws.path, &["affected", "--base", "origin/main", "--format", "names"])?);

  assert_eq!(first, second);

  Ok(())
}

#[test]
fn test_affected_target_filter() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_project("one", &[])?;
  ws.write_file("libs/one/src/index.ts", "export const a = 1;\n")?;
  ws.commit("initial")?;
  ws.baseline()?;

  ws.write_file("libs/one/src/index.ts", "export const a = 2;\n")?;
  ws.commit("change")?;

  // The fixture project declares build and test targets only
  let output = run_blast(
    &ws.path,
    &["affected", "--base", "origin/main", "--target", "deploy", "--format", "names"],
  )?;
  assert!(names(&output).is_empty());

  let output = run_blast(
    &ws.path,
    &["affected", "--base", "origin/main", "--target", "build", "--format", "names"],
  )?;
  assert_eq!(names(&output), vec!["one"]);

  Ok(())
}

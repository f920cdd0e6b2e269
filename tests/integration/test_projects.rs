//! Integration tests for `blast projects`

use crate::helpers::{TestWorkspace, run_blast, run_blast_raw};
use anyhow::Result;

#[test]
fn test_projects_lists_nx_projects() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_project("alpha", &[])?;
  ws.add_project("beta", &[])?;
  ws.write_file("libs/alpha/src/index.ts", "export const a = 1;\n")?;
  ws.write_file("libs/beta/src/index.ts", "export const b = 1;\n")?;

  let output = run_blast(&ws.path, &["projects"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("alpha"));
  assert!(stdout.contains("beta"));
  assert!(stdout.contains("libs/alpha/src"));

  Ok(())
}

#[test]
fn test_projects_json_output() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_project("alpha", &["beta"])?;
  ws.add_project("beta", &[])?;

  let output = run_blast(&ws.path, &["projects", "--json"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  let json: serde_json::Value = serde_json::from_str(&stdout).expect("Should be valid JSON");
  let list = json.as_array().expect("array of projects");
  assert_eq!(list.len(), 2);
  assert!(list.iter().any(|p| p["name"] == "alpha"));

  Ok(())
}

#[test]
fn test_projects_falls_back_to_package_workspaces() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("package.json", r#"{ "name": "root", "workspaces": ["packages/*"] }"#)?;
  ws.write_file(
    "packages/web/package.json",
    r#"{ "name": "web", "scripts": { "build": "tsc" } }"#,
  )?;

  let output = run_blast(&ws.path, &["projects"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("web"));

  Ok(())
}

#[test]
fn test_projects_empty_workspace_is_an_error() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_blast_raw(&ws.path, &["projects"])?;
  assert!(!output.status.success());

  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("No projects"), "got: {}", stderr);

  Ok(())
}

//! CLI commands for blast
//!
//! - **affected**: compute (and optionally run a target for) the projects
//!   semantically affected by changes against a base revision
//! - **projects**: list the projects discovered in the workspace
//!
//! Commands resolve the workspace themselves from `--cwd`; there is no
//! long-lived context because every run rebuilds its index from scratch.

pub mod affected;
pub mod projects;

pub use affected::run_affected;
pub use projects::run_projects;

//! Core building blocks for blast
//!
//! - **config**: optional `blast.toml` parsing with CLI overrides
//! - **error**: categorized error types with contextual help messages
//! - **proc**: bounded subprocess capture
//! - **vcs**: git operations abstraction (SystemGit) and diff parsing

pub mod config;
pub mod error;
pub mod proc;
pub mod vcs;

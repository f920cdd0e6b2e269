//! Git operations abstraction (SystemGit) and change-set resolution

mod changes;
mod system_git;

pub use changes::ChangedFile;
pub use system_git::SystemGit;

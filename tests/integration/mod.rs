//! Integration tests for the blast CLI

mod helpers;
mod test_affected;
mod test_projects;

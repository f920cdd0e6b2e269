//! Terminal output helpers

pub mod log;

pub use log::Logger;

//! Namespace logger with a verbose gate
//!
//! Debug lines only appear with --verbose; warnings always go to stderr.

/// Lightweight namespaced logger, cheap to copy around
#[derive(Debug, Clone, Copy)]
pub struct Logger {
  namespace: &'static str,
  verbose: bool,
}

impl Logger {
  pub fn new(namespace: &'static str, verbose: bool) -> Self {
    Self { namespace, verbose }
  }

  /// Derive a logger for another namespace with the same verbosity
  pub fn with_namespace(&self, namespace: &'static str) -> Self {
    Self {
      namespace,
      verbose: self.verbose,
    }
  }

  /// User-facing progress line
  pub fn info(&self, message: impl AsRef<str>) {
    println!(" > [{}] {}", self.namespace, message.as_ref());
  }

  /// Diagnostic line, gated behind --verbose
  pub fn debug(&self, message: impl AsRef<str>) {
    if self.verbose {
      eprintln!(" > [{}] {}", self.namespace, message.as_ref());
    }
  }

  /// Warning, always printed to stderr
  pub fn warn(&self, message: impl AsRef<str>) {
    eprintln!(" ⚠ [{}] {}", self.namespace, message.as_ref());
  }
}

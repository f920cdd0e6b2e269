mod assets;
mod commands;
mod core;
mod engine;
mod index;
mod lang;
mod lockfile;
mod project;
mod ui;

use clap::{Parser, Subcommand};
use commands::affected::AffectedOptions;
use crate::core::error::{BlastError, print_error};
use std::path::PathBuf;

/// Find the projects truly affected by your changes
#[derive(Parser)]
#[command(name = "blast")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct BlastCli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compute affected projects, optionally running a target for them
  Affected {
    /// Target to run for the affected projects via `npx nx run-many`
    action: Option<String>,
    /// Workspace root (default: current directory)
    #[arg(long)]
    cwd: Option<PathBuf>,
    /// Git revision to compare against (default: origin/main)
    #[arg(long)]
    base: Option<String>,
    /// Consider every project affected, skipping analysis
    #[arg(long)]
    all: bool,
    /// Output format: text (default), json, names
    #[arg(long, default_value = "text")]
    format: String,
    /// Only report projects declaring this target
    #[arg(long)]
    target: Option<String>,
    /// Extra always-include file patterns (regex)
    #[arg(long = "include-files")]
    include_files: Vec<String>,
    /// Analyze lockfile deltas for affected import sites
    #[arg(long)]
    lockfile_check: bool,
    /// Print debug output
    #[arg(short, long)]
    verbose: bool,
    /// Additional arguments passed through to the action
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    action_args: Vec<String>,
  },

  /// List the projects discovered in the workspace
  Projects {
    /// Workspace root (default: current directory)
    #[arg(long)]
    cwd: Option<PathBuf>,
    /// Output projects in JSON format
    #[arg(long)]
    json: bool,
    /// Print debug output
    #[arg(short, long)]
    verbose: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = BlastCli::parse();

  let result = match cli.command {
    Commands::Affected {
      action,
      cwd,
      base,
      all,
      format,
      target,
      include_files,
      lockfile_check,
      verbose,
      action_args,
    } => commands::run_affected(AffectedOptions {
      cwd,
      action,
      base,
      all,
      format,
      target,
      include_files,
      lockfile_check,
      verbose,
      action_args,
    }),
    Commands::Projects { cwd, json, verbose } => commands::run_projects(cwd, json, verbose),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: BlastError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}

//! Command-line interface.
//!
//! ```bash
//! # Check every .j2 file below a role
//! ansible_template_checker roles/web
//!
//! # Check a single file, failing on undefined variables too
//! ansible_template_checker --strict-undefined roles/web/templates/nginx.conf.j2
//!
//! # Also collect .jinja2 files and accept a project filter plugin
//! ansible_template_checker -e .j2 -e .jinja2 --extra-filter site_lookup .
//! ```
//!
//! Diagnostics for failing templates go to stdout, one line each. Logs go to
//! stderr and are controlled by `--verbose`, `--quiet` or `RUST_LOG`.

mod report;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::core::CheckerError;
use crate::templating::{CheckOptions, CheckSummary, DEFAULT_SUFFIX, UndefinedPolicy, check_templates};
use crate::utils::{collect_templates, resolve_input_path};

pub use report::print_results;

/// Runtime configuration derived from the command line that is not part of
/// the check itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// `EnvFilter` directive. `None` defers to `RUST_LOG`, then `warn`.
    pub log_level: Option<String>,
    /// Whether diagnostics may be coloured.
    pub color: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            color: true,
        }
    }
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global tracing subscriber and colour override.
    ///
    /// Safe to call more than once; later calls leave the first subscriber in
    /// place.
    pub fn apply(&self) {
        if !self.color {
            colored::control::set_override(false);
        }

        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(self.color)
            .try_init();
    }
}

/// Pre-commit syntax checker for Ansible Jinja2 templates.
#[derive(Parser, Debug)]
#[command(
    name = "ansible_template_checker",
    about = "Check Ansible Jinja2 templates for syntax errors",
    version,
    long_about = "Renders every template below PATH with no variables bound and reports \
                  syntax errors, unknown filters and unknown tests with file and line."
)]
pub struct Cli {
    /// File or directory to check.
    path: Option<String>,

    /// Template file suffix to collect when walking a directory.
    ///
    /// May be given several times. Defaults to `.j2`.
    #[arg(short = 'e', long = "extension", value_name = "SUFFIX")]
    extensions: Vec<String>,

    /// Additional filter name to accept (e.g. from a project's `filter_plugins/`).
    #[arg(long = "extra-filter", value_name = "NAME")]
    extra_filters: Vec<String>,

    /// Report any use of an undefined variable as a failure.
    #[arg(long)]
    strict_undefined: bool,

    /// Enable debug logging on stderr.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,

    /// Disable coloured output.
    #[arg(long)]
    no_color: bool,
}

impl Cli {
    /// Parse arguments, configure logging and run the check.
    pub fn execute(self) -> Result<CheckSummary> {
        let config = self.build_config();
        self.execute_with_config(&config)
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            color: !self.no_color,
        }
    }

    /// Project the flags into [`CheckOptions`].
    #[must_use]
    pub fn build_options(&self) -> CheckOptions {
        let suffixes = if self.extensions.is_empty() {
            vec![DEFAULT_SUFFIX.to_string()]
        } else {
            self.extensions.iter().map(|ext| normalize_suffix(ext)).collect()
        };

        CheckOptions {
            suffixes,
            extra_filters: self.extra_filters.clone(),
            undefined: if self.strict_undefined {
                UndefinedPolicy::Strict
            } else {
                UndefinedPolicy::Permissive
            },
        }
    }

    pub fn execute_with_config(self, config: &CliConfig) -> Result<CheckSummary> {
        config.apply();

        let arg = self.path.as_deref().ok_or(CheckerError::MissingPath)?;
        let cwd = std::env::current_dir().map_err(|_| CheckerError::CurrentDirUnavailable)?;
        let path = resolve_input_path(arg, &cwd)?;

        let options = self.build_options();
        let templates = collect_templates(&path, &options.suffixes)?;
        tracing::debug!("Found {} template(s) under {}", templates.len(), path.display());

        let results = check_templates(&templates, &options)?;
        print_results(&results, config.color);

        let summary = CheckSummary::from_results(&results);
        tracing::info!(
            "Checked {} template(s): {} passed, {} ignored, {} failed",
            summary.checked,
            summary.passed,
            summary.ignored,
            summary.failed
        );
        Ok(summary)
    }
}

/// `j2` and `.j2` both mean the `.j2` suffix.
fn normalize_suffix(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}

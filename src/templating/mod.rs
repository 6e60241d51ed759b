//! Template checking for Ansible Jinja2 templates.
//!
//! Every discovered file is loaded into a [`TemplateSet`], rendered once with
//! no variables bound, and the engine's reaction is classified:
//!
//! - syntax errors and unknown filters/tests are reported as `FAILED:`
//! - undefined variables (strict policy only) are reported as `Undef!`
//! - runtime type errors and missing include targets are ignored, since both
//!   are expected when templates are rendered outside a play
//!
//! # Example
//!
//! ```rust,no_run
//! use ansible_template_checker::templating::{CheckOptions, check_templates};
//! use std::path::PathBuf;
//!
//! # fn example() -> anyhow::Result<()> {
//! let paths = vec![PathBuf::from("/srv/roles/web/templates/nginx.conf.j2")];
//! let results = check_templates(&paths, &CheckOptions::default())?;
//! for result in &results {
//!     println!("{}: {:?}", result.template, result.outcome);
//! }
//! # Ok(())
//! # }
//! ```

pub mod checker;
pub mod error;
pub mod plugins;
pub mod scan;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

pub use checker::TemplateChecker;
pub use error::{CheckOutcome, CheckResult, FailureKind, IgnoreReason, TemplateFailure};

/// Default template suffix.
pub const DEFAULT_SUFFIX: &str = ".j2";

/// Template sources keyed by name (the file's path), in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSet {
    sources: BTreeMap<String, String>,
}

/// A discovered file that could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFailure {
    pub template: String,
    pub reason: String,
}

impl TemplateSet {
    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(name.into(), source.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.sources.get(name).map(String::as_str)
    }

    /// Template names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Read every path as UTF-8. Unreadable files are returned separately
    /// instead of aborting the load.
    pub fn read_from_paths(paths: &[PathBuf]) -> (Self, Vec<ReadFailure>) {
        let mut set = Self::default();
        let mut failures = Vec::new();

        for path in paths {
            let name = template_name(path);
            match std::fs::read_to_string(path) {
                Ok(source) => {
                    tracing::debug!("Loaded template: {} ({} bytes)", name, source.len());
                    set.insert(name, source);
                }
                Err(err) => {
                    tracing::warn!("Cannot read template {}: {}", name, err);
                    failures.push(ReadFailure {
                        template: name,
                        reason: format!("unable to read template: {err}"),
                    });
                }
            }
        }

        (set, failures)
    }
}

fn template_name(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Treatment of variables that have no value at render time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UndefinedPolicy {
    /// Undefined values render as empty and chain through attribute access.
    #[default]
    Permissive,
    /// Any use of an undefined value is an error.
    Strict,
}

/// Options that shape a check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    /// File name suffixes collected when walking a directory.
    pub suffixes: Vec<String>,
    /// Additional filter names accepted as passthrough filters.
    pub extra_filters: Vec<String>,
    pub undefined: UndefinedPolicy,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            suffixes: vec![DEFAULT_SUFFIX.to_string()],
            extra_filters: Vec::new(),
            undefined: UndefinedPolicy::default(),
        }
    }
}

/// Counts over a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub checked: usize,
    pub passed: usize,
    pub ignored: usize,
    pub failed: usize,
}

impl CheckSummary {
    pub fn from_results(results: &[CheckResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            summary.checked += 1;
            match result.outcome {
                CheckOutcome::Passed => summary.passed += 1,
                CheckOutcome::Ignored {
                    ..
                } => summary.ignored += 1,
                CheckOutcome::Failed(_) => summary.failed += 1,
            }
            summary
        })
    }

    /// Process exit status: 0 when nothing failed.
    pub fn exit_code(&self) -> i32 {
        i32::from(self.failed > 0)
    }
}

/// Load and check `paths`. Results are ordered by template name.
pub fn check_templates(paths: &[PathBuf], options: &CheckOptions) -> Result<Vec<CheckResult>> {
    let (templates, unreadable) = TemplateSet::read_from_paths(paths);
    tracing::debug!("Checking {} template(s)", templates.len());

    let checker = TemplateChecker::new(templates, options)?;
    let mut results = checker.check_all();

    results.extend(unreadable.into_iter().map(|failure| CheckResult {
        outcome: CheckOutcome::Failed(TemplateFailure::new(
            FailureKind::Unreadable,
            failure.template.clone(),
            failure.reason,
        )),
        template: failure.template,
    }));
    results.sort_by(|a, b| a.template.cmp(&b.template));

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_template_set_orders_names() {
        let mut set = TemplateSet::default();
        set.insert("/b.j2", "b");
        set.insert("/a.j2", "a");
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["/a.j2", "/b.j2"]);
        assert_eq!(set.get("/a.j2"), Some("a"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_read_from_paths_reports_unreadable() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("good.j2");
        let binary = temp.path().join("binary.j2");
        let missing = temp.path().join("missing.j2");
        std::fs::write(&good, "{{ x }}").unwrap();
        std::fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();

        let (set, failures) = TemplateSet::read_from_paths(&[good.clone(), binary, missing]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&good.to_string_lossy()), Some("{{ x }}"));
        assert_eq!(failures.len(), 2);
    }

    #[test]
    fn test_summary_exit_code() {
        let passed = CheckResult {
            template: "a".to_string(),
            outcome: CheckOutcome::Passed,
        };
        let failed = CheckResult {
            template: "b".to_string(),
            outcome: CheckOutcome::Failed(TemplateFailure::new(FailureKind::Syntax, "b", "bad")),
        };

        let ok = CheckSummary::from_results(std::slice::from_ref(&passed));
        assert_eq!(ok.exit_code(), 0);

        let summary = CheckSummary::from_results(&[passed, failed]);
        assert_eq!(summary.checked, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(CheckSummary::default().exit_code(), 0);
    }

    #[test]
    fn test_check_templates_merges_unreadable() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("a.j2");
        let bad = temp.path().join("b.j2");
        std::fs::write(&good, "hello {{ name }}").unwrap();
        std::fs::write(&bad, [0xc3, 0x28]).unwrap();

        let results = check_templates(&[good, bad], &CheckOptions::default()).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].outcome, CheckOutcome::Passed);
        match &results[1].outcome {
            CheckOutcome::Failed(failure) => assert_eq!(failure.kind, FailureKind::Unreadable),
            other => panic!("expected unreadable failure, got {other:?}"),
        }
    }
}

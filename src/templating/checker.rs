//! Render-and-classify loop.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use minijinja::{Environment, UndefinedBehavior, context};

use super::error::{
    CheckOutcome, CheckResult, ErrorClass, FailureKind, IgnoreReason, TemplateFailure, classify,
    closest_name,
};
use super::plugins::{ExtraFilters, PluginRegistry};
use super::scan::{NameKind, NameScanner, NameUse};
use super::{CheckOptions, TemplateSet, UndefinedPolicy};

/// Renders every template of a [`TemplateSet`] with an empty context and
/// classifies what goes wrong.
pub struct TemplateChecker {
    env: Environment<'static>,
    templates: TemplateSet,
    filters: BTreeSet<String>,
    tests: BTreeSet<String>,
    scanner: NameScanner,
}

impl TemplateChecker {
    /// Build the render environment for `templates`.
    ///
    /// Templates are parsed lazily by the loader on first access, so building
    /// a checker never fails on a bad template.
    pub fn new(templates: TemplateSet, options: &CheckOptions) -> Result<Self> {
        let registry = PluginRegistry::ansible()
            .with_plugin(ExtraFilters::new(options.extra_filters.clone()));

        let mut env = Environment::new();
        env.set_undefined_behavior(match options.undefined {
            UndefinedPolicy::Permissive => UndefinedBehavior::Chainable,
            UndefinedPolicy::Strict => UndefinedBehavior::Strict,
        });
        registry.install(&mut env);

        let sources = templates.clone();
        env.set_loader(move |name| Ok(sources.get(name).map(str::to_string)));

        let scanner = NameScanner::new().context("Failed to compile template name scanner")?;

        Ok(Self {
            env,
            filters: registry.filter_names(),
            tests: registry.test_names(),
            templates,
            scanner,
        })
    }

    /// Check every template in name order. One failure never stops the rest.
    pub fn check_all(&self) -> Vec<CheckResult> {
        self.templates
            .names()
            .map(|name| CheckResult {
                template: name.to_string(),
                outcome: self.check(name),
            })
            .collect()
    }

    /// Check a single template by name.
    pub fn check(&self, name: &str) -> CheckOutcome {
        tracing::debug!("Checking template: {}", name);

        let template = match self.env.get_template(name) {
            Ok(template) => template,
            Err(err) => return self.outcome_for(name, &err),
        };

        if let Some(source) = self.templates.get(name) {
            if let Some(failure) = self.unknown_name(name, source) {
                return CheckOutcome::Failed(failure);
            }
        }

        match template.render(context! {}) {
            Ok(_) => CheckOutcome::Passed,
            Err(err) => self.outcome_for(name, &err),
        }
    }

    /// First filter or test reference that no plugin provides.
    fn unknown_name(&self, template: &str, source: &str) -> Option<TemplateFailure> {
        let NameUse {
            kind,
            name,
            line,
        } = self.scanner.scan(source).into_iter().find(|u| match u.kind {
            NameKind::Filter => !self.filters.contains(&u.name),
            NameKind::Test => !self.tests.contains(&u.name),
        })?;

        let (label, known) = match kind {
            NameKind::Filter => ("filter", &self.filters),
            NameKind::Test => ("test", &self.tests),
        };
        let mut message = format!("no {label} named '{name}'");
        if let Some(hint) = closest_name(&name, known.iter().map(String::as_str)) {
            message.push_str(&format!(" (did you mean '{hint}'?)"));
        }
        Some(TemplateFailure::new(FailureKind::Syntax, template, message).with_line(Some(line)))
    }

    fn outcome_for(&self, template: &str, err: &minijinja::Error) -> CheckOutcome {
        let message = err.detail().map_or_else(|| err.kind().to_string(), str::to_string);
        match classify(err.kind()) {
            ErrorClass::Syntax => CheckOutcome::Failed(
                TemplateFailure::new(FailureKind::Syntax, template, message).with_line(err.line()),
            ),
            ErrorClass::Undefined => {
                CheckOutcome::Failed(TemplateFailure::new(FailureKind::Undefined, template, message))
            }
            ErrorClass::Unexpected => {
                tracing::warn!("Unexpected engine error in {}: {:#}", template, err);
                CheckOutcome::Failed(TemplateFailure::new(
                    FailureKind::Unexpected,
                    template,
                    err.to_string(),
                ))
            }
            ErrorClass::TypeError => {
                tracing::debug!("Ignoring type error in {}: {}", template, err);
                CheckOutcome::Ignored {
                    reason: IgnoreReason::TypeError,
                    message,
                }
            }
            ErrorClass::TemplateNotFound => {
                tracing::debug!("Ignoring missing template referenced by {}: {}", template, err);
                CheckOutcome::Ignored {
                    reason: IgnoreReason::TemplateNotFound,
                    message,
                }
            }
        }
    }
}

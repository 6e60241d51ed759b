//! Per-template outcomes and engine error classification.
//!
//! A failing template is not an error of the program: it is a value that gets
//! reported and counted. Only the classes below that are marked as failures
//! change the exit code.

use std::fmt;

use colored::Colorize;
use minijinja::ErrorKind;
use strsim::levenshtein;

/// Maximum allowed Levenshtein distance as a percentage of the target length
/// for "did you mean" hints.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// How an engine error is treated by the checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed template or unknown filter/test. Reported, fails the run.
    Syntax,
    /// Undefined variable under the strict policy. Reported, fails the run.
    Undefined,
    /// Runtime type or argument error caused by missing variables. Ignored.
    TypeError,
    /// Include/extends/import target outside the checked tree. Ignored.
    TemplateNotFound,
    /// Anything else the engine raises. Reported, fails the run.
    Unexpected,
}

/// Map an engine error kind onto the checker's error classes.
pub fn classify(kind: ErrorKind) -> ErrorClass {
    match kind {
        ErrorKind::SyntaxError
        | ErrorKind::BadEscape
        | ErrorKind::UnknownFilter
        | ErrorKind::UnknownTest => ErrorClass::Syntax,
        ErrorKind::UndefinedError => ErrorClass::Undefined,
        ErrorKind::InvalidOperation
        | ErrorKind::NonPrimitive
        | ErrorKind::NonKey
        | ErrorKind::TooManyArguments
        | ErrorKind::MissingArgument
        | ErrorKind::CannotUnpack
        | ErrorKind::BadInclude
        | ErrorKind::UnknownFunction
        | ErrorKind::UnknownMethod => ErrorClass::TypeError,
        ErrorKind::TemplateNotFound => ErrorClass::TemplateNotFound,
        _ => ErrorClass::Unexpected,
    }
}

/// Closest candidate to `target` within the similarity threshold.
pub fn closest_name<'a>(target: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let limit = target.len() * SIMILARITY_THRESHOLD_PERCENT / 100;
    candidates
        .into_iter()
        .map(|candidate| (levenshtein(target, candidate), candidate))
        .filter(|(distance, _)| *distance > 0 && *distance <= limit)
        .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)))
        .map(|(_, candidate)| candidate.to_string())
}

/// Kind of a reported failure; decides the output prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Syntax,
    Undefined,
    Unexpected,
    Unreadable,
}

/// A reported failure for one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFailure {
    pub kind: FailureKind,
    pub template: String,
    pub message: String,
    pub line: Option<usize>,
}

impl TemplateFailure {
    pub fn new(kind: FailureKind, template: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            template: template.into(),
            message: message.into(),
            line: None,
        }
    }

    #[must_use]
    pub fn with_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    /// Leading marker of the diagnostic line.
    pub fn prefix(&self) -> &'static str {
        match self.kind {
            FailureKind::Syntax => "FAILED:",
            FailureKind::Undefined => "Undef!",
            FailureKind::Unexpected | FailureKind::Unreadable => "ERROR:",
        }
    }

    /// Diagnostic text after the prefix.
    pub fn body(&self) -> String {
        match self.kind {
            FailureKind::Syntax => {
                let line = self.line.map_or_else(|| "unknown".to_string(), |line| line.to_string());
                format!("{} in ({}) on line {}.", self.message, self.template, line)
            }
            FailureKind::Undefined | FailureKind::Unexpected | FailureKind::Unreadable => {
                format!("{} in {}", self.message, self.template)
            }
        }
    }

    /// The diagnostic line with a coloured prefix.
    pub fn colored(&self) -> String {
        let prefix = match self.kind {
            FailureKind::Syntax => self.prefix().red().bold(),
            FailureKind::Undefined => self.prefix().yellow().bold(),
            FailureKind::Unexpected | FailureKind::Unreadable => self.prefix().red(),
        };
        format!("{prefix} {}", self.body())
    }
}

impl fmt::Display for TemplateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.prefix(), self.body())
    }
}

/// Why an engine error was not reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    TypeError,
    TemplateNotFound,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeError => write!(f, "type error"),
            Self::TemplateNotFound => write!(f, "template not found"),
        }
    }
}

/// Result of checking one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Passed,
    Ignored {
        reason: IgnoreReason,
        message: String,
    },
    Failed(TemplateFailure),
}

impl CheckOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// A template name paired with its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub template: String,
    pub outcome: CheckOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_engine_errors() {
        assert_eq!(classify(ErrorKind::SyntaxError), ErrorClass::Syntax);
        assert_eq!(classify(ErrorKind::UnknownFilter), ErrorClass::Syntax);
        assert_eq!(classify(ErrorKind::UndefinedError), ErrorClass::Undefined);
        assert_eq!(classify(ErrorKind::InvalidOperation), ErrorClass::TypeError);
        assert_eq!(classify(ErrorKind::TemplateNotFound), ErrorClass::TemplateNotFound);
        assert_eq!(classify(ErrorKind::BadSerialization), ErrorClass::Unexpected);
    }

    #[test]
    fn test_closest_name() {
        let names = ["to_json", "to_yaml", "from_json"];
        assert_eq!(closest_name("to_jsn", names), Some("to_json".to_string()));
        assert_eq!(closest_name("completely_else", names), None);
        assert_eq!(closest_name("to_json", names), None);
    }

    #[test]
    fn test_failure_lines() {
        let failure = TemplateFailure::new(FailureKind::Syntax, "/t/a.j2", "unexpected end of input")
            .with_line(Some(3));
        assert_eq!(failure.to_string(), "FAILED: unexpected end of input in (/t/a.j2) on line 3.");

        let undef = TemplateFailure::new(FailureKind::Undefined, "/t/b.j2", "undefined value");
        assert_eq!(undef.to_string(), "Undef! undefined value in /t/b.j2");

        let unreadable = TemplateFailure::new(FailureKind::Unreadable, "/t/c.j2", "invalid UTF-8");
        assert_eq!(unreadable.to_string(), "ERROR: invalid UTF-8 in /t/c.j2");
    }

    #[test]
    fn test_missing_line_is_unknown() {
        let failure = TemplateFailure::new(FailureKind::Syntax, "x.j2", "bad");
        assert!(failure.body().ends_with("on line unknown."));
    }
}

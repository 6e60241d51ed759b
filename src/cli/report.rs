//! Diagnostic output for failing templates.

use std::io::Write;

use crate::templating::{CheckOutcome, CheckResult};

/// Print one line per failing template to stdout.
pub fn print_results(results: &[CheckResult], color: bool) {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    // stdout may already be closed by the reader
    let _ = write_results(&mut out, results, color);
}

/// Write one line per failing template; passed and ignored templates are
/// logged only.
pub fn write_results(out: &mut impl Write, results: &[CheckResult], color: bool) -> std::io::Result<()> {
    for result in results {
        match &result.outcome {
            CheckOutcome::Failed(failure) => {
                if color {
                    writeln!(out, "{}", failure.colored())?;
                } else {
                    writeln!(out, "{failure}")?;
                }
            }
            CheckOutcome::Ignored {
                reason,
                message,
            } => {
                tracing::debug!("Ignored {} in {}: {}", reason, result.template, message);
            }
            CheckOutcome::Passed => {
                tracing::debug!("Passed: {}", result.template);
            }
        }
    }
    out.flush()
}

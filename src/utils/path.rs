//! Resolution of the command-line path argument.

use std::path::{Path, PathBuf};

use super::fs::normalize_path;
use crate::core::CheckerError;

/// Resolve the user's path argument into an absolute file or directory path.
///
/// Resolution rules:
/// - an absolute argument is used as given
/// - `.` means the current working directory
/// - anything else is joined onto `cwd` and lexically normalized
///
/// # Errors
///
/// Returns [`CheckerError::InvalidPath`] when the resolved path is neither a
/// file nor a directory.
///
/// # Examples
///
/// ```rust,no_run
/// use ansible_template_checker::utils::resolve_input_path;
/// use std::path::Path;
///
/// # fn example() -> Result<(), ansible_template_checker::core::CheckerError> {
/// let path = resolve_input_path("roles/web/templates", Path::new("/srv/playbooks"))?;
/// assert_eq!(path, Path::new("/srv/playbooks/roles/web/templates"));
/// # Ok(())
/// # }
/// ```
pub fn resolve_input_path(arg: &str, cwd: &Path) -> Result<PathBuf, CheckerError> {
    let candidate = Path::new(arg);

    let path = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else if arg == "." {
        cwd.to_path_buf()
    } else {
        normalize_path(&cwd.join(candidate))
    };

    if path.is_dir() || path.is_file() {
        tracing::debug!("Resolved '{}' to {}", arg, path.display());
        Ok(path)
    } else {
        Err(CheckerError::InvalidPath {
            arg: arg.to_string(),
        })
    }
}

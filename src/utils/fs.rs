//! File system helpers for template discovery.

use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::core::CheckerError;

/// Normalizes a path by resolving `.` and `..` components lexically.
///
/// No file system access happens here, so the path does not need to exist.
///
/// ```rust
/// use ansible_template_checker::utils::normalize_path;
/// use std::path::Path;
///
/// let path = normalize_path(Path::new("/srv/roles/./web/../db/templates"));
/// assert_eq!(path, Path::new("/srv/roles/db/templates"));
/// ```
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop the root
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                }
            }
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Returns true when the file name ends with one of the given suffixes.
///
/// Matching is done on the raw file name, so `.j2` matches `nginx.conf.j2`
/// but not `nginx.j2.bak`.
#[must_use]
pub fn has_template_suffix(path: &Path, suffixes: &[String]) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .is_some_and(|name| suffixes.iter().any(|suffix| name.ends_with(suffix.as_str())))
}

/// Collects the template files to check.
///
/// A directory is walked recursively without following symbolic links and
/// every non-directory entry whose name ends in one of `suffixes` is kept. A
/// file is returned on its own, whatever its name. The result is sorted.
///
/// Entries that cannot be read during the walk are logged and skipped; the
/// rest of the tree is still checked. Only an unreadable root is an error.
pub fn collect_templates(path: &Path, suffixes: &[String]) -> Result<Vec<PathBuf>, CheckerError> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut templates = Vec::new();
    for entry in WalkDir::new(path).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(CheckerError::WalkFailed {
                    path: path.display().to_string(),
                    reason: err.to_string(),
                });
            }
            Err(err) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", path.display(), err);
                continue;
            }
        };

        // A link to a directory is listed but not descended into.
        if entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir()) {
            continue;
        }

        if has_template_suffix(entry.path(), suffixes) {
            tracing::debug!("Discovered template {}", entry.path().display());
            templates.push(entry.into_path());
        }
    }

    templates.sort();
    Ok(templates)
}

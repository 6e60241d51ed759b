//! Test utilities
//!
//! Helpers shared by unit and integration tests: one-time logging setup and a
//! temporary template tree.
//!
//! # Example
//!
//! ```rust,ignore
//! use ansible_template_checker::test_utils::TemplateTree;
//!
//! let tree = TemplateTree::new().unwrap();
//! tree.write("roles/web/templates/site.conf.j2", "server_name {{ host }};").unwrap();
//! assert!(tree.path().join("roles/web/templates/site.conf.j2").exists());
//! ```

use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, logging stays
/// off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// A temporary directory of template files, removed on drop.
pub struct TemplateTree {
    dir: TempDir,
}

impl TemplateTree {
    pub fn new() -> Result<Self> {
        let dir = TempDir::new().context("Failed to create temporary template tree")?;
        Ok(Self {
            dir,
        })
    }

    /// Root of the tree.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Result<PathBuf> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Create an empty directory at `relative`.
    pub fn mkdir(&self, relative: impl AsRef<Path>) -> Result<PathBuf> {
        let path = self.dir.path().join(relative);
        std::fs::create_dir_all(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(path)
    }
}

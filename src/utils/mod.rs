//! Path and file system utilities
//!
//! - [`path`] - resolving the command-line argument into an absolute path
//! - [`fs`] - recursive template discovery and path normalization

pub mod fs;
pub mod path;

pub use fs::{collect_templates, has_template_suffix, normalize_path};
pub use path::resolve_input_path;

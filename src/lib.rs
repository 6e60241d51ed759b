//! Pre-commit syntax checker for Ansible Jinja2 templates.
//!
//! The checker walks a file or directory, collects templates by suffix (`.j2`
//! by default), renders each one once with no variables bound and reports the
//! errors that mean the template itself is broken:
//!
//! ```text
//! FAILED: unexpected end of input, expected endif in (/srv/roles/web/templates/site.conf.j2) on line 14.
//! Undef! undefined value in /srv/roles/web/templates/motd.j2
//! ```
//!
//! Undefined variables, runtime type errors and include targets outside the
//! checked tree are expected when a template is rendered outside a play, so
//! they are ignored (undefined variables only fail with `--strict-undefined`).
//!
//! # Modules
//!
//! - [`cli`] - argument parsing, logging setup and diagnostic output
//! - [`core`] - error types and user-facing error formatting
//! - [`templating`] - template loading, Ansible plugin catalog and the
//!   render-and-classify loop
//! - [`utils`] - input path resolution and template discovery

pub mod cli;
pub mod core;
pub mod templating;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

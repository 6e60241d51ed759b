//! End-to-end tests for the `ansible_template_checker` binary.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **cli_args**: argument handling and path resolution
//! - **checking**: template outcomes and exit codes
//! - **options**: `--extension`, `--extra-filter` and `--strict-undefined`

use assert_cmd::Command;

mod checking;
mod cli_args;
mod options;

/// The checker binary with colour and logging pinned for stable output.
pub fn checker() -> Command {
    let mut cmd = Command::cargo_bin("ansible_template_checker").unwrap();
    cmd.arg("--no-color").env_remove("RUST_LOG");
    cmd
}

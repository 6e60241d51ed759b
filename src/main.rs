//! `ansible_template_checker` entry point.
//!
//! Exit status is 0 when every template passed or was ignored and 1 when any
//! template failed or the arguments were invalid.

use ansible_template_checker::cli;
use ansible_template_checker::core::user_friendly_error;
use clap::Parser;

fn main() {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(summary) => std::process::exit(summary.exit_code()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}

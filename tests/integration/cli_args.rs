use ansible_template_checker::test_utils::TemplateTree;
use predicates::prelude::*;

use crate::checker;

#[test]
fn test_missing_path_argument_fails() {
    checker()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Please provide a path for testing"));
}

#[test]
fn test_nonexistent_path_fails() {
    let tree = TemplateTree::new().unwrap();

    checker()
        .arg("does/not/exist")
        .current_dir(tree.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Provided arg (does/not/exist) is not a file or directory.",
        ));
}

#[test]
fn test_dot_checks_current_directory() {
    let tree = TemplateTree::new().unwrap();
    tree.write("templates/broken.j2", "{% for x in y %}\n").unwrap();

    checker()
        .arg(".")
        .current_dir(tree.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("broken.j2"));
}

#[test]
fn test_relative_directory_resolves_against_cwd() {
    let tree = TemplateTree::new().unwrap();
    tree.write("roles/web/templates/ok.j2", "{{ greeting | default('hi') }}\n").unwrap();

    checker().arg("roles").current_dir(tree.path()).assert().success().stdout("");
}

#[test]
fn test_single_file_ignores_suffix() {
    let tree = TemplateTree::new().unwrap();
    let file = tree.write("motd.tmpl", "{% if %}").unwrap();

    checker()
        .arg(&file)
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("FAILED: "))
        .stdout(predicate::str::contains(file.to_string_lossy().as_ref()));
}

#[test]
fn test_verbose_and_quiet_are_exclusive() {
    checker().args(["--verbose", "--quiet", "."]).assert().failure();
}

use ansible_template_checker::test_utils::TemplateTree;
use predicates::prelude::*;

use crate::checker;

#[test]
fn test_strict_undefined_reports_warning() {
    let tree = TemplateTree::new().unwrap();
    tree.write("vars.j2", "Hello {{ missing_name }}\n").unwrap();

    checker()
        .arg("--strict-undefined")
        .arg(tree.path())
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("Undef! "))
        .stdout(predicate::str::contains("vars.j2"));
}

#[test]
fn test_extension_option_selects_files() {
    let tree = TemplateTree::new().unwrap();
    tree.write("a.jinja2", "{% if %}").unwrap();
    tree.write("b.j2", "fine").unwrap();

    checker().arg(tree.path()).assert().success();

    checker()
        .args(["-e", "jinja2"])
        .arg(tree.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("a.jinja2"));
}

#[test]
fn test_extra_filter_is_accepted() {
    let tree = TemplateTree::new().unwrap();
    tree.write("custom.j2", "{{ servers | to_haproxy_backend('web') }}\n").unwrap();

    checker().arg(tree.path()).assert().code(1);

    checker()
        .args(["--extra-filter", "to_haproxy_backend"])
        .arg(tree.path())
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_verbose_logs_to_stderr_only() {
    let tree = TemplateTree::new().unwrap();
    tree.write("ok.j2", "{{ x }}").unwrap();

    checker()
        .arg("--verbose")
        .arg(tree.path())
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("Checking template"));
}

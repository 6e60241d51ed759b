use ansible_template_checker::test_utils::TemplateTree;
use predicates::prelude::*;

use crate::checker;

#[test]
fn test_valid_templates_pass() {
    let tree = TemplateTree::new().unwrap();
    tree.write(
        "nginx.conf.j2",
        "server {\n  listen {{ http_port | default(80) }};\n  server_name {{ inventory_hostname }};\n\
         {% for loc in locations | default([]) %}\n  location {{ loc.path }} { }\n{% endfor %}\n}\n",
    )
    .unwrap();
    tree.write(
        "config.yml.j2",
        "{{ settings | to_nice_yaml(indent=2) }}\n{{ users | map(attribute='name') | join(',') }}\n\
         {% if ansible_version.full is version('2.9', '>=') %}new{% endif %}\n",
    )
    .unwrap();

    checker().arg(tree.path()).assert().success().stdout("");
}

#[test]
fn test_ansible_core_plugins_pass() {
    let tree = TemplateTree::new().unwrap();
    tree.write(
        "matrix.j2",
        "{% for pair in zones | product(tiers) | list %}{{ pair | join('-') }}\n{% endfor %}\n\
         {{ peers | combinations(2) | list | length }} {{ query_string | urldecode }}\n",
    )
    .unwrap();
    tree.write(
        "status.j2",
        "{% if result is reachable and result is successful %}up{% endif %}\n\
         {% if wanted is issubset(installed) %}ok{% endif %}\n\
         {% if conf_dir is is_dir and endpoint is url %}{% endif %}\n",
    )
    .unwrap();

    checker().arg(tree.path()).assert().success().stdout("");
}

#[test]
fn test_syntax_error_reports_file_and_line() {
    let tree = TemplateTree::new().unwrap();
    let file = tree
        .write("broken.j2", "line one\nline two\n{{ value }\nline four\n")
        .unwrap();

    checker()
        .arg(tree.path())
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("FAILED: "))
        .stdout(predicate::str::contains(format!("in ({})", file.display())))
        .stdout(predicate::str::contains("on line"));
}

#[test]
fn test_unclosed_block_reports_failure() {
    let tree = TemplateTree::new().unwrap();
    tree.write("loop.j2", "{% for item in items %}\n{{ item }}\n").unwrap();

    checker()
        .arg(tree.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("loop.j2"));
}

#[test]
fn test_only_non_matching_files_pass() {
    let tree = TemplateTree::new().unwrap();
    tree.write("main.yml", "---\n- hosts: all\n").unwrap();
    tree.write("README.md", "{% this is not a template %}").unwrap();

    checker().arg(tree.path()).assert().success().stdout("");
}

#[test]
fn test_missing_include_is_ignored() {
    let tree = TemplateTree::new().unwrap();
    tree.write("page.j2", "{% include 'partials/header.j2' %}\nbody\n").unwrap();
    tree.write("child.j2", "{% extends 'base.j2' %}{% block x %}{% endblock %}").unwrap();

    checker().arg(tree.path()).assert().success().stdout("");
}

#[test]
fn test_type_errors_are_ignored() {
    let tree = TemplateTree::new().unwrap();
    tree.write("math.j2", "{{ 'port-' + 8080 }}\n").unwrap();

    checker().arg(tree.path()).assert().success();
}

#[test]
fn test_undefined_variables_pass_by_default() {
    let tree = TemplateTree::new().unwrap();
    tree.write("vars.j2", "{{ hostvars[inventory_hostname].ansible_host }}\n").unwrap();

    checker().arg(tree.path()).assert().success().stdout("");
}

#[test]
fn test_unknown_filter_fails_with_hint() {
    let tree = TemplateTree::new().unwrap();
    tree.write("typo.j2", "ok\n{{ data | to_nice_jsn }}\n").unwrap();

    checker()
        .arg(tree.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("no filter named 'to_nice_jsn'"))
        .stdout(predicate::str::contains("did you mean 'to_nice_json'?"))
        .stdout(predicate::str::contains("on line 2."));
}

#[test]
fn test_unknown_test_fails() {
    let tree = TemplateTree::new().unwrap();
    tree.write("test.j2", "{% if result is succeded %}ok{% endif %}\n").unwrap();

    checker()
        .arg(tree.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("no test named 'succeded'"));
}

#[test]
fn test_every_template_is_checked() {
    let tree = TemplateTree::new().unwrap();
    tree.write("a.j2", "{% if %}").unwrap();
    tree.write("b.j2", "fine").unwrap();
    tree.write("nested/c.j2", "{{ x | nope }}").unwrap();

    let assert = checker().arg(tree.path()).assert().code(1);
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "unexpected output: {stdout}");
    assert!(lines[0].contains("a.j2"));
    assert!(lines[1].contains("c.j2"));
}

#[test]
fn test_unreadable_template_is_reported() {
    let tree = TemplateTree::new().unwrap();
    tree.write("binary.j2", [0xffu8, 0xfe, 0xfd]).unwrap();

    checker()
        .arg(tree.path())
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("ERROR: "))
        .stdout(predicate::str::contains("binary.j2"));
}

//! Ansible test plugins (`value is version('2.0', '>=')` and friends).

use std::cmp::Ordering;
use std::path::Path;

use minijinja::value::{Rest, Value, ValueKind};
use minijinja::{Environment, Error, ErrorKind};
use regex::Regex;

use super::{CallArgs, TemplatePlugin, items};

const TESTS: &[&str] = &[
    // core.py
    "match",
    "search",
    "regex",
    "version",
    "version_compare",
    "success",
    "succeeded",
    "successful",
    "failed",
    "failure",
    "changed",
    "change",
    "skipped",
    "skip",
    "finished",
    "started",
    "reachable",
    "unreachable",
    "timedout",
    "any",
    "all",
    "truthy",
    "falsy",
    "vault_encrypted",
    "vaulted_file",
    // files.py
    "abs",
    "is_abs",
    "file",
    "is_file",
    "directory",
    "is_dir",
    "link",
    "is_link",
    "exists",
    "link_exists",
    "same_file",
    "is_same_file",
    "mount",
    "is_mount",
    // mathstuff.py
    "subset",
    "issubset",
    "superset",
    "issuperset",
    "contains",
    "nan",
    "isnan",
    // uri.py
    "uri",
    "url",
    "urn",
];

/// Test plugins from Ansible's `core.py`, `files.py`, `mathstuff.py` and
/// `uri.py`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsibleTests;

impl TemplatePlugin for AnsibleTests {
    fn name(&self) -> &'static str {
        "tests"
    }

    fn test_names(&self) -> Vec<String> {
        TESTS.iter().map(|name| (*name).to_string()).collect()
    }

    fn install(&self, env: &mut Environment<'static>) {
        env.add_test("match", regex_match);
        env.add_test("search", regex_search);
        env.add_test("regex", regex_test);
        env.add_test("version", version);
        env.add_test("version_compare", version);
        env.add_test("success", succeeded);
        env.add_test("succeeded", succeeded);
        env.add_test("successful", succeeded);
        env.add_test("failed", failed);
        env.add_test("failure", failed);
        env.add_test("changed", changed);
        env.add_test("change", changed);
        env.add_test("skipped", skipped);
        env.add_test("skip", skipped);
        env.add_test("finished", finished);
        env.add_test("started", started);
        env.add_test("reachable", reachable);
        env.add_test("unreachable", unreachable);
        env.add_test("timedout", timedout);
        env.add_test("any", any);
        env.add_test("all", all);
        env.add_test("truthy", truthy);
        env.add_test("falsy", falsy);
        env.add_test("vault_encrypted", vault_encrypted);
        env.add_test("vaulted_file", on_controller_disk);
        env.add_test("abs", is_abs);
        env.add_test("is_abs", is_abs);
        for name in ["file", "is_file", "directory", "is_dir", "link", "is_link", "exists", "link_exists"] {
            env.add_test(name, on_controller_disk);
        }
        env.add_test("same_file", same_file);
        env.add_test("is_same_file", same_file);
        env.add_test("mount", on_controller_disk);
        env.add_test("is_mount", on_controller_disk);
        env.add_test("subset", subset);
        env.add_test("issubset", subset);
        env.add_test("superset", superset);
        env.add_test("issuperset", superset);
        env.add_test("contains", contains);
        env.add_test("nan", nan);
        env.add_test("isnan", nan);
        env.add_test("uri", uri);
        env.add_test("url", url);
        env.add_test("urn", urn);
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidOperation, message.into())
}

fn text(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

fn regex_with_flags(pattern: &str, ignorecase: bool, multiline: bool) -> Result<Regex, Error> {
    regex::RegexBuilder::new(pattern)
        .case_insensitive(ignorecase)
        .multi_line(multiline)
        .build()
        .map_err(|err| invalid(format!("invalid regular expression '{pattern}'")).with_source(err))
}

#[derive(Clone, Copy, PartialEq)]
enum MatchType {
    Match,
    Search,
}

fn regex_check(value: &Value, args: &CallArgs, default: MatchType) -> Result<bool, Error> {
    if value.is_undefined() {
        return Ok(false);
    }
    let pattern = args
        .get(0, "pattern")
        .ok_or_else(|| Error::new(ErrorKind::MissingArgument, "regex test requires a pattern"))?;
    let mode = match args.get(3, "match_type").as_ref().and_then(Value::as_str) {
        Some("match") => MatchType::Match,
        Some("search") => MatchType::Search,
        Some(other) => return Err(invalid(format!("unsupported match_type '{other}'"))),
        None => default,
    };
    let re = regex_with_flags(&text(&pattern), args.flag(1, "ignorecase"), args.flag(2, "multiline"))?;
    let haystack = text(value);
    Ok(match mode {
        MatchType::Search => re.is_match(&haystack),
        MatchType::Match => re.find(&haystack).is_some_and(|m| m.start() == 0),
    })
}

fn regex_match(value: Value, rest: Rest<Value>) -> Result<bool, Error> {
    regex_check(&value, &CallArgs::new(rest), MatchType::Match)
}

fn regex_search(value: Value, rest: Rest<Value>) -> Result<bool, Error> {
    regex_check(&value, &CallArgs::new(rest), MatchType::Search)
}

fn regex_test(value: Value, rest: Rest<Value>) -> Result<bool, Error> {
    regex_check(&value, &CallArgs::new(rest), MatchType::Search)
}

/// One dotted component of a loose version string.
#[derive(Debug, PartialEq, Eq)]
enum VersionPart {
    Number(u64),
    Text(String),
}

impl PartialOrd for VersionPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Greater,
            (Self::Text(_), Self::Number(_)) => Ordering::Less,
        }
    }
}

fn version_parts(version: &str) -> Vec<VersionPart> {
    let mut parts = Vec::new();
    for segment in version.split(['.', '-', '+', '_']).filter(|s| !s.is_empty()) {
        let mut digits = String::new();
        let mut letters = String::new();
        for c in segment.chars() {
            if c.is_ascii_digit() && letters.is_empty() {
                digits.push(c);
            } else {
                letters.push(c);
            }
        }
        if !digits.is_empty() {
            parts.push(VersionPart::Number(digits.parse().unwrap_or(u64::MAX)));
        }
        if !letters.is_empty() {
            parts.push(VersionPart::Text(letters));
        }
    }
    parts
}

fn compare_versions(left: &str, right: &str) -> Ordering {
    version_parts(left).cmp(&version_parts(right))
}

fn version(value: Value, rest: Rest<Value>) -> Result<bool, Error> {
    let args = CallArgs::new(rest);
    let other = args
        .get(0, "version")
        .ok_or_else(|| Error::new(ErrorKind::MissingArgument, "version test requires a version"))?;
    if value.is_undefined() || other.is_undefined() {
        return Ok(false);
    }
    let operator = args
        .get(1, "operator")
        .map_or_else(|| "eq".to_string(), |op| text(&op));
    let ordering = compare_versions(&text(&value), &text(&other));
    let result = match operator.as_str() {
        "==" | "=" | "eq" => ordering == Ordering::Equal,
        "!=" | "<>" | "ne" => ordering != Ordering::Equal,
        "<" | "lt" => ordering == Ordering::Less,
        "<=" | "le" => ordering != Ordering::Greater,
        ">" | "gt" => ordering == Ordering::Greater,
        ">=" | "ge" => ordering != Ordering::Less,
        other => return Err(invalid(format!("invalid operator type ({other})"))),
    };
    Ok(result)
}

/// Task result field, erroring when the value is not a result mapping.
fn result_field(value: &Value, test: &str, field: &str) -> Result<Option<bool>, Error> {
    if value.is_undefined() {
        return Ok(None);
    }
    if value.kind() != ValueKind::Map {
        return Err(invalid(format!("the '{test}' test expects a dictionary")));
    }
    let field = value.get_attr(field)?;
    if field.is_undefined() {
        return Ok(None);
    }
    Ok(Some(field.is_true()))
}

fn failed(value: Value) -> Result<bool, Error> {
    Ok(result_field(&value, "failed", "failed")?.unwrap_or(false))
}

fn succeeded(value: Value) -> Result<bool, Error> {
    Ok(!result_field(&value, "succeeded", "failed")?.unwrap_or(false))
}

fn changed(value: Value) -> Result<bool, Error> {
    Ok(result_field(&value, "changed", "changed")?.unwrap_or(false))
}

fn skipped(value: Value) -> Result<bool, Error> {
    Ok(result_field(&value, "skipped", "skipped")?.unwrap_or(false))
}

fn finished(value: Value) -> Result<bool, Error> {
    Ok(result_field(&value, "finished", "finished")?.unwrap_or(true))
}

fn started(value: Value) -> Result<bool, Error> {
    Ok(result_field(&value, "started", "started")?.unwrap_or(true))
}

fn reachable(value: Value) -> Result<bool, Error> {
    Ok(!result_field(&value, "reachable", "unreachable")?.unwrap_or(false))
}

fn unreachable(value: Value) -> Result<bool, Error> {
    Ok(result_field(&value, "unreachable", "unreachable")?.unwrap_or(false))
}

/// True when the task hit its `timeout` and recorded the period.
fn timedout(value: Value) -> Result<bool, Error> {
    if result_field(&value, "timedout", "timedout")? != Some(true) {
        return Ok(false);
    }
    Ok(value.get_attr("timedout")?.get_attr("period")?.is_true())
}

fn is_abs(value: Value) -> bool {
    !value.is_undefined() && Path::new(&text(&value)).is_absolute()
}

// Paths named in a template live on the managed host, so file system tests
// never touch the local disk.
fn on_controller_disk(_value: Value) -> bool {
    false
}

fn same_file(_value: Value, _other: Value) -> bool {
    false
}

fn subset(value: Value, other: Value) -> Result<bool, Error> {
    let other = items(&other)?;
    Ok(items(&value)?.iter().all(|item| other.contains(item)))
}

fn superset(value: Value, other: Value) -> Result<bool, Error> {
    let own = items(&value)?;
    Ok(items(&other)?.iter().all(|item| own.contains(item)))
}

fn contains(value: Value, item: Value) -> Result<bool, Error> {
    Ok(items(&value)?.contains(&item))
}

fn any(value: Value) -> Result<bool, Error> {
    Ok(items(&value)?.iter().any(Value::is_true))
}

fn all(value: Value) -> Result<bool, Error> {
    Ok(items(&value)?.iter().all(Value::is_true))
}

fn truthy(value: Value, rest: Rest<Value>) -> bool {
    let convert_bool = CallArgs::new(rest).flag(0, "convert_bool");
    if convert_bool {
        if let Some(s) = value.as_str() {
            return matches!(s.to_lowercase().as_str(), "yes" | "on" | "1" | "true" | "y");
        }
    }
    value.is_true()
}

fn falsy(value: Value, rest: Rest<Value>) -> bool {
    !truthy(value, rest)
}

fn vault_encrypted(value: Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.trim_start().starts_with("$ANSIBLE_VAULT;"))
}

fn nan(value: Value) -> bool {
    f64::try_from(value).is_ok_and(f64::is_nan)
}

/// Scheme and remainder of `value`, split the way Python's `urlparse` does.
fn split_scheme(value: &str) -> (String, &str) {
    if let Some((scheme, rest)) = value.split_once(':') {
        let valid = scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if valid {
            return (scheme.to_ascii_lowercase(), rest);
        }
    }
    (String::new(), value)
}

fn netloc(rest: &str) -> &str {
    rest.strip_prefix("//")
        .map_or("", |after| &after[..after.find(['/', '?', '#']).unwrap_or(after.len())])
}

fn scheme_allowed(scheme: &str, schemes: Option<&Value>) -> Result<bool, Error> {
    let Some(schemes) = schemes else {
        return Ok(true);
    };
    let allowed = items(schemes)?;
    Ok(allowed.is_empty() || allowed.iter().any(|s| s.as_str() == Some(scheme)))
}

fn uri(value: Value, schemes: Option<Value>) -> Result<bool, Error> {
    let Some(s) = value.as_str() else {
        return Ok(false);
    };
    let (scheme, _) = split_scheme(s);
    scheme_allowed(&scheme, schemes.as_ref())
}

fn url(value: Value, schemes: Option<Value>) -> Result<bool, Error> {
    let Some(s) = value.as_str() else {
        return Ok(false);
    };
    let (scheme, rest) = split_scheme(s);
    Ok(scheme_allowed(&scheme, schemes.as_ref())? && (!netloc(rest).is_empty() || scheme == "file"))
}

fn urn(value: Value) -> Result<bool, Error> {
    uri(value, Some(Value::from(vec!["urn"])))
}

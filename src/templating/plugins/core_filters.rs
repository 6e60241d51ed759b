//! Ansible's core filter plugin, implemented natively.
//!
//! Undefined input is handed back unchanged by every filter here so a template
//! rendered without variables keeps going past the filter call.

use base64::Engine as _;
use minijinja::value::{Rest, Value, ValueKind};
use minijinja::{Environment, Error, ErrorKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::Digest;

use super::{CallArgs, TemplatePlugin, items, pairs};

/// Namespace Ansible uses for `to_uuid`.
const ANSIBLE_UUID_NAMESPACE: &str = "361e6d51-faec-444a-9079-341386da8e2e";

const FILTERS: &[&str] = &[
    "to_json",
    "to_nice_json",
    "from_json",
    "to_yaml",
    "to_nice_yaml",
    "from_yaml",
    "from_yaml_all",
    "b64encode",
    "b64decode",
    "bool",
    "ternary",
    "regex_replace",
    "regex_search",
    "regex_findall",
    "regex_escape",
    "quote",
    "urldecode",
    "basename",
    "dirname",
    "splitext",
    "path_join",
    "to_uuid",
    "hash",
    "combine",
    "dict2items",
    "items2dict",
    "flatten",
    "type_debug",
    "comment",
    "mandatory",
];

/// Filters from Ansible's `core.py`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreFilters;

impl TemplatePlugin for CoreFilters {
    fn name(&self) -> &'static str {
        "core"
    }

    fn filter_names(&self) -> Vec<String> {
        FILTERS.iter().map(|name| (*name).to_string()).collect()
    }

    fn install(&self, env: &mut Environment<'static>) {
        env.add_filter("to_json", to_json);
        env.add_filter("to_nice_json", to_nice_json);
        env.add_filter("from_json", from_json);
        env.add_filter("to_yaml", to_yaml);
        env.add_filter("to_nice_yaml", to_yaml);
        env.add_filter("from_yaml", from_yaml);
        env.add_filter("from_yaml_all", from_yaml_all);
        env.add_filter("b64encode", b64encode);
        env.add_filter("b64decode", b64decode);
        env.add_filter("bool", to_bool);
        env.add_filter("ternary", ternary);
        env.add_filter("regex_replace", regex_replace);
        env.add_filter("regex_search", regex_search);
        env.add_filter("regex_findall", regex_findall);
        env.add_filter("regex_escape", regex_escape);
        env.add_filter("quote", quote);
        env.add_filter("urldecode", urldecode);
        env.add_filter("basename", basename);
        env.add_filter("dirname", dirname);
        env.add_filter("splitext", splitext);
        env.add_filter("path_join", path_join);
        env.add_filter("to_uuid", to_uuid);
        env.add_filter("hash", hash);
        env.add_filter("combine", combine);
        env.add_filter("dict2items", dict2items);
        env.add_filter("items2dict", items2dict);
        env.add_filter("flatten", flatten);
        env.add_filter("type_debug", type_debug);
        env.add_filter("comment", comment);
        env.add_filter("mandatory", mandatory);
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidOperation, message.into())
}

/// String content of a value; non-strings use their display form.
fn text(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

fn to_json(value: Value, _options: Rest<Value>) -> Result<String, Error> {
    serde_json::to_string(&value)
        .map_err(|err| invalid("unable to encode value as JSON").with_source(err))
}

fn to_nice_json(value: Value, _options: Rest<Value>) -> Result<String, Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|err| invalid("unable to encode value as JSON").with_source(err))?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn from_json(value: Value, _options: Rest<Value>) -> Result<Value, Error> {
    if value.is_undefined() {
        return Ok(value);
    }
    let parsed: serde_json::Value = serde_json::from_str(&text(&value))
        .map_err(|err| invalid("unable to decode JSON").with_source(err))?;
    Ok(Value::from_serialize(&parsed))
}

fn to_yaml(value: Value, _options: Rest<Value>) -> Result<String, Error> {
    serde_yaml::to_string(&value)
        .map_err(|err| invalid("unable to encode value as YAML").with_source(err))
}

fn from_yaml(value: Value) -> Result<Value, Error> {
    if value.is_undefined() {
        return Ok(value);
    }
    let parsed: serde_yaml::Value = serde_yaml::from_str(&text(&value))
        .map_err(|err| invalid("unable to decode YAML").with_source(err))?;
    Ok(Value::from_serialize(&parsed))
}

fn from_yaml_all(value: Value) -> Result<Value, Error> {
    if value.is_undefined() {
        return Ok(value);
    }
    let source = text(&value);
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&source) {
        let parsed = serde_yaml::Value::deserialize(document)
            .map_err(|err| invalid("unable to decode YAML").with_source(err))?;
        documents.push(Value::from_serialize(&parsed));
    }
    Ok(Value::from(documents))
}

fn b64encode(value: Value, _options: Rest<Value>) -> Value {
    if value.is_undefined() {
        return value;
    }
    Value::from(base64::engine::general_purpose::STANDARD.encode(text(&value)))
}

fn b64decode(value: Value, _options: Rest<Value>) -> Result<Value, Error> {
    if value.is_undefined() {
        return Ok(value);
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(text(&value).trim())
        .map_err(|err| invalid("invalid base64 input").with_source(err))?;
    Ok(Value::from(String::from_utf8_lossy(&bytes).into_owned()))
}

/// Ansible's `bool`: booleans and none pass through, strings are parsed.
fn to_bool(value: Value) -> Value {
    match value.kind() {
        ValueKind::Bool | ValueKind::None | ValueKind::Undefined => value,
        _ => {
            let lowered = text(&value).to_lowercase();
            Value::from(matches!(lowered.as_str(), "yes" | "on" | "1" | "true"))
        }
    }
}

fn ternary(value: Value, true_val: Value, false_val: Value, none_val: Option<Value>) -> Value {
    match none_val {
        Some(none_val) if value.is_none() => return none_val,
        _ => {}
    }
    if value.is_true() { true_val } else { false_val }
}

/// Compile a Python-flavoured pattern honouring `ignorecase`/`multiline`.
fn compile_pattern(pattern: &str, args: &CallArgs) -> Result<Regex, Error> {
    let mut flags = String::new();
    if args.keyword("ignorecase").is_some_and(|v| v.is_true()) {
        flags.push('i');
    }
    if args.keyword("multiline").is_some_and(|v| v.is_true()) {
        flags.push('m');
    }
    let pattern = if flags.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{flags}){pattern}")
    };
    Regex::new(&pattern).map_err(|err| invalid("invalid regular expression").with_source(err))
}

/// Translate Python replacement syntax (`\1`, `\g<name>`) to the `regex` crate's.
fn python_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' => match chars.peek().copied() {
                Some(d) if d.is_ascii_digit() => {
                    let mut group = String::new();
                    while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                        group.push(d);
                        chars.next();
                    }
                    out.push_str(&format!("${{{group}}}"));
                }
                Some('g') => {
                    chars.next();
                    if chars.peek() == Some(&'<') {
                        chars.next();
                        let name: String = chars.by_ref().take_while(|c| *c != '>').collect();
                        out.push_str(&format!("${{{name}}}"));
                    } else {
                        out.push_str("\\g");
                    }
                }
                Some('n') => {
                    chars.next();
                    out.push('\n');
                }
                Some('\\') => {
                    chars.next();
                    out.push('\\');
                }
                _ => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}

fn regex_replace(value: Value, pattern: String, rest: Rest<Value>) -> Result<Value, Error> {
    if value.is_undefined() {
        return Ok(value);
    }
    let args = CallArgs::new(rest);
    let regex = compile_pattern(&pattern, &args)?;
    let replacement = args.get(0, "replacement").map(|v| text(&v)).unwrap_or_default();
    let input = text(&value);
    Ok(Value::from(regex.replace_all(&input, python_replacement(&replacement).as_str()).into_owned()))
}

fn regex_search(value: Value, pattern: String, rest: Rest<Value>) -> Result<Value, Error> {
    if value.is_undefined() {
        return Ok(value);
    }
    let args = CallArgs::new(rest);
    let regex = compile_pattern(&pattern, &args)?;
    let input = text(&value);
    let Some(captures) = regex.captures(&input) else {
        return Ok(Value::from(()));
    };

    let groups: Vec<&str> = args
        .positional()
        .iter()
        .filter_map(Value::as_str)
        .filter(|arg| arg.starts_with('\\'))
        .collect();
    if groups.is_empty() {
        return Ok(Value::from(captures.get(0).map_or("", |m| m.as_str())));
    }

    let selected = groups
        .iter()
        .map(|group| {
            let reference = group.trim_start_matches('\\');
            let found = match reference.parse::<usize>() {
                Ok(index) => captures.get(index),
                Err(_) => captures.name(reference.trim_start_matches("g<").trim_end_matches('>')),
            };
            Value::from(found.map_or("", |m| m.as_str()))
        })
        .collect::<Vec<_>>();
    Ok(Value::from(selected))
}

fn regex_findall(value: Value, pattern: String, rest: Rest<Value>) -> Result<Value, Error> {
    if value.is_undefined() {
        return Ok(value);
    }
    let args = CallArgs::new(rest);
    let regex = compile_pattern(&pattern, &args)?;
    let input = text(&value);
    let group_count = regex.captures_len() - 1;

    let found = regex
        .captures_iter(&input)
        .map(|captures| match group_count {
            0 => Value::from(captures.get(0).map_or("", |m| m.as_str())),
            1 => Value::from(captures.get(1).map_or("", |m| m.as_str())),
            _ => Value::from(
                (1..=group_count)
                    .map(|i| Value::from(captures.get(i).map_or("", |m| m.as_str())))
                    .collect::<Vec<_>>(),
            ),
        })
        .collect::<Vec<_>>();
    Ok(Value::from(found))
}

fn regex_escape(value: Value, _options: Rest<Value>) -> Value {
    if value.is_undefined() {
        return value;
    }
    Value::from(regex::escape(&text(&value)))
}

/// POSIX shell quoting, as Python's `shlex.quote`.
fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    let safe = s.chars().all(|c| c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "'\"'\"'"))
    }
}

fn quote(value: Value) -> Value {
    if value.is_undefined() {
        return value;
    }
    Value::from(shell_quote(&text(&value)))
}

/// Percent-decoding with `+` as a space, as Python's `unquote_plus`.
fn unquote_plus(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let decoded = bytes
                    .get(i + 1..i + 3)
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                match decoded {
                    Some(byte) => {
                        out.push(byte);
                        i += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            other => out.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn urldecode(value: Value) -> Value {
    if value.is_undefined() {
        return value;
    }
    Value::from(unquote_plus(&text(&value)))
}

fn basename(value: Value) -> Value {
    if value.is_undefined() {
        return value;
    }
    let path = text(&value);
    Value::from(path.rsplit('/').next().unwrap_or_default())
}

/// Python's `os.path.dirname`: trailing slashes are stripped unless the head
/// is nothing but slashes.
fn dirname_of(path: &str) -> &str {
    match path.rfind('/') {
        None => "",
        Some(index) => {
            let head = &path[..=index];
            let trimmed = head.trim_end_matches('/');
            if trimmed.is_empty() { head } else { trimmed }
        }
    }
}

fn dirname(value: Value) -> Value {
    if value.is_undefined() {
        return value;
    }
    Value::from(dirname_of(&text(&value)))
}

/// Python's `os.path.splitext`; leading dots of the file name never start an
/// extension.
fn split_extension(path: &str) -> (&str, &str) {
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    let name = &path[name_start..];
    let leading_dots = name.len() - name.trim_start_matches('.').len();
    match name.rfind('.') {
        Some(dot) if dot >= leading_dots => path.split_at(name_start + dot),
        _ => (path, ""),
    }
}

fn splitext(value: Value) -> Value {
    if value.is_undefined() {
        return value;
    }
    let path = text(&value);
    let (root, ext) = split_extension(&path);
    Value::from(vec![Value::from(root), Value::from(ext)])
}

fn path_join(value: Value) -> Result<Value, Error> {
    if value.is_undefined() {
        return Ok(value);
    }
    if value.kind() == ValueKind::String {
        return Ok(value);
    }
    let mut joined = String::new();
    for part in items(&value)? {
        let part = text(&part);
        if part.starts_with('/') || joined.is_empty() {
            joined = part;
        } else if joined.ends_with('/') {
            joined.push_str(&part);
        } else {
            joined.push('/');
            joined.push_str(&part);
        }
    }
    Ok(Value::from(joined))
}

fn to_uuid(value: Value, namespace: Option<String>) -> Result<Value, Error> {
    if value.is_undefined() {
        return Ok(value);
    }
    let namespace = namespace.as_deref().unwrap_or(ANSIBLE_UUID_NAMESPACE);
    let namespace = uuid::Uuid::parse_str(namespace)
        .map_err(|err| invalid("invalid UUID namespace").with_source(err))?;
    Ok(Value::from(uuid::Uuid::new_v5(&namespace, text(&value).as_bytes()).to_string()))
}

fn hash(value: Value, algorithm: Option<String>) -> Result<Value, Error> {
    if value.is_undefined() {
        return Ok(value);
    }
    let input = text(&value);
    let digest = match algorithm.as_deref().unwrap_or("sha1") {
        "sha224" => hex::encode(sha2::Sha224::digest(input.as_bytes())),
        "sha256" => hex::encode(sha2::Sha256::digest(input.as_bytes())),
        "sha384" => hex::encode(sha2::Sha384::digest(input.as_bytes())),
        "sha512" => hex::encode(sha2::Sha512::digest(input.as_bytes())),
        other => return Err(invalid(format!("unsupported hash algorithm '{other}'"))),
    };
    Ok(Value::from(digest))
}

fn merge_into(target: &mut Vec<(Value, Value)>, source: Vec<(Value, Value)>, recursive: bool) {
    for (key, value) in source {
        match target.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing))
                if recursive
                    && existing.kind() == ValueKind::Map
                    && value.kind() == ValueKind::Map =>
            {
                let mut nested = pairs(existing).unwrap_or_default();
                merge_into(&mut nested, pairs(&value).unwrap_or_default(), true);
                *existing = Value::from_iter(nested);
            }
            Some((_, existing)) => *existing = value,
            None => target.push((key, value)),
        }
    }
}

fn combine(value: Value, rest: Rest<Value>) -> Result<Value, Error> {
    let args = CallArgs::new(rest);
    let recursive = args.keyword("recursive").is_some_and(|v| v.is_true());

    let mut merged = pairs(&value)?;
    for other in args.positional() {
        if other.kind() == ValueKind::Seq {
            for nested in items(other)? {
                merge_into(&mut merged, pairs(&nested)?, recursive);
            }
        } else {
            merge_into(&mut merged, pairs(other)?, recursive);
        }
    }
    Ok(Value::from_iter(merged))
}

fn dict2items(value: Value, rest: Rest<Value>) -> Result<Value, Error> {
    let args = CallArgs::new(rest);
    let key_name = args.get(0, "key_name").map_or_else(|| "key".to_string(), |v| text(&v));
    let value_name = args.get(1, "value_name").map_or_else(|| "value".to_string(), |v| text(&v));

    let entries = pairs(&value)?
        .into_iter()
        .map(|(key, item)| {
            Value::from_iter([(key_name.clone(), key), (value_name.clone(), item)])
        })
        .collect::<Vec<_>>();
    Ok(Value::from(entries))
}

fn items2dict(value: Value, rest: Rest<Value>) -> Result<Value, Error> {
    let args = CallArgs::new(rest);
    let key_name = args.get(0, "key_name").map_or_else(|| "key".to_string(), |v| text(&v));
    let value_name = args.get(1, "value_name").map_or_else(|| "value".to_string(), |v| text(&v));

    let mut out = Vec::new();
    for entry in items(&value)? {
        out.push((entry.get_attr(&key_name)?, entry.get_attr(&value_name)?));
    }
    Ok(Value::from_iter(out))
}

fn flatten_into(out: &mut Vec<Value>, value: &Value, levels: Option<usize>, skip_nulls: bool) {
    for item in items(value).unwrap_or_default() {
        if skip_nulls && (item.is_none() || item.is_undefined()) {
            continue;
        }
        match (item.kind(), levels) {
            (ValueKind::Seq, Some(0)) => out.push(item),
            (ValueKind::Seq, levels) => {
                flatten_into(out, &item, levels.map(|l| l - 1), skip_nulls);
            }
            _ => out.push(item),
        }
    }
}

fn flatten(value: Value, rest: Rest<Value>) -> Value {
    if value.is_undefined() {
        return value;
    }
    let args = CallArgs::new(rest);
    let levels = args.get(0, "levels").and_then(|v| usize::try_from(v).ok());
    let skip_nulls = args.get(1, "skip_nulls").is_none_or(|v| v.is_true());

    let mut out = Vec::new();
    flatten_into(&mut out, &value, levels, skip_nulls);
    Value::from(out)
}

/// Python type name of a value, as `type_debug` reports it.
fn python_type_name(value: &Value) -> &'static str {
    match value.kind() {
        ValueKind::Undefined => "AnsibleUndefined",
        ValueKind::None => "NoneType",
        ValueKind::Bool => "bool",
        ValueKind::Number => {
            if i64::try_from(value.clone()).is_ok() {
                "int"
            } else {
                "float"
            }
        }
        ValueKind::String => "str",
        ValueKind::Bytes => "bytes",
        ValueKind::Seq => "list",
        ValueKind::Map => "dict",
        _ => "object",
    }
}

fn type_debug(value: Value) -> Value {
    Value::from(python_type_name(&value))
}

fn comment(value: Value, _options: Rest<Value>) -> Value {
    if value.is_undefined() {
        return value;
    }
    let body = text(&value)
        .lines()
        .map(|line| if line.is_empty() { "#".to_string() } else { format!("# {line}") })
        .collect::<Vec<_>>()
        .join("\n");
    Value::from(format!("#\n{body}\n#"))
}

/// Without bound variables every value is undefined, so `mandatory` cannot
/// fail here.
fn mandatory(value: Value, _options: Rest<Value>) -> Value {
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    fn render(source: &str) -> String {
        let mut env = Environment::new();
        CoreFilters.install(&mut env);
        env.render_str(source, context! {}).unwrap()
    }

    #[test]
    fn test_json_and_yaml_round_out() {
        assert_eq!(render(r#"{{ {"a": 1} | to_json }}"#), r#"{"a":1}"#);
        assert_eq!(render(r#"{{ '{"a": [1, 2]}' | from_json | to_json }}"#), r#"{"a":[1,2]}"#);
        assert_eq!(render(r#"{{ "a: 1" | from_yaml | to_json }}"#), r#"{"a":1}"#);
        assert_eq!(render(r#"{{ {"a": 1} | to_nice_yaml }}"#).trim(), "a: 1");
    }

    #[test]
    fn test_to_nice_json_uses_four_spaces() {
        assert_eq!(render(r#"{{ {"a": 1} | to_nice_json }}"#), "{\n    \"a\": 1\n}");
    }

    #[test]
    fn test_b64_round_trip() {
        assert_eq!(render("{{ 'hello' | b64encode }}"), "aGVsbG8=");
        assert_eq!(render("{{ 'aGVsbG8=' | b64decode }}"), "hello");
    }

    #[test]
    fn test_bool_and_ternary() {
        assert_eq!(render("{{ 'yes' | bool }}"), "true");
        assert_eq!(render("{{ 'off' | bool }}"), "false");
        assert_eq!(render("{{ true | ternary('up', 'down') }}"), "up");
        assert_eq!(render("{{ none | ternary('up', 'down', 'unknown') }}"), "unknown");
    }

    #[test]
    fn test_regex_filters() {
        assert_eq!(
            render(r#"{{ 'web-01.example.com' | regex_replace('^([a-z]+)-(\\d+).*$', '\\2-\\1') }}"#),
            "01-web"
        );
        assert_eq!(render("{{ 'abc123' | regex_search('[0-9]+') }}"), "123");
        assert_eq!(render("{{ 'a1b22c333' | regex_findall('[0-9]+') | join(',') }}"), "1,22,333");
        assert_eq!(render("{{ 'ABC' | regex_replace('b', 'x', ignorecase=true) }}"), "AxC");
        assert_eq!(render("{{ 'a.b' | regex_escape }}"), r"a\.b");
    }

    #[test]
    fn test_python_replacement_translation() {
        assert_eq!(python_replacement(r"\1-\2"), "${1}-${2}");
        assert_eq!(python_replacement(r"\g<host>"), "${host}");
        assert_eq!(python_replacement("$5"), "$$5");
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(dirname_of("/etc/nginx/nginx.conf"), "/etc/nginx");
        assert_eq!(dirname_of("/etc"), "/");
        assert_eq!(dirname_of("file"), "");
        assert_eq!(split_extension("/a/b.tar.gz"), ("/a/b.tar", ".gz"));
        assert_eq!(split_extension("/home/.bashrc"), ("/home/.bashrc", ""));
        assert_eq!(render("{{ '/etc/motd' | basename }}"), "motd");
        assert_eq!(render("{{ ['/etc', 'nginx', 'conf.d'] | path_join }}"), "/etc/nginx/conf.d");
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("simple"), "simple");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("it's"), r#"'it'"'"'s'"#);
    }

    #[test]
    fn test_urldecode() {
        assert_eq!(unquote_plus("a%20b+c"), "a b c");
        assert_eq!(unquote_plus("caf%C3%A9"), "caf\u{e9}");
        assert_eq!(unquote_plus("100%"), "100%");
        assert_eq!(unquote_plus("%zz"), "%zz");
        assert_eq!(render("{{ 'key%3Dvalue' | urldecode }}"), "key=value");
    }

    #[test]
    fn test_hash_and_uuid() {
        assert_eq!(
            render("{{ 'abc' | hash('sha256') }}"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        let uuid = render("{{ 'host1' | to_uuid }}");
        assert_eq!(uuid.len(), 36);
        assert_eq!(uuid, render("{{ 'host1' | to_uuid }}"));
    }

    #[test]
    fn test_combine_and_dict_items() {
        assert_eq!(render(r#"{{ {"a": 1, "b": 2} | combine({"b": 3}) | to_json }}"#), r#"{"a":1,"b":3}"#);
        assert_eq!(
            render(r#"{{ {"a": {"x": 1}} | combine({"a": {"y": 2}}, recursive=true) | to_json }}"#),
            r#"{"a":{"x":1,"y":2}}"#
        );
        assert_eq!(
            render(r#"{{ {"a": 1} | dict2items | to_json }}"#),
            r#"[{"key":"a","value":1}]"#
        );
        assert_eq!(
            render(r#"{{ [{"key": "a", "value": 1}] | items2dict | to_json }}"#),
            r#"{"a":1}"#
        );
    }

    #[test]
    fn test_flatten() {
        assert_eq!(render("{{ [1, [2, [3]], none] | flatten | to_json }}"), "[1,2,3]");
        assert_eq!(render("{{ [1, [2, [3]]] | flatten(levels=1) | to_json }}"), "[1,2,[3]]");
    }

    #[test]
    fn test_type_debug_and_comment() {
        assert_eq!(render("{{ 1 | type_debug }}"), "int");
        assert_eq!(render("{{ 'x' | type_debug }}"), "str");
        assert_eq!(render("{{ [] | type_debug }}"), "list");
        assert_eq!(render("{{ 'managed by ansible' | comment }}"), "#\n# managed by ansible\n#");
    }

    #[test]
    fn test_undefined_input_passes_through() {
        assert_eq!(render("{{ missing | to_uuid }}{{ missing | b64encode }}{{ missing | quote }}"), "");
    }
}

//! Filters whose real work needs a controller, a network or a vault.
//!
//! A syntax check cannot decrypt a vault or resolve a hostname, so these
//! filters exist only to be known: they hand their input back untouched.

use minijinja::value::{Rest, Value, ValueKind};
use minijinja::{Environment, Error, ErrorKind};

use super::{CallArgs, TemplatePlugin};

const PASSTHROUGH_FILTERS: &[&str] = &[
    // network
    "ipaddr",
    "ipv4",
    "ipv6",
    "ipwrap",
    "ipmath",
    "ipsubnet",
    "network_in_network",
    "network_in_usable",
    "nthhost",
    "hwaddr",
    "macaddr",
    "cidr_merge",
    "urlsplit",
    "random_mac",
    // data
    "json_query",
    "from_xml",
    "to_xml",
    "rekey_on_member",
    "subelements",
    "extract",
    "shuffle",
    "human_readable",
    "human_to_bytes",
    "to_datetime",
    "strftime",
    // secrets
    "password_hash",
    "vault",
    "unvault",
    "checksum",
    "md5",
    "sha1",
    // controller file system
    "fileglob",
    "expanduser",
    "expandvars",
    "realpath",
    "relpath",
    "normpath",
    "commonpath",
    "win_basename",
    "win_dirname",
    "win_splitdrive",
];

/// Controller-side filters that return their input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughFilters;

impl TemplatePlugin for PassthroughFilters {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn filter_names(&self) -> Vec<String> {
        PASSTHROUGH_FILTERS.iter().map(|name| (*name).to_string()).collect()
    }

    fn install(&self, env: &mut Environment<'static>) {
        for name in PASSTHROUGH_FILTERS {
            env.add_filter(*name, passthrough);
        }
    }
}

fn passthrough(value: Value, _args: Rest<Value>) -> Value {
    value
}

/// Filter names supplied by the user for site-specific plugins.
#[derive(Debug, Clone, Default)]
pub struct ExtraFilters {
    names: Vec<String>,
}

impl ExtraFilters {
    /// Wrap user-supplied filter names. Blank names are dropped.
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        let names = names
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Self { names }
    }
}

impl TemplatePlugin for ExtraFilters {
    fn name(&self) -> &'static str {
        "extra"
    }

    fn filter_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn install(&self, env: &mut Environment<'static>) {
        for name in &self.names {
            env.add_filter(name.clone(), passthrough);
        }
    }
}

const JINJA_FILTERS: &[&str] = &[
    "center",
    "filesizeformat",
    "forceescape",
    "format",
    "random",
    "striptags",
    "truncate",
    "urlencode",
    "urlize",
    "wordcount",
    "wordwrap",
    "xmlattr",
];

/// Jinja2 builtins the engine does not ship.
#[derive(Debug, Clone, Copy, Default)]
pub struct JinjaCompatFilters;

impl TemplatePlugin for JinjaCompatFilters {
    fn name(&self) -> &'static str {
        "jinja"
    }

    fn filter_names(&self) -> Vec<String> {
        JINJA_FILTERS.iter().map(|name| (*name).to_string()).collect()
    }

    fn test_names(&self) -> Vec<String> {
        vec!["callable".to_string()]
    }

    fn install(&self, env: &mut Environment<'static>) {
        env.add_filter("center", center);
        env.add_filter("filesizeformat", filesizeformat);
        env.add_filter("forceescape", passthrough);
        env.add_filter("format", format);
        env.add_filter("random", random);
        env.add_filter("striptags", striptags);
        env.add_filter("truncate", truncate);
        env.add_filter("urlencode", passthrough);
        env.add_filter("urlize", passthrough);
        env.add_filter("wordcount", wordcount);
        env.add_filter("wordwrap", passthrough);
        env.add_filter("xmlattr", passthrough);
        env.add_test("callable", is_callable);
    }
}

fn text_of(value: &Value) -> Option<String> {
    if value.is_undefined() {
        return None;
    }
    Some(match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    })
}

fn center(value: Value, width: Option<usize>) -> Value {
    let Some(s) = text_of(&value) else {
        return value;
    };
    let width = width.unwrap_or(80);
    let len = s.chars().count();
    if len >= width {
        return Value::from(s);
    }
    let left = (width - len) / 2;
    let right = width - len - left;
    Value::from(format!("{}{}{}", " ".repeat(left), s, " ".repeat(right)))
}

fn filesizeformat(value: Value, rest: Rest<Value>) -> Result<Value, Error> {
    if value.is_undefined() {
        return Ok(value);
    }
    let bytes = f64::try_from(value.clone()).map_err(|_| {
        Error::new(ErrorKind::InvalidOperation, format!("cannot format {} as a file size", value.kind()))
    })?;
    let binary = CallArgs::new(rest).flag(0, "binary");
    let (base, units): (f64, [&str; 8]) = if binary {
        (1024.0, ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"])
    } else {
        (1000.0, ["kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"])
    };
    if bytes == 1.0 {
        return Ok(Value::from("1 Byte"));
    }
    if bytes < base {
        return Ok(Value::from(format!("{bytes} Bytes")));
    }
    let mut unit = units[0];
    let mut scaled = bytes / base;
    for next in &units[1..] {
        if scaled < base {
            break;
        }
        scaled /= base;
        unit = *next;
    }
    Ok(Value::from(format!("{scaled:.1} {unit}")))
}

/// printf-style `%s`/`%d` substitution, enough for `"%s-%s" | format(a, b)`.
fn format(value: Value, args: Rest<Value>) -> Value {
    let Some(template) = text_of(&value) else {
        return value;
    };
    let mut args = args.iter();
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some(_) => {
                if let Some(arg) = args.next() {
                    out.push_str(&text_of(arg).unwrap_or_default());
                }
            }
            None => out.push('%'),
        }
    }
    Value::from(out)
}

fn random(value: Value, _args: Rest<Value>) -> Result<Value, Error> {
    if value.is_undefined() || value.is_none() {
        return Ok(value);
    }
    if let Some(n) = value.as_i64() {
        return Ok(Value::from(n.saturating_sub(1).max(0)));
    }
    let first = value.try_iter()?.next();
    Ok(first.unwrap_or(value))
}

fn striptags(value: Value) -> Value {
    let Some(s) = text_of(&value) else {
        return value;
    };
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    Value::from(out.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn truncate(value: Value, rest: Rest<Value>) -> Value {
    let Some(s) = text_of(&value) else {
        return value;
    };
    let args = CallArgs::new(rest);
    let length = args
        .get(0, "length")
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(255);
    let end = args
        .get(2, "end")
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "...".to_string());
    let leeway = args
        .get(3, "leeway")
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(5);
    if s.chars().count() <= length + leeway {
        return Value::from(s);
    }
    let keep = length.saturating_sub(end.chars().count());
    let head: String = s.chars().take(keep).collect();
    if args.flag(1, "killwords") {
        return Value::from(format!("{head}{end}"));
    }
    let head = head.rsplit_once(' ').map_or(head.as_str(), |(kept, _)| kept);
    Value::from(format!("{head}{end}"))
}

fn wordcount(value: Value) -> Value {
    match text_of(&value) {
        Some(s) => Value::from(s.split_whitespace().count()),
        None => value,
    }
}

fn is_callable(value: Value) -> bool {
    value.kind() == ValueKind::Plain
}

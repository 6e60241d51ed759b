//! Template plugin registry.
//!
//! Ansible extends Jinja2 with filter plugins, test plugins and lookup
//! globals. A template that uses `to_nice_yaml` is perfectly valid for Ansible
//! even though plain Jinja2 has never heard of it, so the checker installs a
//! Rust-native catalog of those plugins into the render environment before
//! anything is rendered.
//!
//! # Plugins
//!
//! | Plugin        | Provides                                                        |
//! |---------------|-----------------------------------------------------------------|
//! | `core`        | serialization, regex, path and dict filters from `core.py`      |
//! | `math`        | set and math filters from `mathstuff.py`                        |
//! | `passthrough` | controller-side filters (vault, ipaddr, time) that return input |
//! | `jinja`       | Jinja2 builtins missing from the engine                         |
//! | `tests`       | Ansible test plugins (`version`, `match`, `succeeded`, ...)     |
//! | `lookups`     | `lookup`, `query` and `q` globals                               |
//! | `extra`       | names passed with `--extra-filter`                              |
//!
//! Filters are never asked to be exact. Their output is discarded; what matters
//! is that a registered name exists and that a call with the wrong shape of
//! arguments surfaces as an engine error rather than a panic.

mod core_filters;
mod lookups;
mod math;
mod passthrough;
mod predicates;

use std::collections::BTreeSet;

use minijinja::Environment;
use minijinja::value::{Rest, Value};

pub use self::core_filters::CoreFilters;
pub use self::lookups::LookupGlobals;
pub use self::math::MathFilters;
pub use self::passthrough::{ExtraFilters, JinjaCompatFilters, PassthroughFilters};
pub use self::predicates::AnsibleTests;

/// Filters the engine ships with (Jinja2 builtins).
pub const BUILTIN_FILTERS: &[&str] = &[
    "abs",
    "attr",
    "batch",
    "bool",
    "capitalize",
    "count",
    "d",
    "default",
    "dictsort",
    "e",
    "escape",
    "first",
    "float",
    "groupby",
    "indent",
    "int",
    "items",
    "join",
    "last",
    "length",
    "lines",
    "list",
    "lower",
    "map",
    "max",
    "min",
    "pprint",
    "reject",
    "rejectattr",
    "replace",
    "reverse",
    "round",
    "safe",
    "select",
    "selectattr",
    "slice",
    "sort",
    "split",
    "string",
    "sum",
    "title",
    "tojson",
    "trim",
    "unique",
    "upper",
];

/// Tests the engine ships with (Jinja2 builtins).
pub const BUILTIN_TESTS: &[&str] = &[
    "boolean",
    "defined",
    "divisibleby",
    "endingwith",
    "eq",
    "equalto",
    "escaped",
    "even",
    "false",
    "filter",
    "float",
    "ge",
    "greaterthan",
    "gt",
    "in",
    "integer",
    "iterable",
    "le",
    "lessthan",
    "lower",
    "lt",
    "mapping",
    "ne",
    "none",
    "number",
    "odd",
    "safe",
    "sameas",
    "sequence",
    "startingwith",
    "string",
    "test",
    "true",
    "undefined",
    "upper",
];

/// A named bundle of filters, tests or globals that can be installed into an
/// [`Environment`].
pub trait TemplatePlugin {
    /// Short plugin name used in logs.
    fn name(&self) -> &'static str;

    /// Names of the filters this plugin installs.
    fn filter_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Names of the tests this plugin installs.
    fn test_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Register everything this plugin provides.
    fn install(&self, env: &mut Environment<'static>);
}

/// Ordered collection of [`TemplatePlugin`]s.
///
/// Later plugins win when two of them register the same name.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn TemplatePlugin>>,
}

impl PluginRegistry {
    /// An empty registry: only engine builtins will be known.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The Ansible catalog.
    #[must_use]
    pub fn ansible() -> Self {
        Self::new()
            .with_plugin(JinjaCompatFilters)
            .with_plugin(PassthroughFilters)
            .with_plugin(CoreFilters)
            .with_plugin(MathFilters)
            .with_plugin(AnsibleTests)
            .with_plugin(LookupGlobals)
    }

    /// Append a plugin.
    #[must_use]
    pub fn with_plugin(mut self, plugin: impl TemplatePlugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Install every plugin into `env`, in registration order.
    pub fn install(&self, env: &mut Environment<'static>) {
        for plugin in &self.plugins {
            tracing::debug!(
                "Installing plugin '{}' ({} filters, {} tests)",
                plugin.name(),
                plugin.filter_names().len(),
                plugin.test_names().len()
            );
            plugin.install(env);
        }
    }

    /// Every filter name a template may use: engine builtins plus plugins.
    #[must_use]
    pub fn filter_names(&self) -> BTreeSet<String> {
        BUILTIN_FILTERS
            .iter()
            .map(|name| (*name).to_string())
            .chain(self.plugins.iter().flat_map(|plugin| plugin.filter_names()))
            .collect()
    }

    /// Every test name a template may use: engine builtins plus plugins.
    #[must_use]
    pub fn test_names(&self) -> BTreeSet<String> {
        BUILTIN_TESTS
            .iter()
            .map(|name| (*name).to_string())
            .chain(self.plugins.iter().flat_map(|plugin| plugin.test_names()))
            .collect()
    }
}

/// Positional and keyword arguments of a filter call.
///
/// Filters take their trailing arguments as `Rest<Value>`; a keyword argument
/// map, when present, is the last element.
#[derive(Debug, Default)]
pub(crate) struct CallArgs {
    positional: Vec<Value>,
    keywords: Option<Value>,
}

impl CallArgs {
    pub(crate) fn new(rest: Rest<Value>) -> Self {
        let mut positional = rest.0;
        let keywords = match positional.last() {
            Some(last) if last.is_kwargs() => positional.pop(),
            _ => None,
        };
        Self {
            positional,
            keywords,
        }
    }

    /// Argument by keyword, falling back to position.
    pub(crate) fn get(&self, index: usize, name: &str) -> Option<Value> {
        self.keyword(name).or_else(|| self.positional.get(index).cloned())
    }

    pub(crate) fn keyword(&self, name: &str) -> Option<Value> {
        self.keywords
            .as_ref()
            .and_then(|kwargs| kwargs.get_attr(name).ok())
            .filter(|value| !value.is_undefined())
    }

    pub(crate) fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub(crate) fn flag(&self, index: usize, name: &str) -> bool {
        self.get(index, name).is_some_and(|value| value.is_true())
    }
}

/// Items of a sequence-like value. Undefined and none are empty.
pub(crate) fn items(value: &Value) -> Result<Vec<Value>, minijinja::Error> {
    if value.is_undefined() || value.is_none() {
        return Ok(Vec::new());
    }
    Ok(value.try_iter()?.collect())
}

/// Key/value pairs of a mapping value. Undefined and none are empty.
pub(crate) fn pairs(value: &Value) -> Result<Vec<(Value, Value)>, minijinja::Error> {
    if value.is_undefined() || value.is_none() {
        return Ok(Vec::new());
    }
    if value.kind() != minijinja::value::ValueKind::Map {
        return Err(minijinja::Error::new(
            minijinja::ErrorKind::InvalidOperation,
            format!("expected a dictionary, got {}", value.kind()),
        ));
    }
    let mut out = Vec::new();
    for key in value.try_iter()? {
        let item = value.get_item(&key)?;
        out.push((key, item));
    }
    Ok(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Filters ansible-core makes available to every template.
    pub(crate) const ANSIBLE_CORE_FILTERS: &[&str] = &[
        // core.py
        "b64decode",
        "b64encode",
        "basename",
        "bool",
        "checksum",
        "combine",
        "comment",
        "commonpath",
        "dict2items",
        "dirname",
        "expanduser",
        "expandvars",
        "extract",
        "fileglob",
        "flatten",
        "from_json",
        "from_yaml",
        "from_yaml_all",
        "groupby",
        "hash",
        "items2dict",
        "mandatory",
        "md5",
        "normpath",
        "password_hash",
        "path_join",
        "quote",
        "random",
        "random_mac",
        "realpath",
        "regex_escape",
        "regex_findall",
        "regex_replace",
        "regex_search",
        "relpath",
        "sha1",
        "shuffle",
        "split",
        "splitext",
        "strftime",
        "subelements",
        "ternary",
        "to_datetime",
        "to_json",
        "to_nice_json",
        "to_nice_yaml",
        "to_uuid",
        "to_yaml",
        "type_debug",
        "win_basename",
        "win_dirname",
        "win_splitdrive",
        // encryption.py
        "unvault",
        "vault",
        // mathstuff.py
        "combinations",
        "difference",
        "human_readable",
        "human_to_bytes",
        "intersect",
        "log",
        "max",
        "min",
        "permutations",
        "pow",
        "product",
        "rekey_on_member",
        "root",
        "symmetric_difference",
        "union",
        "unique",
        "zip",
        "zip_longest",
        // urls.py, urlsplit.py
        "urldecode",
        "urlencode",
        "urlsplit",
    ];

    /// Tests ansible-core makes available to every template.
    pub(crate) const ANSIBLE_CORE_TESTS: &[&str] = &[
        // core.py
        "all",
        "any",
        "change",
        "changed",
        "failed",
        "failure",
        "falsy",
        "finished",
        "match",
        "reachable",
        "regex",
        "search",
        "skip",
        "skipped",
        "started",
        "success",
        "succeeded",
        "successful",
        "timedout",
        "truthy",
        "unreachable",
        "vault_encrypted",
        "vaulted_file",
        "version",
        "version_compare",
        // files.py
        "abs",
        "directory",
        "exists",
        "file",
        "is_abs",
        "is_dir",
        "is_file",
        "is_link",
        "is_mount",
        "is_same_file",
        "link",
        "link_exists",
        "mount",
        "same_file",
        // mathstuff.py
        "contains",
        "isnan",
        "issubset",
        "issuperset",
        "nan",
        "subset",
        "superset",
        // uri.py
        "uri",
        "url",
        "urn",
    ];

    #[test]
    fn test_ansible_registry_knows_core_names() {
        let registry = PluginRegistry::ansible();
        let filters = registry.filter_names();
        let missing: Vec<_> = ANSIBLE_CORE_FILTERS.iter().filter(|name| !filters.contains(**name)).collect();
        assert!(missing.is_empty(), "missing filters: {missing:?}");

        let tests = registry.test_names();
        let missing: Vec<_> = ANSIBLE_CORE_TESTS.iter().filter(|name| !tests.contains(**name)).collect();
        assert!(missing.is_empty(), "missing tests: {missing:?}");
    }

    #[test]
    fn test_empty_registry_knows_only_builtins() {
        let registry = PluginRegistry::new();
        assert!(registry.filter_names().contains("upper"));
        assert!(!registry.filter_names().contains("to_json"));
    }

    #[test]
    fn test_extra_filters_are_known() {
        let registry = PluginRegistry::ansible()
            .with_plugin(ExtraFilters::new(vec!["site_specific".to_string()]));
        assert!(registry.filter_names().contains("site_specific"));
    }
}

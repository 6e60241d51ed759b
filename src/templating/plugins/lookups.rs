//! `lookup`, `query` and `q` globals.
//!
//! Lookups read files, environment variables or remote stores on the
//! controller. None of that is available while checking, so `lookup` yields
//! an empty string and `query` an empty list.

use minijinja::value::{Rest, Value};
use minijinja::{Environment, Error, ErrorKind};

use super::TemplatePlugin;

/// Lookup functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupGlobals;

impl TemplatePlugin for LookupGlobals {
    fn name(&self) -> &'static str {
        "lookups"
    }

    fn install(&self, env: &mut Environment<'static>) {
        env.add_function("lookup", lookup);
        env.add_function("query", query);
        env.add_function("q", query);
    }
}

fn plugin_name(name: &Value) -> Result<(), Error> {
    if name.as_str().is_some_and(|s| !s.is_empty()) {
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::InvalidOperation,
            "lookup plugin name must be a non-empty string",
        ))
    }
}

fn lookup(name: Value, _terms: Rest<Value>) -> Result<Value, Error> {
    plugin_name(&name)?;
    Ok(Value::from(""))
}

fn query(name: Value, _terms: Rest<Value>) -> Result<Value, Error> {
    plugin_name(&name)?;
    Ok(Value::from(Vec::<Value>::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    fn env() -> Environment<'static> {
        let mut env = Environment::new();
        LookupGlobals.install(&mut env);
        env
    }

    #[test]
    fn test_lookup_returns_empty_string() {
        let out = env()
            .render_str("[{{ lookup('file', '/etc/motd') }}]", context! {})
            .unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_query_returns_empty_list() {
        let out = env()
            .render_str("{{ query('inventory_hostnames', 'all') | length }}-{{ q('env', 'HOME') | length }}", context! {})
            .unwrap();
        assert_eq!(out, "0-0");
    }

    #[test]
    fn test_lookup_requires_plugin_name() {
        let err = env().render_str("{{ lookup(42) }}", context! {}).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }
}

//! Set and math filters from Ansible's `mathstuff.py`.

use minijinja::value::{Rest, Value};
use minijinja::{Environment, Error, ErrorKind};

use super::{CallArgs, TemplatePlugin, items};

const FILTERS: &[&str] = &[
    "unique",
    "union",
    "intersect",
    "difference",
    "symmetric_difference",
    "log",
    "pow",
    "root",
    "zip",
    "zip_longest",
    "product",
    "permutations",
    "combinations",
];

/// Set operations over lists and basic arithmetic.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathFilters;

impl TemplatePlugin for MathFilters {
    fn name(&self) -> &'static str {
        "math"
    }

    fn filter_names(&self) -> Vec<String> {
        FILTERS.iter().map(|name| (*name).to_string()).collect()
    }

    fn install(&self, env: &mut Environment<'static>) {
        env.add_filter("unique", unique);
        env.add_filter("union", union);
        env.add_filter("intersect", intersect);
        env.add_filter("difference", difference);
        env.add_filter("symmetric_difference", symmetric_difference);
        env.add_filter("log", log);
        env.add_filter("pow", pow);
        env.add_filter("root", root);
        env.add_filter("zip", zip);
        env.add_filter("zip_longest", zip_longest);
        env.add_filter("product", product);
        env.add_filter("permutations", permutations);
        env.add_filter("combinations", combinations);
    }
}

fn dedup(values: Vec<Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

fn unique(value: Value, _options: Rest<Value>) -> Result<Value, Error> {
    Ok(Value::from(dedup(items(&value)?)))
}

fn union(a: Value, b: Value) -> Result<Value, Error> {
    let mut all = items(&a)?;
    all.extend(items(&b)?);
    Ok(Value::from(dedup(all)))
}

fn intersect(a: Value, b: Value) -> Result<Value, Error> {
    let other = items(&b)?;
    let kept = items(&a)?.into_iter().filter(|v| other.contains(v)).collect();
    Ok(Value::from(dedup(kept)))
}

fn difference(a: Value, b: Value) -> Result<Value, Error> {
    let other = items(&b)?;
    let kept = items(&a)?.into_iter().filter(|v| !other.contains(v)).collect();
    Ok(Value::from(dedup(kept)))
}

fn symmetric_difference(a: Value, b: Value) -> Result<Value, Error> {
    let left = items(&a)?;
    let right = items(&b)?;
    let mut out: Vec<Value> = left.iter().filter(|v| !right.contains(v)).cloned().collect();
    out.extend(right.iter().filter(|v| !left.contains(v)).cloned());
    Ok(Value::from(dedup(out)))
}

/// Numeric view of a value; undefined stays `None` so callers can pass it on.
fn number(value: &Value) -> Result<Option<f64>, Error> {
    if value.is_undefined() {
        return Ok(None);
    }
    f64::try_from(value.clone()).map(Some).map_err(|_| {
        Error::new(ErrorKind::InvalidOperation, format!("cannot use {} as a number", value.kind()))
    })
}

fn log(value: Value, base: Option<f64>) -> Result<Value, Error> {
    let Some(x) = number(&value)? else {
        return Ok(value);
    };
    let result = match base {
        Some(base) => x.log(base),
        None => x.ln(),
    };
    Ok(Value::from(result))
}

fn pow(value: Value, exponent: f64) -> Result<Value, Error> {
    let Some(x) = number(&value)? else {
        return Ok(value);
    };
    Ok(Value::from(x.powf(exponent)))
}

fn root(value: Value, base: Option<f64>) -> Result<Value, Error> {
    let Some(x) = number(&value)? else {
        return Ok(value);
    };
    let result = match base {
        Some(base) => x.powf(1.0 / base),
        None => x.sqrt(),
    };
    Ok(Value::from(result))
}

fn zip(value: Value, others: Rest<Value>) -> Result<Value, Error> {
    let mut columns = vec![items(&value)?];
    for other in others.iter() {
        columns.push(items(other)?);
    }
    let len = columns.iter().map(Vec::len).min().unwrap_or(0);
    let rows = (0..len)
        .map(|i| Value::from(columns.iter().map(|c| c[i].clone()).collect::<Vec<_>>()))
        .collect::<Vec<_>>();
    Ok(Value::from(rows))
}

fn zip_longest(value: Value, rest: Rest<Value>) -> Result<Value, Error> {
    let args = CallArgs::new(rest);
    let fill = args.keyword("fillvalue").unwrap_or_else(|| Value::from(()));

    let mut columns = vec![items(&value)?];
    for other in args.positional() {
        columns.push(items(other)?);
    }
    let len = columns.iter().map(Vec::len).max().unwrap_or(0);
    let rows = (0..len)
        .map(|i| {
            Value::from(
                columns
                    .iter()
                    .map(|c| c.get(i).cloned().unwrap_or_else(|| fill.clone()))
                    .collect::<Vec<_>>(),
            )
        })
        .collect::<Vec<_>>();
    Ok(Value::from(rows))
}

/// Cartesian product of the input with every argument list, `repeat` times.
fn product(value: Value, rest: Rest<Value>) -> Result<Value, Error> {
    let args = CallArgs::new(rest);
    let repeat = match args.keyword("repeat") {
        Some(n) => n
            .as_i64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| Error::new(ErrorKind::InvalidOperation, "repeat must be a non-negative integer"))?,
        None => 1,
    };

    let mut pools = vec![items(&value)?];
    for other in args.positional() {
        pools.push(items(other)?);
    }

    let mut rows: Vec<Vec<Value>> = vec![Vec::new()];
    for pool in pools.iter().cycle().take(pools.len() * repeat) {
        rows = rows
            .iter()
            .flat_map(|row| {
                pool.iter().map(move |item| {
                    let mut next = row.clone();
                    next.push(item.clone());
                    next
                })
            })
            .collect();
    }
    Ok(Value::from(rows.into_iter().map(Value::from).collect::<Vec<_>>()))
}

fn permute(pool: &[Value], r: usize, used: &mut [bool], current: &mut Vec<Value>, out: &mut Vec<Value>) {
    if current.len() == r {
        out.push(Value::from(current.clone()));
        return;
    }
    for i in 0..pool.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        current.push(pool[i].clone());
        permute(pool, r, used, current, out);
        current.pop();
        used[i] = false;
    }
}

fn permutations(value: Value, r: Option<usize>) -> Result<Value, Error> {
    let pool = items(&value)?;
    let r = r.unwrap_or(pool.len());
    let mut out = Vec::new();
    let mut used = vec![false; pool.len()];
    permute(&pool, r, &mut used, &mut Vec::with_capacity(r), &mut out);
    Ok(Value::from(out))
}

fn choose(pool: &[Value], start: usize, r: usize, current: &mut Vec<Value>, out: &mut Vec<Value>) {
    if current.len() == r {
        out.push(Value::from(current.clone()));
        return;
    }
    for i in start..pool.len() {
        current.push(pool[i].clone());
        choose(pool, i + 1, r, current, out);
        current.pop();
    }
}

fn combinations(value: Value, r: usize) -> Result<Value, Error> {
    let pool = items(&value)?;
    let mut out = Vec::new();
    choose(&pool, 0, r, &mut Vec::with_capacity(r), &mut out);
    Ok(Value::from(out))
}

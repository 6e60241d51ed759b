//! Static scan for filter and test names used by a template.
//!
//! The engine only looks filters up when an expression is evaluated, so a
//! misspelled filter inside an `{% if %}` branch that never runs would slip
//! through a render. Jinja2 rejects unknown names at compile time; this scan
//! gives the checker the same behaviour by listing every name used inside
//! `{{ }}` and `{% %}` and its line.

use regex::Regex;

/// Whether a scanned name was used as a filter or a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Filter,
    Test,
}

/// One filter or test reference in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameUse {
    pub kind: NameKind,
    pub name: String,
    pub line: usize,
}

/// Finds filter and test references in template source.
#[derive(Debug, Clone)]
pub struct NameScanner {
    filter: Regex,
    test: Regex,
    filter_block: Regex,
    raw_open: Regex,
    raw_close: Regex,
}

impl NameScanner {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            filter: Regex::new(r"\|\s*([A-Za-z_][A-Za-z0-9_]*)")?,
            test: Regex::new(r"\bis\s+(?:not\s+)?([A-Za-z_][A-Za-z0-9_]*)")?,
            filter_block: Regex::new(r"^\{%[-+]?\s*filter\s+([A-Za-z_][A-Za-z0-9_]*)")?,
            raw_open: Regex::new(r"^\{%[-+]?\s*raw\s*[-+]?%\}$")?,
            raw_close: Regex::new(r"\{%[-+]?\s*endraw\s*[-+]?%\}")?,
        })
    }

    /// Every filter and test reference in `source`, in source order.
    pub fn scan(&self, source: &str) -> Vec<NameUse> {
        let mut uses = Vec::new();
        let mut pos = 0;

        while let Some(offset) = source[pos..].find('{') {
            let start = pos + offset;
            let rest = &source[start..];
            let close = if rest.starts_with("{{") {
                "}}"
            } else if rest.starts_with("{%") {
                "%}"
            } else if rest.starts_with("{#") {
                match rest[2..].find("#}") {
                    Some(end) => {
                        pos = start + 2 + end + 2;
                        continue;
                    }
                    None => break,
                }
            } else {
                pos = start + 1;
                continue;
            };

            let Some((region, end)) = blank_strings(source, start, close) else {
                break;
            };
            pos = end;

            if self.raw_open.is_match(region.trim()) {
                match self.raw_close.find(&source[pos..]) {
                    Some(m) => {
                        pos += m.end();
                        continue;
                    }
                    None => break,
                }
            }

            let line_of = |at: usize| line_at(source, start + at);
            for caps in self.filter.captures_iter(&region) {
                push_use(&mut uses, NameKind::Filter, &caps, &line_of);
            }
            if let Some(caps) = self.filter_block.captures(&region) {
                push_use(&mut uses, NameKind::Filter, &caps, &line_of);
            }
            for caps in self.test.captures_iter(&region) {
                push_use(&mut uses, NameKind::Test, &caps, &line_of);
            }
        }

        uses.sort_by_key(|u| u.line);
        uses
    }
}

fn push_use(uses: &mut Vec<NameUse>, kind: NameKind, caps: &regex::Captures<'_>, line_of: &impl Fn(usize) -> usize) {
    if let Some(name) = caps.get(1) {
        uses.push(NameUse {
            kind,
            name: name.as_str().to_string(),
            line: line_of(name.start()),
        });
    }
}

/// 1-based line of a byte offset.
fn line_at(source: &str, offset: usize) -> usize {
    source[..offset].bytes().filter(|b| *b == b'\n').count() + 1
}

/// Copy of the tag starting at `start` up to and including `close`, with the
/// contents of string literals replaced by spaces. Byte offsets and newlines
/// are preserved. Returns the copy and the offset just past the tag.
fn blank_strings(source: &str, start: usize, close: &str) -> Option<(String, usize)> {
    let mut region = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, c) in source[start..].char_indices() {
        match quote {
            Some(q) => {
                if c == '\n' {
                    region.push('\n');
                } else {
                    region.push_str(&" ".repeat(c.len_utf8()));
                }
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => {
                region.push(c);
                if (c == '"' || c == '\'') && offset >= 2 {
                    quote = Some(c);
                } else if region.len() >= 4 && region.ends_with(close) {
                    return Some((region, start + offset + c.len_utf8()));
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(source: &str) -> Vec<(NameKind, String, usize)> {
        NameScanner::new()
            .unwrap()
            .scan(source)
            .into_iter()
            .map(|u| (u.kind, u.name, u.line))
            .collect()
    }

    #[test]
    fn test_filters_and_lines() {
        let found = names("a\n{{ x | to_json }}\n{% if y | bool %}{% endif %}\n");
        assert_eq!(
            found,
            vec![
                (NameKind::Filter, "to_json".to_string(), 2),
                (NameKind::Filter, "bool".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_chained_filters_and_multiline_tag() {
        let found = names("{{ x\n  | default('a|b')\n  | upper }}");
        assert_eq!(
            found,
            vec![
                (NameKind::Filter, "default".to_string(), 2),
                (NameKind::Filter, "upper".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_tests() {
        let found = names("{% if v is version('1.0', '>=') and w is not defined %}{% endif %}");
        assert_eq!(
            found,
            vec![
                (NameKind::Test, "version".to_string(), 1),
                (NameKind::Test, "defined".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_filter_block() {
        let found = names("{% filter upper %}text{% endfilter %}");
        assert_eq!(found, vec![(NameKind::Filter, "upper".to_string(), 1)]);
    }

    #[test]
    fn test_skips_text_comments_strings_and_raw() {
        assert!(names("plain | text is here").is_empty());
        assert!(names("{# {{ x | bogus }} #}").is_empty());
        assert!(names("{{ 'a | bogus' ~ \"this is odd\" }}").is_empty());
        assert!(names("{% raw %}{{ x | bogus }}{% endraw %}").is_empty());
        assert!(names("{%- raw -%}{{ x | bogus }}{%- endraw -%}").is_empty());
    }

    #[test]
    fn test_escaped_quote_in_string() {
        let found = names(r#"{{ 'it\'s | fine' | lower }}"#);
        assert_eq!(found, vec![(NameKind::Filter, "lower".to_string(), 1)]);
    }

    #[test]
    fn test_line_at() {
        assert_eq!(line_at("a\nb\nc", 0), 1);
        assert_eq!(line_at("a\nb\nc", 4), 3);
    }
}

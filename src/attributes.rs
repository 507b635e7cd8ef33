//! Typed attribute storage for parsed page files.
//!
//! Every page file is a flat list of named blocks. After parsing, each block
//! becomes one entry in an [`AttributeRecord`]: a string, an integer, or an
//! ordered list of strings depending on the block's declared type.
//!
//! ## Permissive lookups
//!
//! Templates routinely probe optional fields (`subtitle`, `css_imports`, ...)
//! that most pages never set. [`AttributeRecord::get_str`] therefore returns an
//! empty string for unknown keys instead of failing. Code that needs to know
//! whether a key was actually present uses [`AttributeRecord::get`].

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
    List(Vec<String>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Truthiness used for boolean-ish attributes (`draft`, `no_sitemap`, ...).
    ///
    /// - strings: false when empty or `false`/`no`/`off`/`0` (any case)
    /// - integers: false when zero
    /// - lists: false when empty
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Str(s) => {
                let s = s.trim();
                !(s.is_empty()
                    || s.eq_ignore_ascii_case("false")
                    || s.eq_ignore_ascii_case("no")
                    || s.eq_ignore_ascii_case("off")
                    || s == "0")
            }
            Value::Int(n) => *n != 0,
            Value::List(items) => !items.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::List(items) => f.write_str(&items.join("\n")),
        }
    }
}

/// Attribute name → value mapping produced by one read of a page file.
///
/// Names are normalized on insert: surrounding whitespace is trimmed and
/// hyphens become underscores, so `:child-template:` and `:child_template:`
/// address the same key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttributeRecord {
    values: BTreeMap<String, Value>,
}

impl AttributeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value; a later insert under the same name overrides.
    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(normalize_name(name), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(&normalize_name(key))
    }

    /// Look up `key`, falling back to `default` when absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.get(key).unwrap_or(default)
    }

    /// Permissive lookup: the value rendered as text, or `""` when absent.
    pub fn get_str(&self, key: &str) -> String {
        self.get(key).map(Value::to_string).unwrap_or_default()
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    /// List lookup. A plain string value yields one item per non-blank line.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::List(items)) => items.clone(),
            Some(Value::Str(s)) => s
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether `key` is present and truthy. See [`Value::is_truthy`].
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(Value::is_truthy)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, Value)]) -> AttributeRecord {
        let mut r = AttributeRecord::new();
        for (k, v) in pairs {
            r.set(k, v.clone());
        }
        r
    }

    #[test]
    fn hyphens_normalized_to_underscores() {
        let r = record(&[("child-template", Value::Str("post.html".into()))]);
        assert_eq!(r.get_str("child_template"), "post.html");
        assert_eq!(r.get_str("child-template"), "post.html");
    }

    #[test]
    fn unknown_key_is_empty_string() {
        let r = AttributeRecord::new();
        assert_eq!(r.get_str("subtitle"), "");
        assert!(r.get("subtitle").is_none());
    }

    #[test]
    fn get_or_falls_back() {
        let r = AttributeRecord::new();
        let default = Value::Str("base.html".into());
        assert_eq!(r.get_or("template", &default), &default);
    }

    #[test]
    fn later_set_overrides() {
        let r = record(&[
            ("title", Value::Str("First".into())),
            ("title", Value::Str("Second".into())),
        ]);
        assert_eq!(r.get_str("title"), "Second");
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn list_renders_newline_joined() {
        let r = record(&[("tags", Value::List(vec!["a".into(), "b".into()]))]);
        assert_eq!(r.get_str("tags"), "a\nb");
        assert_eq!(r.get_list("tags"), vec!["a", "b"]);
    }

    #[test]
    fn string_value_as_single_item_list() {
        let r = record(&[("css", Value::Str("main.css".into()))]);
        assert_eq!(r.get_list("css"), vec!["main.css"]);
        assert!(r.get_list("missing").is_empty());
    }

    #[test]
    fn multiline_string_splits_into_items() {
        let r = record(&[("css_imports", Value::Str("a.css\n  b.css \n\n".into()))]);
        assert_eq!(r.get_list("css_imports"), vec!["a.css", "b.css"]);
    }

    #[test]
    fn flag_truthiness() {
        let r = record(&[
            ("yes", Value::Str("true".into())),
            ("word", Value::Str("anything".into())),
            ("no", Value::Str("False".into())),
            ("zero", Value::Str("0".into())),
            ("empty", Value::Str(String::new())),
            ("int_on", Value::Int(1)),
            ("int_off", Value::Int(0)),
            ("list_off", Value::List(vec![])),
        ]);
        assert!(r.flag("yes"));
        assert!(r.flag("word"));
        assert!(r.flag("int_on"));
        assert!(!r.flag("no"));
        assert!(!r.flag("zero"));
        assert!(!r.flag("empty"));
        assert!(!r.flag("int_off"));
        assert!(!r.flag("list_off"));
        assert!(!r.flag("missing"));
    }

    #[test]
    fn int_accessor_ignores_strings() {
        let r = record(&[
            ("order", Value::Int(3)),
            ("title", Value::Str("3".into())),
        ]);
        assert_eq!(r.get_int("order"), Some(3));
        assert_eq!(r.get_int("title"), None);
    }
}

//! Raw metadata rows
//!
//! A metadata row is one record returned by a schema-enumeration query, exposed
//! as an unordered mapping from driver-standard labels to untyped values.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Driver-standard field labels
pub mod labels {
    pub const TABLE_CAT: &str = "TABLE_CAT";
    pub const TABLE_SCHEM: &str = "TABLE_SCHEM";
    pub const TABLE_NAME: &str = "TABLE_NAME";
    pub const TABLE_TYPE: &str = "TABLE_TYPE";
    pub const REMARKS: &str = "REMARKS";

    pub const COLUMN_NAME: &str = "COLUMN_NAME";
    pub const TYPE_CODE: &str = "TYPE_CODE";
    pub const TYPE_NAME: &str = "TYPE_NAME";
    pub const COLUMN_SIZE: &str = "COLUMN_SIZE";
    pub const SCALE: &str = "SCALE";
    pub const COLUMN_DEF: &str = "COLUMN_DEF";
    pub const IS_NULLABLE: &str = "IS_NULLABLE";
    pub const IS_AUTOINCREMENT: &str = "IS_AUTOINCREMENT";
    pub const ORDINAL_POSITION: &str = "ORDINAL_POSITION";

    pub const INDEX_NAME: &str = "INDEX_NAME";
    pub const NON_UNIQUE: &str = "NON_UNIQUE";

    pub const PK_NAME: &str = "PK_NAME";

    /// Comment store rows
    pub const OBJNAME: &str = "objname";
    pub const VALUE: &str = "value";
}

/// One raw metadata record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataRow {
    values: BTreeMap<String, Value>,
}

impl MetadataRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, label: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(label, value);
        self
    }

    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(label.into(), value.into());
    }

    /// Raw value for a label, matched exactly first and then case-insensitively.
    /// SQL NULL is reported as absent.
    pub fn get(&self, label: &str) -> Option<&Value> {
        self.values
            .get(label)
            .or_else(|| {
                self.values
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(label))
                    .map(|(_, v)| v)
            })
            .filter(|v| !v.is_null())
    }

    /// String value, only if the stored value is a string
    pub fn get_str(&self, label: &str) -> Option<&str> {
        self.get(label).and_then(Value::as_str)
    }

    /// Value rendered as text (numbers and booleans included)
    pub fn get_string(&self, label: &str) -> Option<String> {
        match self.get(label)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Integer value; numeric strings are accepted
    pub fn get_i64(&self, label: &str) -> Option<i64> {
        match self.get(label)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Boolean value; accepts `true`/`false`, `1`/`0` and `YES`/`NO`
    pub fn get_bool(&self, label: &str) -> Option<bool> {
        match self.get(label)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|i| i != 0),
            Value::String(s) => match s.trim().to_ascii_uppercase().as_str() {
                "YES" | "Y" | "TRUE" | "1" => Some(true),
                "NO" | "N" | "FALSE" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for MetadataRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = MetadataRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

/// Search-pattern escape character
pub const SEARCH_ESCAPE: char = '\\';

/// Escape `_` and `%` so a literal name can be used as a search pattern
pub fn escape_for_search(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if c == '_' || c == '%' || c == SEARCH_ESCAPE {
            escaped.push(SEARCH_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Translate a search pattern into an anchored regular expression
///
/// `%` matches any run of characters, `_` exactly one, and `\` makes the next
/// character literal. Matching is case-sensitive.
pub fn search_pattern_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut expr = String::from("(?s)^");
    let mut buf = [0u8; 4];
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            SEARCH_ESCAPE => {
                let literal = chars.next().unwrap_or(SEARCH_ESCAPE);
                expr.push_str(&regex::escape(literal.encode_utf8(&mut buf)));
            }
            other => expr.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    expr.push('$');
    Regex::new(&expr)
}

/// SQL `LIKE` matching with `%`, `_` and `\` as escape character
pub fn search_pattern_matches(pattern: &str, text: &str) -> bool {
    search_pattern_regex(pattern)
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

use std::fmt;

use serde::{Deserialize, Serialize};

// "=" last: it is a prefix of "=~"
const MATCH_OPERATORS: [&str; 4] = ["!=", "=~", "!~", "="];

/// A label filter as supplied with the triggering event.
///
/// `value` is either a bare literal (exact match) or starts with one of the
/// PromQL match operators `=`, `!=`, `=~`, `!~`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelFilter {
    pub key: String,
    pub value: String,
}

impl LabelFilter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// True when the value carries its own match operator
    pub fn has_operator(&self) -> bool {
        MATCH_OPERATORS.iter().any(|op| self.value.starts_with(op))
    }

    /// Render as a single PromQL label matcher.
    ///
    /// Bare values become `key='value'` with any quotes removed. Operator
    /// values are appended verbatim after the key, with double quotes
    /// normalized to single quotes.
    pub fn render(&self) -> String {
        if self.has_operator() {
            format!("{}{}", self.key, self.value.replace('"', "'"))
        } else {
            format!("{}='{}'", self.key, strip_quotes(&self.value))
        }
    }
}

/// Remove every single and double quote character.
pub fn strip_quotes(value: &str) -> String {
    value.chars().filter(|c| *c != '\'' && *c != '"').collect()
}

/// Ordered list of label matchers, joined with commas.
///
/// Braces are not included; the query templates supply them.
#[derive(Clone, Debug, Default)]
pub struct FilterExpression {
    matchers: Vec<String>,
}

impl FilterExpression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an exact-match matcher, `key='value'`
    pub fn exact(mut self, key: &str, value: &str) -> Self {
        self.matchers.push(format!("{}='{}'", key, strip_quotes(value)));
        self
    }

    /// Append a caller-supplied filter
    pub fn filter(mut self, filter: &LabelFilter) -> Self {
        self.matchers.push(filter.render());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn build(&self) -> String {
        self.matchers.join(",")
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

//! Path parameters captured by a route match.

use std::collections::HashMap;

/// Named values captured from the concrete path, plus the unconsumed
/// remainder when the pattern ends in `*`.
///
/// For a route `/posts/:id/comments/:comment_id` on `/posts/42/comments/7`,
/// `params.get("id")` is `Some("42")` and `params.get("comment_id")` is
/// `Some("7")`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    values: HashMap<String, String>,
    remainder: Option<String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The part of the path a trailing `*` segment did not consume, always
    /// starting with `/`. `None` when the route has no remainder segment.
    pub fn remainder(&self) -> Option<&str> {
        self.remainder.as_deref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub(crate) fn set_remainder(&mut self, remainder: String) {
        self.remainder = Some(remainder);
    }

    /// Layers the params of a nested match over these ones. Inner names
    /// shadow outer names; the remainder becomes whatever the inner match
    /// left unconsumed.
    pub(crate) fn merge(mut self, inner: Params) -> Params {
        self.values.extend(inner.values);
        self.remainder = inner.remainder;
        self
    }
}

//! Route pattern grammar.
//!
//! A pattern is a `/`-separated list of segments, each one of:
//!
//! | Syntax   | Kind      | Matches                                         |
//! |----------|-----------|-------------------------------------------------|
//! | `users`  | literal   | exactly `users` (case-sensitive)                |
//! | `:id`    | capture   | any one non-empty segment, stored under `id`    |
//! | `*rest`  | remainder | zero or more trailing segments (last only)      |
//!
//! Patterns are compiled once at registration. Matching walks the compiled
//! segment list against the already-split concrete path, so no regex engine
//! is involved and precedence is a plain comparison of segment kinds.

use std::borrow::Cow;

use crate::error::Error;
use crate::params::Params;

/// Segment kind in precedence order: at the first position where two
/// matching patterns differ, the smaller kind wins.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub(crate) enum Kind {
    Literal,
    Capture,
    Remainder,
}

#[derive(Clone, Debug)]
enum Segment {
    Literal(String),
    Capture(String),
    Remainder(Option<String>),
}

impl Segment {
    fn kind(&self) -> Kind {
        match self {
            Self::Literal(_) => Kind::Literal,
            Self::Capture(_) => Kind::Capture,
            Self::Remainder(_) => Kind::Remainder,
        }
    }
}

/// A compiled route pattern.
#[derive(Clone, Debug)]
pub(crate) struct Pattern {
    raw: String,
    segments: Vec<Segment>,
    rank: Vec<Kind>,
}

impl Pattern {
    pub(crate) fn parse(raw: &str) -> Result<Self, Error> {
        let invalid = |reason| Error::InvalidRoute { pattern: raw.to_owned(), reason };

        let body = raw.strip_prefix('/').ok_or_else(|| invalid("must start with `/`"))?;
        let mut segments = Vec::new();
        let mut names: Vec<&str> = Vec::new();

        if !body.is_empty() {
            let parts: Vec<&str> = body.split('/').collect();
            let last = parts.len() - 1;

            for (i, part) in parts.into_iter().enumerate() {
                let segment = if let Some(name) = part.strip_prefix(':') {
                    check_name(name).map_err(invalid)?;
                    names.push(name);
                    Segment::Capture(name.to_owned())
                } else if let Some(name) = part.strip_prefix('*') {
                    if i != last {
                        return Err(invalid("`*` must be the last segment"));
                    }
                    if name.is_empty() {
                        Segment::Remainder(None)
                    } else {
                        check_name(name).map_err(invalid)?;
                        names.push(name);
                        Segment::Remainder(Some(name.to_owned()))
                    }
                } else if part.is_empty() {
                    return Err(invalid("empty segment"));
                } else {
                    Segment::Literal(part.to_owned())
                };
                segments.push(segment);
            }
        }

        let mut sorted = names.clone();
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(invalid("duplicate parameter name"));
        }

        let rank = segments.iter().map(Segment::kind).collect();
        Ok(Self { raw: raw.to_owned(), segments, rank })
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.raw
    }

    /// Precedence key. Lower sorts first and wins; a pattern that ends where
    /// another continues with more segments ranks lower.
    pub(crate) fn rank(&self) -> &[Kind] {
        &self.rank
    }

    /// True when both patterns accept exactly the same set of paths, i.e.
    /// they differ at most in parameter names.
    pub(crate) fn same_shape(&self, other: &Pattern) -> bool {
        self.segments.len() == other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|pair| match pair {
                (Segment::Literal(a), Segment::Literal(b)) => a == b,
                (a, b) => a.kind() == b.kind() && a.kind() != Kind::Literal,
            })
    }

    /// Tests an already-split concrete path. Returns the captured params on
    /// a match.
    pub(crate) fn matches(&self, path: &[&str]) -> Option<Params> {
        let mut params = Params::new();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(lit) => {
                    if *path.get(i)? != lit.as_str() {
                        return None;
                    }
                }
                Segment::Capture(name) => {
                    params.insert(name.as_str(), decode(path.get(i)?));
                }
                Segment::Remainder(name) => {
                    let rest = path.get(i..).unwrap_or_default();
                    if let Some(name) = name {
                        let decoded: Vec<String> = rest.iter().map(|s| decode(s)).collect();
                        params.insert(name.as_str(), decoded.join("/"));
                    }
                    // Left raw: a mounted table decodes its own captures.
                    params.set_remainder(format!("/{}", rest.join("/")));
                    return Some(params);
                }
            }
        }

        (path.len() == self.segments.len()).then_some(params)
    }
}

/// Splits a concrete request path into segments. The query string and
/// fragment are ignored and empty segments (`//`, trailing `/`) are skipped.
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].split('/').filter(|s| !s.is_empty()).collect()
}

fn check_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("parameter name is empty");
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("parameter name must be ASCII alphanumeric or `_`");
    }
    Ok(())
}

/// Percent-decodes a captured segment, keeping the raw text when the result
/// would not be valid UTF-8.
fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| segment.to_owned())
}

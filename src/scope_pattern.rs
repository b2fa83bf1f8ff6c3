//! Instance-path scope patterns.
//!
//! A pattern without `*` or `?` matches a path only by exact string equality.
//! Otherwise it is compiled into a glob where `*` matches any substring (dots
//! included, possibly empty) and `?` matches exactly one character. Every other
//! character, glob syntax such as `[`, `{` or `\` included, matches itself.

use std::fmt;

use globset::{GlobBuilder, GlobMatcher};

use crate::FactoryError;

#[derive(Clone)]
pub struct ScopePattern {
    raw: String,
    matcher: Option<GlobMatcher>,
}

impl ScopePattern {
    /// The empty pattern: global scope, never matches an instance path.
    pub fn global() -> Self {
        Self {
            raw: String::new(),
            matcher: None,
        }
    }

    /// Compile `raw`.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::InvalidPattern`] when the glob matcher cannot be
    /// built. The caller may still use [`ScopePattern::literal`] for the same text.
    pub fn compile(raw: &str) -> Result<Self, FactoryError> {
        if !has_wildcard(raw) {
            return Ok(Self::literal(raw));
        }
        let glob = GlobBuilder::new(&escape_glob(raw))
            .literal_separator(false)
            .backslash_escape(true)
            .build()
            .map_err(|e| FactoryError::InvalidPattern {
                pattern: raw.to_string(),
                reason: e.kind().to_string(),
            })?;
        Ok(Self {
            raw: raw.to_string(),
            matcher: Some(glob.compile_matcher()),
        })
    }

    /// A pattern that only ever matches by exact equality.
    pub fn literal(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            matcher: None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_global(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn is_wildcard(&self) -> bool {
        has_wildcard(&self.raw)
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.raw == "*" {
            return true;
        }
        match &self.matcher {
            Some(matcher) => matcher.is_match(path),
            None => self.raw == path,
        }
    }
}

impl PartialEq for ScopePattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for ScopePattern {}

impl fmt::Debug for ScopePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScopePattern").field(&self.raw).finish()
    }
}

impl fmt::Display for ScopePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn has_wildcard(raw: &str) -> bool {
    raw.contains(['*', '?'])
}

/// Glob source for `raw` where only `*` and `?` are special.
///
/// Runs of `*` collapse into one so `**` never takes its recursive meaning.
fn escape_glob(raw: &str) -> String {
    let mut glob = String::with_capacity(raw.len() * 2);
    let mut last = None;
    for c in raw.chars() {
        match c {
            '*' if last == Some('*') => continue,
            '[' | ']' | '{' | '}' | '\\' => {
                glob.push('\\');
                glob.push(c);
            }
            _ => glob.push(c),
        }
        last = Some(c);
    }
    glob
}

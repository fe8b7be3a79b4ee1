//! Decode-time type allow-list
//!
//! A settings file is untrusted input: a persisted tag is only ever decoded
//! if the qualified identifier it resolves to matches an explicitly enabled
//! pattern. Built-in types are enabled by default; anything else must be
//! opted in by the embedding application before the stream is used.

use crate::tags::ids;

/// Wildcard-matched set of qualified identifiers permitted during decode
///
/// A pattern is either an exact identifier or a prefix glob ending in `*`
/// (e.g. `myapp::types::*`).
#[derive(Debug, Clone)]
pub struct TypeAllowList {
    patterns: Vec<String>,
}

const BUILTIN_PATTERNS: &[&str] = &[
    ids::TEXT,
    ids::INT,
    ids::LONG,
    ids::FLOAT,
    ids::DOUBLE,
    ids::BOOL,
    ids::POINT,
    ids::RECT,
    ids::FONT,
    ids::RECORD,
];

impl TypeAllowList {
    /// Allow-list covering only the built-in types
    pub fn builtin() -> Self {
        Self {
            patterns: BUILTIN_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Empty allow-list; rejects everything until patterns are added
    pub fn empty() -> Self {
        Self { patterns: Vec::new() }
    }

    /// Enable an additional pattern (exact id or `prefix*` glob)
    pub fn allow(&mut self, pattern: impl Into<String>) {
        self.patterns.push(pattern.into());
    }

    /// Whether `qualified_id` matches any enabled pattern
    pub fn is_allowed(&self, qualified_id: &str) -> bool {
        self.patterns.iter().any(|p| match p.strip_suffix('*') {
            Some(prefix) => qualified_id.starts_with(prefix),
            None => qualified_id == p,
        })
    }
}

impl Default for TypeAllowList {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_allowed_by_default() {
        let list = TypeAllowList::builtin();
        assert!(list.is_allowed(ids::RECT));
        assert!(list.is_allowed(ids::TEXT));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let list = TypeAllowList::builtin();
        assert!(!list.is_allowed("myapp::types::Color"));
    }

    #[test]
    fn test_wildcard_pattern() {
        let mut list = TypeAllowList::builtin();
        list.allow("myapp::types::*");
        assert!(list.is_allowed("myapp::types::Color"));
        assert!(list.is_allowed("myapp::types::Gradient"));
        assert!(!list.is_allowed("myapp::other::Color"));
    }

    #[test]
    fn test_exact_pattern_is_not_a_prefix() {
        let mut list = TypeAllowList::empty();
        list.allow("myapp::types::Color");
        assert!(list.is_allowed("myapp::types::Color"));
        assert!(!list.is_allowed("myapp::types::ColorMap"));
    }

    #[test]
    fn test_empty_list_rejects_builtins() {
        let list = TypeAllowList::empty();
        assert!(!list.is_allowed(ids::RECT));
    }
}

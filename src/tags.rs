//! Type name table: short logical tags <-> qualified type identifiers
//!
//! Documents store the short tag ("Rectangle") when one is known; qualified
//! identifiers ("statefile::types::Rect") are what the codec registry and
//! the allow-list are keyed by. Lookup is total in both directions: an
//! unmapped identifier passes through unchanged and must round-trip, so no
//! lookup ever fails here. Unresolvable identifiers surface later as
//! unknown-type errors when decoding attempts to find a codec.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Qualified identifiers for every built-in type
pub mod ids {
    pub const TEXT: &str = "statefile::value::Text";
    pub const INT: &str = "statefile::value::Int";
    pub const LONG: &str = "statefile::value::Long";
    pub const FLOAT: &str = "statefile::value::Float";
    pub const DOUBLE: &str = "statefile::value::Double";
    pub const BOOL: &str = "statefile::value::Bool";
    pub const POINT: &str = "statefile::types::Point";
    pub const RECT: &str = "statefile::types::Rect";
    pub const FONT: &str = "statefile::types::FontSpec";
    pub const LIST: &str = "statefile::value::List";
    pub const RECORD: &str = "statefile::records::Record";
}

/// Short tags for every built-in type
pub mod names {
    pub const TEXT: &str = "Text";
    pub const INT: &str = "Int";
    pub const LONG: &str = "Long";
    pub const FLOAT: &str = "Float";
    pub const DOUBLE: &str = "Double";
    pub const BOOL: &str = "Bool";
    pub const POINT: &str = "Point";
    pub const RECT: &str = "Rectangle";
    pub const FONT: &str = "Font";
    pub const LIST: &str = "List";
    pub const RECORD: &str = "record";
}

/// Bidirectional tag table, built once at first use and read-only after
pub struct TagTable {
    tag_by_id: HashMap<&'static str, &'static str>,
    id_by_tag: HashMap<&'static str, &'static str>,
}

const BUILTIN_MAPPINGS: &[(&str, &str)] = &[
    (names::TEXT, ids::TEXT),
    (names::INT, ids::INT),
    (names::LONG, ids::LONG),
    (names::FLOAT, ids::FLOAT),
    (names::DOUBLE, ids::DOUBLE),
    (names::BOOL, ids::BOOL),
    (names::POINT, ids::POINT),
    (names::RECT, ids::RECT),
    (names::FONT, ids::FONT),
    (names::LIST, ids::LIST),
    (names::RECORD, ids::RECORD),
];

impl TagTable {
    /// The process-wide table of built-in mappings
    pub fn global() -> &'static TagTable {
        static TABLE: OnceLock<TagTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            let mut tag_by_id = HashMap::new();
            let mut id_by_tag = HashMap::new();
            for &(tag, id) in BUILTIN_MAPPINGS {
                tag_by_id.insert(id, tag);
                id_by_tag.insert(tag, id);
            }
            TagTable { tag_by_id, id_by_tag }
        })
    }

    /// Short tag for a qualified identifier; unmapped ids pass through
    pub fn tag_for<'a>(&self, qualified_id: &'a str) -> &'a str {
        self.tag_by_id.get(qualified_id).copied().unwrap_or(qualified_id)
    }

    /// Qualified identifier for a short tag; unknown tags are treated as
    /// literal identifiers
    pub fn type_for<'a>(&self, tag: &'a str) -> &'a str {
        self.id_by_tag.get(tag).copied().unwrap_or(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_mappings_are_a_bijection() {
        let table = TagTable::global();
        for &(tag, id) in BUILTIN_MAPPINGS {
            assert_eq!(table.tag_for(id), tag);
            assert_eq!(table.type_for(tag), id);
            assert_eq!(table.type_for(table.tag_for(id)), id);
        }
    }

    #[test]
    fn test_unmapped_identifier_passes_through() {
        let table = TagTable::global();
        assert_eq!(table.tag_for("myapp::types::Color"), "myapp::types::Color");
        assert_eq!(table.type_for("myapp::types::Color"), "myapp::types::Color");
        assert_eq!(
            table.type_for(table.tag_for("myapp::types::Color")),
            "myapp::types::Color"
        );
    }

    #[test]
    fn test_no_tag_collides_with_shape_markers() {
        // "array" and "map" are shape markers, never scalar tags
        let table = TagTable::global();
        for &(tag, _) in BUILTIN_MAPPINGS {
            assert_ne!(tag, "array");
            assert_ne!(tag, "map");
        }
        assert_eq!(table.type_for("array"), "array");
    }
}

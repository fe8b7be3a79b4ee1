//! Record wrapper and the recursive codec for composite values
//!
//! A record is the unit of persistence: one named value plus a free-form
//! provenance string. Records are transient — built at write time from an
//! in-memory value, rebuilt at read time and handed straight back to the
//! owning listener.
//!
//! Array- and map-shaped values have no codec of their own; they are
//! recognized structurally and encoded by recursion, tagged with the shape
//! markers `array`/`map` which are mutually exclusive with every scalar tag.
//! Null is represented by absence: a null value writes no type attribute and
//! no body.

use tracing::warn;

use crate::allowlist::TypeAllowList;
use crate::codec::{CodecRegistry, decode_scalar};
use crate::constants::format;
use crate::document::Node;
use crate::errors::CodecError;
use crate::tags::TagTable;
use crate::value::Value;

/// One named, persisted value plus provenance metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    pub value: Value,
    pub source: String,
}

impl Record {
    pub fn new(name: impl Into<String>, source: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            source: source.into(),
        }
    }
}

/// Encode a record as a `record` node
pub fn encode_record(record: &Record, registry: &CodecRegistry) -> Result<Node, CodecError> {
    let mut node = Node::new(format::RECORD_NODE);
    node.set_attr(format::NAME_ATTR, record.name.clone());
    node.set_attr(format::SOURCE_ATTR, record.source.clone());
    write_value(&mut node, &record.value, registry)?;
    Ok(node)
}

/// Decode a `record` node back into a record
///
/// The type attribute is inspected before any per-field accumulation: an
/// absent, empty or `null` attribute yields a null value verbatim (never the
/// type's default instance); anything else is delegated to the recursive
/// codec keyed by that attribute.
pub fn decode_record(
    node: &Node,
    registry: &CodecRegistry,
    allow: &TypeAllowList,
) -> Result<Record, CodecError> {
    let name = node.attr(format::NAME_ATTR).unwrap_or("").to_string();
    let source = node.attr(format::SOURCE_ATTR).unwrap_or("").to_string();
    let value = decode_node_value(node, registry, allow)?;
    Ok(Record { name, value, source })
}

/// Write `value` into `node`: a type/shape attribute plus body, or nothing
/// at all for null
pub fn write_value(
    node: &mut Node,
    value: &Value,
    registry: &CodecRegistry,
) -> Result<(), CodecError> {
    match value {
        Value::Null => Ok(()),
        Value::Array(items) => {
            node.set_attr(format::TYPE_ATTR, format::ARRAY_TAG);
            for item in items {
                let child = node.add_child(format::ITEM_NODE);
                write_value(child, item, registry)?;
            }
            Ok(())
        }
        Value::Map(entries) => {
            node.set_attr(format::TYPE_ATTR, format::MAP_TAG);
            for (key, val) in entries {
                let item = node.add_child(format::ITEM_NODE);
                let key_node = item.add_child(format::KEY_NODE);
                write_value(key_node, key, registry)?;
                let value_node = item.add_child(format::VALUE_NODE);
                write_value(value_node, val, registry)?;
            }
            Ok(())
        }
        scalar => {
            let codec = registry
                .codec_for_value(scalar)
                .filter(|c| c.can_convert(scalar))
                .ok_or_else(|| CodecError::UnknownType {
                    tag: String::new(),
                    id: format!("{scalar:?}"),
                })?;
            let tag = TagTable::global().tag_for(codec.qualified_id());
            node.set_attr(format::TYPE_ATTR, tag);
            codec.write(scalar, node)
        }
    }
}

/// Decode the value held by `node`, treating a missing/empty/`null` type
/// attribute as null
pub fn decode_node_value(
    node: &Node,
    registry: &CodecRegistry,
    allow: &TypeAllowList,
) -> Result<Value, CodecError> {
    match node.attr(format::TYPE_ATTR) {
        None | Some("") | Some(format::NULL_TAG) => Ok(Value::Null),
        Some(tag) => read_value(node, tag, registry, allow),
    }
}

/// Decode `node` according to the declared shape or type tag
pub fn read_value(
    node: &Node,
    tag: &str,
    registry: &CodecRegistry,
    allow: &TypeAllowList,
) -> Result<Value, CodecError> {
    match tag {
        format::ARRAY_TAG => {
            let mut items = Vec::new();
            for child in node.children() {
                if child.name != format::ITEM_NODE {
                    continue;
                }
                items.push(decode_node_value(child, registry, allow)?);
            }
            Ok(Value::Array(items))
        }
        format::MAP_TAG => {
            let mut entries = Vec::new();
            for child in node.children() {
                if child.name != format::ITEM_NODE {
                    continue;
                }
                // Tolerate partial writes: an entry without a key is dropped
                let Some(key_node) = child.child(format::KEY_NODE) else {
                    warn!("skipping map item without a key child");
                    continue;
                };
                let key = decode_node_value(key_node, registry, allow)?;
                let value = match child.child(format::VALUE_NODE) {
                    Some(value_node) => decode_node_value(value_node, registry, allow)?,
                    None => Value::Null,
                };
                entries.push((key, value));
            }
            Ok(Value::Map(entries))
        }
        _ => {
            let id = TagTable::global().type_for(tag);
            if !allow.is_allowed(id) {
                return Err(CodecError::TypeNotAllowed { id: id.to_string() });
            }
            let codec = registry.get(id).ok_or_else(|| CodecError::UnknownType {
                tag: tag.to_string(),
                id: id.to_string(),
            })?;
            decode_scalar(codec, node)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FontSpec, FontStyle, Point, Rect};

    fn roundtrip(value: Value) -> Value {
        let registry = CodecRegistry::with_builtins();
        let allow = TypeAllowList::builtin();
        let record = Record::new("probe", "test", value);
        let node = encode_record(&record, &registry).unwrap();
        decode_record(&node, &registry, &allow).unwrap().value
    }

    #[test]
    fn test_scalar_roundtrips() {
        let samples = [
            Value::Text("hello".to_string()),
            Value::Text(String::new()),
            Value::Int(0),
            Value::Int(-42),
            Value::Long(i64::MIN),
            Value::Float(1.5),
            Value::Double(-2.25),
            Value::Bool(true),
            Value::Bool(false),
            Value::Point(Point::new(-3, 7)),
            Value::Rect(Rect::new(0, 0, 0, 0)),
            Value::Rect(Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX)),
            Value::Font(FontSpec::new("Monospace", 13.5, FontStyle::Bold)),
        ];
        for value in samples {
            assert_eq!(roundtrip(value.clone()), value);
        }
    }

    #[test]
    fn test_null_roundtrip_is_absence() {
        let registry = CodecRegistry::with_builtins();
        let record = Record::new("nothing", "test", Value::Null);
        let node = encode_record(&record, &registry).unwrap();
        // No type attribute and no body
        assert_eq!(node.attr("type"), None);
        assert!(node.children().is_empty());

        let allow = TypeAllowList::builtin();
        let decoded = decode_record(&node, &registry, &allow).unwrap();
        assert_eq!(decoded.value, Value::Null);
    }

    #[test]
    fn test_shape_tags_exclusive_with_scalar_tags() {
        let registry = CodecRegistry::with_builtins();
        let record = Record::new("paths", "test", Value::array(["a", "b"]));
        let node = encode_record(&record, &registry).unwrap();
        assert_eq!(node.attr("type"), Some("array"));
        // Items carry their own scalar tags
        assert_eq!(node.children()[0].attr("type"), Some("Text"));
    }

    #[test]
    fn test_nested_composites_roundtrip() {
        // arrays of maps of arrays, three levels deep
        let value = Value::map([
            (
                Value::Text("layers".to_string()),
                Value::Array(vec![
                    Value::map([
                        (Value::Text("bounds".to_string()), Value::Rect(Rect::new(1, 2, 3, 4))),
                        (
                            Value::Text("stops".to_string()),
                            Value::Array(vec![Value::Double(0.0), Value::Double(1.0)]),
                        ),
                    ]),
                    Value::Null,
                ]),
            ),
            (Value::Int(7), Value::Bool(true)),
        ]);
        assert_eq!(roundtrip(value.clone()), value);
    }

    #[test]
    fn test_map_entry_order_preserved() {
        let value = Value::map([
            ("zeta", Value::Int(1)),
            ("alpha", Value::Int(2)),
            ("mid", Value::Int(3)),
        ]);
        let Value::Map(entries) = roundtrip(value) else {
            panic!("expected map");
        };
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(
            keys,
            vec![
                Value::Text("zeta".to_string()),
                Value::Text("alpha".to_string()),
                Value::Text("mid".to_string()),
            ]
        );
    }

    #[test]
    fn test_array_with_null_elements() {
        let value = Value::Array(vec![Value::Null, Value::Int(1), Value::Null]);
        assert_eq!(roundtrip(value.clone()), value);
    }

    #[test]
    fn test_unknown_type_tag_rejected() {
        let registry = CodecRegistry::with_builtins();
        let mut allow = TypeAllowList::builtin();
        allow.allow("myapp::*");

        let mut node = Node::new("record");
        node.set_attr("type", "myapp::types::Color");
        let err = decode_node_value(&node, &registry, &allow).unwrap_err();
        assert!(matches!(err, CodecError::UnknownType { .. }));
    }

    #[test]
    fn test_type_outside_allowlist_rejected() {
        let registry = CodecRegistry::with_builtins();
        let allow = TypeAllowList::empty();

        let mut node = Node::new("record");
        node.set_attr("type", "Rectangle");
        node.add_child("x").set_text("10");
        let err = decode_node_value(&node, &registry, &allow).unwrap_err();
        assert!(matches!(err, CodecError::TypeNotAllowed { .. }));
    }

    #[test]
    fn test_map_item_without_key_skipped() {
        let registry = CodecRegistry::with_builtins();
        let allow = TypeAllowList::builtin();

        let mut node = Node::new("record");
        node.set_attr("type", "map");
        // well-formed entry
        let good = node.add_child("item");
        let key = good.add_child("key");
        key.set_attr("type", "Text");
        key.add_child("text").set_text("kept");
        let val = good.add_child("value");
        val.set_attr("type", "Int");
        val.add_child("value").set_text("1");
        // malformed entry: no key child
        let bad = node.add_child("item");
        let orphan = bad.add_child("value");
        orphan.set_attr("type", "Int");
        orphan.add_child("value").set_text("2");

        let decoded = decode_node_value(&node, &registry, &allow).unwrap();
        assert_eq!(
            decoded,
            Value::map([("kept", Value::Int(1))])
        );
    }

    #[test]
    fn test_map_item_without_value_decodes_null() {
        let registry = CodecRegistry::with_builtins();
        let allow = TypeAllowList::builtin();

        let mut node = Node::new("record");
        node.set_attr("type", "map");
        let item = node.add_child("item");
        let key = item.add_child("key");
        key.set_attr("type", "Text");
        key.add_child("text").set_text("orphaned");

        let decoded = decode_node_value(&node, &registry, &allow).unwrap();
        assert_eq!(decoded, Value::map([("orphaned", Value::Null)]));
    }

    #[test]
    fn test_record_source_attribute_written() {
        let registry = CodecRegistry::with_builtins();
        let record = Record::new("bounds", "main-window", Value::Int(1));
        let node = encode_record(&record, &registry).unwrap();
        assert_eq!(node.attr("source"), Some("main-window"));
        assert_eq!(node.attr("name"), Some("bounds"));
    }
}

//! Per-type codecs and the codec registry
//!
//! Each built-in type has one [`TypeCodec`]: it knows its qualified
//! identifier, its short alias, a default value, how to write a value as
//! named child fields, and how to rebuild one through a [`ValueBuilder`].
//! Builders are field-order-agnostic: they start from the codec's default
//! value and overwrite whichever fields the document supplies, so a
//! composite type (e.g. a typeface needing family+size+style) is finalized
//! only once all fields have arrived, regardless of storage order. A node
//! with zero fields decodes to the default value unchanged.
//!
//! The registry owns exactly one codec per qualified identifier. Matching is
//! exact — no subtype or fallback matching — and registration preconditions
//! (duplicate identifier, missing builder outside the record registration)
//! fail immediately rather than at document-processing time.

use std::collections::HashMap;

use crate::document::Node;
use crate::errors::CodecError;
use crate::tags::{ids, names};
use crate::types::{FontSpec, FontStyle, Point, Rect};
use crate::value::Value;

/// Strategy object describing how one type is (de)serialized
pub trait TypeCodec: Send + Sync {
    /// Qualified identifier this codec governs (exact match only)
    fn qualified_id(&self) -> &'static str;

    /// Short tag written to documents instead of the qualified identifier
    fn alias(&self) -> Option<&'static str>;

    /// Canonical placeholder instance; also the builder's starting state
    fn default_value(&self) -> Value;

    /// Whether this codec can write the given value
    fn can_convert(&self, value: &Value) -> bool;

    /// Write `value` as named child fields of `node`
    fn write(&self, value: &Value, node: &mut Node) -> Result<(), CodecError>;

    /// Start a fresh accumulator, or `None` for the record registration
    /// (record nodes are decoded by the record layer, which must inspect
    /// the type attribute before any per-field accumulation applies)
    fn begin(&self) -> Option<Box<dyn ValueBuilder>>;
}

/// Field-order-agnostic accumulator for one value being decoded
pub trait ValueBuilder {
    /// Feed one named field; unrecognized names are ignored
    fn field(&mut self, name: &str, text: &str) -> Result<(), CodecError>;

    /// Produce the finished value
    fn finish(self: Box<Self>) -> Result<Value, CodecError>;
}

/// Registry of codecs keyed by qualified identifier
///
/// Rebuilt on every stream open; registrations are additive and never
/// removed while a stream is in use.
pub struct CodecRegistry {
    by_id: HashMap<&'static str, Box<dyn TypeCodec>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self { by_id: HashMap::new() }
    }

    /// Registry pre-loaded with every built-in codec
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: Vec<Box<dyn TypeCodec>> = vec![
            Box::new(TextCodec),
            Box::new(IntCodec),
            Box::new(LongCodec),
            Box::new(FloatCodec),
            Box::new(DoubleCodec),
            Box::new(BoolCodec),
            Box::new(PointCodec),
            Box::new(RectCodec),
            Box::new(FontCodec),
            Box::new(RecordCodec),
        ];
        for codec in builtins {
            // Built-in registrations cannot violate the preconditions
            registry
                .register(codec)
                .expect("built-in codec registration is infallible");
        }
        registry
    }

    /// Register a codec, failing fast on precondition violations
    pub fn register(&mut self, codec: Box<dyn TypeCodec>) -> Result<(), CodecError> {
        let id = codec.qualified_id();
        if codec.begin().is_none() && id != ids::RECORD {
            return Err(CodecError::InvalidRegistration(format!(
                "codec for '{id}' has no builder"
            )));
        }
        if self.by_id.contains_key(id) {
            return Err(CodecError::InvalidRegistration(format!(
                "duplicate codec for '{id}'"
            )));
        }
        self.by_id.insert(id, codec);
        Ok(())
    }

    pub fn get(&self, qualified_id: &str) -> Option<&dyn TypeCodec> {
        self.by_id.get(qualified_id).map(|c| c.as_ref())
    }

    /// Codec whose type matches the value's runtime variant, if any
    /// (array/map/null shapes have no codec; they are handled structurally)
    pub fn codec_for_value(&self, value: &Value) -> Option<&dyn TypeCodec> {
        let id = match value {
            Value::Text(_) => ids::TEXT,
            Value::Int(_) => ids::INT,
            Value::Long(_) => ids::LONG,
            Value::Float(_) => ids::FLOAT,
            Value::Double(_) => ids::DOUBLE,
            Value::Bool(_) => ids::BOOL,
            Value::Point(_) => ids::POINT,
            Value::Rect(_) => ids::RECT,
            Value::Font(_) => ids::FONT,
            Value::Null | Value::Array(_) | Value::Map(_) => return None,
        };
        self.get(id)
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Decode a scalar node through its codec's builder
pub fn decode_scalar(codec: &dyn TypeCodec, node: &Node) -> Result<Value, CodecError> {
    let Some(mut builder) = codec.begin() else {
        return Err(CodecError::InvalidRegistration(format!(
            "codec for '{}' cannot decode scalar nodes",
            codec.qualified_id()
        )));
    };
    for child in node.children() {
        builder.field(&child.name, child.text().unwrap_or(""))?;
    }
    builder.finish()
}

fn invalid_field(type_id: &'static str, field: &str, text: &str) -> CodecError {
    CodecError::InvalidField {
        type_id,
        field: field.to_string(),
        text: text.to_string(),
    }
}

fn mismatch(id: &'static str, value: &Value) -> CodecError {
    CodecError::InvalidRegistration(format!("codec for '{id}' asked to write {value:?}"))
}

// ---------------------------------------------------------------------------
// Text

struct TextCodec;

struct TextBuilder {
    text: String,
}

impl TypeCodec for TextCodec {
    fn qualified_id(&self) -> &'static str {
        ids::TEXT
    }

    fn alias(&self) -> Option<&'static str> {
        Some(names::TEXT)
    }

    fn default_value(&self) -> Value {
        Value::Text(String::new())
    }

    fn can_convert(&self, value: &Value) -> bool {
        matches!(value, Value::Text(_))
    }

    fn write(&self, value: &Value, node: &mut Node) -> Result<(), CodecError> {
        let Value::Text(s) = value else {
            return Err(mismatch(ids::TEXT, value));
        };
        node.add_child("text").set_text(s.clone());
        Ok(())
    }

    fn begin(&self) -> Option<Box<dyn ValueBuilder>> {
        Some(Box::new(TextBuilder { text: String::new() }))
    }
}

impl ValueBuilder for TextBuilder {
    fn field(&mut self, name: &str, text: &str) -> Result<(), CodecError> {
        if name == "text" {
            self.text = text.to_string();
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Value, CodecError> {
        Ok(Value::Text(self.text))
    }
}

// ---------------------------------------------------------------------------
// Numeric and boolean scalars share one shape: a single "value" field

macro_rules! simple_codec {
    ($codec:ident, $builder:ident, $variant:ident, $ty:ty, $id:expr, $alias:expr) => {
        struct $codec;

        struct $builder {
            value: $ty,
        }

        impl TypeCodec for $codec {
            fn qualified_id(&self) -> &'static str {
                $id
            }

            fn alias(&self) -> Option<&'static str> {
                Some($alias)
            }

            fn default_value(&self) -> Value {
                Value::$variant(<$ty>::default())
            }

            fn can_convert(&self, value: &Value) -> bool {
                matches!(value, Value::$variant(_))
            }

            fn write(&self, value: &Value, node: &mut Node) -> Result<(), CodecError> {
                let Value::$variant(v) = value else {
                    return Err(mismatch($id, value));
                };
                node.add_child("value").set_text(v.to_string());
                Ok(())
            }

            fn begin(&self) -> Option<Box<dyn ValueBuilder>> {
                Some(Box::new($builder {
                    value: <$ty>::default(),
                }))
            }
        }

        impl ValueBuilder for $builder {
            fn field(&mut self, name: &str, text: &str) -> Result<(), CodecError> {
                if name == "value" {
                    self.value = text.parse().map_err(|_| invalid_field($id, name, text))?;
                }
                Ok(())
            }

            fn finish(self: Box<Self>) -> Result<Value, CodecError> {
                Ok(Value::$variant(self.value))
            }
        }
    };
}

simple_codec!(IntCodec, IntBuilder, Int, i32, ids::INT, names::INT);
simple_codec!(LongCodec, LongBuilder, Long, i64, ids::LONG, names::LONG);
simple_codec!(FloatCodec, FloatBuilder, Float, f32, ids::FLOAT, names::FLOAT);
simple_codec!(DoubleCodec, DoubleBuilder, Double, f64, ids::DOUBLE, names::DOUBLE);
simple_codec!(BoolCodec, BoolBuilder, Bool, bool, ids::BOOL, names::BOOL);

// ---------------------------------------------------------------------------
// Point

struct PointCodec;

struct PointBuilder {
    point: Point,
}

impl TypeCodec for PointCodec {
    fn qualified_id(&self) -> &'static str {
        ids::POINT
    }

    fn alias(&self) -> Option<&'static str> {
        Some(names::POINT)
    }

    fn default_value(&self) -> Value {
        Value::Point(Point::new(0, 0))
    }

    fn can_convert(&self, value: &Value) -> bool {
        matches!(value, Value::Point(_))
    }

    fn write(&self, value: &Value, node: &mut Node) -> Result<(), CodecError> {
        let Value::Point(p) = value else {
            return Err(mismatch(ids::POINT, value));
        };
        node.add_child("x").set_text(p.x.to_string());
        node.add_child("y").set_text(p.y.to_string());
        Ok(())
    }

    fn begin(&self) -> Option<Box<dyn ValueBuilder>> {
        Some(Box::new(PointBuilder {
            point: Point::new(0, 0),
        }))
    }
}

impl ValueBuilder for PointBuilder {
    fn field(&mut self, name: &str, text: &str) -> Result<(), CodecError> {
        let parsed = || text.parse::<i32>().map_err(|_| invalid_field(ids::POINT, name, text));
        match name {
            "x" => self.point.x = parsed()?,
            "y" => self.point.y = parsed()?,
            _ => {}
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Value, CodecError> {
        Ok(Value::Point(self.point))
    }
}

// ---------------------------------------------------------------------------
// Rect

struct RectCodec;

struct RectBuilder {
    rect: Rect,
}

impl TypeCodec for RectCodec {
    fn qualified_id(&self) -> &'static str {
        ids::RECT
    }

    fn alias(&self) -> Option<&'static str> {
        Some(names::RECT)
    }

    fn default_value(&self) -> Value {
        Value::Rect(Rect::new(0, 0, 0, 0))
    }

    fn can_convert(&self, value: &Value) -> bool {
        matches!(value, Value::Rect(_))
    }

    fn write(&self, value: &Value, node: &mut Node) -> Result<(), CodecError> {
        let Value::Rect(r) = value else {
            return Err(mismatch(ids::RECT, value));
        };
        node.add_child("x").set_text(r.x.to_string());
        node.add_child("y").set_text(r.y.to_string());
        node.add_child("width").set_text(r.width.to_string());
        node.add_child("height").set_text(r.height.to_string());
        Ok(())
    }

    fn begin(&self) -> Option<Box<dyn ValueBuilder>> {
        Some(Box::new(RectBuilder {
            rect: Rect::new(0, 0, 0, 0),
        }))
    }
}

impl ValueBuilder for RectBuilder {
    fn field(&mut self, name: &str, text: &str) -> Result<(), CodecError> {
        let parsed = || text.parse::<i32>().map_err(|_| invalid_field(ids::RECT, name, text));
        match name {
            "x" => self.rect.x = parsed()?,
            "y" => self.rect.y = parsed()?,
            "width" => self.rect.width = parsed()?,
            "height" => self.rect.height = parsed()?,
            _ => {}
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Value, CodecError> {
        Ok(Value::Rect(self.rect))
    }
}

// ---------------------------------------------------------------------------
// Font

struct FontCodec;

struct FontBuilder {
    font: FontSpec,
}

impl TypeCodec for FontCodec {
    fn qualified_id(&self) -> &'static str {
        ids::FONT
    }

    fn alias(&self) -> Option<&'static str> {
        Some(names::FONT)
    }

    fn default_value(&self) -> Value {
        Value::Font(FontSpec::default())
    }

    fn can_convert(&self, value: &Value) -> bool {
        matches!(value, Value::Font(_))
    }

    fn write(&self, value: &Value, node: &mut Node) -> Result<(), CodecError> {
        let Value::Font(f) = value else {
            return Err(mismatch(ids::FONT, value));
        };
        node.add_child("family").set_text(f.family.clone());
        node.add_child("size").set_text(f.size.to_string());
        node.add_child("style").set_text(f.style.as_str());
        Ok(())
    }

    fn begin(&self) -> Option<Box<dyn ValueBuilder>> {
        Some(Box::new(FontBuilder {
            font: FontSpec::default(),
        }))
    }
}

impl ValueBuilder for FontBuilder {
    fn field(&mut self, name: &str, text: &str) -> Result<(), CodecError> {
        match name {
            "family" => self.font.family = text.to_string(),
            "size" => {
                self.font.size =
                    text.parse().map_err(|_| invalid_field(ids::FONT, name, text))?;
            }
            "style" => {
                self.font.style = text
                    .parse::<FontStyle>()
                    .map_err(|_| invalid_field(ids::FONT, name, text))?;
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Value, CodecError> {
        Ok(Value::Font(self.font))
    }
}

// ---------------------------------------------------------------------------
// Record

/// Reserved registration for the record wrapper itself
///
/// Record bodies are written and decoded by the record layer, which must
/// inspect the type attribute before any generic field accumulation; this
/// registration reserves the tag and is the one codec allowed to have no
/// builder.
struct RecordCodec;

impl TypeCodec for RecordCodec {
    fn qualified_id(&self) -> &'static str {
        ids::RECORD
    }

    fn alias(&self) -> Option<&'static str> {
        Some(names::RECORD)
    }

    fn default_value(&self) -> Value {
        Value::Null
    }

    fn can_convert(&self, _value: &Value) -> bool {
        false
    }

    fn write(&self, _value: &Value, _node: &mut Node) -> Result<(), CodecError> {
        Ok(())
    }

    fn begin(&self) -> Option<Box<dyn ValueBuilder>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar_node(children: &[(&str, &str)]) -> Node {
        let mut node = Node::new("value");
        for (name, text) in children {
            node.add_child(*name).set_text(*text);
        }
        node
    }

    #[test]
    fn test_point_fields_in_any_order() {
        let codec = PointCodec;
        let node = scalar_node(&[("y", "20"), ("x", "10")]);
        let value = decode_scalar(&codec, &node).unwrap();
        assert_eq!(value, Value::Point(Point::new(10, 20)));
    }

    #[test]
    fn test_missing_field_keeps_default() {
        let codec = RectCodec;
        let node = scalar_node(&[("width", "300")]);
        let value = decode_scalar(&codec, &node).unwrap();
        assert_eq!(value, Value::Rect(Rect::new(0, 0, 300, 0)));
    }

    #[test]
    fn test_zero_fields_yields_default_value() {
        let codec = FontCodec;
        let value = decode_scalar(&codec, &Node::new("value")).unwrap();
        assert_eq!(value, codec.default_value());
    }

    #[test]
    fn test_unknown_field_ignored() {
        let codec = IntCodec;
        let node = scalar_node(&[("value", "7"), ("legacy", "junk")]);
        assert_eq!(decode_scalar(&codec, &node).unwrap(), Value::Int(7));
    }

    #[test]
    fn test_unparseable_field_rejected() {
        let codec = IntCodec;
        let node = scalar_node(&[("value", "not-a-number")]);
        let err = decode_scalar(&codec, &node).unwrap_err();
        assert!(matches!(err, CodecError::InvalidField { .. }));
    }

    #[test]
    fn test_duplicate_registration_fails_fast() {
        let mut registry = CodecRegistry::with_builtins();
        let err = registry.register(Box::new(IntCodec)).unwrap_err();
        assert!(matches!(err, CodecError::InvalidRegistration(_)));
    }

    #[test]
    fn test_builderless_codec_rejected_unless_record() {
        struct Bogus;
        impl TypeCodec for Bogus {
            fn qualified_id(&self) -> &'static str {
                "myapp::types::Bogus"
            }
            fn alias(&self) -> Option<&'static str> {
                None
            }
            fn default_value(&self) -> Value {
                Value::Null
            }
            fn can_convert(&self, _value: &Value) -> bool {
                false
            }
            fn write(&self, _value: &Value, _node: &mut Node) -> Result<(), CodecError> {
                Ok(())
            }
            fn begin(&self) -> Option<Box<dyn ValueBuilder>> {
                None
            }
        }
        let mut registry = CodecRegistry::new();
        let err = registry.register(Box::new(Bogus)).unwrap_err();
        assert!(matches!(err, CodecError::InvalidRegistration(_)));
    }

    #[test]
    fn test_codec_for_value_exact_match_only() {
        let registry = CodecRegistry::with_builtins();
        assert!(registry.codec_for_value(&Value::Int(1)).is_some());
        assert!(registry.codec_for_value(&Value::Null).is_none());
        assert!(registry.codec_for_value(&Value::Array(vec![])).is_none());
        assert!(registry.codec_for_value(&Value::Map(vec![])).is_none());
    }

    #[test]
    fn test_boundary_values_roundtrip_through_builders() {
        let cases = [
            (Value::Int(i32::MIN), &IntCodec as &dyn TypeCodec),
            (Value::Int(0), &IntCodec),
            (Value::Long(i64::MAX), &LongCodec),
            (Value::Double(-0.25), &DoubleCodec),
            (Value::Bool(false), &BoolCodec),
            (Value::Text(String::new()), &TextCodec),
        ];
        for (value, codec) in cases {
            let mut node = Node::new("value");
            codec.write(&value, &mut node).unwrap();
            assert_eq!(decode_scalar(codec, &node).unwrap(), value);
        }
    }
}

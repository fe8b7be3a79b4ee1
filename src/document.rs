//! Structured settings document: element tree, writer and reader
//!
//! The persisted format is a minimal XML subset: elements, attributes, text
//! content and the five standard entity escapes. Writing emits a UTF-8
//! byte-order mark and a header line before the body; reading tolerates the
//! absence of both and skips comments. The tree itself is format-agnostic —
//! the codec layer only ever sees [`Node`]s.

use std::io::{self, Write};

use crate::constants::format;
use crate::errors::CodecError;

/// One element of a settings document
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Attribute value by name, if present
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing any previous value of the same name
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// First child with the given element name
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Append a child and return a mutable reference to it
    pub fn add_child(&mut self, name: impl Into<String>) -> &mut Node {
        self.children.push(Node::new(name));
        self.children.last_mut().unwrap()
    }

    pub fn push_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Remove the first child matching `pred`, returning it
    pub fn remove_child_where(&mut self, pred: impl Fn(&Node) -> bool) -> Option<Node> {
        let idx = self.children.iter().position(|c| pred(c))?;
        Some(self.children.remove(idx))
    }
}

/// Write BOM, header line and pretty-printed body to `w`
pub fn write_document<W: Write>(w: &mut W, root: &Node) -> io::Result<()> {
    w.write_all(format::BOM)?;
    writeln!(w, "{}", format::HEADER)?;
    write_body(w, root)
}

/// Write just the pretty-printed body (framing is written at stream open)
pub fn write_body<W: Write>(w: &mut W, root: &Node) -> io::Result<()> {
    write_node(w, root, 0)
}

fn write_node<W: Write>(w: &mut W, node: &Node, depth: usize) -> io::Result<()> {
    let pad = "  ".repeat(depth);
    write!(w, "{pad}<{}", node.name)?;
    for (name, value) in &node.attrs {
        write!(w, " {name}=\"{}\"", escape(value))?;
    }
    if let Some(text) = &node.text {
        // Leaf text stays on one line so it round-trips verbatim
        writeln!(w, ">{}</{}>", escape(text), node.name)?;
    } else if node.children.is_empty() {
        writeln!(w, "/>")?;
    } else {
        writeln!(w, ">")?;
        for child in &node.children {
            write_node(w, child, depth + 1)?;
        }
        writeln!(w, "{pad}</{}>", node.name)?;
    }
    Ok(())
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(s: &str) -> Result<String, CodecError> {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            return Err(CodecError::Malformed(format!(
                "unterminated entity in '{tail}'"
            )));
        };
        match &tail[..=semi] {
            "&amp;" => out.push('&'),
            "&lt;" => out.push('<'),
            "&gt;" => out.push('>'),
            "&quot;" => out.push('"'),
            "&apos;" => out.push('\''),
            other => {
                return Err(CodecError::Malformed(format!("unknown entity '{other}'")));
            }
        }
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Parse a settings document, tolerating a missing BOM/header
pub fn read_document(input: &str) -> Result<Node, CodecError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut parser = Parser { s: input.as_bytes(), pos: 0 };
    parser.skip_misc()?;
    let root = parser.parse_element()?;
    parser.skip_misc()?;
    if parser.pos < parser.s.len() {
        return Err(CodecError::Malformed(
            "unexpected content after document root".to_string(),
        ));
    }
    Ok(root)
}

struct Parser<'a> {
    s: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.s.get(self.pos).copied()
    }

    fn starts_with(&self, pat: &str) -> bool {
        self.s[self.pos..].starts_with(pat.as_bytes())
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    /// Skip whitespace, processing instructions and comments
    fn skip_misc(&mut self) -> Result<(), CodecError> {
        loop {
            self.skip_ws();
            if self.starts_with("<?") {
                self.skip_until("?>")?;
            } else if self.starts_with("<!--") {
                self.skip_until("-->")?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_until(&mut self, end: &str) -> Result<(), CodecError> {
        let tail = &self.s[self.pos..];
        match tail
            .windows(end.len())
            .position(|window| window == end.as_bytes())
        {
            Some(idx) => {
                self.pos += idx + end.len();
                Ok(())
            }
            None => Err(CodecError::Malformed(format!("missing '{end}'"))),
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), CodecError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(CodecError::Malformed(format!(
                "expected '{}' at offset {}",
                byte as char, self.pos
            )))
        }
    }

    fn read_name(&mut self) -> Result<&'a str, CodecError> {
        let s = self.s;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b':' | b'.') {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(CodecError::Malformed(format!(
                "expected a name at offset {start}"
            )));
        }
        // Name characters are all ASCII, so the slice is valid UTF-8
        std::str::from_utf8(&s[start..self.pos])
            .map_err(|_| CodecError::Malformed("non-UTF-8 name".to_string()))
    }

    fn parse_element(&mut self) -> Result<Node, CodecError> {
        let s = self.s;
        self.expect(b'<')?;
        let name = self.read_name()?;
        let mut node = Node::new(name);

        // Attributes until '>' or '/>'
        loop {
            self.skip_ws();
            if self.starts_with("/>") {
                self.pos += 2;
                return Ok(node);
            }
            if self.peek() == Some(b'>') {
                self.pos += 1;
                break;
            }
            let attr_name = self.read_name()?.to_string();
            self.skip_ws();
            self.expect(b'=')?;
            self.skip_ws();
            let quote = match self.peek() {
                Some(q @ (b'"' | b'\'')) => q,
                _ => {
                    return Err(CodecError::Malformed(format!(
                        "expected quoted value for attribute '{attr_name}'"
                    )));
                }
            };
            self.pos += 1;
            let start = self.pos;
            while let Some(b) = self.peek() {
                if b == quote {
                    break;
                }
                self.pos += 1;
            }
            let raw = std::str::from_utf8(&s[start..self.pos])
                .map_err(|_| CodecError::Malformed("non-UTF-8 attribute value".to_string()))?;
            self.expect(quote)?;
            node.set_attr(attr_name, unescape(raw)?);
        }

        // Content: text and child elements until the matching close tag
        let mut text = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(CodecError::Malformed(format!(
                        "unexpected end of input inside <{}>",
                        node.name
                    )));
                }
                Some(b'<') => {
                    if self.starts_with("</") {
                        self.pos += 2;
                        let close = self.read_name()?;
                        if close != node.name {
                            return Err(CodecError::Malformed(format!(
                                "mismatched close tag: <{}> closed by </{close}>",
                                node.name
                            )));
                        }
                        self.skip_ws();
                        self.expect(b'>')?;
                        break;
                    }
                    if self.starts_with("<!--") {
                        self.skip_until("-->")?;
                        continue;
                    }
                    let child = self.parse_element()?;
                    node.push_child(child);
                }
                Some(_) => {
                    let start = self.pos;
                    while self.peek().is_some_and(|b| b != b'<') {
                        self.pos += 1;
                    }
                    let raw = std::str::from_utf8(&s[start..self.pos])
                        .map_err(|_| CodecError::Malformed("non-UTF-8 text".to_string()))?;
                    text.push_str(&unescape(raw)?);
                }
            }
        }

        // Pretty-printing indentation around children is not content
        if !text.is_empty() {
            if node.children.is_empty() {
                node.set_text(text);
            } else if !text.chars().all(char::is_whitespace) {
                node.set_text(text.trim().to_string());
            }
        }
        Ok(node)
    }
}

//! Minimal XML tree with pretty printing.
//!
//! Output layout: tab indentation, inline text for elements holding a single text
//! node, one line per text node otherwise, self-closing empty elements.

use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute, keeping first-insertion order
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some(existing) => existing.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
        self
    }

    pub fn child(mut self, element: XmlElement) -> Self {
        self.children.push(XmlNode::Element(element));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn write_pretty(&self, out: &mut String, depth: usize, indent: &str) {
        let pad = indent.repeat(depth);
        let _ = write!(out, "{}<{}", pad, self.name);
        for (name, value) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", name, escape_attr(value));
        }

        if self.children.is_empty() {
            out.push_str("/>\n");
            return;
        }

        if let [XmlNode::Text(text)] = self.children.as_slice() {
            let _ = writeln!(out, ">{}</{}>", escape_text(text), self.name);
            return;
        }

        out.push_str(">\n");
        for child in &self.children {
            match child {
                XmlNode::Element(e) => e.write_pretty(out, depth + 1, indent),
                XmlNode::Text(text) => {
                    let _ = writeln!(out, "{}{}{}", pad, indent, escape_text(text));
                }
            }
        }
        let _ = writeln!(out, "{}</{}>", pad, self.name);
    }
}

/// Render a full document with declaration
pub fn to_pretty_xml(root: &XmlElement) -> String {
    let mut out = String::from("<?xml version=\"1.0\" ?>\n");
    root.write_pretty(&mut out, 0, "\t");
    out
}

pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
    out
}

/// Float text in shortest round-trip form.
///
/// Magnitudes in `[1e-4, 1e16)` and zero print positionally with at least one
/// fractional digit. Anything else uses a signed exponent of at least two digits
/// (`8.726646259971648e-06`, `1e+16`).
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-4..1e16).contains(&magnitude) {
        return if value.fract() == 0.0 {
            format!("{:.1}", value)
        } else {
            format!("{}", value)
        };
    }

    let scientific = format!("{:e}", value);
    match scientific.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => scientific,
    }
}

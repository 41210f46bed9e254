//! HTML serialization.

use crate::document::{Document, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

impl Document {
    /// Serialize the children of `node`.
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        let raw = self
            .tag(node)
            .is_some_and(|t| RAW_TEXT_ELEMENTS.contains(&t));
        for child in self.children(node) {
            self.write_node(*child, raw, &mut out);
        }
        out
    }

    /// Serialize `node` including its own tag.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, false, &mut out);
        out
    }

    fn write_node(&self, node: NodeId, raw_text: bool, out: &mut String) {
        match self.data(node) {
            NodeData::Document => {
                for child in self.children(node) {
                    self.write_node(*child, false, out);
                }
            }
            NodeData::Text(text) => {
                if raw_text {
                    out.push_str(text);
                } else {
                    escape_text(text, out);
                }
            }
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.name);
                for (name, value) in el.attrs() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_attr(value, out);
                    out.push('"');
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&el.name.as_str()) {
                    return;
                }

                let raw = RAW_TEXT_ELEMENTS.contains(&el.name.as_str());
                for child in self.children(node) {
                    self.write_node(*child, raw, out);
                }
                out.push_str("</");
                out.push_str(&el.name);
                out.push('>');
            }
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_and_escaping() {
        let doc = Document::parse(r#"<div id="x"><img src="a.png" alt="a &quot;b&quot;"><p>1 &lt; 2</p></div>"#);
        let x = doc.get_element_by_id("x").unwrap();
        assert_eq!(
            doc.inner_html(x),
            r#"<img src="a.png" alt="a &quot;b&quot;"><p>1 &lt; 2</p>"#
        );
    }

    #[test]
    fn test_script_is_not_escaped() {
        let doc = Document::parse("<div id=s><script>if (a < b) {}</script></div>");
        let s = doc.get_element_by_id("s").unwrap();
        assert_eq!(doc.inner_html(s), "<script>if (a < b) {}</script>");
    }
}

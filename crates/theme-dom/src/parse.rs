//! HTML parsing using html5ever.
//!
//! Parsing goes through the full HTML5 tree builder, so unclosed tags,
//! stray end tags and other malformed markup produce a best-effort tree
//! instead of an error.

use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::document::{Document, NodeId};

impl Document {
    /// Parse a complete HTML document.
    pub fn parse(html: &str) -> Self {
        let dom: RcDom = parse_document(RcDom::default(), ParseOpts::default()).one(html);

        let mut doc = Document::new();
        let root = doc.root();
        for child in dom.document.children.borrow().iter() {
            doc.convert_node(child, root);
        }
        doc
    }

    /// Parse a markup fragment. The fragment's nodes end up under
    /// `fragment_root()`.
    pub fn parse_fragment(html: &str) -> Self {
        Self::parse(html)
    }

    /// The `<body>` element, or the root when there is none.
    pub fn fragment_root(&self) -> NodeId {
        self.descendants(self.root())
            .into_iter()
            .find(|n| self.tag(*n) == Some("body"))
            .unwrap_or_else(|| self.root())
    }

    fn convert_node(&mut self, rc_node: &Handle, parent: NodeId) {
        match &rc_node.data {
            RcNodeData::Document => {
                for child in rc_node.children.borrow().iter() {
                    self.convert_node(child, parent);
                }
            }

            RcNodeData::Doctype { .. } | RcNodeData::ProcessingInstruction { .. } => {}

            RcNodeData::Text { contents } => {
                let node = self.create_text(contents.borrow().to_string());
                self.append_child(parent, node);
            }

            RcNodeData::Comment { contents } => {
                let node = self.create_comment(contents.to_string());
                self.append_child(parent, node);
            }

            RcNodeData::Element {
                name,
                attrs,
                template_contents,
                ..
            } => {
                let node = self.create_element(&name.local);
                for attr in attrs.borrow().iter() {
                    self.set_attr(node, &attr.name.local, attr.value.to_string());
                }
                self.append_child(parent, node);

                for child in rc_node.children.borrow().iter() {
                    self.convert_node(child, node);
                }

                // <template> content lives in a separate fragment; keep it
                // inline so deferred media can clone it later.
                if let Some(content) = template_contents.borrow().as_ref() {
                    for child in content.children.borrow().iter() {
                        self.convert_node(child, node);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tolerates_broken_markup() {
        let doc = Document::parse("<div id=a><p>one<p>two</div><span id=b>open");
        let a = doc.get_element_by_id("a").unwrap();
        assert_eq!(doc.select(a, "p").unwrap().len(), 2);
        assert!(doc.get_element_by_id("b").is_some());
    }

    #[test]
    fn test_template_content_is_inlined() {
        let doc = Document::parse(
            r#"<deferred-media id="m"><template><video src="v.mp4"></video></template></deferred-media>"#,
        );
        let m = doc.get_element_by_id("m").unwrap();
        let template = doc.select_first(m, "template").unwrap().unwrap();
        assert_eq!(doc.tag(doc.children(template)[0]), Some("video"));
    }

    #[test]
    fn test_fragment_root_is_body() {
        let doc = Document::parse_fragment("<li>a</li><li>b</li>");
        let body = doc.fragment_root();
        assert_eq!(doc.tag(body), Some("body"));
        assert_eq!(doc.inner_html(body), "<li>a</li><li>b</li>");
    }
}

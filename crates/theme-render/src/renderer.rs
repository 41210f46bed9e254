//! Copying fetched sections into the live document.
//!
//! Replacing a subtree discards whatever behavior was bound to the old
//! nodes. The renderer reports the live roots it rewrote so the calling
//! component can tear down its old bindings and set up new ones.

use theme_core::selectors::ATTR_ONLY_WITH;
use theme_core::ThemeError;
use theme_dom::{Document, NodeId};

use crate::payload::SectionPayload;
use crate::section::SectionDescriptor;

/// Outcome of a render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Live ids whose content was replaced.
    pub replaced: Vec<String>,
    /// Live roots that were rewritten (same order as `replaced`).
    pub roots: Vec<NodeId>,
    /// Descriptors whose source section was absent from the payload.
    pub missing: Vec<String>,
    /// Descriptors whose live target does not exist on this page.
    pub no_target: Vec<String>,
}

impl RenderReport {
    /// Whether the section for `id` was absent from the payload.
    pub fn is_missing(&self, id: &str) -> bool {
        self.missing.iter().any(|m| m == id)
    }

    /// Whether every descriptor was rendered.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.no_target.is_empty()
    }
}

/// Applies section payloads to a live document.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialRenderer;

impl PartialRenderer {
    /// Create a renderer.
    pub fn new() -> Self {
        Self
    }

    /// Replace the inner content of each descriptor's live target with the
    /// inner content of its source element.
    pub fn render(
        &self,
        live: &mut Document,
        payload: &SectionPayload,
        descriptors: &[SectionDescriptor],
    ) -> Result<RenderReport, ThemeError> {
        let mut report = RenderReport::default();

        for descriptor in descriptors {
            let Some((source_doc, source)) = payload.find(descriptor)? else {
                tracing::debug!(id = %descriptor.id, key = %descriptor.section_key, "section missing from payload");
                report.missing.push(descriptor.id.clone());
                continue;
            };
            let Some(target) = live.get_element_by_id(&descriptor.id) else {
                tracing::debug!(id = %descriptor.id, "no live target for section");
                report.no_target.push(descriptor.id.clone());
                continue;
            };

            live.import_children(target, source_doc, source);
            report.replaced.push(descriptor.id.clone());
            report.roots.push(target);
        }

        Ok(report)
    }

    /// Render a single descriptor, returning the rewritten root.
    pub fn render_one(
        &self,
        live: &mut Document,
        payload: &SectionPayload,
        descriptor: &SectionDescriptor,
    ) -> Result<Option<NodeId>, ThemeError> {
        let report = self.render(live, payload, std::slice::from_ref(descriptor))?;
        Ok(report.roots.first().copied())
    }

    /// Remove the live element `id` and every element marked as only
    /// relevant while it exists. Returns the number of elements removed.
    pub fn remove_stale(&self, live: &mut Document, id: &str) -> usize {
        let mut doomed: Vec<NodeId> = live
            .descendants(live.root())
            .into_iter()
            .filter(|n| live.attr(*n, ATTR_ONLY_WITH) == Some(id))
            .collect();
        doomed.extend(live.get_element_by_id(id));

        let count = doomed.len();
        for node in doomed {
            live.remove(node);
        }
        if count > 0 {
            tracing::debug!(id, removed = count, "removed stale section");
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live() -> Document {
        Document::parse(
            r#"<main>
                <div id="ProductGridContainer"><ul id="product-grid"><li>old</li></ul></div>
                <div id="ProductCount">2 products</div>
                <nav id="Pagination" data-is-more-results="true"></nav>
                <p data-only-with="Pagination">Showing page 1</p>
            </main>"#,
        )
    }

    #[test]
    fn test_render_replaces_inner_content() {
        let mut doc = live();
        let payload = SectionPayload::from_html(
            r#"<div id="ProductGridContainer"><ul id="product-grid"><li>new</li></ul></div>
               <div id="ProductCount">1 product</div>"#,
        );
        let report = PartialRenderer::new()
            .render(
                &mut doc,
                &payload,
                &[
                    SectionDescriptor::new("ProductGridContainer", "main"),
                    SectionDescriptor::new("ProductCount", "main"),
                ],
            )
            .unwrap();

        assert!(report.is_complete());
        let grid = doc.get_element_by_id("product-grid").unwrap();
        assert_eq!(doc.inner_html(grid), "<li>new</li>");
        let count = doc.get_element_by_id("ProductCount").unwrap();
        assert_eq!(doc.text_content(count), "1 product");
    }

    #[test]
    fn test_render_reports_missing_and_leaves_target() {
        let mut doc = live();
        let payload = SectionPayload::from_html("<div>no grid here</div>");
        let report = PartialRenderer::new()
            .render(
                &mut doc,
                &payload,
                &[SectionDescriptor::new("ProductGridContainer", "main")],
            )
            .unwrap();

        assert!(report.is_missing("ProductGridContainer"));
        let grid = doc.get_element_by_id("product-grid").unwrap();
        assert_eq!(doc.inner_html(grid), "<li>old</li>");
    }

    #[test]
    fn test_remove_stale_removes_dependents() {
        let mut doc = live();
        let removed = PartialRenderer::new().remove_stale(&mut doc, "Pagination");
        assert_eq!(removed, 2);
        assert!(doc.get_element_by_id("Pagination").is_none());
        assert!(doc.select(doc.root(), "[data-only-with]").unwrap().is_empty());
    }

    #[test]
    fn test_render_is_idempotent() {
        let payload = SectionPayload::from_html(
            r#"<div id="ProductGridContainer"><ul id="product-grid"><li>a</li></ul></div>"#,
        );
        let descriptors = [SectionDescriptor::new("ProductGridContainer", "main")];
        let mut doc = live();
        let renderer = PartialRenderer::new();

        renderer.render(&mut doc, &payload, &descriptors).unwrap();
        let first = doc.outer_html(doc.root());
        renderer.render(&mut doc, &payload, &descriptors).unwrap();
        assert_eq!(doc.outer_html(doc.root()), first);
    }
}

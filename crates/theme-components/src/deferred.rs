//! Lazy images and deferred media.
//!
//! `img[data-src]` loads by moving `data-src` into `src`. A
//! `deferred-media` element loads by appending a copy of its `<template>`
//! content. Loaded elements carry `data-loaded` so repeated scans after a
//! section swap never load twice.

use std::cell::RefCell;

use theme_core::selectors::{ATTR_LOADED, DEFERRED_MEDIA, LAZY_IMAGE};
use theme_dom::{Document, DomError, NodeId, Selector};

/// Loads registered media when it becomes visible.
#[derive(Debug)]
pub struct DeferredLoader {
    eager: bool,
    pending: RefCell<Vec<NodeId>>,
}

impl DeferredLoader {
    /// Create a loader. Without intersection observation everything found
    /// by `scan` loads immediately.
    pub fn new(intersection_observer: bool) -> Self {
        Self {
            eager: !intersection_observer,
            pending: RefCell::new(Vec::new()),
        }
    }

    /// Register every unloaded media element under `root`. Returns the
    /// number of elements registered (or loaded, in eager mode).
    pub fn scan(&self, doc: &mut Document, root: NodeId) -> Result<usize, DomError> {
        let selector = Selector::parse(&format!("{}, {}", LAZY_IMAGE, DEFERRED_MEDIA))?;
        let found: Vec<NodeId> = doc
            .query_selector_all(root, &selector)
            .into_iter()
            .filter(|n| !doc.has_attr(*n, ATTR_LOADED))
            .collect();

        if self.eager {
            return Ok(found.into_iter().filter(|n| load_media(doc, *n)).count());
        }

        let mut pending = self.pending.borrow_mut();
        pending.retain(|n| doc.is_attached(*n));
        let mut added = 0;
        for node in found {
            if !pending.contains(&node) {
                pending.push(node);
                added += 1;
            }
        }
        Ok(added)
    }

    /// Load the registered elements that entered the viewport.
    pub fn on_intersection(&self, doc: &mut Document, visible: &[NodeId]) -> usize {
        let ready: Vec<NodeId> = {
            let mut pending = self.pending.borrow_mut();
            let (ready, rest): (Vec<NodeId>, Vec<NodeId>) =
                pending.drain(..).partition(|n| visible.contains(n));
            *pending = rest;
            ready
        };
        ready.into_iter().filter(|n| load_media(doc, *n)).count()
    }

    /// Load the registered elements currently inside the viewport.
    pub fn load_visible(&self, doc: &mut Document) -> usize {
        let visible: Vec<NodeId> = self
            .pending
            .borrow()
            .iter()
            .copied()
            .filter(|n| doc.is_in_viewport(*n))
            .collect();
        self.on_intersection(doc, &visible)
    }

    /// Load one element explicitly (e.g. a play button on deferred media).
    pub fn load(&self, doc: &mut Document, node: NodeId) -> bool {
        self.pending.borrow_mut().retain(|n| *n != node);
        load_media(doc, node)
    }

    /// Elements waiting to load.
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }
}

fn load_media(doc: &mut Document, node: NodeId) -> bool {
    if !doc.is_attached(node) || doc.has_attr(node, ATTR_LOADED) {
        return false;
    }

    match doc.tag(node) {
        Some("img") => {
            let Some(src) = doc.attr(node, "data-src").map(String::from) else {
                return false;
            };
            doc.set_attr(node, "src", src);
            doc.remove_attr(node, "data-src");
        }
        Some(DEFERRED_MEDIA) => {
            let template = doc
                .element_children(node)
                .into_iter()
                .find(|c| doc.tag(*c) == Some("template"));
            let Some(template) = template else {
                return false;
            };
            for child in doc.children(template).to_vec() {
                let copy = doc.clone_node(child);
                doc.append_child(node, copy);
            }
        }
        _ => return false,
    }

    doc.set_attr(node, ATTR_LOADED, "true");
    tracing::trace!(node = %node, "media loaded");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use theme_dom::Rect;

    const PAGE: &str = r#"<main>
        <img id="a" data-src="/a.jpg">
        <img id="b" data-src="/b.jpg">
        <deferred-media id="m"><template><video src="/v.mp4"></video></template></deferred-media>
    </main>"#;

    #[test]
    fn test_eager_mode_loads_on_scan() {
        let mut doc = Document::parse(PAGE);
        let root = doc.root();
        let loader = DeferredLoader::new(false);
        assert_eq!(loader.scan(&mut doc, root).unwrap(), 3);

        let a = doc.get_element_by_id("a").unwrap();
        assert_eq!(doc.attr(a, "src"), Some("/a.jpg"));
        let m = doc.get_element_by_id("m").unwrap();
        assert_eq!(doc.select(m, "video").unwrap().len(), 2);
        assert_eq!(loader.scan(&mut doc, root).unwrap(), 0);
    }

    #[test]
    fn test_observed_mode_waits_for_intersection() {
        let mut doc = Document::parse(PAGE);
        let root = doc.root();
        let loader = DeferredLoader::new(true);
        assert_eq!(loader.scan(&mut doc, root).unwrap(), 3);
        assert_eq!(loader.scan(&mut doc, root).unwrap(), 0);

        let a = doc.get_element_by_id("a").unwrap();
        doc.set_viewport_height(600.0);
        doc.set_rect(a, Rect::new(100.0, 50.0));
        assert_eq!(loader.load_visible(&mut doc), 1);
        assert_eq!(doc.attr(a, "src"), Some("/a.jpg"));
        assert_eq!(loader.pending_count(), 2);

        let m = doc.get_element_by_id("m").unwrap();
        assert!(loader.load(&mut doc, m));
        assert!(!loader.load(&mut doc, m));
    }
}

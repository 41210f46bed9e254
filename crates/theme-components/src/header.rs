//! Sticky header that hides while scrolling down.

use std::cell::Cell;

use theme_core::selectors::{HEADER_HIDDEN_CLASS, HEADER_ID, HEADER_STICKY_CLASS};

use crate::context::SharedDocument;

/// Tracks scroll direction and toggles the header's hidden state.
#[derive(Debug)]
pub struct StickyHeader {
    doc: SharedDocument,
    last_scroll: Cell<f64>,
    height: Cell<f64>,
    hidden: Cell<bool>,
}

impl StickyHeader {
    pub fn new(doc: SharedDocument) -> Self {
        let header = Self {
            doc,
            last_scroll: Cell::new(0.0),
            height: Cell::new(0.0),
            hidden: Cell::new(false),
        };
        header.measure();
        header
    }

    /// Re-read the header height from layout.
    pub fn measure(&self) {
        let doc = self.doc.borrow();
        let height = doc
            .get_element_by_id(HEADER_ID)
            .and_then(|h| doc.rect(h))
            .map(|r| r.height)
            .unwrap_or(0.0);
        self.height.set(height);
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden.get()
    }

    /// Space the header covers at the top of the viewport. Zero while
    /// hidden.
    pub fn offset(&self) -> f64 {
        if self.hidden.get() {
            0.0
        } else {
            self.height.get()
        }
    }

    /// Apply a new scroll position. Returns true when visibility changed.
    pub fn on_scroll(&self, scroll_y: f64) -> bool {
        let mut doc = self.doc.borrow_mut();
        let Some(header) = doc.get_element_by_id(HEADER_ID) else {
            return false;
        };

        let last = self.last_scroll.replace(scroll_y);
        let was_hidden = self.hidden.get();
        let hidden = if scroll_y > last && scroll_y > self.height.get() {
            true
        } else if scroll_y < last {
            false
        } else {
            was_hidden
        };

        doc.toggle_class(header, HEADER_STICKY_CLASS, scroll_y > 0.0);
        doc.toggle_class(header, HEADER_HIDDEN_CLASS, hidden);
        self.hidden.set(hidden);
        hidden != was_hidden
    }

    /// Force the header visible (e.g. when a drawer opens).
    pub fn reveal(&self) {
        if !self.hidden.replace(false) {
            return;
        }
        let mut doc = self.doc.borrow_mut();
        if let Some(header) = doc.get_element_by_id(HEADER_ID) {
            doc.remove_class(header, HEADER_HIDDEN_CLASS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::share;
    use theme_dom::{Document, Rect};

    fn header() -> (SharedDocument, StickyHeader) {
        let mut doc = Document::parse(r#"<header id="SiteHeader"></header><main></main>"#);
        let h = doc.get_element_by_id("SiteHeader").unwrap();
        doc.set_rect(h, Rect::new(0.0, 80.0));
        let doc = share(doc);
        let header = StickyHeader::new(doc.clone());
        (doc, header)
    }

    #[test]
    fn test_hides_on_scroll_down_and_reveals_on_scroll_up() {
        let (doc, header) = header();
        assert!(!header.on_scroll(40.0));
        assert_eq!(header.offset(), 80.0);

        assert!(header.on_scroll(300.0));
        assert!(header.is_hidden());
        assert_eq!(header.offset(), 0.0);
        {
            let doc = doc.borrow();
            let h = doc.get_element_by_id("SiteHeader").unwrap();
            assert!(doc.has_class(h, "header--hidden"));
            assert!(doc.has_class(h, "header--sticky"));
        }

        assert!(header.on_scroll(250.0));
        assert!(!header.is_hidden());
    }
}

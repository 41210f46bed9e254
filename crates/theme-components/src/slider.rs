//! Scroll-snap carousel: page tracking, counter and button state.

use std::cell::{Cell, RefCell};

use theme_core::selectors::{ATTR_PER_VIEW, SLIDE, SLIDER_COUNTER, SLIDER_NEXT, SLIDER_PREV};
use theme_dom::{Document, DomError, NodeId};

use crate::context::{SharedDocument, ThemeContext};
use crate::lifecycle::{Bindings, Component, DomEvent, EventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlideAction {
    Prev,
    Next,
}

/// A horizontally scrolling list of `[data-slide]` elements.
///
/// Pages are 1-based. With `per_view` slides visible at once there are
/// `slides - per_view + 1` pages.
pub struct Slider {
    doc: SharedDocument,
    root: NodeId,
    separator: String,
    slides: Cell<usize>,
    per_view: Cell<usize>,
    current: Cell<usize>,
    bindings: RefCell<Bindings<SlideAction>>,
}

impl Slider {
    pub fn new(ctx: &ThemeContext, doc: SharedDocument, root: NodeId) -> Result<Self, DomError> {
        let slider = Self {
            doc,
            root,
            separator: ctx.config.strings().slide_counter_separator.clone(),
            slides: Cell::new(0),
            per_view: Cell::new(1),
            current: Cell::new(1),
            bindings: RefCell::new(Bindings::new()),
        };
        slider.init_pages()?;
        slider.setup(&slider.doc.borrow());
        Ok(slider)
    }

    /// Recount slides, e.g. after the slider's content was re-rendered.
    pub fn init_pages(&self) -> Result<(), DomError> {
        {
            let doc = self.doc.borrow();
            self.slides.set(doc.select(self.root, SLIDE)?.len());
            let per_view = doc
                .attr(self.root, ATTR_PER_VIEW)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(1);
            self.per_view.set(per_view);
        }
        self.current.set(self.current.get().clamp(1, self.total_pages()));
        self.update()
    }

    pub fn slide_count(&self) -> usize {
        self.slides.get()
    }

    pub fn total_pages(&self) -> usize {
        (self.slides.get() + 1).saturating_sub(self.per_view.get()).max(1)
    }

    pub fn current_page(&self) -> usize {
        self.current.get()
    }

    /// Derive the current page from the scroll offset of the slide list.
    pub fn on_scroll(&self, scroll_left: f64, slide_width: f64) -> Result<usize, DomError> {
        if slide_width > 0.0 && scroll_left.is_finite() {
            let index = (scroll_left.max(0.0) / slide_width).round() as usize;
            self.current.set((index + 1).min(self.total_pages()));
        }
        self.update()?;
        Ok(self.current.get())
    }

    pub fn next(&self) -> Result<usize, DomError> {
        self.go_to(self.current.get() + 1)
    }

    pub fn prev(&self) -> Result<usize, DomError> {
        self.go_to(self.current.get().saturating_sub(1))
    }

    fn go_to(&self, page: usize) -> Result<usize, DomError> {
        self.current.set(page.clamp(1, self.total_pages()));
        self.update()?;
        Ok(self.current.get())
    }

    pub fn counter_text(&self) -> String {
        format!("{} {} {}", self.current.get(), self.separator, self.total_pages())
    }

    fn update(&self) -> Result<(), DomError> {
        let mut doc = self.doc.borrow_mut();
        let current = self.current.get();
        let total = self.total_pages();

        for counter in doc.select(self.root, SLIDER_COUNTER)? {
            doc.clear_children(counter);
            let text = doc.create_text(self.counter_text());
            doc.append_child(counter, text);
        }
        for (selector, disabled) in [(SLIDER_PREV, current <= 1), (SLIDER_NEXT, current >= total)] {
            for button in doc.select(self.root, selector)? {
                if disabled {
                    doc.set_attr(button, "disabled", "");
                } else {
                    doc.remove_attr(button, "disabled");
                }
            }
        }
        Ok(())
    }

    pub fn handle(&self, event: &DomEvent) -> bool {
        let action = {
            let doc = self.doc.borrow();
            self.bindings.borrow().dispatch(&doc, event)
        };
        let result = match action {
            Some(SlideAction::Prev) => self.prev(),
            Some(SlideAction::Next) => self.next(),
            None => return false,
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "slider update failed");
        }
        true
    }
}

impl Component for Slider {
    fn name(&self) -> &'static str {
        "slider"
    }

    fn setup(&self, doc: &Document) {
        if !doc.is_attached(self.root) {
            return;
        }
        let mut bindings = self.bindings.borrow_mut();
        for (selector, action) in [(SLIDER_PREV, SlideAction::Prev), (SLIDER_NEXT, SlideAction::Next)] {
            if let Ok(buttons) = doc.select(self.root, selector) {
                for button in buttons {
                    bindings.bind(button, EventKind::Click, action);
                }
            }
        }
    }

    fn teardown(&self) {
        self.bindings.borrow_mut().clear();
    }

    fn binding_count(&self) -> usize {
        self.bindings.borrow().len()
    }

    fn stale_binding_count(&self, doc: &Document) -> usize {
        self.bindings.borrow().stale_count(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::context::share;
    use theme_core::{ThemeConfig, ThemeSettings};
    use theme_fetch::ReplayFetcher;

    fn slider(per_view: usize, slides: usize) -> (SharedDocument, Slider) {
        let items: String = (0..slides).map(|i| format!("<li data-slide>{i}</li>")).collect();
        let doc = share(Document::parse(&format!(
            r#"<slider-component id="s" data-per-view="{per_view}">
                <ul>{items}</ul>
                <button data-slider-prev>Prev</button>
                <span data-slider-counter></span>
                <button data-slider-next>Next</button>
            </slider-component>"#
        )));
        let ctx = ThemeContext::new(
            ThemeConfig::new(ThemeSettings::default(), 1200),
            Rc::new(ReplayFetcher::new()),
        );
        let root = doc.borrow().get_element_by_id("s").unwrap();
        let slider = Slider::new(&ctx, doc.clone(), root).unwrap();
        (doc, slider)
    }

    fn counter(doc: &SharedDocument) -> String {
        let d = doc.borrow();
        let root = d.root();
        let node = d.select_first(root, "[data-slider-counter]").unwrap().unwrap();
        d.text_content(node)
    }

    #[test]
    fn test_pages_account_for_slides_per_view() {
        let (doc, slider) = slider(3, 5);
        assert_eq!(slider.slide_count(), 5);
        assert_eq!(slider.total_pages(), 3);
        assert_eq!(counter(&doc), "1 of 3");

        assert_eq!(slider.on_scroll(410.0, 200.0).unwrap(), 3);
        assert_eq!(counter(&doc), "3 of 3");
        assert_eq!(slider.next().unwrap(), 3);
    }

    #[test]
    fn test_buttons_disable_at_the_ends() {
        let (doc, slider) = slider(1, 2);
        let (prev, next) = {
            let d = doc.borrow();
            let root = d.root();
            (
                d.select_first(root, "[data-slider-prev]").unwrap().unwrap(),
                d.select_first(root, "[data-slider-next]").unwrap().unwrap(),
            )
        };
        assert!(doc.borrow().has_attr(prev, "disabled"));
        assert!(!doc.borrow().has_attr(next, "disabled"));

        assert!(slider.handle(&DomEvent::click(next)));
        assert_eq!(slider.current_page(), 2);
        assert!(!doc.borrow().has_attr(prev, "disabled"));
        assert!(doc.borrow().has_attr(next, "disabled"));
    }

    #[test]
    fn test_more_per_view_than_slides_is_one_page() {
        let (_doc, slider) = slider(4, 2);
        assert_eq!(slider.total_pages(), 1);
        assert_eq!(slider.counter_text(), "1 of 1");
    }
}

//! Load-more and infinite-scroll pagination.
//!
//! New result items are appended after the last existing item, never
//! swapped in. The pagination element is refreshed from each response;
//! once a response stops advertising more results the element and every
//! `[data-pagination-only]` companion are removed and the controller
//! becomes exhausted for good.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use theme_core::selectors::{
    ATTR_MORE_RESULTS, ATTR_NEXT_URL, LOAD_MORE, PAGINATION_ID, PAGINATION_ONLY, PRODUCT_GRID_ID,
    RESULT_ITEM,
};
use theme_core::{ThemeError, ThemeEvent};
use theme_dom::{Document, NodeId, Selector};
use theme_fetch::{OperationKey, RequestCoordinator};
use theme_observability::ComponentLogger;
use theme_render::{PartialRenderer, SectionDescriptor, SectionPayload, SectionRequest};
use tokio::sync::watch;

use crate::context::{SharedDocument, ThemeContext};
use crate::deferred::DeferredLoader;
use crate::lifecycle::{Bindings, Component, DomEvent, EventKind};

const OPERATION: OperationKey = "pagination";

/// Shared flag that suspends loading while another component is busy.
///
/// Pauses nest: loading resumes once every `PauseGuard` is dropped.
#[derive(Debug, Clone, Default)]
pub struct PauseHandle {
    depth: Rc<Cell<u32>>,
}

impl PauseHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pause until the returned guard is dropped.
    pub fn pause(&self) -> PauseGuard {
        self.depth.set(self.depth.get() + 1);
        PauseGuard {
            depth: Rc::clone(&self.depth),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.depth.get() > 0
    }
}

/// Resumes pagination on drop.
#[derive(Debug)]
#[must_use = "pagination resumes as soon as the guard is dropped"]
pub struct PauseGuard {
    depth: Rc<Cell<u32>>,
}

impl Drop for PauseGuard {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

/// Pagination state. `Exhausted` is terminal until the listing is
/// replaced wholesale (see `reset`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationState {
    Idle,
    Loading,
    Exhausted,
}

/// Result of `load_more`.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Nothing was fetched: exhausted, already loading, or paused.
    Skipped,
    /// Items were appended. `exhausted` is set when this was the last page.
    Appended { count: usize, exhausted: bool },
    /// There was nothing left to load.
    Exhausted,
    /// The fetch was cancelled.
    Cancelled,
    /// The fetch failed; the listing is unchanged.
    Failed(ThemeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaginationAction {
    LoadMore,
    ResultClick,
}

/// Appends further result pages to the product grid.
pub struct PaginationController {
    ctx: ThemeContext,
    doc: SharedDocument,
    coordinator: RequestCoordinator,
    renderer: PartialRenderer,
    deferred: Rc<DeferredLoader>,
    section_id: String,
    state: Cell<PaginationState>,
    pause: PauseHandle,
    bindings: RefCell<Bindings<PaginationAction>>,
    logger: ComponentLogger,
}

impl PaginationController {
    /// Create a controller for the grid rendered by `section_id`.
    pub fn new(
        ctx: ThemeContext,
        doc: SharedDocument,
        section_id: impl Into<String>,
        deferred: Rc<DeferredLoader>,
    ) -> Self {
        let logger = ctx.logger("pagination");
        let controller = Self {
            ctx,
            doc,
            coordinator: RequestCoordinator::new(),
            renderer: PartialRenderer::new(),
            deferred,
            section_id: section_id.into(),
            state: Cell::new(PaginationState::Idle),
            pause: PauseHandle::new(),
            bindings: RefCell::new(Bindings::new()),
            logger,
        };
        controller.setup(&controller.doc.borrow());
        controller
    }

    pub fn state(&self) -> PaginationState {
        self.state.get()
    }

    pub fn is_exhausted(&self) -> bool {
        self.state.get() == PaginationState::Exhausted
    }

    /// Handle other components use to pause loading.
    pub fn pause_handle(&self) -> PauseHandle {
        self.pause.clone()
    }

    /// Fetch the next page and append its results.
    pub async fn load_more(&self) -> LoadOutcome {
        if self.state.get() != PaginationState::Idle || self.pause.is_paused() {
            return LoadOutcome::Skipped;
        }

        let next = {
            let doc = self.doc.borrow();
            doc.get_element_by_id(PAGINATION_ID)
                .and_then(|p| doc.attr(p, ATTR_NEXT_URL))
                .map(String::from)
        };
        let Some(next) = next else {
            let mut doc = self.doc.borrow_mut();
            return match self.exhaust(&mut doc) {
                Ok(_) => LoadOutcome::Exhausted,
                Err(e) => LoadOutcome::Failed(e),
            };
        };

        let url = SectionRequest::new(&next).section_id(&self.section_id);
        let session = self.coordinator.start_operation(OPERATION, url);
        self.state.set(PaginationState::Loading);

        let result = session.fetch_text(self.ctx.fetcher.as_ref()).await;
        self.coordinator.end_operation(OPERATION, &session);

        let outcome = match result {
            Ok(body) if session.is_current() => match self.append_page(&body) {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.logger.warn_with("could not append page", &[("error", &e)]);
                    LoadOutcome::Failed(e)
                }
            },
            Ok(_) => LoadOutcome::Cancelled,
            Err(e) if e.is_cancellation() => {
                self.logger.debug_with("page load cancelled", &[("url", &session.url())]);
                LoadOutcome::Cancelled
            }
            Err(e) => {
                self.logger.warn_with("page load failed", &[("url", &session.url()), ("error", &e)]);
                LoadOutcome::Failed(e)
            }
        };

        if self.state.get() == PaginationState::Loading {
            self.state.set(PaginationState::Idle);
        }
        if let LoadOutcome::Appended { count, .. } = outcome {
            self.ctx.bus.publish(ThemeEvent::ResultsAppended { count });
        }
        outcome
    }

    fn append_page(&self, body: &str) -> Result<LoadOutcome, ThemeError> {
        let payload = SectionPayload::parse(body)?;
        let mut doc = self.doc.borrow_mut();

        let grid = SectionDescriptor::new(PRODUCT_GRID_ID, self.section_id.as_str());
        let Some((source_doc, source_grid)) = payload.find(&grid)? else {
            self.exhaust(&mut doc)?;
            return Ok(LoadOutcome::Exhausted);
        };
        let live_grid = doc
            .get_element_by_id(PRODUCT_GRID_ID)
            .ok_or_else(|| ThemeError::MissingSection(PRODUCT_GRID_ID.to_string()))?;

        let item = Selector::parse(RESULT_ITEM)?;
        let mut anchor = doc.query_selector_all(live_grid, &item).last().copied();
        let mut appended: Vec<NodeId> = Vec::new();
        for source in source_doc.query_selector_all(source_grid, &item) {
            let copy = doc.import_node(source_doc, source);
            match anchor {
                Some(last) => doc.insert_after(last, copy),
                None => doc.append_child(live_grid, copy),
            }
            anchor = Some(copy);
            appended.push(copy);
        }

        let next = payload
            .select_first(&format!("#{}", PAGINATION_ID))?
            .filter(|(d, n)| d.has_attr(*n, ATTR_MORE_RESULTS));
        let live_pagination = doc.get_element_by_id(PAGINATION_ID);
        let exhausted = match (next, live_pagination) {
            (Some((source_doc, source)), Some(live)) => {
                doc.copy_attributes_from(live, source_doc, source);
                doc.import_children(live, source_doc, source);
                false
            }
            _ => {
                self.exhaust(&mut doc)?;
                true
            }
        };

        for node in &appended {
            self.deferred.scan(&mut doc, *node)?;
        }
        self.rebind(&doc);

        self.logger
            .debug_builder("page appended")
            .field_u64("count", appended.len() as u64)
            .field_bool("exhausted", exhausted)
            .emit();
        Ok(LoadOutcome::Appended {
            count: appended.len(),
            exhausted,
        })
    }

    fn exhaust(&self, doc: &mut Document) -> Result<usize, ThemeError> {
        self.state.set(PaginationState::Exhausted);
        let mut removed = self.renderer.remove_stale(doc, PAGINATION_ID);
        let root = doc.root();
        for node in doc.select(root, PAGINATION_ONLY)? {
            doc.remove(node);
            removed += 1;
        }
        self.teardown();
        self.logger.debug("pagination exhausted");
        Ok(removed)
    }

    /// Abort an in-flight page load, e.g. because the shopper clicked a
    /// result and is navigating away.
    pub fn on_result_click(&self) -> bool {
        let cancelled = self.coordinator.cancel(OPERATION);
        if cancelled {
            self.logger.debug("page load aborted by result click");
        }
        cancelled
    }

    /// Forget everything after the listing was replaced by a filter change.
    pub fn reset(&self) {
        self.coordinator.cancel(OPERATION);
        self.state.set(PaginationState::Idle);
        self.rebind(&self.doc.borrow());
    }

    /// Load whenever the load-more element is visible, checking on a fixed
    /// interval. Ends when exhausted or when `visibility` closes. Returns
    /// the number of pages appended.
    pub async fn run_auto_load(&self, mut visibility: watch::Receiver<bool>) -> usize {
        if !self.ctx.config.capabilities().intersection_observer {
            return 0;
        }
        let period = self.ctx.config.timings().infinite_scroll_interval();
        let mut pages = 0;

        loop {
            if self.is_exhausted() || visibility.has_changed().is_err() {
                break;
            }
            let visible = *visibility.borrow_and_update();
            if visible && matches!(self.load_more().await, LoadOutcome::Appended { .. }) {
                pages += 1;
            }
            if period.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(period).await;
            }
        }
        pages
    }

    /// Route a DOM event to this controller.
    pub async fn handle(&self, event: &DomEvent) -> bool {
        let action = {
            let doc = self.doc.borrow();
            self.bindings.borrow().dispatch(&doc, event)
        };
        match action {
            Some(PaginationAction::LoadMore) => {
                self.load_more().await;
                true
            }
            Some(PaginationAction::ResultClick) => {
                self.on_result_click();
                true
            }
            None => false,
        }
    }
}

impl Component for PaginationController {
    fn name(&self) -> &'static str {
        "pagination"
    }

    fn setup(&self, doc: &Document) {
        let mut bindings = self.bindings.borrow_mut();
        if self.is_exhausted() {
            return;
        }
        if let Some(grid) = doc.get_element_by_id(PRODUCT_GRID_ID) {
            bindings.bind(grid, EventKind::Click, PaginationAction::ResultClick);
        }
        if let Some(pagination) = doc.get_element_by_id(PAGINATION_ID) {
            if let Ok(buttons) = doc.select(pagination, LOAD_MORE) {
                for button in buttons {
                    bindings.bind(button, EventKind::Click, PaginationAction::LoadMore);
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

    #[test]
    fn test_pause_guards_nest() {
        let handle = PauseHandle::new();
        let outer = handle.pause();
        let inner = handle.clone().pause();
        drop(outer);
        assert!(handle.is_paused());
        drop(inner);
        assert!(!handle.is_paused());
    }
}

//! Facet filtering and sorting.
//!
//! Every filter or sort change serializes the facets form, fetches the
//! grid section for the new parameters and swaps the facets form, the
//! results container and the product count in place. Each change starts a
//! new `"facets"` session, so a burst of changes results in exactly one
//! applied response: the last one.
//!
//! UI state the server cannot know about is carried across the swap:
//! which filter groups the shopper expanded, the grid's layout class,
//! keyboard focus and the scroll position.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use theme_core::selectors::{
    ATTR_OPEN, ATTR_SECTION_ID, FACETS_FORM_ID, FACET_CLEAR_ALL, FACET_GROUP, FACET_GROUP_SUMMARY,
    FACET_REMOVE, LOADING_CLASS, PRODUCT_COUNT_ID, PRODUCT_GRID_ID, RESULTS_CONTAINER_ID,
    SORT_PARAM, SORT_SECONDARY_ID,
};
use theme_core::{join_path_query, SearchParams, ThemeError, ThemeEvent};
use theme_dom::{Document, DomError, NodeId, Selector};
use theme_fetch::{OperationKey, RequestCoordinator};
use theme_observability::ComponentLogger;
use theme_render::{
    PartialRenderer, RenderReport, SectionDescriptor, SectionPayload, SectionRequest,
};

use crate::context::{SharedDocument, ThemeContext};
use crate::deferred::DeferredLoader;
use crate::header::StickyHeader;
use crate::history::{BrowserHistory, HistoryState};
use crate::lifecycle::{Bindings, Component, DomEvent, EventKind};
use crate::pagination::PauseHandle;

const OPERATION: OperationKey = "facets";

/// Ids of filter groups the shopper expanded, in the order found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiExpansionState {
    ids: Vec<String>,
}

impl UiExpansionState {
    /// Read the expanded groups from the live facets form.
    pub fn capture(doc: &Document) -> Result<Self, DomError> {
        let mut state = Self::default();
        let Some(form) = doc.get_element_by_id(FACETS_FORM_ID) else {
            return Ok(state);
        };
        for group in doc.select(form, FACET_GROUP)? {
            if doc.has_attr(group, ATTR_OPEN) {
                if let Some(id) = doc.id_of(group) {
                    state.insert(id);
                }
            }
        }
        Ok(state)
    }

    /// Expand every recorded group present in the live form. Returns the
    /// number of groups expanded.
    pub fn apply(&self, doc: &mut Document) -> usize {
        let mut applied = 0;
        for id in &self.ids {
            if let Some(group) = doc.get_element_by_id(id) {
                doc.set_attr(group, ATTR_OPEN, "");
                applied += 1;
            }
        }
        applied
    }

    /// Record `id` as expanded. Already-recorded ids keep their place.
    pub fn insert(&mut self, id: &str) {
        if !self.contains(id) {
            self.ids.push(id.to_string());
        }
    }

    /// Forget `id`; a no-op when it was never recorded.
    pub fn remove(&mut self, id: &str) {
        self.ids.retain(|i| i != id);
    }

    /// Whether the group `id` is recorded as expanded.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    /// Expanded group ids, oldest first.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

/// Whether a filter request is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    Idle,
    Submitting,
}

/// Result of one filter application.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    /// The new results are in the DOM.
    Applied,
    /// Superseded by a newer change; nothing was touched.
    Cancelled,
    /// The request failed; the DOM is unchanged.
    Failed(ThemeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FacetAction {
    Change,
    Navigate(String),
    Toggle(String),
}

/// Drives the facets form and the results it controls.
pub struct FacetFilterController {
    ctx: ThemeContext,
    doc: SharedDocument,
    history: Rc<dyn BrowserHistory>,
    coordinator: RequestCoordinator,
    renderer: PartialRenderer,
    deferred: Rc<DeferredLoader>,
    path: String,
    section_id: String,
    initial: SearchParams,
    expansion: RefCell<UiExpansionState>,
    state: Cell<FilterState>,
    pause: Option<PauseHandle>,
    header: Option<Rc<StickyHeader>>,
    bindings: RefCell<Bindings<FacetAction>>,
    logger: ComponentLogger,
}

impl FacetFilterController {
    /// Create a controller for the page currently shown by `history`.
    ///
    /// Requires the facets form and a results container carrying
    /// `data-section-id`.
    pub fn new(
        ctx: ThemeContext,
        doc: SharedDocument,
        history: Rc<dyn BrowserHistory>,
        deferred: Rc<DeferredLoader>,
    ) -> Result<Self, ThemeError> {
        let (section_id, expansion) = {
            let doc = doc.borrow();
            doc.require_by_id(FACETS_FORM_ID)?;
            let container = doc.require_by_id(RESULTS_CONTAINER_ID)?;
            let section_id = doc
                .attr(container, ATTR_SECTION_ID)
                .map(String::from)
                .ok_or_else(|| {
                    ThemeError::Config(format!("#{} has no {}", RESULTS_CONTAINER_ID, ATTR_SECTION_ID))
                })?;
            (section_id, UiExpansionState::capture(&doc)?)
        };

        let current = history.current_url();
        let (path, query) = current.split_once('?').unwrap_or((current.as_str(), ""));

        let controller = Self {
            logger: ctx.logger("facets"),
            ctx,
            history,
            coordinator: RequestCoordinator::new(),
            renderer: PartialRenderer::new(),
            deferred,
            path: path.to_string(),
            section_id,
            initial: SearchParams::parse(query),
            expansion: RefCell::new(expansion),
            state: Cell::new(FilterState::Idle),
            pause: None,
            header: None,
            bindings: RefCell::new(Bindings::new()),
            doc,
        };
        controller.setup(&controller.doc.borrow());
        Ok(controller)
    }

    /// Pause `pagination` while a filter request runs.
    pub fn with_pause(mut self, pause: PauseHandle) -> Self {
        self.pause = Some(pause);
        self
    }

    /// Account for `header` when restoring the scroll position.
    pub fn with_header(mut self, header: Rc<StickyHeader>) -> Self {
        self.header = Some(header);
        self
    }

    pub fn state(&self) -> FilterState {
        self.state.get()
    }

    pub fn section_id(&self) -> &str {
        &self.section_id
    }

    pub fn expansion(&self) -> UiExpansionState {
        self.expansion.borrow().clone()
    }

    /// Parameters the live form currently describes, with the secondary
    /// sort control folded in and empty values stripped.
    pub fn form_params(&self) -> SearchParams {
        let doc = self.doc.borrow();
        let Some(form) = doc.get_element_by_id(FACETS_FORM_ID) else {
            return SearchParams::new();
        };
        let mut params = SearchParams::from_pairs(doc.form_entries(form)).strip_empty();
        let sort = doc
            .get_element_by_id(SORT_SECONDARY_ID)
            .and_then(|s| doc.control_value(s))
            .filter(|v| !v.trim().is_empty());
        if let Some(sort) = sort {
            params.set(SORT_PARAM, sort);
        }
        params
    }

    /// React to a change of any control in the facets form.
    pub async fn handle_filter_change(&self, trigger: Option<NodeId>) -> FilterOutcome {
        let trigger_id = {
            let doc = self.doc.borrow();
            trigger.and_then(|t| doc.id_of(t)).map(String::from)
        };
        let params = self.form_params();
        self.apply_filters(params, trigger_id.as_deref(), true).await
    }

    /// Fetch and render results for `params`.
    ///
    /// `trigger_id` names the control to refocus after the swap. History
    /// is only pushed when `update_history` is set, so replaying a popped
    /// entry never pushes a new one.
    pub async fn apply_filters(
        &self,
        params: SearchParams,
        trigger_id: Option<&str>,
        update_history: bool,
    ) -> FilterOutcome {
        let params = params.strip_empty();
        let url = SectionRequest::new(&self.path)
            .with_params(&params)
            .section_id(&self.section_id);
        let session = self.coordinator.start_operation(OPERATION, url);
        self.state.set(FilterState::Submitting);
        self.set_loading(true);
        let pause = self.pause.as_ref().map(PauseHandle::pause);

        let result = session.fetch_text(self.ctx.fetcher.as_ref()).await;
        self.coordinator.end_operation(OPERATION, &session);

        let outcome = match result {
            Ok(body) if session.is_current() => match self.render_results(&body, trigger_id) {
                Ok(()) => FilterOutcome::Applied,
                Err(e) => {
                    self.logger.warn_with("could not render filter results", &[("error", &e)]);
                    FilterOutcome::Failed(e)
                }
            },
            Ok(_) => FilterOutcome::Cancelled,
            Err(e) if e.is_cancellation() => {
                self.logger.debug_with("superseded", &[("url", &session.url())]);
                FilterOutcome::Cancelled
            }
            Err(e) => {
                self.logger.warn_with(
                    self.ctx.config.strings().filter_error.as_str(),
                    &[("url", &session.url()), ("error", &e)],
                );
                FilterOutcome::Failed(e)
            }
        };

        drop(pause);
        if !self.coordinator.is_active(OPERATION) {
            self.set_loading(false);
            self.state.set(FilterState::Idle);
        }

        if outcome == FilterOutcome::Applied {
            if update_history {
                self.update_url(&params);
            }
            self.ctx.bus.publish(ThemeEvent::FiltersUpdated {
                search_params: params.to_query_string(),
            });
        }
        outcome
    }

    fn descriptors(&self) -> [SectionDescriptor; 3] {
        [
            SectionDescriptor::new(FACETS_FORM_ID, self.section_id.as_str()),
            SectionDescriptor::new(RESULTS_CONTAINER_ID, self.section_id.as_str()),
            SectionDescriptor::new(PRODUCT_COUNT_ID, self.section_id.as_str()),
        ]
    }

    fn render_results(&self, body: &str, trigger_id: Option<&str>) -> Result<(), ThemeError> {
        let payload = SectionPayload::parse(body)?;
        let descriptors = self.descriptors();
        if payload.find(&descriptors[1])?.is_none() {
            return Err(ThemeError::MissingSection(RESULTS_CONTAINER_ID.to_string()));
        }

        let mut doc = self.doc.borrow_mut();
        let expansion = UiExpansionState::capture(&doc)?;
        let grid_class = doc
            .get_element_by_id(PRODUCT_GRID_ID)
            .and_then(|g| doc.attr(g, "class"))
            .map(String::from);

        self.teardown();
        let swapped = self.swap(&mut doc, &payload, &descriptors);
        self.setup(&doc);
        let report = swapped?;

        expansion.apply(&mut doc);
        *self.expansion.borrow_mut() = expansion;
        if let (Some(class), Some(grid)) = (grid_class, doc.get_element_by_id(PRODUCT_GRID_ID)) {
            doc.set_attr(grid, "class", class);
        }

        if let Some(target) = trigger_id.and_then(|id| doc.get_element_by_id(id)) {
            doc.focus(target);
        }
        self.restore_scroll(&mut doc);

        self.logger
            .debug_builder("results replaced")
            .field_u64("sections", report.replaced.len() as u64)
            .emit();
        Ok(())
    }

    /// Replace the sections and register deferred blocks inside them.
    /// Bindings must be torn down before and set up after, whether or not
    /// this succeeds.
    fn swap(
        &self,
        doc: &mut Document,
        payload: &SectionPayload,
        descriptors: &[SectionDescriptor],
    ) -> Result<RenderReport, ThemeError> {
        let report = self.renderer.render(doc, payload, descriptors)?;
        for root in &report.roots {
            self.deferred.scan(doc, *root)?;
        }
        Ok(report)
    }

    fn restore_scroll(&self, doc: &mut Document) {
        let Some(rect) = doc
            .get_element_by_id(RESULTS_CONTAINER_ID)
            .and_then(|c| doc.rect(c))
        else {
            return;
        };
        let offset = self.header.as_ref().map(|h| h.offset()).unwrap_or(0.0);
        let top = (rect.top - offset).max(0.0);
        if doc.viewport().scroll_y > top {
            doc.scroll_to(top);
        }
    }

    fn set_loading(&self, on: bool) {
        let mut doc = self.doc.borrow_mut();
        if let Some(container) = doc.get_element_by_id(RESULTS_CONTAINER_ID) {
            doc.toggle_class(container, LOADING_CLASS, on);
        }
    }

    /// Push a history entry for `params`.
    pub fn update_url(&self, params: &SearchParams) {
        let url = join_path_query(&self.path, params);
        self.history.push_state(HistoryState::new(params), &url);
    }

    /// Replay a history entry. An entry without state is the page as first
    /// loaded.
    pub async fn on_popstate(&self, state: Option<HistoryState>) -> FilterOutcome {
        let params = match state {
            Some(state) => state.params(),
            None => self.initial.clone(),
        };
        self.apply_filters(params, None, false).await
    }

    /// Remove every filter, keeping only the sort order.
    pub async fn clear_all(&self) -> FilterOutcome {
        let current = self.form_params();
        let mut params = SearchParams::new();
        for sort in current.get_all(SORT_PARAM) {
            params.append(SORT_PARAM, sort);
        }
        self.apply_filters(params, None, true).await
    }

    /// Remove a single active filter value.
    pub async fn remove_filter(&self, name: &str, value: &str) -> FilterOutcome {
        let mut params = self.form_params();
        params.remove_pair(name, value);
        self.apply_filters(params, None, true).await
    }

    /// Apply the query string of an active-filter link.
    pub async fn navigate(&self, href: &str) -> FilterOutcome {
        let query = href.split_once('?').map(|(_, q)| q).unwrap_or("");
        self.apply_filters(SearchParams::parse(query), None, true).await
    }

    /// Expand or collapse a filter group. Returns the new open state.
    pub fn toggle_group(&self, id: &str) -> bool {
        let mut doc = self.doc.borrow_mut();
        let Some(group) = doc.get_element_by_id(id) else {
            return false;
        };
        let open = !doc.has_attr(group, ATTR_OPEN);
        let mut expansion = self.expansion.borrow_mut();
        if open {
            doc.set_attr(group, ATTR_OPEN, "");
            expansion.insert(id);
        } else {
            doc.remove_attr(group, ATTR_OPEN);
            expansion.remove(id);
        }
        open
    }

    /// Route a DOM event to this controller.
    pub async fn handle(&self, event: &DomEvent) -> bool {
        let action = {
            let doc = self.doc.borrow();
            self.bindings.borrow().dispatch(&doc, event)
        };
        match action {
            Some(FacetAction::Change) => {
                self.handle_filter_change(Some(event.target)).await;
            }
            Some(FacetAction::Navigate(href)) => {
                self.navigate(&href).await;
            }
            Some(FacetAction::Toggle(id)) => {
                self.toggle_group(&id);
            }
            None => return false,
        }
        true
    }
}

impl Component for FacetFilterController {
    fn name(&self) -> &'static str {
        "facets"
    }

    fn setup(&self, doc: &Document) {
        let mut bindings = self.bindings.borrow_mut();
        if let Some(form) = doc.get_element_by_id(FACETS_FORM_ID) {
            bindings.bind(form, EventKind::Change, FacetAction::Change);
            bindings.bind(form, EventKind::Submit, FacetAction::Change);
        }
        if let Some(sort) = doc.get_element_by_id(SORT_SECONDARY_ID) {
            bindings.bind(sort, EventKind::Change, FacetAction::Change);
        }

        let root = doc.root();
        if let Ok(links) = Selector::parse(&format!("{}, {}", FACET_REMOVE, FACET_CLEAR_ALL)) {
            for link in doc.query_selector_all(root, &links) {
                if let Some(href) = doc.attr(link, "href") {
                    bindings.bind(link, EventKind::Click, FacetAction::Navigate(href.to_string()));
                }
            }
        }
        if let Ok(summaries) = doc.select(root, FACET_GROUP_SUMMARY) {
            for summary in summaries {
                let group = doc.parent_element(summary).and_then(|g| doc.id_of(g));
                if let Some(id) = group {
                    bindings.bind(summary, EventKind::Click, FacetAction::Toggle(id.to_string()));
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

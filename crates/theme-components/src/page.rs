//! Composition root for one storefront page.
//!
//! `StorefrontPage::mount` looks at which load-bearing elements the page
//! carries and builds the matching components, wiring the pieces that
//! cooperate: pagination pauses while filters apply, the cart closes the
//! quick-add overlay before opening, scroll restoration accounts for the
//! sticky header.
//!
//! Bus handlers run synchronously inside `publish`, often while a
//! component is mid-operation. The page's subscription therefore only
//! queues events; `process_events` drains the queue once the publishing
//! operation has returned.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use futures::future::join_all;
use theme_core::selectors::{
    ATTR_SECTION_ID, CART_DRAWER_ID, FACETS_FORM_ID, HEADER_ID, MENU_DRAWER_ID, PAGINATION_ID,
    PRODUCT_GRID_ID, QUICK_ADD_MODAL_ID, RECOMMENDATIONS, RESULTS_CONTAINER_ID, SLIDER,
};
use theme_core::{Subscription, ThemeError, ThemeEvent};
use theme_dom::NodeId;
use theme_observability::ComponentLogger;

use crate::cart_drawer::{CartDrawerController, FetchScriptLoader};
use crate::context::{SharedDocument, ThemeContext};
use crate::deferred::DeferredLoader;
use crate::facets::{FacetFilterController, FilterOutcome};
use crate::header::StickyHeader;
use crate::history::{BrowserHistory, HistoryState};
use crate::lifecycle::{Component, DomEvent};
use crate::modal::ModalDialog;
use crate::navigation::MenuDrawer;
use crate::pagination::PaginationController;
use crate::recommendations::{ProductRecommendations, RecommendationsOutcome};
use crate::slider::Slider;

/// Every component mounted on a page.
pub struct StorefrontPage {
    ctx: ThemeContext,
    doc: SharedDocument,
    deferred: Rc<DeferredLoader>,
    header: Option<Rc<StickyHeader>>,
    facets: Option<FacetFilterController>,
    pagination: Option<PaginationController>,
    quick_add: Option<Rc<ModalDialog>>,
    cart: Option<CartDrawerController>,
    menu: Option<MenuDrawer>,
    sliders: Vec<Slider>,
    recommendations: Vec<ProductRecommendations>,
    queue: Rc<RefCell<VecDeque<ThemeEvent>>>,
    _subscription: Subscription,
    logger: ComponentLogger,
}

impl StorefrontPage {
    /// Build the components present in `doc`.
    pub fn mount(
        ctx: ThemeContext,
        doc: SharedDocument,
        history: Rc<dyn BrowserHistory>,
    ) -> Result<Self, ThemeError> {
        let logger = ctx.logger("page");
        let deferred = Rc::new(DeferredLoader::new(ctx.config.capabilities().intersection_observer));

        let (present, pagination_section, slider_roots, recommendation_nodes) = {
            let mut doc = doc.borrow_mut();
            let root = doc.root();
            deferred.scan(&mut doc, root)?;

            let present = |id: &str| doc.get_element_by_id(id).is_some();
            let found = Present {
                header: present(HEADER_ID),
                facets: present(FACETS_FORM_ID),
                grid: present(PRODUCT_GRID_ID) && present(PAGINATION_ID),
                quick_add: present(QUICK_ADD_MODAL_ID),
                cart: present(CART_DRAWER_ID),
                menu: present(MENU_DRAWER_ID),
            };
            let section = [RESULTS_CONTAINER_ID, PAGINATION_ID]
                .into_iter()
                .filter_map(|id| doc.get_element_by_id(id))
                .find_map(|node| doc.attr(node, ATTR_SECTION_ID).map(String::from));
            (found, section, doc.select(root, SLIDER)?, doc.select(root, RECOMMENDATIONS)?)
        };

        let header = present.header.then(|| Rc::new(StickyHeader::new(doc.clone())));

        let pagination = match (present.grid, pagination_section) {
            (true, Some(section)) => Some(PaginationController::new(
                ctx.clone(),
                doc.clone(),
                section,
                Rc::clone(&deferred),
            )),
            (true, None) => {
                logger.warn("pagination found without a section id, not mounting");
                None
            }
            _ => None,
        };

        let facets = if present.facets {
            let mut facets = FacetFilterController::new(
                ctx.clone(),
                doc.clone(),
                history,
                Rc::clone(&deferred),
            )?;
            if let Some(pagination) = &pagination {
                facets = facets.with_pause(pagination.pause_handle());
            }
            if let Some(header) = &header {
                facets = facets.with_header(Rc::clone(header));
            }
            Some(facets)
        } else {
            None
        };

        let quick_add = present
            .quick_add
            .then(|| Rc::new(ModalDialog::quick_add(ctx.clone(), doc.clone())));

        let cart = present.cart.then(|| {
            let loader = Rc::new(FetchScriptLoader::new(Rc::clone(&ctx.fetcher)));
            let cart = CartDrawerController::new(ctx.clone(), doc.clone()).with_script_loader(loader);
            match &quick_add {
                Some(modal) => cart.with_quick_add(Rc::clone(modal)),
                None => cart,
            }
        });

        let menu = present.menu.then(|| MenuDrawer::new(&ctx, doc.clone()));

        let sliders = slider_roots
            .into_iter()
            .map(|root| Slider::new(&ctx, doc.clone(), root))
            .collect::<Result<Vec<_>, _>>()?;

        let recommendations = recommendation_nodes
            .into_iter()
            .map(|node| {
                ProductRecommendations::new(ctx.clone(), doc.clone(), node)
                    .with_deferred(Rc::clone(&deferred))
            })
            .collect();

        let queue: Rc<RefCell<VecDeque<ThemeEvent>>> = Rc::default();
        let subscription = {
            let queue = Rc::clone(&queue);
            ctx.bus.subscribe(move |event| {
                if Self::reacts_to(event) {
                    queue.borrow_mut().push_back(event.clone());
                }
            })
        };

        let page = Self {
            ctx,
            doc,
            deferred,
            header,
            facets,
            pagination,
            quick_add,
            cart,
            menu,
            sliders,
            recommendations,
            queue,
            _subscription: subscription,
            logger,
        };
        page.logger
            .debug_builder("page mounted")
            .field("components", page.component_names().join(","))
            .emit();
        Ok(page)
    }

    fn reacts_to(event: &ThemeEvent) -> bool {
        matches!(
            event,
            ThemeEvent::RestoredFromCache
                | ThemeEvent::CartRefresh
                | ThemeEvent::CartDrawerOpen
                | ThemeEvent::FiltersUpdated { .. }
                | ThemeEvent::BreakpointChanged { .. }
        )
    }

    pub fn context(&self) -> &ThemeContext {
        &self.ctx
    }

    pub fn document(&self) -> &SharedDocument {
        &self.doc
    }

    pub fn facets(&self) -> Option<&FacetFilterController> {
        self.facets.as_ref()
    }

    pub fn pagination(&self) -> Option<&PaginationController> {
        self.pagination.as_ref()
    }

    pub fn cart(&self) -> Option<&CartDrawerController> {
        self.cart.as_ref()
    }

    pub fn quick_add(&self) -> Option<&ModalDialog> {
        self.quick_add.as_deref()
    }

    pub fn menu(&self) -> Option<&MenuDrawer> {
        self.menu.as_ref()
    }

    pub fn header(&self) -> Option<&StickyHeader> {
        self.header.as_deref()
    }

    pub fn sliders(&self) -> &[Slider] {
        &self.sliders
    }

    pub fn deferred(&self) -> &DeferredLoader {
        &self.deferred
    }

    fn components(&self) -> Vec<&dyn Component> {
        let mut components: Vec<&dyn Component> = Vec::new();
        if let Some(c) = &self.facets {
            components.push(c);
        }
        if let Some(c) = &self.pagination {
            components.push(c);
        }
        if let Some(c) = &self.quick_add {
            components.push(c.as_ref());
        }
        if let Some(c) = &self.cart {
            components.push(c);
        }
        if let Some(c) = &self.menu {
            components.push(c);
        }
        components.extend(self.sliders.iter().map(|s| s as &dyn Component));
        components
    }

    /// Names of the mounted components.
    pub fn component_names(&self) -> Vec<&'static str> {
        self.components().iter().map(|c| c.name()).collect()
    }

    /// Bindings, across all components, that point at detached nodes.
    pub fn stale_binding_count(&self) -> usize {
        let doc = self.doc.borrow();
        self.components()
            .iter()
            .map(|c| c.stale_binding_count(&doc))
            .sum()
    }

    /// Deliver a DOM event to the first component bound to it, then
    /// process whatever that published.
    pub async fn dispatch(&self, event: DomEvent) -> bool {
        let mut handled = false;
        if let Some(quick_add) = &self.quick_add {
            handled = quick_add.handle(&event).await;
        }
        if !handled {
            if let Some(cart) = &self.cart {
                handled = cart.handle(&event).await;
            }
        }
        if !handled {
            if let Some(menu) = &self.menu {
                handled = menu.handle(&event).await;
            }
        }
        if !handled {
            if let Some(facets) = &self.facets {
                handled = facets.handle(&event).await;
            }
        }
        if !handled {
            if let Some(pagination) = &self.pagination {
                handled = pagination.handle(&event).await;
            }
        }
        if !handled {
            handled = self.sliders.iter().any(|s| s.handle(&event));
        }
        self.process_events().await;
        handled
    }

    /// React to queued bus events. Returns the number processed.
    pub async fn process_events(&self) -> usize {
        let mut processed = 0;
        loop {
            let Some(event) = self.queue.borrow_mut().pop_front() else {
                break;
            };
            processed += 1;
            match event {
                ThemeEvent::RestoredFromCache | ThemeEvent::CartRefresh => {
                    if let Some(cart) = &self.cart {
                        cart.refresh(false).await;
                    }
                }
                ThemeEvent::FiltersUpdated { .. } => {
                    if let Some(pagination) = &self.pagination {
                        pagination.reset();
                    }
                }
                ThemeEvent::BreakpointChanged { breakpoint } => {
                    if let Some(menu) = &self.menu {
                        menu.on_breakpoint(breakpoint).await;
                    }
                }
                ThemeEvent::CartDrawerOpen => {
                    if let Some(header) = &self.header {
                        header.reveal();
                    }
                }
                _ => {}
            }
        }
        processed
    }

    /// The browser showed the page again. A page restored from the
    /// back/forward cache has a stale cart.
    pub async fn on_pageshow(&self, persisted: bool) {
        if persisted {
            self.ctx.bus.publish(ThemeEvent::RestoredFromCache);
        }
        self.process_events().await;
    }

    /// The viewport was resized. Publishes `BreakpointChanged` when a
    /// threshold was crossed.
    pub async fn resize(&self, width: u32) -> bool {
        let changed = self.ctx.config.breakpoint().update_width(width);
        if let Some(breakpoint) = changed {
            self.ctx.bus.publish(ThemeEvent::BreakpointChanged { breakpoint });
        }
        self.process_events().await;
        changed.is_some()
    }

    /// The window scrolled to `y`.
    pub fn on_scroll(&self, y: f64) {
        self.doc.borrow_mut().scroll_to(y);
        if let Some(header) = &self.header {
            header.on_scroll(y);
        }
        self.deferred.load_visible(&mut self.doc.borrow_mut());
    }

    /// A history entry was popped.
    pub async fn on_popstate(&self, state: Option<HistoryState>) -> Option<FilterOutcome> {
        let facets = self.facets.as_ref()?;
        let outcome = facets.on_popstate(state).await;
        self.process_events().await;
        Some(outcome)
    }

    /// Load every recommendations block concurrently.
    pub async fn load_recommendations(&self) -> Vec<(NodeId, RecommendationsOutcome)> {
        let loads = self.recommendations.iter().map(|r| async move { (r.node(), r.load().await) });
        join_all(loads).await
    }
}

struct Present {
    header: bool,
    facets: bool,
    grid: bool,
    quick_add: bool,
    cart: bool,
    menu: bool,
}

impl std::fmt::Debug for StorefrontPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontPage")
            .field("components", &self.component_names())
            .field("recommendations", &self.recommendations.len())
            .finish_non_exhaustive()
    }
}

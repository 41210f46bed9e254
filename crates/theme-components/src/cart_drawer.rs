//! Cart drawer: open/close choreography and cart re-rendering.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use theme_core::selectors::{
    ACTIVE_CLASS, ATTR_LOADED, ATTR_SCRIPT, ATTR_SUPPRESS_GRANULAR, CART_CHECKOUT, CART_CLOSE,
    CART_DRAWER_ID, CART_DRAWER_SECTION, CART_FOOTER_ID, CART_ICON_BUBBLE_ID,
    CART_ICON_BUBBLE_SECTION, CART_ITEM, CART_ITEMS_ID, CART_TERMS_ID, CART_TERMS_NOTICE_ID,
    EMPTY_CLASS, SHIPPING_CALCULATOR_ID,
};
use theme_core::{FetchError, ThemeError, ThemeEvent};
use theme_dom::{Document, NodeId};
use theme_fetch::{Fetcher, OperationKey, RequestCoordinator};
use theme_observability::ComponentLogger;
use theme_render::{PartialRenderer, SectionDescriptor, SectionPayload, SectionRequest};

use crate::context::{SharedDocument, ThemeContext};
use crate::disclosure::{Disclosure, Transition};
use crate::focus_trap::FocusTrap;
use crate::lifecycle::{Bindings, Component, DomEvent, EventKind, Key};
use crate::modal::{set_body_lock, ModalDialog};

const OPERATION: OperationKey = "cart";

/// Loads a third-party script on demand.
#[async_trait(?Send)]
pub trait ScriptLoader {
    async fn load(&self, src: &str) -> Result<(), FetchError>;
}

/// Script loader that fetches the script through the page's transport.
pub struct FetchScriptLoader {
    fetcher: Rc<dyn Fetcher>,
}

impl FetchScriptLoader {
    pub fn new(fetcher: Rc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait(?Send)]
impl ScriptLoader for FetchScriptLoader {
    async fn load(&self, src: &str) -> Result<(), FetchError> {
        self.fetcher.get(src).await?.error_for_status(src)?;
        Ok(())
    }
}

/// Result of a cart render.
#[derive(Debug, Clone, PartialEq)]
pub enum CartOutcome {
    Rendered,
    Cancelled,
    /// Rendering failed; a `CartError` event was published.
    Failed(ThemeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CartAction {
    Close,
    Checkout,
    Tab { shift: bool },
}

/// The slide-out cart.
pub struct CartDrawerController {
    ctx: ThemeContext,
    doc: SharedDocument,
    coordinator: RequestCoordinator,
    renderer: PartialRenderer,
    disclosure: Disclosure,
    trap: FocusTrap,
    opener: Cell<Option<NodeId>>,
    quick_add: Option<Rc<ModalDialog>>,
    scripts: Option<Rc<dyn ScriptLoader>>,
    shipping_requested: Cell<bool>,
    bindings: RefCell<Bindings<CartAction>>,
    logger: ComponentLogger,
}

impl CartDrawerController {
    pub fn new(ctx: ThemeContext, doc: SharedDocument) -> Self {
        let duration = ctx.config.timings().drawer_transition();
        let drawer = Self {
            logger: ctx.logger("cart-drawer"),
            ctx,
            doc,
            coordinator: RequestCoordinator::new(),
            renderer: PartialRenderer::new(),
            disclosure: Disclosure::new(duration),
            trap: FocusTrap::new(),
            opener: Cell::new(None),
            quick_add: None,
            scripts: None,
            shipping_requested: Cell::new(false),
            bindings: RefCell::new(Bindings::new()),
        };
        drawer.setup(&drawer.doc.borrow());
        drawer
    }

    /// Close `modal` before the drawer opens.
    pub fn with_quick_add(mut self, modal: Rc<ModalDialog>) -> Self {
        self.quick_add = Some(modal);
        self
    }

    /// Load the shipping calculator script through `loader`.
    pub fn with_script_loader(mut self, loader: Rc<dyn ScriptLoader>) -> Self {
        self.scripts = Some(loader);
        self
    }

    pub fn disclosure(&self) -> &Disclosure {
        &self.disclosure
    }

    pub fn is_open(&self) -> bool {
        self.disclosure.is_open()
    }

    /// Open the drawer. A visible quick-add overlay is closed first; one
    /// still mid-transition is allowed to settle before it is closed.
    pub async fn open(&self, opener: Option<NodeId>) -> Transition {
        if let Some(modal) = &self.quick_add {
            modal.disclosure().wait_settled().await;
            if modal.is_open() {
                modal.close().await;
                let delay = self.ctx.config.timings().quick_add_close_delay();
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        let transition = self.disclosure.request_open();
        if transition != Transition::Started {
            return transition;
        }
        {
            let mut doc = self.doc.borrow_mut();
            self.opener.set(opener.or_else(|| doc.focused()));
            if let Some(drawer) = doc.get_element_by_id(CART_DRAWER_ID) {
                doc.add_class(drawer, ACTIVE_CLASS);
            }
            set_body_lock(&mut doc, true);
        }
        self.ctx.bus.publish(ThemeEvent::CartDrawerOpen);

        self.disclosure.settle().await;
        {
            let mut doc = self.doc.borrow_mut();
            if let Some(drawer) = doc.get_element_by_id(CART_DRAWER_ID) {
                self.trap.activate(&mut doc, drawer, None);
            }
        }
        self.load_shipping_calculator().await;
        transition
    }

    /// Close the drawer and return focus to whatever opened it.
    pub async fn close(&self) -> Transition {
        let transition = self.disclosure.request_close();
        if transition != Transition::Started {
            return transition;
        }
        {
            let mut doc = self.doc.borrow_mut();
            if let Some(drawer) = doc.get_element_by_id(CART_DRAWER_ID) {
                doc.remove_class(drawer, ACTIVE_CLASS);
            }
            self.trap.deactivate(&mut doc, self.opener.take());
            set_body_lock(&mut doc, false);
        }
        self.ctx.bus.publish(ThemeEvent::CartDrawerClose);
        self.disclosure.settle().await;
        transition
    }

    async fn load_shipping_calculator(&self) {
        if self.shipping_requested.replace(true) {
            return;
        }
        let src = {
            let doc = self.doc.borrow();
            doc.get_element_by_id(SHIPPING_CALCULATOR_ID)
                .and_then(|c| doc.attr(c, ATTR_SCRIPT))
                .map(String::from)
        };
        let (Some(src), Some(loader)) = (src, self.scripts.as_ref()) else {
            return;
        };

        match loader.load(&src).await {
            Ok(()) => {
                let mut doc = self.doc.borrow_mut();
                if let Some(calculator) = doc.get_element_by_id(SHIPPING_CALCULATOR_ID) {
                    doc.set_attr(calculator, ATTR_LOADED, "true");
                }
            }
            Err(e) => self
                .logger
                .warn_with("shipping calculator failed to load", &[("src", &src), ("error", &e)]),
        }
    }

    /// Whether the shipping calculator load was attempted.
    pub fn shipping_calculator_requested(&self) -> bool {
        self.shipping_requested.get()
    }

    /// Re-render the cart from the server.
    ///
    /// When the line items are on the page and not suppressed, only the
    /// items and footer are refreshed from the drawer section. Otherwise
    /// the whole drawer and the header bubble are re-rendered.
    pub async fn refresh(&self, suppress_granular: bool) -> CartOutcome {
        let granular = !suppress_granular && {
            let doc = self.doc.borrow();
            doc.get_element_by_id(CART_ITEMS_ID).is_some()
                && !doc
                    .get_element_by_id(CART_DRAWER_ID)
                    .is_some_and(|d| doc.has_attr(d, ATTR_SUPPRESS_GRANULAR))
        };
        let routes = self.ctx.config.routes();
        let url = if granular {
            SectionRequest::new(&routes.cart).section_id(CART_DRAWER_SECTION)
        } else {
            SectionRequest::new(&routes.root).sections(&[CART_DRAWER_SECTION, CART_ICON_BUBBLE_SECTION])
        };

        let session = self.coordinator.start_operation(OPERATION, url);
        let result = session.fetch_text(self.ctx.fetcher.as_ref()).await;
        self.coordinator.end_operation(OPERATION, &session);

        match result {
            Ok(body) if session.is_current() => {
                let rendered = SectionPayload::parse(&body).and_then(|payload| {
                    if granular {
                        self.render_items(&payload)
                    } else {
                        self.render_sections(&payload)
                    }
                });
                match rendered {
                    Ok(()) => CartOutcome::Rendered,
                    Err(e) => self.report_error(e),
                }
            }
            Ok(_) => CartOutcome::Cancelled,
            Err(e) if e.is_cancellation() => CartOutcome::Cancelled,
            Err(e) => self.report_error(e),
        }
    }

    /// Render the `sections` map of an add-to-cart response, then open.
    pub async fn render_contents(&self, payload: &SectionPayload, opener: Option<NodeId>) -> CartOutcome {
        if let Err(e) = self.render_sections(payload) {
            return self.report_error(e);
        }
        self.open(opener).await;
        CartOutcome::Rendered
    }

    fn render_items(&self, payload: &SectionPayload) -> Result<(), ThemeError> {
        let descriptors = [
            SectionDescriptor::new(CART_ITEMS_ID, CART_DRAWER_SECTION),
            SectionDescriptor::new(CART_FOOTER_ID, CART_DRAWER_SECTION),
        ];
        self.swap(payload, &descriptors, CART_ITEMS_ID)
    }

    fn render_sections(&self, payload: &SectionPayload) -> Result<(), ThemeError> {
        let descriptors = [
            SectionDescriptor::new(CART_DRAWER_ID, CART_DRAWER_SECTION),
            SectionDescriptor::new(CART_ICON_BUBBLE_ID, CART_ICON_BUBBLE_SECTION),
        ];
        self.swap(payload, &descriptors, CART_DRAWER_ID)
    }

    fn swap(
        &self,
        payload: &SectionPayload,
        descriptors: &[SectionDescriptor],
        required: &str,
    ) -> Result<(), ThemeError> {
        let mut doc = self.doc.borrow_mut();
        self.teardown();
        let report = self.renderer.render(&mut doc, payload, descriptors);
        self.setup(&doc);
        let report = report?;
        if report.is_missing(required) {
            return Err(ThemeError::MissingSection(required.to_string()));
        }

        let empty = match doc.get_element_by_id(CART_ITEMS_ID) {
            Some(items) => doc.select(items, CART_ITEM)?.is_empty(),
            None => true,
        };
        if let Some(drawer) = doc.get_element_by_id(CART_DRAWER_ID) {
            doc.toggle_class(drawer, EMPTY_CLASS, empty);
        }
        // A swap inside an open drawer drops the focused node.
        if self.disclosure.is_open() && doc.focused().is_none() {
            if let Some(drawer) = doc.get_element_by_id(CART_DRAWER_ID) {
                self.trap.activate(&mut doc, drawer, None);
            }
        }
        Ok(())
    }

    fn report_error(&self, error: ThemeError) -> CartOutcome {
        self.logger.warn_with("cart update failed", &[("error", &error)]);
        self.ctx.bus.publish(ThemeEvent::CartError {
            message: self.ctx.config.strings().cart_error.clone(),
            source_id: Some(CART_DRAWER_ID.to_string()),
        });
        CartOutcome::Failed(error)
    }

    /// Block checkout while a required terms checkbox is unchecked.
    pub fn on_checkout_submit(&self) -> Result<(), ThemeError> {
        let mut doc = self.doc.borrow_mut();
        let Some(terms) = doc.get_element_by_id(CART_TERMS_ID) else {
            return Ok(());
        };
        let notice = doc.get_element_by_id(CART_TERMS_NOTICE_ID);
        if doc.has_attr(terms, "checked") {
            if let Some(notice) = notice {
                doc.set_attr(notice, "hidden", "");
            }
            return Ok(());
        }

        let message = self.ctx.config.strings().terms_required.clone();
        if let Some(notice) = notice {
            doc.remove_attr(notice, "hidden");
            doc.clear_children(notice);
            let text = doc.create_text(message.as_str());
            doc.append_child(notice, text);
        }
        doc.focus(terms);
        Err(ThemeError::Validation(message))
    }

    /// Route a DOM event to this drawer.
    pub async fn handle(&self, event: &DomEvent) -> bool {
        let action = {
            let doc = self.doc.borrow();
            self.bindings.borrow().dispatch(&doc, event)
        };
        match action {
            Some(CartAction::Close) => {
                self.close().await;
            }
            Some(CartAction::Checkout) => {
                if let Err(e) = self.on_checkout_submit() {
                    self.logger.debug_with("checkout blocked", &[("reason", &e)]);
                }
            }
            Some(CartAction::Tab { shift }) => {
                self.trap.handle_tab(&mut self.doc.borrow_mut(), shift);
            }
            None => return false,
        }
        true
    }
}

impl Component for CartDrawerController {
    fn name(&self) -> &'static str {
        "cart-drawer"
    }

    fn setup(&self, doc: &Document) {
        let Some(drawer) = doc.get_element_by_id(CART_DRAWER_ID) else {
            return;
        };
        let mut bindings = self.bindings.borrow_mut();
        bindings.bind(drawer, EventKind::KeyDown(Key::Escape), CartAction::Close);
        for shift in [false, true] {
            bindings.bind(drawer, EventKind::KeyDown(Key::Tab { shift }), CartAction::Tab { shift });
        }
        if let Ok(buttons) = doc.select(drawer, CART_CLOSE) {
            for button in buttons {
                bindings.bind(button, EventKind::Click, CartAction::Close);
            }
        }
        if let Ok(buttons) = doc.select(drawer, CART_CHECKOUT) {
            for button in buttons {
                bindings.bind(button, EventKind::Click, CartAction::Checkout);
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

//! Header navigation drawer.

use std::cell::{Cell, RefCell};

use theme_core::selectors::{ATTR_OPEN, MENU_DRAWER_ID, MENU_TOGGLE};
use theme_core::Breakpoint;
use theme_dom::{Document, NodeId};
use tokio::sync::watch;

use crate::context::{SharedDocument, ThemeContext};
use crate::disclosure::{Disclosure, Transition};
use crate::focus_trap::FocusTrap;
use crate::lifecycle::{Bindings, Component, DomEvent, EventKind, Key};
use crate::modal::set_body_lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Toggle,
    Close,
    Tab { shift: bool },
}

/// The mobile menu drawer. Only meaningful below the desktop breakpoint.
pub struct MenuDrawer {
    doc: SharedDocument,
    disclosure: Disclosure,
    trap: FocusTrap,
    toggle: Cell<Option<NodeId>>,
    bindings: RefCell<Bindings<MenuAction>>,
}

impl MenuDrawer {
    pub fn new(ctx: &ThemeContext, doc: SharedDocument) -> Self {
        let menu = Self {
            doc,
            disclosure: Disclosure::new(ctx.config.timings().drawer_transition()),
            trap: FocusTrap::new(),
            toggle: Cell::new(None),
            bindings: RefCell::new(Bindings::new()),
        };
        menu.setup(&menu.doc.borrow());
        menu
    }

    pub fn is_open(&self) -> bool {
        self.disclosure.is_open()
    }

    pub fn disclosure(&self) -> &Disclosure {
        &self.disclosure
    }

    pub async fn open(&self, toggle: Option<NodeId>) -> Transition {
        let transition = self.disclosure.request_open();
        if transition != Transition::Started {
            return transition;
        }
        {
            let mut doc = self.doc.borrow_mut();
            let toggle = toggle.or_else(|| doc.focused());
            self.toggle.set(toggle);
            if let Some(menu) = doc.get_element_by_id(MENU_DRAWER_ID) {
                doc.set_attr(menu, ATTR_OPEN, "");
                if let Some(toggle) = toggle {
                    doc.set_attr(toggle, "aria-expanded", "true");
                }
                set_body_lock(&mut doc, true);
                self.trap.activate(&mut doc, menu, None);
            }
        }
        self.disclosure.settle().await;
        transition
    }

    /// Close the menu and hand focus back to the toggle that opened it.
    pub async fn close(&self) -> Transition {
        let transition = self.disclosure.request_close();
        if transition != Transition::Started {
            return transition;
        }
        {
            let mut doc = self.doc.borrow_mut();
            if let Some(menu) = doc.get_element_by_id(MENU_DRAWER_ID) {
                doc.remove_attr(menu, ATTR_OPEN);
            }
            let toggle = self.toggle.take();
            if let Some(toggle) = toggle {
                doc.set_attr(toggle, "aria-expanded", "false");
            }
            set_body_lock(&mut doc, false);
            self.trap.deactivate(&mut doc, toggle);
        }
        self.disclosure.settle().await;
        transition
    }

    pub async fn toggle(&self, toggle: Option<NodeId>) -> Transition {
        if self.disclosure.state().is_visible() {
            self.close().await
        } else {
            self.open(toggle).await
        }
    }

    /// Close when the layout switches to desktop. Returns true if it closed.
    pub async fn on_breakpoint(&self, breakpoint: Breakpoint) -> bool {
        if !breakpoint.is_desktop() || !self.disclosure.state().is_visible() {
            return false;
        }
        tracing::debug!(breakpoint = breakpoint.as_str(), "closing menu drawer");
        self.close().await == Transition::Started
    }

    /// Follow breakpoint changes until the sender goes away.
    pub async fn watch_breakpoints(&self, mut changes: watch::Receiver<Breakpoint>) {
        while changes.changed().await.is_ok() {
            let breakpoint = *changes.borrow_and_update();
            self.on_breakpoint(breakpoint).await;
        }
    }

    pub async fn handle(&self, event: &DomEvent) -> bool {
        let action = {
            let doc = self.doc.borrow();
            self.bindings.borrow().dispatch(&doc, event)
        };
        match action {
            Some(MenuAction::Toggle) => {
                self.toggle(Some(event.target)).await;
            }
            Some(MenuAction::Close) => {
                self.close().await;
            }
            Some(MenuAction::Tab { shift }) => {
                self.trap.handle_tab(&mut self.doc.borrow_mut(), shift);
            }
            None => return false,
        }
        true
    }
}

impl Component for MenuDrawer {
    fn name(&self) -> &'static str {
        "menu-drawer"
    }

    fn setup(&self, doc: &Document) {
        let mut bindings = self.bindings.borrow_mut();
        let root = doc.root();
        if let Ok(toggles) = doc.select(root, MENU_TOGGLE) {
            for toggle in toggles {
                bindings.bind(toggle, EventKind::Click, MenuAction::Toggle);
            }
        }
        if let Some(menu) = doc.get_element_by_id(MENU_DRAWER_ID) {
            bindings.bind(menu, EventKind::KeyDown(Key::Escape), MenuAction::Close);
            for shift in [false, true] {
                bindings.bind(menu, EventKind::KeyDown(Key::Tab { shift }), MenuAction::Tab { shift });
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

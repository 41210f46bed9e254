//! Modal dialogs, including the quick-add overlay.

use std::cell::{Cell, RefCell};

use theme_core::selectors::{ATTR_OPEN, BODY_LOCK_CLASS, MODAL_CLOSE, QUICK_ADD_MODAL_ID};
use theme_core::ThemeEvent;
use theme_dom::{Document, NodeId};

use crate::context::{SharedDocument, ThemeContext};
use crate::disclosure::{Disclosure, Transition};
use crate::focus_trap::FocusTrap;
use crate::lifecycle::{Bindings, Component, DomEvent, EventKind, Key};

/// Toggle the scroll lock on `<body>`.
pub(crate) fn set_body_lock(doc: &mut Document, locked: bool) {
    let root = doc.root();
    if let Ok(Some(body)) = doc.select_first(root, "body") {
        doc.toggle_class(body, BODY_LOCK_CLASS, locked);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModalAction {
    Close,
    Tab { shift: bool },
}

/// A dialog shown by setting `open` on its element.
pub struct ModalDialog {
    id: String,
    ctx: ThemeContext,
    doc: SharedDocument,
    disclosure: Disclosure,
    trap: FocusTrap,
    opener: Cell<Option<NodeId>>,
    close_event: Option<ThemeEvent>,
    bindings: RefCell<Bindings<ModalAction>>,
}

impl ModalDialog {
    /// Create a modal for the element with `id`.
    pub fn new(ctx: ThemeContext, doc: SharedDocument, id: impl Into<String>) -> Self {
        let duration = ctx.config.timings().modal_transition();
        let modal = Self {
            id: id.into(),
            ctx,
            doc,
            disclosure: Disclosure::new(duration),
            trap: FocusTrap::new(),
            opener: Cell::new(None),
            close_event: None,
            bindings: RefCell::new(Bindings::new()),
        };
        modal.setup(&modal.doc.borrow());
        modal
    }

    /// The quick-add overlay. Announces `QuickAddClose` when it closes.
    pub fn quick_add(ctx: ThemeContext, doc: SharedDocument) -> Self {
        let mut modal = Self::new(ctx, doc, QUICK_ADD_MODAL_ID);
        modal.close_event = Some(ThemeEvent::QuickAddClose);
        modal
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the dialog is shown, judged by its `open` attribute.
    pub fn is_open(&self) -> bool {
        let doc = self.doc.borrow();
        doc.get_element_by_id(&self.id)
            .is_some_and(|m| doc.has_attr(m, ATTR_OPEN))
    }

    pub fn disclosure(&self) -> &Disclosure {
        &self.disclosure
    }

    pub async fn open(&self, opener: Option<NodeId>) -> Transition {
        let transition = self.disclosure.request_open();
        if transition != Transition::Started {
            return transition;
        }
        {
            let mut doc = self.doc.borrow_mut();
            let Some(modal) = doc.get_element_by_id(&self.id) else {
                self.disclosure.transition_end();
                return Transition::Unchanged;
            };
            self.opener.set(opener.or_else(|| doc.focused()));
            doc.set_attr(modal, ATTR_OPEN, "");
            set_body_lock(&mut doc, true);
            self.trap.activate(&mut doc, modal, None);
        }
        self.disclosure.settle().await;
        transition
    }

    pub async fn close(&self) -> Transition {
        let transition = self.disclosure.request_close();
        if transition != Transition::Started {
            return transition;
        }
        {
            let mut doc = self.doc.borrow_mut();
            if let Some(modal) = doc.get_element_by_id(&self.id) {
                doc.remove_attr(modal, ATTR_OPEN);
            }
            set_body_lock(&mut doc, false);
            self.trap.deactivate(&mut doc, self.opener.take());
        }
        if let Some(event) = &self.close_event {
            self.ctx.bus.publish(event.clone());
        }
        self.disclosure.settle().await;
        transition
    }

    /// Route a DOM event to this dialog.
    pub async fn handle(&self, event: &DomEvent) -> bool {
        let action = {
            let doc = self.doc.borrow();
            self.bindings.borrow().dispatch(&doc, event)
        };
        match action {
            Some(ModalAction::Close) => {
                self.close().await;
                true
            }
            Some(ModalAction::Tab { shift }) => {
                self.trap.handle_tab(&mut self.doc.borrow_mut(), shift);
                true
            }
            None => false,
        }
    }
}

impl Component for ModalDialog {
    fn name(&self) -> &'static str {
        "modal"
    }

    fn setup(&self, doc: &Document) {
        let Some(modal) = doc.get_element_by_id(&self.id) else {
            return;
        };
        let mut bindings = self.bindings.borrow_mut();
        bindings.bind(modal, EventKind::KeyDown(Key::Escape), ModalAction::Close);
        for shift in [false, true] {
            bindings.bind(modal, EventKind::KeyDown(Key::Tab { shift }), ModalAction::Tab { shift });
        }
        if let Ok(buttons) = doc.select(modal, MODAL_CLOSE) {
            for button in buttons {
                bindings.bind(button, EventKind::Click, ModalAction::Close);
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

//! Keyboard focus containment for drawers and modals.

use std::cell::Cell;

use theme_dom::{Document, NodeId};

#[derive(Debug, Clone, Copy)]
struct ActiveTrap {
    container: NodeId,
    previous: Option<NodeId>,
}

/// Keeps Tab navigation inside one container while active.
#[derive(Debug, Default)]
pub struct FocusTrap {
    active: Cell<Option<ActiveTrap>>,
}

impl FocusTrap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.get().is_some()
    }

    /// Container the trap is holding focus in.
    pub fn container(&self) -> Option<NodeId> {
        self.active.get().map(|t| t.container)
    }

    /// Trap focus in `container`, focusing `initial` or the first focusable
    /// element. Re-activating replaces the container but keeps the
    /// originally focused element for restoration.
    pub fn activate(&self, doc: &mut Document, container: NodeId, initial: Option<NodeId>) {
        let previous = match self.active.get() {
            Some(trap) => trap.previous,
            None => doc.focused(),
        };
        self.active.set(Some(ActiveTrap {
            container,
            previous,
        }));

        let target = initial
            .filter(|n| doc.contains(container, *n))
            .or_else(|| doc.focusable_elements(container).first().copied())
            .unwrap_or(container);
        doc.focus(target);
    }

    /// Move focus for a Tab press, wrapping at either end. Returns the
    /// element focused, or None when the trap is inactive.
    pub fn handle_tab(&self, doc: &mut Document, shift: bool) -> Option<NodeId> {
        let trap = self.active.get()?;
        let focusable = doc.focusable_elements(trap.container);
        let (first, last) = (*focusable.first()?, *focusable.last()?);

        let current = doc.focused().and_then(|f| focusable.iter().position(|n| *n == f));
        let next = match (current, shift) {
            (None, false) => first,
            (None, true) => last,
            (Some(i), false) if i + 1 == focusable.len() => first,
            (Some(0), true) => last,
            (Some(i), false) => focusable[i + 1],
            (Some(i), true) => focusable[i - 1],
        };
        doc.focus(next);
        Some(next)
    }

    /// Release the trap and return focus to `restore_to`, falling back to
    /// the element focused before activation.
    pub fn deactivate(&self, doc: &mut Document, restore_to: Option<NodeId>) {
        let Some(trap) = self.active.take() else {
            return;
        };
        match restore_to
            .or(trap.previous)
            .filter(|n| doc.is_attached(*n))
        {
            Some(node) => doc.focus(node),
            None => doc.blur(),
        }
    }
}

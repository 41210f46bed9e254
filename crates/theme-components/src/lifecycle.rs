//! Listener bindings and the setup/teardown lifecycle.
//!
//! Components never attach behavior to nodes directly. They record which
//! node reacts to which event in a `Bindings` table, rebuilt by `setup`
//! after every subtree swap and emptied by `teardown` before it. Dispatch
//! walks from the event target up through its ancestors, so a binding on a
//! container also catches events from its descendants.

use theme_dom::{Document, NodeId};

/// Keyboard keys the components react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Tab { shift: bool },
    Other,
}

/// Kind of DOM event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Click,
    Change,
    Submit,
    KeyDown(Key),
}

/// An event delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomEvent {
    pub target: NodeId,
    pub kind: EventKind,
}

impl DomEvent {
    pub fn click(target: NodeId) -> Self {
        Self {
            target,
            kind: EventKind::Click,
        }
    }

    pub fn change(target: NodeId) -> Self {
        Self {
            target,
            kind: EventKind::Change,
        }
    }

    pub fn submit(target: NodeId) -> Self {
        Self {
            target,
            kind: EventKind::Submit,
        }
    }

    pub fn key(target: NodeId, key: Key) -> Self {
        Self {
            target,
            kind: EventKind::KeyDown(key),
        }
    }
}

#[derive(Debug, Clone)]
struct Binding<A> {
    node: NodeId,
    kind: EventKind,
    action: A,
}

/// Table of node → event → action bindings owned by one component.
#[derive(Debug, Clone)]
pub struct Bindings<A> {
    entries: Vec<Binding<A>>,
}

impl<A> Default for Bindings<A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<A: Clone> Bindings<A> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `action` to `kind` events on `node` and its descendants.
    pub fn bind(&mut self, node: NodeId, kind: EventKind, action: A) {
        self.entries.push(Binding { node, kind, action });
    }

    /// Drop every binding.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `node` has a binding for `kind`.
    pub fn is_bound(&self, node: NodeId, kind: EventKind) -> bool {
        self.entries.iter().any(|b| b.node == node && b.kind == kind)
    }

    /// Bindings whose node is no longer in the live tree.
    pub fn stale_count(&self, doc: &Document) -> usize {
        self.entries
            .iter()
            .filter(|b| !doc.is_attached(b.node))
            .count()
    }

    /// Resolve an event to the action of the nearest bound node.
    pub fn dispatch(&self, doc: &Document, event: &DomEvent) -> Option<A> {
        if !doc.is_attached(event.target) {
            return None;
        }
        std::iter::once(event.target)
            .chain(doc.ancestors(event.target))
            .find_map(|node| {
                self.entries
                    .iter()
                    .find(|b| b.node == node && b.kind == event.kind)
                    .map(|b| b.action.clone())
            })
    }
}

/// A component whose listeners must be rebuilt around DOM swaps.
pub trait Component {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Bind listeners to the current live nodes.
    fn setup(&self, doc: &Document);

    /// Drop every listener.
    fn teardown(&self);

    /// Number of live bindings.
    fn binding_count(&self) -> usize;

    /// Bindings that point at nodes no longer in the live tree.
    fn stale_binding_count(&self, doc: &Document) -> usize;

    /// Tear down and set up again.
    fn rebind(&self, doc: &Document) {
        self.teardown();
        self.setup(doc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Action {
        Open,
        Close,
    }

    #[test]
    fn test_dispatch_bubbles_to_ancestor() {
        let doc = Document::parse(
            r#"<div id="drawer"><button id="close"><span id="icon">x</span></button></div>"#,
        );
        let drawer = doc.get_element_by_id("drawer").unwrap();
        let close = doc.get_element_by_id("close").unwrap();
        let icon = doc.get_element_by_id("icon").unwrap();

        let mut bindings = Bindings::new();
        bindings.bind(close, EventKind::Click, Action::Close);
        bindings.bind(drawer, EventKind::KeyDown(Key::Escape), Action::Close);
        bindings.bind(drawer, EventKind::Click, Action::Open);

        assert_eq!(bindings.dispatch(&doc, &DomEvent::click(icon)), Some(Action::Close));
        assert_eq!(bindings.dispatch(&doc, &DomEvent::click(drawer)), Some(Action::Open));
        assert_eq!(
            bindings.dispatch(&doc, &DomEvent::key(icon, Key::Escape)),
            Some(Action::Close)
        );
        assert_eq!(bindings.dispatch(&doc, &DomEvent::key(icon, Key::Enter)), None);
    }

    #[test]
    fn test_detached_nodes_do_not_dispatch() {
        let mut doc = Document::parse(r#"<div id="a"><button id="b"></button></div>"#);
        let button = doc.get_element_by_id("b").unwrap();
        let mut bindings = Bindings::new();
        bindings.bind(button, EventKind::Click, Action::Open);

        doc.remove(button);
        assert_eq!(bindings.stale_count(&doc), 1);
        assert_eq!(bindings.dispatch(&doc, &DomEvent::click(button)), None);
    }
}

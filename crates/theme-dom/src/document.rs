//! Node arena with a single live tree.
//!
//! `detach` only unlinks a node; `remove` frees the node and its subtree,
//! and freed slots are reused by later allocations. Each `NodeId` carries
//! the generation of its slot, so a handle to a freed node never resolves
//! to whatever reuses the slot: it reads as an empty, detached comment.
//! Lookups such as `get_element_by_id` only see nodes attached to the root.

use std::collections::HashMap;

use crate::error::DomError;
use crate::selector::Selector;

/// Handle to a node in a `Document`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    /// Raw arena index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Generation of the slot this handle was issued for.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// Element payload: lowercase tag name and ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name (lowercase).
    pub name: String,
    attrs: Vec<(String, String)>,
}

impl Element {
    /// Create an element with no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    /// Get an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set (or replace) an attribute value.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    /// Remove an attribute. Returns true if it was present.
    pub fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|(k, _)| k != name);
        before != self.attrs.len()
    }

    /// All attributes in source order.
    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    /// Iterate the whitespace-separated class list.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    /// Check for a class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The document root.
    Document,
    /// An element.
    Element(Element),
    /// A text node.
    Text(String),
    /// A comment.
    Comment(String),
}

/// What a freed handle reads as.
static FREED: NodeData = NodeData::Comment(String::new());

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    generation: u32,
    live: bool,
}

impl Node {
    fn new(data: NodeData, generation: u32) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
            generation,
            live: true,
        }
    }
}

/// Vertical geometry of a laid-out element, in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Distance from the top of the document.
    pub top: f64,
    /// Rendered height.
    pub height: f64,
}

impl Rect {
    /// Create a rect.
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Scroll state of the window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Current vertical scroll offset.
    pub scroll_y: f64,
    /// Visible height.
    pub height: f64,
}

/// A mutable document tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    free: Vec<usize>,
    focused: Option<NodeId>,
    viewport: Viewport,
    geometry: HashMap<NodeId, Rect>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document, 0)],
            free: Vec::new(),
            focused: None,
            viewport: Viewport::default(),
            geometry: HashMap::new(),
        }
    }

    /// The document root.
    pub fn root(&self) -> NodeId {
        NodeId {
            index: 0,
            generation: 0,
        }
    }

    /// Number of slots in the arena, live or free.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Number of allocated nodes, attached or not.
    pub fn live_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Whether `node` still refers to an allocated node.
    pub fn is_live(&self, node: NodeId) -> bool {
        self.slot(node).is_some()
    }

    fn slot(&self, node: NodeId) -> Option<&Node> {
        self.nodes
            .get(node.index)
            .filter(|n| n.live && n.generation == node.generation)
    }

    fn slot_mut(&mut self, node: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(node.index)
            .filter(|n| n.live && n.generation == node.generation)
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        if let Some(index) = self.free.pop() {
            let generation = self.nodes[index].generation;
            self.nodes[index] = Node::new(data, generation);
            return NodeId { index, generation };
        }
        let index = self.nodes.len();
        self.nodes.push(Node::new(data, 0));
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Free `node` and everything beneath it. The caller has unlinked it.
    fn release(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(next) = stack.pop() {
            let Some(slot) = self.slot_mut(next) else {
                continue;
            };
            stack.append(&mut slot.children);
            slot.data = NodeData::Comment(String::new());
            slot.parent = None;
            slot.live = false;
            slot.generation = slot.generation.wrapping_add(1);
            self.geometry.remove(&next);
            self.free.push(next.index);
        }
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeData::Element(Element::new(name)))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    // ---------------------------------------------------------------------
    // Tree structure
    // ---------------------------------------------------------------------

    /// Node payload.
    pub fn data(&self, node: NodeId) -> &NodeData {
        self.slot(node).map_or(&FREED, |n| &n.data)
    }

    /// Element payload, if the node is an element.
    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match self.data(node) {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Mutable element payload, if the node is an element.
    pub fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.slot_mut(node)?.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Tag name of an element node.
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|el| el.name.as_str())
    }

    /// Parent node.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slot(node).and_then(|n| n.parent)
    }

    /// Nearest ancestor that is an element.
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).filter(|p| self.element(*p).is_some())
    }

    /// Direct children.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.slot(node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Direct children that are elements.
    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|c| self.element(*c).is_some())
            .collect()
    }

    /// All descendants in document order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(node);
        while let Some(p) = current {
            out.push(p);
            current = self.parent(p);
        }
        out
    }

    /// Whether `node` is `ancestor` or lies beneath it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).contains(&ancestor)
    }

    /// Whether the node is connected to the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.contains(self.root(), node)
    }

    /// Unlink a node from its parent. The node keeps its own subtree.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.slot_mut(node).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent) = self.slot_mut(parent) {
            parent.children.retain(|c| *c != node);
        }
    }

    /// Remove a node from the tree and free it with its subtree. Drops
    /// focus if it was inside. The root cannot be removed.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.root() || !self.is_live(node) {
            return;
        }
        if let Some(focused) = self.focused {
            if self.contains(node, focused) {
                self.focused = None;
            }
        }
        self.detach(node);
        self.release(node);
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.is_live(parent) || !self.is_live(child) || self.contains(child, parent) {
            return;
        }
        self.detach(child);
        if let Some(slot) = self.slot_mut(child) {
            slot.parent = Some(parent);
        }
        if let Some(slot) = self.slot_mut(parent) {
            slot.children.push(child);
        }
    }

    /// Insert `child` immediately after `reference`.
    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) {
        let Some(parent) = self.parent(reference) else {
            return;
        };
        if !self.is_live(child) || self.contains(child, parent) {
            return;
        }
        self.detach(child);
        if let Some(slot) = self.slot_mut(parent) {
            let siblings = &mut slot.children;
            let pos = siblings
                .iter()
                .position(|c| *c == reference)
                .map(|p| p + 1)
                .unwrap_or(siblings.len());
            siblings.insert(pos, child);
        }
        if let Some(slot) = self.slot_mut(child) {
            slot.parent = Some(parent);
        }
    }

    /// Remove and free every child of `node`.
    pub fn clear_children(&mut self, node: NodeId) {
        for child in self.children(node).to_vec() {
            self.remove(child);
        }
    }

    // ---------------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------------

    /// Attribute value of an element.
    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|el| el.attr(name))
    }

    /// Whether an element carries an attribute.
    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    /// Set an attribute on an element. Non-elements are ignored.
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(node) {
            el.set_attr(name, value);
        }
    }

    /// Remove an attribute from an element.
    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> bool {
        self.element_mut(node)
            .map(|el| el.remove_attr(name))
            .unwrap_or(false)
    }

    /// The `id` attribute.
    pub fn id_of(&self, node: NodeId) -> Option<&str> {
        self.attr(node, "id")
    }

    /// Check for a class.
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).is_some_and(|el| el.has_class(class))
    }

    /// Add a class if missing.
    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let current = self.attr(node, "class").unwrap_or("").trim().to_string();
        let next = if current.is_empty() {
            class.to_string()
        } else {
            format!("{} {}", current, class)
        };
        self.set_attr(node, "class", next);
    }

    /// Remove a class if present.
    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if !self.has_class(node, class) {
            return;
        }
        let next: Vec<String> = self
            .element(node)
            .map(|el| el.classes().filter(|c| *c != class).map(String::from).collect())
            .unwrap_or_default();
        self.set_attr(node, "class", next.join(" "));
    }

    /// Add or remove a class.
    pub fn toggle_class(&mut self, node: NodeId, class: &str, on: bool) {
        if on {
            self.add_class(node, class);
        } else {
            self.remove_class(node, class);
        }
    }

    /// Replace the attribute list of `target` with that of `src_node` in `src`.
    pub fn copy_attributes_from(&mut self, target: NodeId, src: &Document, src_node: NodeId) {
        let Some(attrs) = src.element(src_node).map(|el| el.attrs.clone()) else {
            return;
        };
        if let Some(el) = self.element_mut(target) {
            el.attrs = attrs;
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> String {
        self.descendants(node)
            .into_iter()
            .filter_map(|n| match self.data(n) {
                NodeData::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Find the attached element with the given id.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|n| self.id_of(*n) == Some(id))
    }

    /// First element under `scope` (exclusive) matching the selector.
    pub fn query_selector(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|n| selector.matches(self, *n))
    }

    /// All elements under `scope` (exclusive) matching the selector.
    pub fn query_selector_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    /// Parse `selector` and return the first match under `scope`.
    pub fn select_first(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>, DomError> {
        let selector = Selector::parse(selector)?;
        Ok(self.query_selector(scope, &selector))
    }

    /// Parse `selector` and return every match under `scope`.
    pub fn select(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let selector = Selector::parse(selector)?;
        Ok(self.query_selector_all(scope, &selector))
    }

    /// Nearest inclusive ancestor matching the selector.
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        std::iter::once(node)
            .chain(self.ancestors(node))
            .find(|n| selector.matches(self, *n))
    }

    // ---------------------------------------------------------------------
    // Cross-document copies
    // ---------------------------------------------------------------------

    /// Deep-copy `src_node` from `src` into this arena. The copy is detached.
    pub fn import_node(&mut self, src: &Document, src_node: NodeId) -> NodeId {
        let copy = self.push(src.data(src_node).clone());
        for child in src.children(src_node) {
            let child_copy = self.import_node(src, *child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Deep-copy a node within this arena. The copy is detached.
    pub fn clone_node(&mut self, node: NodeId) -> NodeId {
        let data = self.data(node).clone();
        let copy = self.push(data);
        for child in self.children(node).to_vec() {
            let child_copy = self.clone_node(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Replace the children of `target` with deep copies of the children of
    /// `src_node` in `src`.
    pub fn import_children(&mut self, target: NodeId, src: &Document, src_node: NodeId) {
        self.clear_children(target);
        for child in src.children(src_node) {
            let copy = self.import_node(src, *child);
            self.append_child(target, copy);
        }
    }

    /// Replace the children of `node` with the parsed `html`.
    pub fn set_inner_html(&mut self, node: NodeId, html: &str) {
        let fragment = Document::parse_fragment(html);
        let body = fragment.fragment_root();
        self.import_children(node, &fragment, body);
    }

    // ---------------------------------------------------------------------
    // Focus
    // ---------------------------------------------------------------------

    /// Focus an attached element.
    pub fn focus(&mut self, node: NodeId) {
        if self.is_attached(node) && self.element(node).is_some() {
            self.focused = Some(node);
        }
    }

    /// Clear focus.
    pub fn blur(&mut self) {
        self.focused = None;
    }

    /// Currently focused element, if it is still attached.
    pub fn focused(&self) -> Option<NodeId> {
        self.focused.filter(|n| self.is_attached(*n))
    }

    /// Keyboard-focusable elements under `container`, in document order.
    pub fn focusable_elements(&self, container: NodeId) -> Vec<NodeId> {
        self.descendants(container)
            .into_iter()
            .filter(|n| self.is_focusable(*n))
            .collect()
    }

    fn is_focusable(&self, node: NodeId) -> bool {
        let Some(el) = self.element(node) else {
            return false;
        };
        if el.attr("disabled").is_some() || el.attr("hidden").is_some() {
            return false;
        }
        if let Some(tabindex) = el.attr("tabindex") {
            return tabindex.trim() != "-1";
        }
        match el.name.as_str() {
            "a" => el.attr("href").is_some(),
            "input" => el.attr("type") != Some("hidden"),
            "button" | "select" | "textarea" | "summary" => true,
            _ => false,
        }
    }

    // ---------------------------------------------------------------------
    // Viewport and geometry
    // ---------------------------------------------------------------------

    /// Window scroll state.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Set the visible height of the window.
    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport.height = height;
    }

    /// Scroll the window.
    pub fn scroll_to(&mut self, y: f64) {
        self.viewport.scroll_y = y.max(0.0);
    }

    /// Record layout geometry for an element (supplied by the host).
    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        self.geometry.insert(node, rect);
    }

    /// Layout geometry of an element, if known.
    pub fn rect(&self, node: NodeId) -> Option<Rect> {
        self.geometry.get(&node).copied()
    }

    /// Whether any part of the element is inside the viewport.
    pub fn is_in_viewport(&self, node: NodeId) -> bool {
        let Some(rect) = self.rect(node) else {
            return false;
        };
        let vp = self.viewport;
        rect.bottom() > vp.scroll_y && rect.top < vp.scroll_y + vp.height
    }

    /// Checked element lookup used by callers that need a hard error.
    pub fn require_by_id(&self, id: &str) -> Result<NodeId, DomError> {
        self.get_element_by_id(id)
            .ok_or_else(|| DomError::NotFound(format!("#{}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::parse(
            r#"<html><body>
                <div id="grid" class="grid grid--4">
                    <ul id="list"><li class="item">a</li><li class="item">b</li></ul>
                </div>
                <a id="link" href="/x">x</a>
            </body></html>"#,
        )
    }

    #[test]
    fn test_get_element_by_id_ignores_detached() {
        let mut doc = sample();
        let list = doc.get_element_by_id("list").unwrap();
        doc.remove(list);
        assert!(doc.get_element_by_id("list").is_none());
        assert!(!doc.is_attached(list));
    }

    #[test]
    fn test_class_helpers() {
        let mut doc = sample();
        let grid = doc.get_element_by_id("grid").unwrap();
        doc.add_class(grid, "loading");
        assert!(doc.has_class(grid, "loading"));
        doc.add_class(grid, "loading");
        assert_eq!(doc.attr(grid, "class"), Some("grid grid--4 loading"));
        doc.remove_class(grid, "grid--4");
        assert_eq!(doc.attr(grid, "class"), Some("grid loading"));
    }

    #[test]
    fn test_insert_after() {
        let mut doc = sample();
        let items = doc.select(doc.root(), "li.item").unwrap();
        let extra = doc.create_element("li");
        doc.insert_after(items[0], extra);
        let list = doc.get_element_by_id("list").unwrap();
        assert_eq!(doc.element_children(list), vec![items[0], extra, items[1]]);
    }

    #[test]
    fn test_focus_dropped_when_removed() {
        let mut doc = sample();
        let link = doc.get_element_by_id("link").unwrap();
        doc.focus(link);
        assert_eq!(doc.focused(), Some(link));
        doc.remove(link);
        assert_eq!(doc.focused(), None);
    }

    #[test]
    fn test_import_children_across_documents() {
        let mut live = sample();
        let fetched = Document::parse(r#"<div id="grid"><p>new</p></div>"#);
        let src = fetched.get_element_by_id("grid").unwrap();
        let target = live.get_element_by_id("grid").unwrap();
        live.import_children(target, &fetched, src);
        assert_eq!(live.inner_html(target), "<p>new</p>");
        assert!(live.get_element_by_id("list").is_none());
    }

    #[test]
    fn test_clone_node_is_deep_and_detached() {
        let mut doc = sample();
        let list = doc.get_element_by_id("list").unwrap();
        let copy = doc.clone_node(list);
        assert!(!doc.is_attached(copy));
        assert_eq!(doc.outer_html(copy), doc.outer_html(list));
    }

    #[test]
    fn test_removed_slots_are_reused_under_a_new_generation() {
        let mut doc = sample();
        let list = doc.get_element_by_id("list").unwrap();
        let live = doc.live_count();
        doc.remove(list);
        assert_eq!(doc.live_count(), live - 5);
        assert!(!doc.is_live(list));

        let fresh = doc.create_element("section");
        assert_eq!(doc.live_count(), live - 4);
        assert_ne!(fresh, list);
        assert_eq!(doc.tag(list), None);
        assert!(doc.children(list).is_empty());
        assert!(!doc.is_attached(list));

        // A stale handle is inert.
        doc.set_attr(list, "id", "ghost");
        doc.append_child(list, fresh);
        assert!(doc.get_element_by_id("ghost").is_none());
        assert_eq!(doc.parent(fresh), None);
    }

    #[test]
    fn test_repeated_swaps_keep_arena_bounded() {
        let mut live = sample();
        let fetched = Document::parse(r#"<div id="grid"><ul><li>a</li><li>b</li></ul></div>"#);
        let src = fetched.get_element_by_id("grid").unwrap();
        let target = live.get_element_by_id("grid").unwrap();

        live.import_children(target, &fetched, src);
        let arena = live.arena_len();
        for _ in 0..10 {
            live.import_children(target, &fetched, src);
        }
        assert_eq!(live.arena_len(), arena);
        assert_eq!(live.inner_html(target), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn test_in_viewport() {
        let mut doc = sample();
        let link = doc.get_element_by_id("link").unwrap();
        doc.set_viewport_height(800.0);
        doc.set_rect(link, Rect::new(1200.0, 40.0));
        assert!(!doc.is_in_viewport(link));
        doc.scroll_to(500.0);
        assert!(doc.is_in_viewport(link));
    }
}

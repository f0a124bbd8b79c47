//! Arena-backed element tree the interaction controller reads and mutates.
//!
//! Handles stay valid after removal: a removed node simply stops resolving,
//! so timers that outlive their target degrade into no-ops. Freed slots are
//! reused under a new generation, which keeps the arena as large as the live
//! tree and stops stale handles from reaching the newcomer.

use std::collections::BTreeMap;

use crate::interaction::validation::SelectedFile;

/// Stable handle to an element inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

/// Vertical layout box, in CSS pixels relative to the viewport top.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    text: String,
    value: String,
    files: Vec<SelectedFile>,
    rect: Option<Rect>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|existing| existing == class)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }
}

/// Simple CSS-like selectors covering the structural roles the page uses.
#[derive(Debug, Clone, Copy)]
pub enum Selector<'a> {
    Tag(&'a str),
    Class(&'a str),
    Id(&'a str),
    HasAttr(&'a str),
    AttrEq(&'a str, &'a str),
    /// Matches when every inner selector matches (`input[type="email"]`).
    All(&'a [Selector<'a>]),
    /// Matches when any inner selector matches (`.card, .login-card`).
    Any(&'a [Selector<'a>]),
}

impl Selector<'_> {
    pub fn matches(&self, element: &Element) -> bool {
        match self {
            Selector::Tag(tag) => element.tag.eq_ignore_ascii_case(tag),
            Selector::Class(class) => element.has_class(class),
            Selector::Id(id) => element.attribute("id") == Some(*id),
            Selector::HasAttr(name) => element.has_attribute(name),
            Selector::AttrEq(name, value) => element.attribute(name) == Some(*value),
            Selector::All(parts) => parts.iter().all(|part| part.matches(element)),
            Selector::Any(parts) => parts.iter().any(|part| part.matches(element)),
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                element: Some(Element::new("body")),
            }],
            free: Vec::new(),
            body: NodeId {
                index: 0,
                generation: 0,
            },
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        self.slots
            .get(node.index)
            .filter(|slot| slot.generation == node.generation)
            .and_then(|slot| slot.element.as_ref())
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        self.slots
            .get_mut(node.index)
            .filter(|slot| slot.generation == node.generation)
            .and_then(|slot| slot.element.as_mut())
    }

    /// Creates a detached element, reusing a freed slot when one is available.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        while let Some(index) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut(index) {
                slot.element = Some(Element::new(tag));
                return NodeId {
                    index,
                    generation: slot.generation,
                };
            }
        }
        let index = self.slots.len();
        self.slots.push(Slot {
            generation: 0,
            element: Some(Element::new(tag)),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Creates an element with the given classes and appends it to `parent`.
    pub fn append_new(&mut self, parent: NodeId, tag: &str, classes: &[&str]) -> NodeId {
        let node = self.create_element(tag);
        for class in classes {
            self.add_class(node, class);
        }
        self.append_child(parent, node);
        node
    }

    /// Moves `child` under `parent`. Refuses to create cycles.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.element(parent).is_none()
            || self.element(child).is_none()
            || self.contains(child, parent)
        {
            return false;
        }
        self.detach(child);
        if let Some(element) = self.element_mut(child) {
            element.parent = Some(parent);
        }
        if let Some(element) = self.element_mut(parent) {
            element.children.push(child);
        }
        true
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        if let Some(element) = self.element_mut(parent) {
            element.children.retain(|child| *child != node);
        }
        if let Some(element) = self.element_mut(node) {
            element.parent = None;
        }
    }

    /// Removes `node` and its subtree. Returns false when there was nothing to remove.
    pub fn remove(&mut self, node: NodeId) -> bool {
        if node == self.body || self.element(node).is_none() {
            return false;
        }
        self.detach(node);
        self.drop_subtree(node);
        true
    }

    /// Removes every child of `node`, keeping `node` itself.
    pub fn clear_children(&mut self, node: NodeId) {
        let children = match self.element_mut(node) {
            Some(element) => {
                element.text.clear();
                std::mem::take(&mut element.children)
            }
            None => return,
        };
        for child in children {
            self.drop_subtree(child);
        }
    }

    fn drop_subtree(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(current.index)
                .filter(|slot| slot.generation == current.generation)
            else {
                continue;
            };
            if let Some(element) = slot.element.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
                stack.extend(element.children);
            }
        }
    }

    /// True when the node is still attached to the body.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.body {
                return true;
            }
            current = self.element(id).and_then(|element| element.parent);
        }
        false
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.element(node).and_then(|element| element.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.element(node)
            .map(|element| element.children.as_slice())
            .unwrap_or(&[])
    }

    /// Inclusive containment, matching `Node.contains`.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Nearest inclusive ancestor matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &Selector<'_>) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            let element = self.element(id)?;
            if selector.matches(element) {
                return Some(id);
            }
            current = element.parent;
        }
        None
    }

    /// First descendant of `scope` matching `selector`, in document order.
    pub fn query(&self, scope: NodeId, selector: &Selector<'_>) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|id| self.matches(*id, selector))
    }

    /// Every descendant of `scope` matching `selector`, in document order.
    pub fn query_all(&self, scope: NodeId, selector: &Selector<'_>) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.matches(*id, selector))
            .collect()
    }

    pub fn matches(&self, node: NodeId, selector: &Selector<'_>) -> bool {
        self.element(node)
            .is_some_and(|element| selector.matches(element))
    }

    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut ordered = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            ordered.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        ordered
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|element| element.has_class(class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.element_mut(node) {
            if !element.has_class(class) {
                element.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.element_mut(node) {
            element.classes.retain(|existing| existing != class);
        }
    }

    /// Flips `class` and returns whether it is now present.
    pub fn toggle_class(&mut self, node: NodeId, class: &str) -> bool {
        if self.has_class(node, class) {
            self.remove_class(node, class);
            false
        } else {
            self.add_class(node, class);
            self.has_class(node, class)
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|element| element.attribute(name))
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.attributes.insert(name.to_string(), value.to_string());
        }
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.element(node).and_then(|element| element.style(property))
    }

    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.style.insert(property.to_string(), value.to_string());
        }
    }

    /// Replaces the children of `node` with plain text, like `textContent =`.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.clear_children(node);
        if let Some(element) = self.element_mut(node) {
            element.text = text.to_string();
        }
    }

    /// Concatenated text of `node` and its descendants.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Some(element) = self.element(node) {
            out.push_str(&element.text);
        }
        for id in self.descendants(node) {
            if let Some(element) = self.element(id) {
                out.push_str(&element.text);
            }
        }
        out
    }

    pub fn value(&self, node: NodeId) -> &str {
        self.element(node).map(Element::value).unwrap_or("")
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.value = value.to_string();
        }
    }

    pub fn files(&self, node: NodeId) -> &[SelectedFile] {
        self.element(node).map(Element::files).unwrap_or(&[])
    }

    pub fn set_files(&mut self, node: NodeId, files: Vec<SelectedFile>) {
        if let Some(element) = self.element_mut(node) {
            element.files = files;
        }
    }

    pub fn rect(&self, node: NodeId) -> Option<Rect> {
        self.element(node).and_then(Element::rect)
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        if let Some(element) = self.element_mut(node) {
            element.rect = Some(rect);
        }
    }
}

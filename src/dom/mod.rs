//! Owned HTML Document Tree
//!
//! This module provides the arena-backed DOM the copy pipeline works on.
//! Documents are parsed with html5ever (see `parse.rs`), mutated in place
//! by the export stages, and written back out by the XML-style serializer
//! in `serialize.rs`.
//!
//! # Node Identity
//!
//! Every node is addressed by a `NodeId` that stays valid for the lifetime
//! of its `Document`, even after the node is detached. A cloned document
//! records, per node, the id of the node it was copied from (`origin`), so a
//! working tree can always find its counterpart in the source tree no matter
//! how its structure changes afterwards.

mod parse;
mod serialize;

pub use serialize::{escape_attribute, escape_text, to_xml_string, XHTML_NAMESPACE};

// ─────────────────────────────────────────────────────────────────────────────
// Node Types
// ─────────────────────────────────────────────────────────────────────────────

/// Index of a node inside its owning `Document`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the document arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single `name="value"` pair on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Element name and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase local name (`div`, `img`, ...)
    pub name: String,
    /// Attributes in source order
    pub attrs: Vec<Attribute>,
}

impl Element {
    /// Create an element with no attributes.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    /// Look up an attribute value (names compare case-insensitively).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self
            .attrs
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.value = value.to_string(),
            None => self.attrs.push(Attribute {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Remove an attribute. Returns true if it was present.
    pub fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|a| !a.name.eq_ignore_ascii_case(name));
        before != self.attrs.len()
    }

    /// Whitespace-separated entries of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The invisible container at the top of every document
    Document,
    Element(Element),
    Text(String),
    Comment(String),
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
    origin: Option<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The node in the source document this node was cloned from.
    pub fn origin(&self) -> Option<NodeId> {
        self.origin
    }

    pub fn as_element(&self) -> Option<&Element> {
        match &self.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Document
// ─────────────────────────────────────────────────────────────────────────────

/// An arena of nodes rooted at a `NodeKind::Document` node.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
                origin: None,
            }],
        }
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Total number of nodes ever allocated, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.node(id).as_element()
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    /// Set an attribute on an element. Non-element nodes are ignored.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(id) {
            element.set_attr(name, value);
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> bool {
        self.element_mut(id)
            .map(|e| e.remove_attr(name))
            .unwrap_or(false)
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).map(|e| e.has_class(class)).unwrap_or(false)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn origin(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).origin
    }

    /// First child of `id` that is an element.
    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.element(c).is_some())
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Construction
    // ─────────────────────────────────────────────────────────────────────────

    fn push(&mut self, kind: NodeKind, origin: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
            origin,
        });
        id
    }

    /// Allocate a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeKind::Element(Element::new(name)), None)
    }

    /// Allocate a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()), None)
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Comment(text.to_string()), None)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────────

    /// Unlink `id` from its parent. The node and its subtree stay allocated.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Append `child` as the last child of `parent`, moving it if attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Put `new` where `old` is. `old` ends up detached.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        let Some(parent) = self.nodes[old.0].parent else {
            return;
        };
        self.detach(new);
        let position = self.nodes[parent.0].children.iter().position(|&c| c == old);
        if let Some(position) = position {
            self.nodes[parent.0].children[position] = new;
            self.nodes[new.0].parent = Some(parent);
            self.nodes[old.0].parent = None;
        }
    }

    /// Replace the data of a text node. Other node kinds are left alone.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let NodeKind::Text(data) = &mut self.nodes[id.0].kind {
            *data = text.to_string();
        }
    }

    /// Detach every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Replace the children of `id` with the nodes parsed from `markup`.
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) {
        let fragment = Document::parse_fragment(markup);
        self.clear_children(id);
        let body = fragment.body_or_root();
        for &child in fragment.children(body) {
            let copy = self.import(&fragment, child, false);
            self.append_child(id, copy);
        }
    }

    /// Copy `id` and its subtree inside this document.
    ///
    /// Copies keep the origin of the node they were copied from, so content
    /// moved around by a later stage still points at the source tree.
    pub fn deep_copy(&mut self, id: NodeId) -> NodeId {
        let kind = self.nodes[id.0].kind.clone();
        let origin = self.nodes[id.0].origin;
        let copy = self.push(kind, origin);
        let children = self.nodes[id.0].children.clone();
        for child in children {
            let child_copy = self.deep_copy(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Deep-copy `id` into a fresh, independent document.
    ///
    /// The copy becomes the only child of the new document's root and every
    /// copied node's origin is the id of its counterpart in `self`.
    pub fn clone_subtree(&self, id: NodeId) -> Document {
        let mut doc = Document::new();
        let copy = doc.import(self, id, true);
        let root = doc.root();
        doc.append_child(root, copy);
        doc
    }

    fn import(&mut self, src: &Document, id: NodeId, link_origin: bool) -> NodeId {
        let source = src.node(id);
        let origin = if link_origin { Some(id) } else { source.origin };
        let kind = match &source.kind {
            // A nested document node only happens for fragments; flatten it.
            NodeKind::Document => NodeKind::Element(Element::new("div")),
            other => other.clone(),
        };
        let copy = self.push(kind, origin);
        for &child in source.children() {
            let child_copy = self.import(src, child, link_origin);
            self.append_child(copy, child_copy);
        }
        copy
    }

    fn body_or_root(&self) -> NodeId {
        self.descendants(self.root())
            .into_iter()
            .find(|&id| self.tag_name(id) == Some("body"))
            .unwrap_or_else(|| self.root())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Traversal & Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// `id` followed by all of its descendants, depth-first in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            for &child in self.node(current).children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Elements among `id` and its descendants, in document order.
    pub fn elements(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.element(n).is_some())
            .collect()
    }

    /// Elements among `id` and its descendants with the given tag name.
    pub fn elements_by_tag(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        self.elements(id)
            .into_iter()
            .filter(|&n| self.tag_name(n).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
            .collect()
    }

    /// Elements among `id` and its descendants carrying `class`.
    pub fn elements_with_class(&self, id: NodeId, class: &str) -> Vec<NodeId> {
        self.elements(id)
            .into_iter()
            .filter(|&n| self.has_class(n, class))
            .collect()
    }

    /// First element (self or descendant, document order) carrying `class`.
    pub fn find_by_class(&self, id: NodeId, class: &str) -> Option<NodeId> {
        self.elements(id)
            .into_iter()
            .find(|&n| self.has_class(n, class))
    }

    /// True if `ancestor` is a proper ancestor of `id`.
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let NodeKind::Text(text) = &self.node(node).kind {
                out.push_str(text);
            }
        }
        out
    }
}

/// Iterator over the ancestors of a node.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

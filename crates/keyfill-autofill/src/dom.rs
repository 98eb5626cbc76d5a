//! Arena-backed page model.
//!
//! The detector and executor do not talk to a live browser DOM; they operate
//! on a [`PageDocument`], an owned snapshot parsed from HTML with html5ever.
//! Nodes are stored in a flat arena and referenced by [`NodeId`] indices,
//! parent/children links kept alongside.
//!
//! Beyond the static tree, the document carries the two pieces of mutable
//! state autofill needs:
//!
//! - a per-control **value** (seeded from the `value` attribute, writable via
//!   [`PageDocument::set_value`]), and
//! - an **event log**: every `input`/`change`/`click`/`submit` notification
//!   raised through [`PageDocument::dispatch`] is recorded in order, which is
//!   how the host glue (and tests) observe that reactive frameworks would
//!   have been notified.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::error::{AutofillError, Result};

/// Index of a node inside a [`PageDocument`] arena.
///
/// Only meaningful for the document it came from; using it against another
/// document yields [`AutofillError::DetachedNode`] (or arbitrary lookups for
/// read accessors, which return `None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Node payload.
#[derive(Debug)]
enum NodeData {
    /// Synthetic document root.
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug)]
struct ElementData {
    /// Lowercase local tag name.
    tag: String,
    /// Lowercase attribute names with their values, in source order.
    attrs: Vec<(String, String)>,
    /// Current control value state (distinct from the `value` attribute).
    value: String,
}

impl ElementData {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// The notification kinds autofill raises on page nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Value-in-progress notification (`input`).
    Input,
    /// Committed-value notification (`change`).
    Change,
    /// Activation of a button-like element.
    Click,
    /// Form submission signal on a container.
    Submit,
}

/// One entry in the document's event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchedEvent {
    pub target: NodeId,
    pub kind: EventKind,
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// An owned, mutable snapshot of a page.
#[derive(Debug)]
pub struct PageDocument {
    nodes: Vec<Node>,
    events: Vec<DispatchedEvent>,
}

impl PageDocument {
    /// Parse an HTML string into a page snapshot.
    ///
    /// html5ever's error recovery applies, so arbitrary real-world markup
    /// (missing `<html>`, unclosed tags, bare fragments) parses into a tree.
    /// Whitespace-only text runs, comments, and doctypes are dropped; only
    /// elements and text survive into the arena.
    pub fn parse(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .expect("reading from an in-memory buffer cannot fail");

        let mut doc = Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            events: Vec::new(),
        };
        doc.convert_children(&dom.document, doc.root());

        tracing::debug!(nodes = doc.nodes.len(), "parsed page snapshot");
        doc
    }

    /// The synthetic root above `<html>`.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn convert_children(&mut self, handle: &Handle, parent: NodeId) {
        for child in handle.children.borrow().iter() {
            match &child.data {
                RcNodeData::Element { name, attrs, .. } => {
                    let tag = name.local.to_string().to_ascii_lowercase();
                    let attrs: Vec<(String, String)> = attrs
                        .borrow()
                        .iter()
                        .map(|a| {
                            (
                                a.name.local.to_string().to_ascii_lowercase(),
                                a.value.to_string(),
                            )
                        })
                        .collect();
                    // Controls start out holding their declared value.
                    let value = attrs
                        .iter()
                        .find(|(n, _)| n == "value")
                        .map(|(_, v)| v.clone())
                        .unwrap_or_default();

                    let id = self.push_node(
                        parent,
                        NodeData::Element(ElementData { tag, attrs, value }),
                    );
                    self.convert_children(child, id);
                }
                RcNodeData::Text { contents } => {
                    let text = contents.borrow().to_string();
                    if !text.trim().is_empty() {
                        self.push_node(parent, NodeData::Text(text));
                    }
                }
                // Doctype, comments, and processing instructions carry no
                // autofill signal.
                _ => {}
            }
        }
    }

    fn push_node(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    // -- Read access ---------------------------------------------------------

    /// Whether `id` refers to a node of this document.
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.node(id)?.data {
            NodeData::Element(ref e) => Some(e),
            _ => None,
        }
    }

    /// Lowercase tag name, if `id` is an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    /// Attribute value by lowercase name, if present.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    /// Parent node, `None` at the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Direct children in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// All descendants of `id` in document (pre-)order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Ancestors of `id` from its parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            out.push(node);
            current = self.parent(node);
        }
        out
    }

    /// Concatenated descendant text, whitespace-collapsed.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        for node in self.descendants(id) {
            if let Some(Node {
                data: NodeData::Text(text),
                ..
            }) = self.node(node)
            {
                parts.push(text.trim().to_string());
            }
        }
        parts.join(" ")
    }

    /// Whether `id` is an `<input>`, `<select>`, or `<textarea>`.
    pub fn is_form_control(&self, id: NodeId) -> bool {
        matches!(self.tag(id), Some("input" | "select" | "textarea"))
    }

    /// Whether the control carries the `disabled` attribute.
    pub fn is_disabled(&self, id: NodeId) -> bool {
        self.attr(id, "disabled").is_some()
    }

    /// Rough computed visibility: not `type=hidden`, no `hidden` attribute,
    /// no `display:none` in the inline style.
    pub fn is_visible(&self, id: NodeId) -> bool {
        if self
            .attr(id, "type")
            .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
        {
            return false;
        }
        if self.attr(id, "hidden").is_some() {
            return false;
        }
        if let Some(style) = self.attr(id, "style") {
            let style: String = style.to_ascii_lowercase().split_whitespace().collect();
            if style.contains("display:none") {
                return false;
            }
        }
        true
    }

    // -- Mutation ------------------------------------------------------------

    /// Current value state of a control.
    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.value.as_str())
    }

    /// Overwrite a control's value state.
    ///
    /// # Errors
    ///
    /// [`AutofillError::DetachedNode`] if `id` is not a node of this
    /// document, [`AutofillError::NotAControl`] if it is not a form control.
    pub fn set_value(&mut self, id: NodeId, value: &str) -> Result<()> {
        if !self.contains(id) {
            return Err(AutofillError::DetachedNode { node: id });
        }
        if !self.is_form_control(id) {
            return Err(AutofillError::NotAControl { node: id });
        }
        match self.nodes[id.index()].data {
            NodeData::Element(ref mut e) => {
                e.value = value.to_string();
                Ok(())
            }
            _ => Err(AutofillError::NotAControl { node: id }),
        }
    }

    /// Raise a notification on `id`, recording it in the event log.
    ///
    /// # Errors
    ///
    /// [`AutofillError::DetachedNode`] if `id` is not a node of this
    /// document.
    pub fn dispatch(&mut self, id: NodeId, kind: EventKind) -> Result<()> {
        if !self.contains(id) {
            return Err(AutofillError::DetachedNode { node: id });
        }
        self.events.push(DispatchedEvent { target: id, kind });
        Ok(())
    }

    /// Every notification raised so far, in dispatch order.
    pub fn events(&self) -> &[DispatchedEvent] {
        &self.events
    }

    /// The notification kinds raised on `id`, in dispatch order.
    pub fn events_for(&self, id: NodeId) -> Vec<EventKind> {
        self.events
            .iter()
            .filter(|e| e.target == id)
            .map(|e| e.kind)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

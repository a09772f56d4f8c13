//! An arena-backed in-memory host tree.
//!
//! [`MemDom`] implements [`Dom`] without a browser: nodes live in one arena behind a shared
//! handle, listeners are plain callbacks fired through [`MemDom::dispatch`], and every mutating
//! primitive ticks a counter in [`Stats`]. That makes it the natural backend for servers and for
//! tests that assert *which* writes a mount or patch performed, not just the resulting markup.

use crate::dom::{Dom, EventHandler, HandlerSlot};
use compact_str::CompactString;
use core::cell::RefCell;
use std::rc::Rc;

/// A handle to one node of a [`MemDom`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemNode(usize);

/// The value listeners receive from [`MemDom::dispatch`].
#[derive(Clone, Debug)]
pub struct MemEvent {
	pub name: CompactString,
}

impl MemEvent {
	#[must_use]
	pub fn new(name: &str) -> Self {
		Self {
			name: CompactString::from(name),
		}
	}
}

/// Counters for every mutating host primitive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
	pub attr_writes: u64,
	pub text_writes: u64,
	pub text_inserts: u64,
	pub node_inserts: u64,
	pub node_removes: u64,
	pub subtree_clones: u64,
	pub listener_attaches: u64,
}

/// An in-memory [`Dom`]. Cloning the value clones a handle to one shared arena.
#[derive(Clone)]
pub struct MemDom {
	arena: Rc<RefCell<Arena>>,
}

#[derive(Default)]
struct Arena {
	nodes: Vec<NodeData>,
	stats: Stats,
}

struct NodeData {
	parent: Option<usize>,
	kind: NodeKind,
}

enum NodeKind {
	Element {
		tag: CompactString,
		attrs: Vec<(CompactString, String)>,
		children: Vec<usize>,
		listeners: Vec<(CompactString, HandlerSlot<MemDom>)>,
	},
	Text {
		data: String,
	},
}

impl MemDom {
	#[must_use]
	pub fn new() -> Self {
		Self {
			arena: Rc::new(RefCell::new(Arena::default())),
		}
	}

	/// A snapshot of the mutation counters.
	#[must_use]
	pub fn stats(&self) -> Stats {
		self.arena.borrow().stats
	}

	pub fn reset_stats(&self) {
		self.arena.borrow_mut().stats = Stats::default();
	}

	/// Fires `event` at the listeners for `event.name` on `node`, in attachment order.
	///
	/// Handler slots are cloned out before any handler runs, so handlers are free to patch blocks
	/// living in this same arena.
	pub fn dispatch(&self, node: &MemNode, event: &MemEvent) {
		let slots: Vec<HandlerSlot<Self>> = {
			let arena = self.arena.borrow();
			match &arena.nodes[node.0].kind {
				NodeKind::Element { listeners, .. } => listeners
					.iter()
					.filter(|(name, _)| *name == event.name)
					.map(|(_, slot)| slot.clone())
					.collect(),
				NodeKind::Text { .. } => Vec::new(),
			}
		};
		for slot in slots {
			slot.invoke(event);
		}
	}

	#[must_use]
	pub fn tag_of(&self, node: &MemNode) -> Option<CompactString> {
		match &self.arena.borrow().nodes[node.0].kind {
			NodeKind::Element { tag, .. } => Some(tag.clone()),
			NodeKind::Text { .. } => None,
		}
	}

	#[must_use]
	pub fn text_of(&self, node: &MemNode) -> Option<String> {
		match &self.arena.borrow().nodes[node.0].kind {
			NodeKind::Text { data } => Some(data.clone()),
			NodeKind::Element { .. } => None,
		}
	}

	#[must_use]
	pub fn attribute_of(&self, node: &MemNode, name: &str) -> Option<String> {
		match &self.arena.borrow().nodes[node.0].kind {
			NodeKind::Element { attrs, .. } => attrs
				.iter()
				.find(|(attr, _)| *attr == name)
				.map(|(_, value)| value.clone()),
			NodeKind::Text { .. } => None,
		}
	}

	#[must_use]
	pub fn child_count(&self, node: &MemNode) -> usize {
		match &self.arena.borrow().nodes[node.0].kind {
			NodeKind::Element { children, .. } => children.len(),
			NodeKind::Text { .. } => 0,
		}
	}
}

impl Default for MemDom {
	fn default() -> Self {
		Self::new()
	}
}

impl Arena {
	fn push(&mut self, kind: NodeKind) -> usize {
		let index = self.nodes.len();
		self.nodes.push(NodeData { parent: None, kind });
		index
	}

	fn children_mut(&mut self, parent: usize) -> &mut Vec<usize> {
		match &mut self.nodes[parent].kind {
			NodeKind::Element { children, .. } => children,
			NodeKind::Text { .. } => panic!("text nodes cannot have children"),
		}
	}

	fn detach(&mut self, node: usize) {
		if let Some(parent) = self.nodes[node].parent.take() {
			self.children_mut(parent).retain(|&child| child != node);
		}
	}

	fn insert(&mut self, parent: usize, node: usize, reference: Option<usize>) {
		self.detach(node);
		let children = self.children_mut(parent);
		let at = match reference {
			Some(reference) => children
				.iter()
				.position(|&child| child == reference)
				.expect("reference node is not a child of the given parent"),
			None => children.len(),
		};
		children.insert(at, node);
		self.nodes[node].parent = Some(parent);
	}

	fn copy(&mut self, node: usize, deep: bool) -> usize {
		// Listeners are never copied, mirroring `cloneNode`.
		let kind = match &self.nodes[node].kind {
			NodeKind::Element { tag, attrs, .. } => NodeKind::Element {
				tag: tag.clone(),
				attrs: attrs.clone(),
				children: Vec::new(),
				listeners: Vec::new(),
			},
			NodeKind::Text { data } => NodeKind::Text { data: data.clone() },
		};
		let copy = self.push(kind);
		if deep {
			let children = match &self.nodes[node].kind {
				NodeKind::Element { children, .. } => children.clone(),
				NodeKind::Text { .. } => Vec::new(),
			};
			for child in children {
				let child_copy = self.copy(child, true);
				self.children_mut(copy).push(child_copy);
				self.nodes[child_copy].parent = Some(copy);
			}
		}
		copy
	}

	fn serialize(&self, node: usize, out: &mut String) {
		match &self.nodes[node].kind {
			NodeKind::Element {
				tag,
				attrs,
				children,
				..
			} => {
				out.push('<');
				out.push_str(tag);
				for (name, value) in attrs {
					out.push(' ');
					out.push_str(name);
					out.push_str("=\"");
					escape_into(value, true, out);
					out.push('"');
				}
				out.push('>');
				for &child in children {
					self.serialize(child, out);
				}
				out.push_str("</");
				out.push_str(tag);
				out.push('>');
			}
			NodeKind::Text { data } => escape_into(data, false, out),
		}
	}
}

fn escape_into(text: &str, in_attribute: bool, out: &mut String) {
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' if in_attribute => out.push_str("&quot;"),
			c => out.push(c),
		}
	}
}

impl Dom for MemDom {
	type Node = MemNode;
	type Event = MemEvent;

	fn create_element(&self, tag: &str) -> MemNode {
		MemNode(self.arena.borrow_mut().push(NodeKind::Element {
			tag: CompactString::from(tag),
			attrs: Vec::new(),
			children: Vec::new(),
			listeners: Vec::new(),
		}))
	}

	fn create_text(&self, data: &str) -> MemNode {
		MemNode(self.arena.borrow_mut().push(NodeKind::Text {
			data: String::from(data),
		}))
	}

	fn clone_subtree(&self, node: &MemNode, deep: bool) -> MemNode {
		let mut arena = self.arena.borrow_mut();
		arena.stats.subtree_clones += 1;
		MemNode(arena.copy(node.0, deep))
	}

	fn child_at(&self, node: &MemNode, index: usize) -> Option<MemNode> {
		match &self.arena.borrow().nodes[node.0].kind {
			NodeKind::Element { children, .. } => children.get(index).copied().map(MemNode),
			NodeKind::Text { .. } => None,
		}
	}

	fn parent(&self, node: &MemNode) -> Option<MemNode> {
		self.arena.borrow().nodes[node.0].parent.map(MemNode)
	}

	fn insert_before(&self, parent: &MemNode, node: &MemNode, reference: Option<&MemNode>) {
		let mut arena = self.arena.borrow_mut();
		arena.stats.node_inserts += 1;
		arena.insert(parent.0, node.0, reference.map(|reference| reference.0));
	}

	fn remove(&self, node: &MemNode) {
		let mut arena = self.arena.borrow_mut();
		arena.stats.node_removes += 1;
		arena.detach(node.0);
	}

	fn set_attribute(&self, node: &MemNode, name: &str, value: &str) {
		let mut arena = self.arena.borrow_mut();
		arena.stats.attr_writes += 1;
		match &mut arena.nodes[node.0].kind {
			NodeKind::Element { attrs, .. } => {
				match attrs.iter_mut().find(|(attr, _)| *attr == name) {
					Some((_, current)) => *current = String::from(value),
					None => attrs.push((CompactString::from(name), String::from(value))),
				}
			}
			NodeKind::Text { .. } => panic!("cannot set an attribute on a text node"),
		}
	}

	fn set_text(&self, parent: &MemNode, value: &str, index: usize) {
		let mut arena = self.arena.borrow_mut();
		arena.stats.text_writes += 1;
		let child = match &arena.nodes[parent.0].kind {
			NodeKind::Element { children, .. } => children[index],
			NodeKind::Text { .. } => panic!("text nodes cannot have children"),
		};
		match &mut arena.nodes[child].kind {
			NodeKind::Text { data } => *data = String::from(value),
			NodeKind::Element { .. } => {
				panic!("child at index {index} is an element, not a text node")
			}
		}
	}

	fn insert_text_at(&self, parent: &MemNode, value: &str, index: usize) {
		let mut arena = self.arena.borrow_mut();
		arena.stats.text_inserts += 1;
		let node = arena.push(NodeKind::Text {
			data: String::from(value),
		});
		let children = arena.children_mut(parent.0);
		let at = index.min(children.len());
		children.insert(at, node);
		arena.nodes[node].parent = Some(parent.0);
	}

	fn attach_listener(
		&self,
		node: &MemNode,
		name: &str,
		initial: Option<EventHandler<Self>>,
	) -> HandlerSlot<Self> {
		let slot = HandlerSlot::new(initial);
		let mut arena = self.arena.borrow_mut();
		arena.stats.listener_attaches += 1;
		match &mut arena.nodes[node.0].kind {
			NodeKind::Element { listeners, .. } => {
				listeners.push((CompactString::from(name), slot.clone()));
			}
			NodeKind::Text { .. } => panic!("cannot attach a listener to a text node"),
		}
		slot
	}

	fn outer_html(&self, node: &MemNode) -> String {
		let arena = self.arena.borrow();
		let mut out = String::new();
		arena.serialize(node.0, &mut out);
		out
	}
}

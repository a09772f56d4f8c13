//! The instance runtime.
//!
//! A [`Block`] is one live use of a compiled template. Mounting deep-clones the template skeleton
//! and applies every edit once; patching replaces the prop map and rewrites only the host nodes
//! whose resolved value actually changed. All host mutation in this crate happens here (and in
//! the compiler's one-time skeleton construction).

use crate::{
	dom::{Dom, HandlerSlot},
	template::{Edit, EditOp},
	vnode::{EventSource, Hole, Props, Value},
};
use compact_str::CompactString;
use core::cell::RefCell;
use core::fmt::{self, Debug, Formatter};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{error, trace, trace_span, warn};

/// One live, mounted-or-unmounted use of a compiled template.
///
/// Blocks are cheap shared handles; cloning one clones the handle, not the instance. Everything is
/// single-threaded and runs to completion: callers serialize access to one block themselves.
pub struct Block<D: Dom>(Rc<Inner<D>>);

struct Inner<D: Dom> {
	dom: D,
	skeleton: D::Node,
	edits: Rc<[Edit<D>]>,
	props: RefCell<Option<Props<D>>>,
	key: Option<CompactString>,
	/// The mounted root. Absent until the first [`Block::mount`].
	root: RefCell<Option<D::Node>>,
	/// Lazily resolved parent of the mounted root.
	parent: RefCell<Option<D::Node>>,
	/// Edit index → resolved host node, populated while mounting. Path coordinates are only valid
	/// against a pristine clone, so patching *must* go through this cache.
	cache: RefCell<HashMap<usize, D::Node>>,
	/// Patch capabilities for hole-driven listeners, indexed by compile-time slot.
	listener_slots: RefCell<Vec<Option<HandlerSlot<D>>>>,
}

impl<D: Dom> Block<D> {
	pub(crate) fn new(
		dom: D,
		skeleton: D::Node,
		edits: Rc<[Edit<D>]>,
		event_slots: usize,
		props: Option<Props<D>>,
		key: Option<CompactString>,
	) -> Self {
		Self(Rc::new(Inner {
			dom,
			skeleton,
			edits,
			props: RefCell::new(props),
			key,
			root: RefCell::new(None),
			parent: RefCell::new(None),
			cache: RefCell::new(HashMap::new()),
			listener_slots: RefCell::new(vec![None; event_slots]),
		}))
	}

	/// Mounts this block, returning its root host node.
	///
	/// Idempotent: an already-mounted block returns its existing root untouched. Otherwise the
	/// skeleton is deep-cloned and every edit is applied in compiled order; when `parent` is
	/// given, the root is inserted before `reference` (appended without one).
	pub fn mount(&self, parent: Option<&D::Node>, reference: Option<&D::Node>) -> D::Node {
		if let Some(root) = self.root() {
			return root;
		}
		let span = trace_span!("mount");
		let _enter = span.enter();

		let inner = &*self.0;
		let dom = &inner.dom;
		let root = dom.clone_subtree(&inner.skeleton, true);
		inner.cache.borrow_mut().clear();

		let props = inner.props.borrow();
		for (index, edit) in inner.edits.iter().enumerate() {
			let Some(el) = self.resolve(edit, &root, index) else {
				error!(
					path = ?edit.path,
					"Edit path does not resolve against the cloned skeleton. Skipping its ops."
				);
				continue;
			};
			for op in &edit.ops {
				match op {
					EditOp::Block { index, block } => {
						let anchor = dom.child_at(&el, *index);
						block.mount(Some(&el), anchor.as_ref());
					}
					EditOp::Child { index, hole } => match resolved(props.as_ref(), hole) {
						Value::Block(nested) => {
							let anchor = dom.child_at(&el, *index);
							nested.mount(Some(&el), anchor.as_ref());
						}
						value => dom.insert_text_at(&el, &value.to_text(), *index),
					},
					EditOp::Event { name, source, slot } => {
						let handler = match source {
							EventSource::Listener(handler) => Some(Rc::clone(handler)),
							EventSource::Hole(hole) => {
								into_handler(&resolved(props.as_ref(), hole), hole)
							}
						};
						let patch = dom.attach_listener(&el, name, handler);
						if let Some(slot) = slot {
							inner.listener_slots.borrow_mut()[*slot] = Some(patch);
						}
					}
					EditOp::Attribute { name, hole } => {
						dom.set_attribute(&el, name, &resolved(props.as_ref(), hole).to_text());
					}
				}
			}
		}
		drop(props);

		*inner.root.borrow_mut() = Some(root.clone());
		if let Some(parent) = parent {
			dom.insert_before(parent, &root, reference);
		}
		root
	}

	/// Patches this block against the props carried by `next`, returning the (unchanged) root.
	///
	/// No-op when unmounted, when `next` carries no props, or when the shallow per-key scan finds
	/// no identity change. Comparison is strict identity; a new reference for a deep-equal value
	/// counts as changed.
	pub fn patch(&self, next: &Block<D>) -> Option<D::Node> {
		let inner = &*self.0;
		let root = inner.root.borrow().clone()?;
		let span = trace_span!("patch");
		let _enter = span.enter();

		let Some(new_props) = next.props() else {
			trace!("No incoming props. Nothing to do.");
			return Some(root);
		};
		let old_props = inner.props.borrow().clone().unwrap_or_default();
		if !old_props.differs(&new_props) {
			trace!("Props are shallow-identical. Skipping.");
			return Some(root);
		}
		*inner.props.borrow_mut() = Some(new_props.clone());

		let dom = &inner.dom;
		for (index, edit) in inner.edits.iter().enumerate() {
			let Some(el) = self.resolve(edit, &root, index) else {
				error!(
					path = ?edit.path,
					"Edit path is neither cached nor resolvable. Skipping its ops."
				);
				continue;
			};
			for op in &edit.ops {
				match op {
					EditOp::Block { block, .. } => {
						// Compile-time nested instances are shared with the carrier, so this
						// recursion only does work when their props were swapped directly.
						block.patch(block);
					}
					EditOp::Event {
						source: EventSource::Hole(hole),
						slot,
						..
					} => {
						let old = old_props.resolved(hole);
						let new = new_props.resolved(hole);
						if old.same(&new) {
							continue;
						}
						let slots = inner.listener_slots.borrow();
						if let Some(patch) = slot.and_then(|slot| slots.get(slot)).and_then(Option::as_ref) {
							patch.replace(into_handler(&new, hole));
						} else {
							warn!(key = hole.key(), "No listener slot for event hole. Was the block mounted?");
						}
					}
					// Fixed listeners never change.
					EditOp::Event { .. } => {}
					EditOp::Attribute { name, hole } => {
						let new = new_props.resolved(hole);
						if old_props.resolved(hole).same(&new) {
							continue;
						}
						dom.set_attribute(&el, name, &new.to_text());
					}
					EditOp::Child { index, hole } => {
						let old = old_props.resolved(hole);
						let new = new_props.resolved(hole);
						if old.same(&new) {
							continue;
						}
						match (old, new) {
							(Value::Block(mounted), Value::Block(carrier)) => {
								mounted.patch(&carrier);
							}
							(Value::Block(_), _) => warn!(
								key = hole.key(),
								"Child hole changed from a nested block to a non-block value. Skipping."
							),
							(_, Value::Block(_)) => warn!(
								key = hole.key(),
								"Child hole changed from a non-block value to a nested block. Skipping."
							),
							(_, new) => dom.set_text(&el, &new.to_text(), *index),
						}
					}
				}
			}
		}
		Some(root)
	}

	/// Repositions the mounted root immediately before `other`'s root (when given) or before
	/// `reference`, within the cached parent. Edits and props are untouched.
	pub fn move_before(&self, other: Option<&Block<D>>, reference: Option<&D::Node>) {
		let Some(root) = self.root() else {
			warn!("Cannot move an unmounted block.");
			return;
		};
		let Some(parent) = self.parent() else {
			warn!("Cannot move a block with no resolvable parent.");
			return;
		};
		let anchor = other.and_then(Block::root).or_else(|| reference.cloned());
		self.0.dom.insert_before(&parent, &root, anchor.as_ref());
	}

	/// Detaches the mounted root from its parent at the host level.
	///
	/// Props, the node cache, listener slots and the cached parent stay with the detached
	/// subtree, so the block can be re-inserted into its former parent with
	/// [`move_before`](`Block::move_before`). Nested blocks need no separate unmounting; they
	/// leave the live tree with this subtree.
	pub fn remove(&self) {
		let Some(root) = self.root() else {
			warn!("Cannot remove an unmounted block.");
			return;
		};
		self.0.dom.remove(&root);
	}

	/// The serialized form of the mounted root; `None` while unmounted.
	#[must_use]
	pub fn to_html(&self) -> Option<String> {
		self.root().map(|root| self.0.dom.outer_html(&root))
	}

	#[must_use]
	pub fn root(&self) -> Option<D::Node> {
		self.0.root.borrow().clone()
	}

	#[must_use]
	pub fn props(&self) -> Option<Props<D>> {
		self.0.props.borrow().clone()
	}

	#[must_use]
	pub fn key(&self) -> Option<&str> {
		self.0.key.as_deref()
	}

	/// The parent of the mounted root, resolved lazily and cached for the mount's lifetime.
	#[must_use]
	pub fn parent(&self) -> Option<D::Node> {
		if let Some(parent) = self.0.parent.borrow().clone() {
			return Some(parent);
		}
		let parent = self
			.0
			.root
			.borrow()
			.as_ref()
			.and_then(|root| self.0.dom.parent(root));
		if let Some(parent) = &parent {
			*self.0.parent.borrow_mut() = Some(parent.clone());
		}
		parent
	}

	/// Identity comparison of instances, not of contents.
	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// Resolves `edit`'s target within `root`, memoizing per edit index. The first resolution for
	/// a slot walks the path; later ones return the cached node.
	fn resolve(&self, edit: &Edit<D>, root: &D::Node, slot: usize) -> Option<D::Node> {
		if let Some(node) = self.0.cache.borrow().get(&slot) {
			return Some(node.clone());
		}
		let node = resolve_path(&self.0.dom, &edit.path, root)?;
		self.0.cache.borrow_mut().insert(slot, node.clone());
		Some(node)
	}
}

impl<D: Dom> Clone for Block<D> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

impl<D: Dom> Debug for Block<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Block")
			.field("key", &self.0.key)
			.field("mounted", &self.0.root.borrow().is_some())
			.field("edits", &self.0.edits.len())
			.finish()
	}
}

/// Walks `path`'s child-index steps down from `root`.
///
/// The root being structurally identical to the skeleton the path was recorded against is a
/// precondition, not re-validated here; a missing step returns `None` for the caller to log.
pub(crate) fn resolve_path<D: Dom>(dom: &D, path: &[usize], root: &D::Node) -> Option<D::Node> {
	let mut node = root.clone();
	for &step in path {
		node = dom.child_at(&node, step)?;
	}
	Some(node)
}

fn resolved<D: Dom>(props: Option<&Props<D>>, hole: &Hole) -> Value<D> {
	props.map_or(Value::Null, |props| props.resolved(hole))
}

fn into_handler<D: Dom>(value: &Value<D>, hole: &Hole) -> Option<crate::dom::EventHandler<D>> {
	match value {
		Value::Handler(handler) => Some(Rc::clone(handler)),
		Value::Null => None,
		other => {
			warn!(
				key = hole.key(),
				value = ?other,
				"Event hole resolved to a non-handler value. Ignoring it."
			);
			None
		}
	}
}

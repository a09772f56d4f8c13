//! The host-tree seam.
//!
//! Everything the engine does to a live tree goes through [`Dom`]. The trait is shaped after the
//! handful of primitives a block template actually needs (structural cloning, index-addressed
//! child access, positional text insertion, listener installation) rather than after any one
//! host's full API. [`crate::mem::MemDom`] and [`crate::web::WebDom`] are the two shipped
//! implementations.

use core::cell::RefCell;
use std::rc::Rc;

/// A listener callback, shared between the engine and the host.
pub type EventHandler<D> = Rc<dyn Fn(&<D as Dom>::Event)>;

/// Host-tree primitives required by the compiler and the instance runtime.
///
/// Implementations are cheap-to-clone handles (a document reference, a shared arena); node handles
/// likewise. Index arguments follow the host's ordered child list, the same ordering
/// [`child_at`](`Dom::child_at`) exposes.
pub trait Dom: Clone + 'static {
	/// A cheap handle to one node of the host tree. Cloning the handle never clones the node.
	type Node: Clone;
	/// The value passed to listeners when an event fires.
	type Event;

	fn create_element(&self, tag: &str) -> Self::Node;
	fn create_text(&self, data: &str) -> Self::Node;

	/// Structurally copies `node`, and its whole subtree when `deep`. The copy is independent of
	/// the original and carries no listeners, like
	/// [***cloneNode***](https://developer.mozilla.org/en-US/docs/Web/API/Node/cloneNode).
	fn clone_subtree(&self, node: &Self::Node, deep: bool) -> Self::Node;

	/// The child of `node` at `index`, if there is one.
	fn child_at(&self, node: &Self::Node, index: usize) -> Option<Self::Node>;

	/// The parent of `node`, if it is attached to one.
	fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

	/// Inserts `node` under `parent`, immediately before `reference`. Appends when no reference
	/// node is given.
	fn insert_before(&self, parent: &Self::Node, node: &Self::Node, reference: Option<&Self::Node>);

	/// Detaches `node` from its parent. A no-op for detached nodes.
	fn remove(&self, node: &Self::Node);

	fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

	/// Rewrites the data of the text node at child position `index` of `parent`.
	///
	/// The child at `index` being a text node is a precondition; it is host-defined what happens
	/// otherwise.
	fn set_text(&self, parent: &Self::Node, value: &str, index: usize);

	/// Inserts a new text node at child position `index` of `parent`, appending when `index` is
	/// past the end of the child list.
	fn insert_text_at(&self, parent: &Self::Node, value: &str, index: usize);

	/// Installs a listener for `name` events on `node`, exactly once.
	///
	/// The returned [`HandlerSlot`] is the only way to change which callback the listener invokes:
	/// replacing the slot's handler must take effect without the host detaching or re-adding the
	/// underlying listener.
	fn attach_listener(
		&self,
		node: &Self::Node,
		name: &str,
		initial: Option<EventHandler<Self>>,
	) -> HandlerSlot<Self>;

	/// Serializes `node` and its subtree.
	fn outer_html(&self, node: &Self::Node) -> String;
}

/// The capability object returned by [`Dom::attach_listener`].
///
/// Holds the handler a live listener currently invokes. Its one operation is
/// [`replace`](`HandlerSlot::replace`); the listener installation itself is never touched again.
pub struct HandlerSlot<D: Dom> {
	current: Rc<RefCell<Option<EventHandler<D>>>>,
}

impl<D: Dom> HandlerSlot<D> {
	#[must_use]
	pub fn new(initial: Option<EventHandler<D>>) -> Self {
		Self {
			current: Rc::new(RefCell::new(initial)),
		}
	}

	/// Swaps the active handler in place.
	pub fn replace(&self, handler: Option<EventHandler<D>>) {
		*self.current.borrow_mut() = handler;
	}

	/// Invokes the current handler, if any. Hosts call this when the underlying event fires.
	///
	/// The handler is cloned out first, so it may itself patch blocks that own this slot.
	pub fn invoke(&self, event: &D::Event) {
		let handler = self.current.borrow().clone();
		if let Some(handler) = handler {
			handler(event);
		}
	}

	#[must_use]
	pub fn is_set(&self) -> bool {
		self.current.borrow().is_some()
	}
}

impl<D: Dom> Clone for HandlerSlot<D> {
	fn clone(&self) -> Self {
		Self {
			current: Rc::clone(&self.current),
		}
	}
}

//! The browser host tree.
//!
//! [`WebDom`] implements [`Dom`] over [`web_sys::Node`]. Each listener is a single
//! [`Closure`](`wasm_bindgen::closure::Closure`) that reads the current handler from its
//! [`HandlerSlot`] on every event, so patching a handler never goes through
//! [***removeEventListener***](https://developer.mozilla.org/en-US/docs/Web/API/EventTarget/removeEventListener).
//! The module compiles on every target but is only functional on `wasm32`.

use crate::{
	closure_set,
	dom::{Dom, EventHandler, HandlerSlot},
};
use tracing::error;
use wasm_bindgen::{closure::Closure, JsCast, UnwrapThrowExt};

/// A [`Dom`] over the browser's document.
#[derive(Clone, Debug)]
pub struct WebDom {
	document: web_sys::Document,
}

impl WebDom {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self { document }
	}

	/// The [`WebDom`] for the current window's document, if there is one.
	#[must_use]
	pub fn from_window() -> Option<Self> {
		Some(Self::new(web_sys::window()?.document()?))
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}
}

impl Dom for WebDom {
	type Node = web_sys::Node;
	type Event = web_sys::Event;

	fn create_element(&self, tag: &str) -> web_sys::Node {
		self.document
			.create_element(tag)
			.expect_throw("block-dom: Failed to create element for the template skeleton.")
			.into()
	}

	fn create_text(&self, data: &str) -> web_sys::Node {
		self.document.create_text_node(data).into()
	}

	fn clone_subtree(&self, node: &web_sys::Node, deep: bool) -> web_sys::Node {
		node.clone_node_with_deep(deep)
			.expect_throw("block-dom: Failed to clone the template skeleton.")
	}

	fn child_at(&self, node: &web_sys::Node, index: usize) -> Option<web_sys::Node> {
		node.child_nodes().get(u32::try_from(index).ok()?)
	}

	fn parent(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.parent_node()
	}

	fn insert_before(
		&self,
		parent: &web_sys::Node,
		node: &web_sys::Node,
		reference: Option<&web_sys::Node>,
	) {
		if let Err(error) = parent.insert_before(node, reference) {
			error!("Failed to insert node: {:?}", error);
		}
	}

	fn remove(&self, node: &web_sys::Node) {
		match node.parent_node() {
			Some(parent) => {
				if let Err(error) = parent.remove_child(node) {
					error!("Failed to remove the node: {:?}", error);
				}
			}
			None => (),
		}
	}

	fn set_attribute(&self, node: &web_sys::Node, name: &str, value: &str) {
		let Some(element) = node.dyn_ref::<web_sys::Element>() else {
			return error!("Expected to set {:?} on a `web_sys::Element` but found {:?}.", name, node);
		};
		if let Err(error) = element.set_attribute(name, value) {
			error!("Failed to set attribute {:?}={:?}: {:?}", name, value, error);
		}
	}

	fn set_text(&self, parent: &web_sys::Node, value: &str, index: usize) {
		let Some(child) = self.child_at(parent, index) else {
			return error!("Expected a text node at child position {} but found nothing.", index);
		};
		match child.dyn_ref::<web_sys::Text>() {
			Some(text) => text.set_data(value),
			None => error!("Expected to update `web_sys::Text` but found {:?}.", child),
		}
	}

	fn insert_text_at(&self, parent: &web_sys::Node, value: &str, index: usize) {
		let text = self.document.create_text_node(value);
		let reference = self.child_at(parent, index);
		if let Err(error) = parent.insert_before(text.as_ref(), reference.as_ref()) {
			error!("Failed to insert text at {}: {:?}", index, error);
		}
	}

	fn attach_listener(
		&self,
		node: &web_sys::Node,
		name: &str,
		initial: Option<EventHandler<Self>>,
	) -> HandlerSlot<Self> {
		let slot = HandlerSlot::new(initial);
		let dispatch = slot.clone();
		let closure = Closure::wrap(
			Box::new(move |event: web_sys::Event| dispatch.invoke(&event))
				as Box<dyn Fn(web_sys::Event)>,
		);
		if let Err(error) = node.add_event_listener_with_callback(
			name,
			closure.as_ref().unchecked_ref::<js_sys::Function>(),
		) {
			error!("Failed to add event listener {:?}: {:?}", name, error);
		}
		closure_set::retain(closure);
		slot
	}

	fn outer_html(&self, node: &web_sys::Node) -> String {
		match node.dyn_ref::<web_sys::Element>() {
			Some(element) => element.outer_html(),
			None => node.text_content().unwrap_or_default(),
		}
	}
}

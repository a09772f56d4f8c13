//! The template compiler.
//!
//! [`Template::compile`] walks a rendered [`VNode`] tree exactly once and lowers it into a static
//! skeleton (real host nodes, built through the [`Dom`] trait) plus an ordered list of [`Edit`]s.
//! The skeleton is never mutated afterwards; every instance mounts against its own deep clone.

use crate::{
	block::Block,
	dom::Dom,
	vnode::{AttrValue, EventSource, Hole, Props, VElement, VNode},
};
use compact_str::CompactString;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, trace_span};

/// A static text segment that would have merged into its preceding sibling during naive
/// materialization. Recorded per [`Edit`] and inserted into the canonical skeleton exactly once,
/// at compile time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextInit {
	pub value: CompactString,
	/// Child position among the skeleton children of the edit's node.
	pub index: usize,
}

/// One instruction to perform at an [`Edit`]'s node.
///
/// Child positions in `Child` and `Block` ops count *every* logical child (text segments, holes
/// and nested blocks alike), so they are valid against the fully mounted child list.
pub enum EditOp<D: Dom> {
	/// Set an attribute from a hole's resolved value.
	Attribute { name: CompactString, hole: Hole },
	/// Fill a child position from a hole's resolved value: text, or a nested block to mount.
	Child { index: usize, hole: Hole },
	/// Install a listener. Holes get a per-instance patch slot; fixed listeners never change.
	Event {
		name: CompactString,
		source: EventSource<D>,
		slot: Option<usize>,
	},
	/// Mount a block instance embedded at compile time. The instance is shared by every clone of
	/// the enclosing template.
	Block { index: usize, block: Block<D> },
}

/// The compiled instructions for one node of the skeleton.
///
/// `path` is the sequence of child-index steps from the skeleton root to the node, in skeleton
/// coordinates (holes and blocks contribute nothing to the skeleton). It uniquely addresses the
/// node in any clone of the skeleton; [`Block::mount`](`crate::block::Block::mount`) resolves it
/// before the clone's child lists are touched and caches the result for patching.
pub struct Edit<D: Dom> {
	pub path: Box<[usize]>,
	pub inits: Vec<TextInit>,
	pub ops: Vec<EditOp<D>>,
}

/// A render function broke the compile-time contract. Nothing partially compiled escapes.
#[derive(Debug, Error)]
pub enum CompileError {
	#[error("template root must be a single element, found {found}")]
	NonElementRoot { found: &'static str },
}

/// A compiled template: one canonical skeleton plus its edit list, shared by any number of
/// [`Block`] instances.
pub struct Template<D: Dom> {
	dom: D,
	skeleton: D::Node,
	edits: Rc<[Edit<D>]>,
	event_slots: usize,
}

impl<D: Dom> Template<D> {
	/// Compiles `render` into a template.
	///
	/// `render` runs exactly once, against a fresh [`Holes`](`crate::vnode::Holes`) provider. Its
	/// result must be rooted in a single element.
	///
	/// # Errors
	///
	/// [`CompileError::NonElementRoot`] when the rendered root is text, a hole or a block.
	pub fn compile<F>(dom: &D, render: F) -> Result<Self, CompileError>
	where
		F: FnOnce(&crate::vnode::Holes) -> VNode<D>,
	{
		let span = trace_span!("compile");
		let _enter = span.enter();

		let holes = crate::vnode::Holes::default();
		let root = match render(&holes) {
			VNode::Element(element) => element,
			VNode::Text(_) => return Err(CompileError::NonElementRoot { found: "text" }),
			VNode::Hole(_) => return Err(CompileError::NonElementRoot { found: "a hole" }),
			VNode::Block(_) => return Err(CompileError::NonElementRoot { found: "a block" }),
		};

		let mut walker = Walker {
			dom,
			edits: Vec::new(),
			event_slots: 0,
		};
		let skeleton = walker.element(root, &[]);
		let Walker {
			edits, event_slots, ..
		} = walker;

		debug!(
			edits = edits.len(),
			event_slots, "compiled template skeleton"
		);
		Ok(Self {
			dom: dom.clone(),
			skeleton,
			edits: edits.into(),
			event_slots,
		})
	}

	/// The factory: creates an unmounted [`Block`] over this template.
	///
	/// When no explicit `key` is given, a `"key"` prop serves as the identity key.
	#[must_use]
	pub fn instance(&self, props: Option<Props<D>>, key: Option<&str>) -> Block<D> {
		let key = key.map(CompactString::from).or_else(|| {
			props
				.as_ref()
				.and_then(|props| props.get("key"))
				.and_then(crate::vnode::Value::as_str)
				.map(CompactString::from)
		});
		Block::new(
			self.dom.clone(),
			self.skeleton.clone(),
			Rc::clone(&self.edits),
			self.event_slots,
			props,
			key,
		)
	}

	#[must_use]
	pub fn edits(&self) -> &[Edit<D>] {
		&self.edits
	}

	#[must_use]
	pub fn skeleton(&self) -> &D::Node {
		&self.skeleton
	}

	/// How many hole-driven event positions instances of this template carry.
	#[must_use]
	pub fn event_slots(&self) -> usize {
		self.event_slots
	}
}

struct Walker<'a, D: Dom> {
	dom: &'a D,
	edits: Vec<Edit<D>>,
	event_slots: usize,
}

impl<D: Dom> Walker<'_, D> {
	/// Materializes `element` into a skeleton node, emitting its edit record after its children's
	/// (deepest first, the order mounting later relies on for path resolution).
	fn element(&mut self, element: VElement<D>, path: &[usize]) -> D::Node {
		let node = self.dom.create_element(&element.tag);
		let mut ops = Vec::new();
		let mut inits = Vec::new();

		for (name, value) in element.attrs {
			match value {
				AttrValue::Lit(value) => self.dom.set_attribute(&node, &name, &value),
				AttrValue::Hole(hole) => ops.push(EditOp::Attribute { name, hole }),
			}
		}

		// Listeners cannot live in a clonable skeleton; every binding becomes an op.
		for (name, source) in element.events {
			let slot = matches!(source, EventSource::Hole(_)).then(|| {
				let slot = self.event_slots;
				self.event_slots += 1;
				slot
			});
			ops.push(EditOp::Event { name, source, slot });
		}

		// `position` counts every logical child; `materialized` only those present in the
		// skeleton. A text child while a run is open would merge with the run's previous segment
		// under naive materialization, so it is recorded as an init instead; the segment is still
		// created here, once, against the canonical skeleton.
		let mut position = 0_usize;
		let mut materialized = 0_usize;
		let mut text_run_open = false;
		for child in element.children {
			match child {
				VNode::Text(text) => {
					if text_run_open {
						inits.push(TextInit {
							value: text.clone(),
							index: materialized,
						});
					} else {
						text_run_open = true;
					}
					let segment = self.dom.create_text(&text);
					self.dom.insert_before(&node, &segment, None);
					materialized += 1;
					position += 1;
				}
				VNode::Hole(hole) => {
					ops.push(EditOp::Child {
						index: position,
						hole,
					});
					position += 1;
				}
				VNode::Block(block) => {
					ops.push(EditOp::Block {
						index: position,
						block,
					});
					position += 1;
				}
				VNode::Element(child_element) => {
					let mut child_path = path.to_vec();
					child_path.push(materialized);
					let child_node = self.element(child_element, &child_path);
					self.dom.insert_before(&node, &child_node, None);
					text_run_open = false;
					materialized += 1;
					position += 1;
				}
			}
		}

		if !ops.is_empty() || !inits.is_empty() {
			self.edits.push(Edit {
				path: path.into(),
				inits,
				ops,
			});
		}
		node
	}
}

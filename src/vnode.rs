//! Virtual nodes, holes and prop maps.
//!
//! A [`VNode`] tree is produced once by a render function and describes one template; it is never
//! mutated or diffed. Dynamic positions are marked with [`Hole`]s handed out by the [`Holes`]
//! provider the render function receives.

use crate::{
	block::Block,
	dom::{Dom, EventHandler},
};
use compact_str::{CompactString, ToCompactString};
use core::cell::RefCell;
use core::fmt::{self, Debug, Formatter};
use hashbrown::HashMap;
use std::rc::Rc;

/// A compile-time placeholder for the prop value stored under one key.
///
/// Holes are identity-stable: [`Holes::get`] returns the *same* hole for repeated lookups of one
/// key, and equality between holes is identity, not key comparison. A hole carries no value; it is
/// resolved against a concrete prop map at mount and patch time.
#[derive(Clone)]
pub struct Hole(Rc<CompactString>);

impl Hole {
	fn new(key: &str) -> Self {
		Self(Rc::new(CompactString::from(key)))
	}

	#[must_use]
	pub fn key(&self) -> &str {
		&self.0
	}
}

impl PartialEq for Hole {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}
impl Eq for Hole {}

impl Debug for Hole {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Hole").field(&self.key()).finish()
	}
}

/// The placeholder provider passed to a render function.
///
/// A lookup table with lazy insertion: the first [`get`](`Holes::get`) for a key creates its
/// [`Hole`], every later one returns that identical hole.
#[derive(Debug, Default)]
pub struct Holes {
	memo: RefCell<HashMap<CompactString, Hole>>,
}

impl Holes {
	#[must_use]
	pub fn get(&self, key: &str) -> Hole {
		self.memo
			.borrow_mut()
			.entry_ref(key)
			.or_insert_with(|| Hole::new(key))
			.clone()
	}
}

/// A concrete prop value, as stored in a [`Props`] map.
///
/// Comparison through [`same`](`Value::same`) is strict identity per the host language's notion of
/// it: primitives by value, handlers and nested blocks by reference. There is no deep equality.
#[derive(Clone)]
pub enum Value<D: Dom> {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(CompactString),
	Handler(EventHandler<D>),
	Block(Block<D>),
}

impl<D: Dom> Value<D> {
	pub fn handler(f: impl Fn(&D::Event) + 'static) -> Self {
		Self::Handler(Rc::new(f))
	}

	/// Strict identity comparison. A new handler or block reference counts as changed even if it
	/// behaves identically; `Float` follows host float semantics, so `NaN` never compares equal.
	#[must_use]
	#[allow(clippy::float_cmp)]
	pub fn same(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Float(a), Self::Float(b)) => a == b,
			(Self::Str(a), Self::Str(b)) => a == b,
			(Self::Handler(a), Self::Handler(b)) => {
				core::ptr::eq(Rc::as_ptr(a).cast::<()>(), Rc::as_ptr(b).cast::<()>())
			}
			(Self::Block(a), Self::Block(b)) => a.ptr_eq(b),
			_ => false,
		}
	}

	/// Text coercion for attribute values and child text. `Null`, handlers and blocks render
	/// empty.
	#[must_use]
	pub fn to_text(&self) -> CompactString {
		match self {
			Self::Null | Self::Handler(_) | Self::Block(_) => CompactString::default(),
			Self::Bool(value) => value.to_compact_string(),
			Self::Int(value) => value.to_compact_string(),
			Self::Float(value) => value.to_compact_string(),
			Self::Str(value) => value.clone(),
		}
	}

	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(value) => Some(value),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_block(&self) -> Option<&Block<D>> {
		match self {
			Self::Block(block) => Some(block),
			_ => None,
		}
	}
}

impl<D: Dom> Debug for Value<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("Null"),
			Self::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
			Self::Int(value) => f.debug_tuple("Int").field(value).finish(),
			Self::Float(value) => f.debug_tuple("Float").field(value).finish(),
			Self::Str(value) => f.debug_tuple("Str").field(value).finish(),
			Self::Handler(_) => f.write_str("Handler(..)"),
			Self::Block(block) => f.debug_tuple("Block").field(block).finish(),
		}
	}
}

impl<D: Dom> From<&str> for Value<D> {
	fn from(value: &str) -> Self {
		Self::Str(CompactString::from(value))
	}
}
impl<D: Dom> From<String> for Value<D> {
	fn from(value: String) -> Self {
		Self::Str(CompactString::from(value))
	}
}
impl<D: Dom> From<bool> for Value<D> {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl<D: Dom> From<i64> for Value<D> {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}
impl<D: Dom> From<f64> for Value<D> {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}
impl<D: Dom> From<Block<D>> for Value<D> {
	fn from(value: Block<D>) -> Self {
		Self::Block(value)
	}
}

/// A prop map: hole key → concrete value.
pub struct Props<D: Dom> {
	values: HashMap<CompactString, Value<D>>,
}

impl<D: Dom> Props<D> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(mut self, key: &str, value: impl Into<Value<D>>) -> Self {
		self.insert(key, value);
		self
	}

	pub fn insert(&mut self, key: &str, value: impl Into<Value<D>>) {
		self.values.insert(CompactString::from(key), value.into());
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&Value<D>> {
		self.values.get(key)
	}

	/// The value a hole resolves to against this map; [`Value::Null`] when the key is absent.
	#[must_use]
	pub fn resolved(&self, hole: &Hole) -> Value<D> {
		self.get(hole.key()).cloned().unwrap_or(Value::Null)
	}

	/// The shallow scan behind the patch short-circuit: `true` iff some key of *this* map resolves
	/// to a non-identical value in `next`. Keys only present in `next` are not consulted.
	#[must_use]
	pub fn differs(&self, next: &Self) -> bool {
		self.values
			.iter()
			.any(|(key, old)| !old.same(next.get(key).unwrap_or(&Value::Null)))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.values.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

impl<D: Dom> Default for Props<D> {
	fn default() -> Self {
		Self {
			values: HashMap::new(),
		}
	}
}

impl<D: Dom> Clone for Props<D> {
	fn clone(&self) -> Self {
		Self {
			values: self.values.clone(),
		}
	}
}

impl<D: Dom> Debug for Props<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.values.iter()).finish()
	}
}

/// An attribute value in a virtual element: a literal, or a hole resolved per instance.
#[derive(Clone, Debug)]
pub enum AttrValue {
	Lit(CompactString),
	Hole(Hole),
}

/// An event binding in a virtual element: a fixed listener, or a hole resolved per instance.
#[derive(Clone)]
pub enum EventSource<D: Dom> {
	Listener(EventHandler<D>),
	Hole(Hole),
}

impl<D: Dom> Debug for EventSource<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Listener(_) => f.write_str("Listener(..)"),
			Self::Hole(hole) => f.debug_tuple("Hole").field(hole).finish(),
		}
	}
}

/// One element of a virtual tree.
pub struct VElement<D: Dom> {
	pub tag: CompactString,
	pub attrs: Vec<(CompactString, AttrValue)>,
	pub events: Vec<(CompactString, EventSource<D>)>,
	pub children: Vec<VNode<D>>,
}

impl<D: Dom> VElement<D> {
	#[must_use]
	pub fn new(tag: &str) -> Self {
		Self {
			tag: CompactString::from(tag),
			attrs: Vec::new(),
			events: Vec::new(),
			children: Vec::new(),
		}
	}

	#[must_use]
	pub fn attr(mut self, name: &str, value: &str) -> Self {
		self.attrs
			.push((CompactString::from(name), AttrValue::Lit(CompactString::from(value))));
		self
	}

	#[must_use]
	pub fn attr_hole(mut self, name: &str, hole: &Hole) -> Self {
		self.attrs
			.push((CompactString::from(name), AttrValue::Hole(hole.clone())));
		self
	}

	#[must_use]
	pub fn on(mut self, name: &str, handler: impl Fn(&D::Event) + 'static) -> Self {
		self.events
			.push((CompactString::from(name), EventSource::Listener(Rc::new(handler))));
		self
	}

	#[must_use]
	pub fn on_hole(mut self, name: &str, hole: &Hole) -> Self {
		self.events
			.push((CompactString::from(name), EventSource::Hole(hole.clone())));
		self
	}

	#[must_use]
	pub fn child(mut self, child: impl Into<VNode<D>>) -> Self {
		self.children.push(child.into());
		self
	}

	#[must_use]
	pub fn text(self, text: &str) -> Self {
		self.child(VNode::Text(CompactString::from(text)))
	}

	#[must_use]
	pub fn hole(self, hole: &Hole) -> Self {
		self.child(VNode::Hole(hole.clone()))
	}
}

/// One node of a virtual tree.
pub enum VNode<D: Dom> {
	Element(VElement<D>),
	Text(CompactString),
	Hole(Hole),
	/// A block instance embedded at compile time. Shared by every clone of the enclosing
	/// template.
	Block(Block<D>),
}

impl<D: Dom> From<VElement<D>> for VNode<D> {
	fn from(element: VElement<D>) -> Self {
		Self::Element(element)
	}
}
impl<D: Dom> From<&Hole> for VNode<D> {
	fn from(hole: &Hole) -> Self {
		Self::Hole(hole.clone())
	}
}
impl<D: Dom> From<&str> for VNode<D> {
	fn from(text: &str) -> Self {
		Self::Text(CompactString::from(text))
	}
}
impl<D: Dom> From<Block<D>> for VNode<D> {
	fn from(block: Block<D>) -> Self {
		Self::Block(block)
	}
}

#[cfg(test)]
mod tests {
	use super::{Holes, Value};
	use crate::mem::MemDom;

	#[test]
	fn holes_are_memoized_by_identity() {
		let holes = Holes::default();
		let a_1 = holes.get("a");
		let a_2 = holes.get("a");
		let b = holes.get("b");
		assert_eq!(a_1, a_2);
		assert_ne!(a_1, b);
		assert_eq!(b.key(), "b");
	}

	#[test]
	fn value_identity_is_shallow() {
		let by_value: Value<MemDom> = Value::from("red");
		assert!(by_value.same(&Value::from("red")));
		assert!(!by_value.same(&Value::from("blue")));
		assert!(!Value::<MemDom>::Null.same(&Value::from(0_i64)));

		let handler: Value<MemDom> = Value::handler(|_| {});
		assert!(handler.same(&handler.clone()));
		// A fresh handler for the same behavior is a different value.
		assert!(!handler.same(&Value::handler(|_| {})));
	}

	#[test]
	fn float_nan_never_compares_equal() {
		let nan: Value<MemDom> = Value::from(f64::NAN);
		assert!(!nan.same(&nan.clone()));
	}
}

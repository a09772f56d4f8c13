use block_dom::{
	dom::Dom,
	mem::MemDom,
	template::Template,
	vnode::{Props, VElement, Value},
};

#[test]
fn identical_props_short_circuit_without_host_writes() {
	let dom = MemDom::new();
	let template = Template::compile(&dom, |holes| {
		VElement::new("div")
			.attr_hole("class", &holes.get("c"))
			.hole(&holes.get("t"))
			.into()
	})
	.unwrap();

	let block = template.instance(Some(Props::new().with("c", "red").with("t", "hi")), None);
	let root = block.mount(None, None);
	let mounted = dom.stats();

	let same = template.instance(Some(Props::new().with("c", "red").with("t", "hi")), None);
	assert_eq!(block.patch(&same), Some(root));
	assert_eq!(dom.stats(), mounted, "shallow-identical props must not write to the host");
}

#[test]
fn patch_without_props_is_a_benign_no_op() {
	let dom = MemDom::new();
	let template = Template::compile(&dom, |holes| {
		VElement::new("div").hole(&holes.get("t")).into()
	})
	.unwrap();

	let block = template.instance(Some(Props::new().with("t", "hi")), None);
	let root = block.mount(None, None);
	let mounted = dom.stats();

	let empty_handed = template.instance(None, None);
	assert_eq!(block.patch(&empty_handed), Some(root));
	assert_eq!(dom.stats(), mounted);
	// The stored props survive an empty-handed patch.
	assert!(block.props().unwrap().get("t").is_some());
}

#[test]
fn patch_before_mount_does_nothing() {
	let dom = MemDom::new();
	let template = Template::compile(&dom, |holes| {
		VElement::new("div").hole(&holes.get("t")).into()
	})
	.unwrap();

	let block = template.instance(Some(Props::new().with("t", "hi")), None);
	let next = template.instance(Some(Props::new().with("t", "bye")), None);
	assert_eq!(block.patch(&next), None);
}

#[test]
fn only_the_changed_position_is_written() {
	let dom = MemDom::new();
	let template = Template::compile(&dom, |holes| {
		VElement::new("div")
			.child(VElement::new("span").hole(&holes.get("a")))
			.child(VElement::new("span").hole(&holes.get("b")))
			.into()
	})
	.unwrap();

	let block = template.instance(
		Some(Props::new().with("a", 1_i64).with("b", 2_i64)),
		None,
	);
	let root = block.mount(None, None);
	let mounted = dom.stats();

	let next = template.instance(
		Some(Props::new().with("a", 1_i64).with("b", 3_i64)),
		None,
	);
	block.patch(&next);

	let stats = dom.stats();
	assert_eq!(stats.text_writes, mounted.text_writes + 1);
	assert_eq!(stats.attr_writes, mounted.attr_writes);
	assert_eq!(stats.text_inserts, mounted.text_inserts);
	assert_eq!(stats.node_inserts, mounted.node_inserts);

	let span_a = dom.child_at(&root, 0).unwrap();
	let span_b = dom.child_at(&root, 1).unwrap();
	assert_eq!(dom.text_of(&dom.child_at(&span_a, 0).unwrap()).as_deref(), Some("1"));
	assert_eq!(dom.text_of(&dom.child_at(&span_b, 0).unwrap()).as_deref(), Some("3"));
}

#[test]
fn a_new_reference_for_an_equal_value_counts_as_changed() {
	let dom = MemDom::new();
	let template = Template::compile(&dom, |holes| {
		VElement::new("button").on_hole("click", &holes.get("go")).into()
	})
	.unwrap();

	let block = template.instance(
		Some(Props::new().with("go", Value::handler(|_| {}))),
		None,
	);
	block.mount(None, None);

	// Same behavior, fresh `Rc`: the shallow scan must treat it as a change.
	let old = block.props().unwrap();
	let next = template.instance(
		Some(Props::new().with("go", Value::handler(|_| {}))),
		None,
	);
	assert!(old.differs(&next.props().unwrap()));
}

#[test]
fn end_to_end_attribute_and_text_counters() {
	let dom = MemDom::new();
	let template = Template::compile(&dom, |holes| {
		VElement::new("div")
			.attr_hole("class", &holes.get("c"))
			.hole(&holes.get("t"))
			.into()
	})
	.unwrap();

	let block = template.instance(Some(Props::new().with("c", "red").with("t", "hi")), None);
	block.mount(None, None);
	assert_eq!(block.to_html().as_deref(), Some(r#"<div class="red">hi</div>"#));
	let mounted = dom.stats();
	assert_eq!(mounted.attr_writes, 1);
	assert_eq!(mounted.text_inserts, 1);

	let next = template.instance(Some(Props::new().with("c", "red").with("t", "bye")), None);
	block.patch(&next);

	let stats = dom.stats();
	assert_eq!(block.to_html().as_deref(), Some(r#"<div class="red">bye</div>"#));
	assert_eq!(stats.attr_writes, mounted.attr_writes, "the class attribute did not change");
	assert_eq!(stats.text_writes, mounted.text_writes + 1);
	assert_eq!(
		block.props().unwrap().get("t").and_then(Value::as_str),
		Some("bye"),
		"patch must store the new prop map"
	);
}

use block_dom::{
	dom::Dom,
	mem::MemDom,
	template::Template,
	vnode::{Props, VElement, VNode},
};

fn span_label(dom: &MemDom) -> Template<MemDom> {
	Template::compile(dom, |holes| {
		VElement::new("span").hole(&holes.get("label")).into()
	})
	.unwrap()
}

fn div_content(dom: &MemDom) -> Template<MemDom> {
	Template::compile(dom, |holes| {
		VElement::new("div").hole(&holes.get("content")).into()
	})
	.unwrap()
}

#[test]
fn a_block_prop_mounts_as_a_child() {
	let dom = MemDom::new();
	let inner = span_label(&dom).instance(Some(Props::new().with("label", "one")), None);
	let outer = div_content(&dom).instance(Some(Props::new().with("content", inner.clone())), None);

	outer.mount(None, None);
	assert_eq!(outer.to_html().as_deref(), Some("<div><span>one</span></div>"));
	assert_eq!(inner.to_html().as_deref(), Some("<span>one</span>"));
	assert_eq!(inner.parent(), outer.root());
}

#[test]
fn patching_recurses_into_the_mounted_nested_block() {
	let dom = MemDom::new();
	let spans = span_label(&dom);
	let divs = div_content(&dom);

	let inner = spans.instance(Some(Props::new().with("label", "one")), None);
	let outer = divs.instance(Some(Props::new().with("content", inner.clone())), None);
	outer.mount(None, None);
	let mounted = dom.stats();

	// The carrier holds a fresh, unmounted nested block with the new nested props.
	let carrier = spans.instance(Some(Props::new().with("label", "two")), None);
	let next = divs.instance(Some(Props::new().with("content", carrier.clone())), None);
	outer.patch(&next);

	assert_eq!(outer.to_html().as_deref(), Some("<div><span>two</span></div>"));
	assert_eq!(carrier.root(), None, "the carrier itself must never mount");
	assert_eq!(dom.stats().text_writes, mounted.text_writes + 1);
	assert_eq!(dom.stats().node_inserts, mounted.node_inserts);
}

#[test]
fn nested_patching_costs_the_same_as_patching_directly() {
	let dom = MemDom::new();
	let spans = span_label(&dom);
	let divs = div_content(&dom);

	let through_outer = spans.instance(Some(Props::new().with("label", "start")), None);
	let outer = divs.instance(
		Some(Props::new().with("content", through_outer.clone())),
		None,
	);
	outer.mount(None, None);

	let direct = spans.instance(Some(Props::new().with("label", "start")), None);
	direct.mount(None, None);

	let before = dom.stats();
	let carrier = spans.instance(Some(Props::new().with("label", "end")), None);
	outer.patch(&divs.instance(Some(Props::new().with("content", carrier)), None));
	let via_outer_writes = dom.stats().text_writes - before.text_writes;

	let before = dom.stats();
	direct.patch(&spans.instance(Some(Props::new().with("label", "end")), None));
	let direct_writes = dom.stats().text_writes - before.text_writes;

	assert_eq!(via_outer_writes, direct_writes);
	assert_eq!(via_outer_writes, 1);
}

#[test]
fn nested_short_circuit_matches_direct_invocation() {
	let dom = MemDom::new();
	let spans = span_label(&dom);
	let divs = div_content(&dom);

	let inner = spans.instance(Some(Props::new().with("label", "same")), None);
	let outer = divs.instance(Some(Props::new().with("content", inner)), None);
	outer.mount(None, None);
	let mounted = dom.stats();

	// New carrier, identical nested props: the outer diff sees a new block reference and
	// recurses, the nested diff short-circuits on its own.
	let carrier = spans.instance(Some(Props::new().with("label", "same")), None);
	outer.patch(&divs.instance(Some(Props::new().with("content", carrier)), None));
	assert_eq!(dom.stats(), mounted);
}

#[test]
fn blocks_embedded_at_compile_time_mount_in_place() {
	let dom = MemDom::new();
	let badge = span_label(&dom).instance(Some(Props::new().with("label", "fixed")), None);

	let template = Template::compile(&dom, |holes| {
		VElement::new("div")
			.text("[")
			.child(VNode::Block(badge.clone()))
			.hole(&holes.get("after"))
			.into()
	})
	.unwrap();

	let block = template.instance(Some(Props::new().with("after", "]")), None);
	block.mount(None, None);
	assert_eq!(
		block.to_html().as_deref(),
		Some("<div>[<span>fixed</span>]</div>")
	);

	// Patching the outer block leaves the embedded one alone.
	let mounted = dom.stats();
	let next = template.instance(Some(Props::new().with("after", ")")), None);
	block.patch(&next);
	assert_eq!(dom.stats().text_writes, mounted.text_writes + 1);
	assert_eq!(
		block.to_html().as_deref(),
		Some("<div>[<span>fixed</span>)</div>")
	);
}

#[test]
fn an_element_after_a_hole_still_resolves_its_own_edits() {
	let dom = MemDom::new();
	let template = Template::compile(&dom, |holes| {
		VElement::new("div")
			.hole(&holes.get("lead"))
			.child(VElement::new("span").hole(&holes.get("inner")))
			.into()
	})
	.unwrap();

	let block = template.instance(
		Some(Props::new().with("lead", "L").with("inner", "I")),
		None,
	);
	block.mount(None, None);
	assert_eq!(block.to_html().as_deref(), Some("<div>L<span>I</span></div>"));

	let next = template.instance(
		Some(Props::new().with("lead", "L2").with("inner", "I2")),
		None,
	);
	block.patch(&next);
	assert_eq!(block.to_html().as_deref(), Some("<div>L2<span>I2</span></div>"));
}

#[test]
fn move_before_reorders_mounted_siblings() {
	let dom = MemDom::new();
	let spans = span_label(&dom);
	let list = dom.create_element("ul");

	let a = spans.instance(Some(Props::new().with("label", "a")), None);
	let b = spans.instance(Some(Props::new().with("label", "b")), None);
	a.mount(Some(&list), None);
	b.mount(Some(&list), None);
	assert_eq!(dom.outer_html(&list), "<ul><span>a</span><span>b</span></ul>");

	b.move_before(Some(&a), None);
	assert_eq!(dom.outer_html(&list), "<ul><span>b</span><span>a</span></ul>");

	// Moving is pure repositioning; props and edits are untouched.
	assert_eq!(b.to_html().as_deref(), Some("<span>b</span>"));
}

#[test]
fn remove_detaches_but_keeps_the_instance_usable() {
	let dom = MemDom::new();
	let spans = span_label(&dom);
	let list = dom.create_element("ul");

	let a = spans.instance(Some(Props::new().with("label", "a")), None);
	let b = spans.instance(Some(Props::new().with("label", "b")), None);
	a.mount(Some(&list), None);
	b.mount(Some(&list), None);
	// Resolve (and thereby cache) the parent while still attached.
	assert_eq!(a.parent(), Some(list));

	a.remove();
	assert_eq!(dom.outer_html(&list), "<ul><span>b</span></ul>");
	// Detached, not destroyed: the subtree and bookkeeping survive.
	assert_eq!(a.to_html().as_deref(), Some("<span>a</span>"));
	assert!(a.root().is_some());

	// The cached parent still points at the list, so the block can come back.
	a.move_before(Some(&b), None);
	assert_eq!(dom.outer_html(&list), "<ul><span>a</span><span>b</span></ul>");

	// And patching the detached-then-restored block keeps working.
	a.patch(&spans.instance(Some(Props::new().with("label", "a2")), None));
	assert_eq!(dom.outer_html(&list), "<ul><span>a2</span><span>b</span></ul>");
}

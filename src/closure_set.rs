use core::cell::RefCell;
use tracing::trace;
use wasm_bindgen::closure::Closure;

thread_local! {
	static CLOSURE_SET: RefCell<Vec<Closure<dyn Fn(web_sys::Event)>>> = RefCell::new(Vec::new());
}

//TODO: Free closures when the subtree holding their target is removed.
pub(crate) fn retain(closure: Closure<dyn Fn(web_sys::Event)>) {
	CLOSURE_SET.with(move |set| set.borrow_mut().push(closure));
	trace!("Retained listener closure.");
}

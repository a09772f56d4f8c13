#![doc(html_root_url = "https://docs.rs/block-dom/0.0.1")]
#![warn(clippy::pedantic)]

//! A block DOM engine.
//!
//! [`Template::compile`](`template::Template::compile`) runs a render function once against a
//! [`Holes`](`vnode::Holes`) provider and lowers the resulting virtual tree into a static,
//! clonable skeleton plus an ordered list of positional [`Edit`](`template::Edit`)s. A
//! [`Block`](`block::Block`) is one live use of that template: mounting deep-clones the skeleton
//! and applies every edit, while patching compares the old and new prop for each hole and touches
//! only the host nodes whose input actually changed. No tree diff happens at runtime.
//!
//! The engine talks to its host tree exclusively through the [`Dom`](`dom::Dom`) trait.
//! [`mem::MemDom`] is an arena-backed implementation with mutation counters, suitable for servers
//! and tests; [`web::WebDom`] drives the browser DOM through `web_sys`.

pub mod block;
mod closure_set;
pub mod dom;
pub mod mem;
pub mod template;
pub mod vnode;
pub mod web;

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

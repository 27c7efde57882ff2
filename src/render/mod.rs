//! Text renderers for the campaign snapshot.
//!
//! Both renderers are infallible: any registry/relation state, including an
//! empty one, produces a well-formed document.

mod graph;
mod roster;

pub use graph::*;
pub use roster::*;

//! Payload cache (spec.md §4.4): the layer that lets WRITE buffer bytes
//! ahead of durability and READ serve hot files without round-tripping the
//! content store on every call.

pub mod memory;
pub mod state;

pub use memory::{Cancelled, PayloadCache};
pub use state::State;

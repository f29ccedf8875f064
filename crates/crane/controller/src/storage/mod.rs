//! Storage layer for crane-controller
//!
//! The controller only needs to read a recommendation by key and write it
//! back. The in-memory store backs tests and single-process wiring.

mod memory;
mod traits;

pub use memory::InMemoryStore;
pub use traits::RecommendationStore;

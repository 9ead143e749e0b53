//! Relation graph utilities
//!
//! @module graph

mod components;

pub use components::{split_components, Component};
